//! Integration tests for packing, saving, loading and predicting.

use iris_classifier::bundle::{load_bundle, read_metadata, METADATA_FILE};
use iris_classifier::service::PREDICT_API;
use iris_classifier::{
    train, ArtifactStore, BundleTag, Error, IrisClassifier, ModelConfig, Table, MODEL_SLOT,
    SERVICE_NAME,
};

fn packed_service() -> IrisClassifier {
    let trained = train(&ModelConfig::default()).unwrap();
    let mut svc = IrisClassifier::new();
    svc.pack(MODEL_SLOT, trained.model).unwrap();
    svc.set_training_report(trained.report);
    svc
}

fn sample_rows() -> Vec<Vec<f64>> {
    vec![
        vec![5.1, 3.5, 1.4, 0.2],
        vec![7.0, 3.2, 4.7, 1.4],
        vec![6.3, 3.3, 6.0, 2.5],
        vec![4.9, 3.0, 1.4, 0.2],
        vec![5.8, 2.7, 5.1, 1.9],
    ]
}

// ---------------------------------------------------------------------------
// Prediction contract
// ---------------------------------------------------------------------------

#[test]
fn one_label_per_row_in_order() {
    let svc = packed_service();
    let rows = sample_rows();
    let labels = svc.predict_rows(rows.clone()).unwrap();
    assert_eq!(labels.len(), rows.len());

    // predicting rows one at a time gives the same labels in the same order
    for (row, label) in rows.into_iter().zip(labels.iter()) {
        assert_eq!(svc.predict_rows(vec![row]).unwrap(), vec![*label]);
    }
    assert!(labels.iter().all(|&l| l < 3));
}

#[test]
fn empty_batch_gives_empty_output() {
    let svc = packed_service();
    assert!(svc.predict(&Table::from_rows(Vec::new()).unwrap()).unwrap().is_empty());
}

#[test]
fn wrong_feature_count_is_rejected() {
    let svc = packed_service();
    for rows in [vec![vec![5.1, 3.5, 1.4]], vec![vec![5.1, 3.5, 1.4, 0.2, 9.9]]] {
        let err = svc.predict_rows(rows).unwrap_err();
        assert!(matches!(err, Error::FeatureCount { expected: 4, .. }));
    }
}

// ---------------------------------------------------------------------------
// Bundles
// ---------------------------------------------------------------------------

#[test]
fn save_then_load_predicts_identically() {
    let home = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(home.path());
    let svc = packed_service();

    let path = svc.save(&store).unwrap();
    assert!(path.starts_with(home.path().join(SERVICE_NAME)));
    assert!(path.join(METADATA_FILE).is_file());
    assert!(path.join("artifacts").join("model.json").is_file());

    let loaded = load_bundle(&path).unwrap();
    assert_eq!(loaded.spec(), svc.spec());
    assert_eq!(
        loaded.predict_rows(sample_rows()).unwrap(),
        svc.predict_rows(sample_rows()).unwrap()
    );
}

#[test]
fn metadata_records_service_and_training() {
    let home = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(home.path());
    let svc = packed_service();
    let path = svc.save(&store).unwrap();

    let meta = read_metadata(&path).unwrap();
    assert_eq!(meta.service.name, SERVICE_NAME);
    assert_eq!(meta.service.apis[0].name, PREDICT_API);
    assert_eq!(meta.env.crate_name, "iris-classifier");
    assert_eq!(Some(meta.version.as_str()), path.file_name().and_then(|s| s.to_str()));
    assert_eq!(meta.training.as_ref(), svc.training_report());
}

#[test]
fn latest_tag_resolves_newest_version() {
    let home = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(home.path());
    let svc = packed_service();

    // back-to-back saves land in the same second; latest must still follow them
    let mut saved = Vec::new();
    for _ in 0..10 {
        let path = svc.save(&store).unwrap();
        assert_eq!(store.resolve(&BundleTag::latest(SERVICE_NAME)).unwrap(), path);
        assert_eq!(store.list().unwrap().last().unwrap().path, path);
        saved.push(path);
    }

    let listed: Vec<_> = store.list().unwrap().into_iter().map(|b| b.path).collect();
    assert_eq!(listed, saved);
    assert_eq!(store.versions(SERVICE_NAME).unwrap().len(), saved.len());

    let loaded = store
        .load(&format!("{}:latest", SERVICE_NAME).parse().unwrap())
        .unwrap();
    assert_eq!(loaded.name(), SERVICE_NAME);
}

#[test]
fn renamed_service_is_saved_under_its_name() {
    let home = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(home.path());
    let trained = train(&ModelConfig::default()).unwrap();
    let mut svc = IrisClassifier::with_name("IrisStaging");
    svc.pack(MODEL_SLOT, trained.model).unwrap();
    svc.save(&store).unwrap();

    assert!(store.load(&BundleTag::latest("IrisStaging")).is_ok());
    assert!(matches!(
        store.load(&BundleTag::latest(SERVICE_NAME)),
        Err(Error::BundleNotFound(_))
    ));
}

#[test]
fn delete_removes_bundle() {
    let home = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(home.path());
    let path = packed_service().save(&store).unwrap();
    let version = path.file_name().unwrap().to_str().unwrap().to_string();

    let removed = store.delete(&BundleTag::new(SERVICE_NAME, version)).unwrap();
    assert_eq!(removed, path);
    assert!(!path.exists());
    assert!(store.list().unwrap().is_empty());
}
