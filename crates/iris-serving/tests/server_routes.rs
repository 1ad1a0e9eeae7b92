//! HTTP route tests driven through the router with tower's `oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use iris_classifier::bundle::read_metadata;
use iris_classifier::dataset::IrisDataset;
use iris_classifier::{train, ArtifactStore, IrisClassifier, ModelConfig, MODEL_SLOT};
use iris_serving::server::{router, AppState};

fn state() -> (tempfile::TempDir, AppState) {
    let home = tempfile::tempdir().unwrap();
    let trained = train(&ModelConfig::default()).unwrap();
    let mut service = IrisClassifier::new();
    service.pack(MODEL_SLOT, trained.model).unwrap();
    let dir = service.save(&ArtifactStore::new(home.path())).unwrap();

    let state = AppState::from_bundle(&dir).unwrap();
    assert_eq!(state.metadata.as_ref(), &read_metadata(&dir).unwrap());
    (home, state)
}

async fn body_string(resp: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn post_predict(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn predict_returns_one_label_per_row() {
    let (_home, state) = state();
    let resp = router(state)
        .oneshot(post_predict("[[5.1, 3.5, 1.4, 0.2], [4.9, 3.0, 1.4, 0.2]]"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let labels: Vec<usize> = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(labels, vec![0, 0]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn predict_handles_full_dataset_batch() {
    let (_home, state) = state();
    let data = IrisDataset::load();
    let rows: Vec<Vec<f64>> = data.records.rows().into_iter().map(|r| r.to_vec()).collect();
    let expected = state.service.predict_rows(rows.clone()).unwrap();

    let app = router(state);
    let body = serde_json::to_string(&rows).unwrap();
    let (big, health) = tokio::join!(
        app.clone().oneshot(post_predict(&body)),
        app.clone()
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap()),
    );
    assert_eq!(health.unwrap().status(), StatusCode::OK);

    let resp = big.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let labels: Vec<usize> = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(labels.len(), 150);
    assert_eq!(labels, expected);
}

#[tokio::test]
async fn predict_rejects_wrong_width() {
    let (_home, state) = state();
    let resp = router(state)
        .oneshot(post_predict("[[5.1, 3.5]]"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(resp).await.contains("error"));
}

#[tokio::test]
async fn predict_rejects_malformed_json() {
    let (_home, state) = state();
    let resp = router(state)
        .oneshot(post_predict("{\"rows\": 1}"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn healthz_and_metadata() {
    let (_home, state) = state();
    let app = router(state);

    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(Request::builder().uri("/metadata").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let meta: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(meta["service"]["name"], "IrisClassifier");
}
