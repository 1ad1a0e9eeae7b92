//! One-shot prediction against a saved bundle.
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};

use iris_classifier::bundle::load_bundle;
use iris_classifier::dataset::target_name;
use iris_classifier::table::{read_table_csv, TableReaderConfig};
use iris_classifier::Table;

use crate::util::validate_tsv_or_csv_file;

/// Where the feature rows come from.
#[derive(Debug, Clone)]
pub enum PredictInput {
    /// JSON array of rows, e.g. `[[5.1, 3.5, 1.4, 0.2]]`.
    Json(String),
    /// CSV or TSV file with a header row.
    File(String),
}

impl PredictInput {
    pub fn read(&self) -> Result<Table> {
        match self {
            PredictInput::Json(json) => {
                Table::from_json(json).context("Failed to parse --input as a JSON array of rows")
            }
            PredictInput::File(path) => {
                validate_tsv_or_csv_file(path)?;
                read_table_csv(path, &TableReaderConfig::for_path(path))
                    .with_context(|| format!("Failed to read input file: {}", path))
            }
        }
    }
}

/// Load the bundle at `bundle_dir` and predict every input row.
pub fn run_predict<P: AsRef<Path>>(bundle_dir: P, input: &PredictInput) -> Result<Vec<usize>> {
    let service = load_bundle(&bundle_dir)
        .with_context(|| format!("Failed to load bundle: {}", bundle_dir.as_ref().display()))?;
    let table = input.read()?;
    let labels = service.predict(&table)?;
    log::info!("Predicted {} rows with {}", labels.len(), service.name());
    Ok(labels)
}

/// Write labels as CSV or TSV (by extension) with row index and species name.
pub fn write_predictions<P: AsRef<Path>>(labels: &[usize], output_path: P) -> Result<()> {
    let path = output_path.as_ref();
    let delimiter = match path.extension().and_then(|ext| ext.to_str()) {
        Some("tsv") => b'\t',
        _ => b',',
    };

    let file = File::create(path).with_context(|| format!("Failed to create output file: {:?}", path))?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(BufWriter::new(file));

    writer.write_record(["row", "label", "species"])?;
    for (i, &label) in labels.iter().enumerate() {
        writer.write_record([
            i.to_string(),
            label.to_string(),
            target_name(label).unwrap_or("").to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
