//! Result export: CSV, JSON and Parquet writers for experiment results.

use std::path::Path;

use crate::metrics::{ReplicationSummary, SimulationResult};

#[path = "export/csv.rs"]
mod csv;
#[path = "export/json.rs"]
mod json;
#[path = "export/parquet.rs"]
mod parquet;
#[path = "export/writer_utils.rs"]
mod writer_utils;

/// Export simulation results to Parquet format, one row per run.
///
/// Waiting-time columns are nullable; runs without samples write null.
///
/// # Errors
///
/// Returns an error if `results` is empty, or if file creation or Parquet writing fails.
pub fn export_to_parquet(
    results: &[SimulationResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    writer_utils::ensure_not_empty(results)?;
    let file = writer_utils::create_output_file(path)?;
    parquet::export_to_parquet_impl(results, file)
}

/// Export simulation results to a pretty-printed JSON array.
pub fn export_to_json(
    results: &[SimulationResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = writer_utils::create_output_file(path)?;
    json::export_to_json_impl(results, file)
}

/// Export replication summaries to a pretty-printed JSON array.
pub fn export_summaries_to_json(
    summaries: &[ReplicationSummary],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = writer_utils::create_output_file(path)?;
    json::export_to_json_impl(summaries, file)
}

/// Export simulation results to CSV, parameter columns first.
///
/// Missing waiting-time values are written as empty fields.
///
/// # Errors
///
/// Returns an error if `results` is empty, or if file creation or CSV writing fails.
pub fn export_to_csv(
    results: &[SimulationResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    writer_utils::ensure_not_empty(results)?;
    let file = writer_utils::create_output_file(path)?;
    csv::export_to_csv_impl(results, file)
}

/// Export per-configuration replication summaries to CSV (mean and std per metric).
pub fn export_summaries_to_csv(
    summaries: &[ReplicationSummary],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    writer_utils::ensure_not_empty(summaries)?;
    let file = writer_utils::create_output_file(path)?;
    csv::export_summaries_to_csv_impl(summaries, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::summarize_replications;
    use crate::metrics::tests::sample_result;
    use tempfile::NamedTempFile;

    fn results() -> Vec<SimulationResult> {
        vec![
            sample_result("exp_0", 1, 100),
            sample_result("exp_0", 2, 110),
        ]
    }

    #[test]
    fn test_export_to_json() {
        let file = NamedTempFile::new().unwrap();
        export_to_json(&results(), file.path()).unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(2));
        assert_eq!(parsed[0]["vehicles_served"], 100);
        assert!(parsed[0]["p90_queue_wait"].is_null());
    }

    #[test]
    fn test_export_to_csv() {
        let file = NamedTempFile::new().unwrap();
        export_to_csv(&results(), file.path()).unwrap();

        let mut reader = ::csv::Reader::from_path(file.path()).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "experiment_id");
        let served_col = headers.iter().position(|h| h == "vehicles_served").unwrap();
        let p90_col = headers.iter().position(|h| h == "p90_queue_wait").unwrap();

        let rows: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][served_col], "110");
        assert_eq!(&rows[0][p90_col], "");
    }

    #[test]
    fn test_export_rejects_empty_results() {
        let file = NamedTempFile::new().unwrap();
        assert!(export_to_csv(&[], file.path()).is_err());
        assert!(export_to_parquet(&[], file.path()).is_err());
    }

    #[test]
    fn test_export_to_parquet() {
        use ::parquet::file::reader::{FileReader, SerializedFileReader};

        let file = NamedTempFile::new().unwrap();
        export_to_parquet(&results(), file.path()).unwrap();

        let reader = SerializedFileReader::new(std::fs::File::open(file.path()).unwrap()).unwrap();
        let metadata = reader.metadata();
        assert_eq!(metadata.file_metadata().num_rows(), 2);
        let schema = metadata.file_metadata().schema_descr();
        assert!(schema.columns().iter().any(|c| c.name() == "mean_queue_wait"));
    }

    #[test]
    fn test_export_summaries_to_csv() {
        let summaries = summarize_replications(&results());
        let file = NamedTempFile::new().unwrap();
        export_summaries_to_csv(&summaries, file.path()).unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        let mut lines = contents.lines();
        let header = lines.next().unwrap();
        assert!(header.contains("vehicles_served_mean"));
        assert!(header.contains("vehicles_served_std"));
        assert_eq!(lines.count(), 1);
    }
}
