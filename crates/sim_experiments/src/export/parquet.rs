use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray, UInt32Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use crate::metrics::SimulationResult;

pub(crate) fn export_to_parquet_impl(
    results: &[SimulationResult],
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    let batch = build_record_batch(results)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

fn build_record_batch(
    results: &[SimulationResult],
) -> Result<RecordBatch, arrow::error::ArrowError> {
    let schema = Arc::new(parquet_schema());
    let arrays = build_arrays(results);

    RecordBatch::try_new(schema, arrays)
}

fn parquet_schema() -> Schema {
    Schema::new(vec![
        Field::new("experiment_id", DataType::Utf8, false),
        Field::new("run_id", DataType::UInt64, false),
        Field::new("seed", DataType::UInt64, false),
        Field::new("employee_capacity", DataType::UInt32, false),
        Field::new("arrival_profile", DataType::Utf8, false),
        Field::new("acquisition_policy", DataType::Utf8, false),
        Field::new("elapsed", DataType::Float64, false),
        Field::new("vehicles_arrived", DataType::UInt64, false),
        Field::new("vehicles_served", DataType::UInt64, false),
        Field::new("vehicles_in_system", DataType::UInt64, false),
        Field::new("throughput_per_hour", DataType::Float64, false),
        Field::new("mean_queue_wait", DataType::Float64, true),
        Field::new("median_queue_wait", DataType::Float64, true),
        Field::new("p90_queue_wait", DataType::Float64, true),
        Field::new("mean_dispenser_wait", DataType::Float64, true),
        Field::new("mean_employee_wait", DataType::Float64, true),
        Field::new("mean_service_duration", DataType::Float64, true),
        Field::new("mean_system_time", DataType::Float64, true),
        Field::new("employee_utilization", DataType::Float64, false),
        Field::new("dispenser_utilization", DataType::Float64, false),
        Field::new("max_dispenser_utilization", DataType::Float64, false),
    ])
}

fn strings(results: &[SimulationResult], f: impl Fn(&SimulationResult) -> &str) -> ArrayRef {
    Arc::new(StringArray::from(results.iter().map(f).collect::<Vec<_>>()))
}

fn u64s(results: &[SimulationResult], f: impl Fn(&SimulationResult) -> u64) -> ArrayRef {
    Arc::new(UInt64Array::from(results.iter().map(f).collect::<Vec<_>>()))
}

fn f64s(results: &[SimulationResult], f: impl Fn(&SimulationResult) -> f64) -> ArrayRef {
    Arc::new(Float64Array::from(results.iter().map(f).collect::<Vec<_>>()))
}

fn nullable_f64s(
    results: &[SimulationResult],
    f: impl Fn(&SimulationResult) -> Option<f64>,
) -> ArrayRef {
    Arc::new(Float64Array::from(results.iter().map(f).collect::<Vec<_>>()))
}

fn build_arrays(results: &[SimulationResult]) -> Vec<ArrayRef> {
    vec![
        strings(results, |r| r.experiment_id.as_str()),
        u64s(results, |r| r.run_id as u64),
        u64s(results, |r| r.seed),
        Arc::new(UInt32Array::from(
            results
                .iter()
                .map(|r| r.employee_capacity)
                .collect::<Vec<_>>(),
        )),
        strings(results, |r| r.arrival_profile.as_str()),
        strings(results, |r| r.acquisition_policy.as_str()),
        f64s(results, |r| r.elapsed),
        u64s(results, |r| r.vehicles_arrived),
        u64s(results, |r| r.vehicles_served),
        u64s(results, |r| r.vehicles_in_system),
        f64s(results, |r| r.throughput_per_hour),
        nullable_f64s(results, |r| r.mean_queue_wait),
        nullable_f64s(results, |r| r.median_queue_wait),
        nullable_f64s(results, |r| r.p90_queue_wait),
        nullable_f64s(results, |r| r.mean_dispenser_wait),
        nullable_f64s(results, |r| r.mean_employee_wait),
        nullable_f64s(results, |r| r.mean_service_duration),
        nullable_f64s(results, |r| r.mean_system_time),
        f64s(results, |r| r.employee_utilization),
        f64s(results, |r| r.dispenser_utilization),
        f64s(results, |r| r.max_dispenser_utilization),
    ]
}
