use std::fs::File;
use std::path::Path;

pub(crate) fn ensure_not_empty<T>(items: &[T]) -> Result<(), Box<dyn std::error::Error>> {
    if items.is_empty() {
        return Err("No results to export".into());
    }

    Ok(())
}

pub(crate) fn create_output_file(
    path: impl AsRef<Path>,
) -> Result<File, Box<dyn std::error::Error>> {
    Ok(File::create(path)?)
}

/// Format an optional value as a CSV field; `None` becomes empty.
pub(crate) fn optional_field(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
