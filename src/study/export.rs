/// Export the results table to CSV for spreadsheet analysis
use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use super::results::ResultsTable;
use crate::error::StudyError;

/// Write the full trial table to `path`: variable columns first
/// (unit-qualified headers), then output columns, then the provenance
/// column. Callers invoke this only after exploration fully completes, so
/// a failed run never leaves a partial CSV behind.
pub fn export_table_to_csv(table: &ResultsTable, path: &Path) -> Result<(), StudyError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let mut file = File::create(path)?;

    let mut header: Vec<String> = table.variable_headers().to_vec();
    header.extend(table.output_headers().iter().cloned());
    header.push("generation".to_string());
    writeln!(file, "{}", header.join(","))?;

    for record in table.records() {
        let mut row: Vec<String> = record.values.iter().map(f64::to_string).collect();
        row.extend(record.outputs.iter().map(f64::to_string));
        row.push(record.provenance.label());
        writeln!(file, "{}", row.join(","))?;
    }

    debug!("exported {} trials to {}", table.len(), path.display());
    Ok(())
}
