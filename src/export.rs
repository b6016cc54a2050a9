//! Cohort export to single-column CSV files

use std::fs::File;

use anyhow::Context;
use polars::prelude::*;
use tracing::info;

/// Header of the exported ID column
pub const ID_COLUMN: &str = "master_id";

/// Write customer IDs as a CSV with a `master_id` header, one ID per line
///
/// An empty cohort still produces the header row.
pub fn write_ids(ids: &[String], output_path: &str) -> crate::Result<()> {
    let mut df = DataFrame::new(vec![Series::new(ID_COLUMN, ids)])?;

    let mut file =
        File::create(output_path).with_context(|| format!("failed to create {output_path}"))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("failed to write {output_path}"))?;

    info!(ids = ids.len(), path = output_path, "wrote cohort");
    Ok(())
}
