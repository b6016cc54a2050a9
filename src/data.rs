//! Record loading from the customer order CSV using Polars

use anyhow::Context;
use polars::prelude::*;
use tracing::info;

use crate::error::RfmError;

/// Columns the loader requires, in the order they are read
pub const COLUMNS: [&str; 12] = [
    "master_id",
    "order_channel",
    "last_order_channel",
    "first_order_date",
    "last_order_date",
    "last_order_date_online",
    "last_order_date_offline",
    "order_num_total_ever_online",
    "order_num_total_ever_offline",
    "customer_value_total_ever_offline",
    "customer_value_total_ever_online",
    "interested_in_categories_12",
];

/// One CSV data row, untyped
///
/// Every field is kept as the raw string the file contained (`None` for an
/// empty cell). Typing happens in [`crate::features::derive_features`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    /// 1-based data row number, header excluded
    pub record: usize,
    pub master_id: Option<String>,
    pub order_channel: Option<String>,
    pub last_order_channel: Option<String>,
    pub first_order_date: Option<String>,
    pub last_order_date: Option<String>,
    pub last_order_date_online: Option<String>,
    pub last_order_date_offline: Option<String>,
    pub order_num_total_ever_online: Option<String>,
    pub order_num_total_ever_offline: Option<String>,
    pub customer_value_total_ever_offline: Option<String>,
    pub customer_value_total_ever_online: Option<String>,
    pub interested_in_categories_12: Option<String>,
}

/// Load the customer order CSV
///
/// # Arguments
/// * `file_path` - Path to the CSV file (header row required)
///
/// # Returns
/// * One `RawRecord` per data row, in file order
pub fn load_records(file_path: &str) -> crate::Result<Vec<RawRecord>> {
    // Schema inference is disabled so every column arrives as a string and
    // the feature deriver can report the exact offending value.
    let df = LazyCsvReader::new(file_path)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()
        .with_context(|| format!("failed to open {file_path}"))?
        .select(COLUMNS.map(col))
        .collect()
        .with_context(|| format!("failed to read required columns from {file_path}"))?;

    if df.height() == 0 {
        return Err(RfmError::EmptyInput.into());
    }

    let columns = COLUMNS
        .iter()
        .map(|name| string_column(&df, name))
        .collect::<crate::Result<Vec<_>>>()?;

    let records: Vec<RawRecord> = (0..df.height())
        .map(|row| {
            let mut fields = columns.iter().map(|ca| ca.get(row).map(str::to_string));
            let mut next = || fields.next().flatten();
            // Field initializers run in source order, which follows COLUMNS.
            RawRecord {
                record: row + 1,
                master_id: next(),
                order_channel: next(),
                last_order_channel: next(),
                first_order_date: next(),
                last_order_date: next(),
                last_order_date_online: next(),
                last_order_date_offline: next(),
                order_num_total_ever_online: next(),
                order_num_total_ever_offline: next(),
                customer_value_total_ever_offline: next(),
                customer_value_total_ever_online: next(),
                interested_in_categories_12: next(),
            }
        })
        .collect();

    info!(records = records.len(), path = file_path, "loaded order records");
    Ok(records)
}

fn string_column<'a>(df: &'a DataFrame, name: &str) -> crate::Result<&'a StringChunked> {
    let column = df
        .column(name)
        .with_context(|| format!("missing column `{name}`"))?;
    Ok(column.str()?)
}
