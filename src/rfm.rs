//! Per-customer recency, frequency and monetary aggregation

use chrono::{Datelike, Duration, NaiveDate};
use ndarray::Array2;
use polars::prelude::*;
use tracing::info;

use crate::error::RfmError;
use crate::features::OrderRecord;

/// Column of `RfmData::raw_features` holding recency in days
pub const RECENCY: usize = 0;
/// Column of `RfmData::raw_features` holding the record count
pub const FREQUENCY: usize = 1;
/// Column of `RfmData::raw_features` holding total spend
pub const MONETARY: usize = 2;

/// Days added to the latest order date to get the analysis date
pub const ANALYSIS_OFFSET_DAYS: i64 = 2;

/// Recency, frequency and monetary values for one customer
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRfm {
    pub customer_id: String,
    /// Days between the analysis date and the latest order
    pub recency: i64,
    /// Number of order records attributed to the customer
    pub frequency: u32,
    /// Total spend across all records
    pub monetary: f64,
}

/// Aggregated RFM table for the whole customer population
#[derive(Debug, Clone)]
pub struct RfmData {
    /// Reference date recency is measured from
    pub analysis_date: NaiveDate,
    /// One row per customer in ascending customer ID order
    pub customers: Vec<CustomerRfm>,
}

impl RfmData {
    /// Raw RFM values (n_customers, 3), columns `RECENCY`, `FREQUENCY`, `MONETARY`
    pub fn raw_features(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.customers.len(), 3), |(row, column)| {
            let customer = &self.customers[row];
            match column {
                // Day counts stay far below 2^53, so the conversion is exact.
                RECENCY => customer.recency as f64,
                FREQUENCY => f64::from(customer.frequency),
                _ => customer.monetary,
            }
        })
    }
}

/// The latest last-order date plus `ANALYSIS_OFFSET_DAYS`
pub fn analysis_date(records: &[OrderRecord]) -> Result<NaiveDate, RfmError> {
    records
        .iter()
        .map(|record| record.last_order_date)
        .max()
        .map(|latest| latest + Duration::days(ANALYSIS_OFFSET_DAYS))
        .ok_or(RfmError::EmptyInput)
}

/// Group records by customer and compute RFM values
///
/// Frequency counts records, not the summed order numbers inside them.
///
/// # Returns
/// * `RfmData` with exactly one row per distinct customer ID
pub fn aggregate(records: &[OrderRecord]) -> Result<RfmData, RfmError> {
    let analysis_date = analysis_date(records)?;

    let rfm_df = compute_rfm_features(order_frame(records)?, analysis_date)?;
    let customers = customer_rows(&rfm_df)?;

    info!(
        customers = customers.len(),
        analysis_date = %analysis_date,
        "aggregated RFM values"
    );

    Ok(RfmData {
        analysis_date,
        customers,
    })
}

fn day_number(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce())
}

/// Customer ID, last order day and total spend of every record
fn order_frame(records: &[OrderRecord]) -> PolarsResult<DataFrame> {
    let customer_ids: Vec<&str> = records
        .iter()
        .map(|record| record.customer_id.as_str())
        .collect();
    let last_order_days: Vec<i64> = records
        .iter()
        .map(|record| day_number(record.last_order_date))
        .collect();
    let total_values: Vec<f64> = records.iter().map(|record| record.total_value).collect();

    DataFrame::new(vec![
        Series::new("master_id", customer_ids),
        Series::new("last_order_day", last_order_days),
        Series::new("total_value", total_values),
    ])
}

/// One row per customer: `master_id`, `recency`, `frequency`, `monetary`
fn compute_rfm_features(df: DataFrame, analysis_date: NaiveDate) -> PolarsResult<DataFrame> {
    df.lazy()
        .group_by([col("master_id")])
        .agg([
            col("last_order_day").max().alias("last_order_day"),
            col("total_value").count().alias("frequency"),
            col("total_value").sum().alias("monetary"),
        ])
        .with_columns([
            (lit(day_number(analysis_date)) - col("last_order_day")).alias("recency"),
        ])
        .select([
            col("master_id"),
            col("recency"),
            col("frequency"),
            col("monetary"),
        ])
        .sort(["master_id"], SortMultipleOptions::default())
        .collect()
}

fn customer_rows(df: &DataFrame) -> PolarsResult<Vec<CustomerRfm>> {
    let customer_ids = df.column("master_id")?.str()?;
    let recency = df.column("recency")?.i64()?;
    let frequency = df.column("frequency")?.cast(&DataType::UInt32)?;
    let monetary = df.column("monetary")?.f64()?;

    Ok(customer_ids
        .into_no_null_iter()
        .zip(recency.into_no_null_iter())
        .zip(frequency.u32()?.into_no_null_iter())
        .zip(monetary.into_no_null_iter())
        .map(|(((customer_id, recency), frequency), monetary)| CustomerRfm {
            customer_id: customer_id.to_string(),
            recency,
            frequency,
            monetary,
        })
        .collect())
}
