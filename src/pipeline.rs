//! Aggregate, score and classify in one pass over a derived record set

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::info;

use crate::error::RfmError;
use crate::features::OrderRecord;
use crate::rfm::{aggregate, CustomerRfm};
use crate::score::{score_population, RfmScore};
use crate::segment::{classify, Segment};

/// A customer with quintile scores and segment
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCustomer {
    pub rfm: CustomerRfm,
    pub score: RfmScore,
    /// Recency digit followed by frequency digit
    pub rf_code: String,
    pub segment: Segment,
}

impl ScoredCustomer {
    pub fn customer_id(&self) -> &str {
        &self.rfm.customer_id
    }
}

/// Result of segmenting a customer population
#[derive(Debug, Clone)]
pub struct Segmentation {
    pub analysis_date: NaiveDate,
    /// Scored customers in ascending customer ID order
    pub customers: Vec<ScoredCustomer>,
}

impl Segmentation {
    /// Number of customers per segment, segments without customers omitted
    pub fn segment_counts(&self) -> BTreeMap<Segment, usize> {
        let mut counts = BTreeMap::new();
        for customer in &self.customers {
            *counts.entry(customer.segment).or_insert(0) += 1;
        }
        counts
    }
}

/// Segment every customer found in `records`
///
/// # Arguments
/// * `records` - Derived order records, possibly several per customer
///
/// # Returns
/// * `Segmentation` with one `ScoredCustomer` per distinct customer ID
pub fn segment_customers(records: &[OrderRecord]) -> Result<Segmentation, RfmError> {
    let rfm = aggregate(records)?;
    let scores = score_population(&rfm)?;

    let customers = rfm
        .customers
        .into_iter()
        .zip(scores)
        .map(|(customer, score)| {
            let rf_code = score.rf_code();
            let segment = classify(&rf_code)?;
            Ok::<_, RfmError>(ScoredCustomer {
                rfm: customer,
                score,
                rf_code,
                segment,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    info!(customers = customers.len(), "classified customers into segments");

    Ok(Segmentation {
        analysis_date: rfm.analysis_date,
        customers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{derive_features, tests::raw_record};

    /// Ten customers, `c0`..`c9`, with increasing spend and recency
    fn population() -> Vec<OrderRecord> {
        let raw: Vec<_> = (0..10)
            .map(|i| {
                let mut raw = raw_record(i + 1, &format!("c{i}"));
                raw.last_order_date = Some(format!("2021-05-{:02}", 30 - i));
                raw.customer_value_total_ever_online = Some(format!("{}.0", 100 * (i + 1)));
                raw.customer_value_total_ever_offline = Some("0".into());
                raw
            })
            .collect();
        derive_features(&raw).unwrap()
    }

    #[test]
    fn test_segment_customers() {
        let segmentation = segment_customers(&population()).unwrap();
        assert_eq!(segmentation.customers.len(), 10);

        let first = &segmentation.customers[0];
        assert_eq!(first.customer_id(), "c0");
        assert_eq!(first.score.recency, 5);
        assert_eq!(first.score.frequency, 1);
        assert_eq!(first.rf_code, "51");
        assert_eq!(first.segment, Segment::NewCustomers);

        let last = &segmentation.customers[9];
        assert_eq!(last.score.recency, 1);
        assert_eq!(last.score.frequency, 5);
        assert_eq!(last.score.monetary, 5);
        assert_eq!(last.segment, Segment::CantLoose);
    }

    #[test]
    fn test_scores_in_range_and_code_matches_scores() {
        let segmentation = segment_customers(&population()).unwrap();
        for customer in &segmentation.customers {
            for score in [
                customer.score.recency,
                customer.score.frequency,
                customer.score.monetary,
            ] {
                assert!((1..=5).contains(&score));
            }
            assert_eq!(
                customer.rf_code,
                format!("{}{}", customer.score.recency, customer.score.frequency)
            );
        }
    }

    #[test]
    fn test_segment_counts_sum_to_population() {
        let segmentation = segment_customers(&population()).unwrap();
        let total: usize = segmentation.segment_counts().values().sum();
        assert_eq!(total, segmentation.customers.len());
    }

    #[test]
    fn test_degenerate_population_fails() {
        let records = population();
        assert!(matches!(
            segment_customers(&records[..3]),
            Err(RfmError::InsufficientDistinctValues { .. })
        ));
    }
}
