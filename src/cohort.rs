//! Campaign cohort selection by segment and interest keywords

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use crate::features::OrderRecord;
use crate::pipeline::ScoredCustomer;
use crate::segment::Segment;

/// A targeted marketing campaign
#[derive(Debug, Clone, PartialEq)]
pub struct Campaign {
    pub name: String,
    /// Segments whose customers are eligible
    pub segments: Vec<Segment>,
    /// A customer qualifies if their interest tags contain any keyword
    pub keywords: Vec<String>,
}

impl Campaign {
    pub fn new(name: &str, segments: &[Segment], keywords: &[&str]) -> Self {
        Campaign {
            name: name.to_string(),
            segments: segments.to_vec(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Premium women's line: loyal, high-value customers interested in `KADIN`
    pub fn premium_womens() -> Self {
        Campaign::new(
            "premium_womens",
            &[Segment::Champions, Segment::LoyalCustomers],
            &["KADIN"],
        )
    }

    /// Discounted men's and children's lines: lapsing or new customers
    /// interested in `ERKEK` or `COCUK`
    ///
    /// Keywords match as plain substrings of the tag string, so `COCUK` also
    /// selects compound tags such as `AKTIFCOCUK`.
    pub fn discount_mens_kids() -> Self {
        Campaign::new(
            "discount_mens_kids",
            &[
                Segment::CantLoose,
                Segment::AboutToSleep,
                Segment::NewCustomers,
            ],
            &["ERKEK", "COCUK"],
        )
    }

    pub fn targets(&self, segment: Segment) -> bool {
        self.segments.contains(&segment)
    }

    pub fn interested(&self, record: &OrderRecord) -> bool {
        self.keywords.iter().any(|keyword| record.has_interest(keyword))
    }

    /// Distinct IDs of customers in a target segment with a matching interest
    ///
    /// Inner join of the segment filter over `customers` with the interest
    /// filter over `records`. IDs come back in ascending order.
    pub fn select(&self, customers: &[ScoredCustomer], records: &[OrderRecord]) -> Vec<String> {
        let interested: HashSet<&str> = records
            .iter()
            .filter(|record| self.interested(record))
            .map(|record| record.customer_id.as_str())
            .collect();

        let cohort: BTreeSet<&str> = customers
            .iter()
            .filter(|customer| self.targets(customer.segment))
            .map(|customer| customer.customer_id())
            .filter(|id| interested.contains(id))
            .collect();

        debug!(
            campaign = %self.name,
            interested = interested.len(),
            selected = cohort.len(),
            "selected campaign cohort"
        );

        cohort.into_iter().map(str::to_string).collect()
    }
}
