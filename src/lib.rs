//! rfmforge: RFM customer segmentation and campaign cohort selection
//!
//! Customer order summaries are aggregated into recency, frequency and
//! monetary values, scored into population quintiles, mapped to named
//! marketing segments and joined with interest tags to select campaign
//! cohorts.

pub mod cli;
pub mod cohort;
pub mod data;
pub mod error;
pub mod export;
pub mod features;
pub mod pipeline;
pub mod report;
pub mod rfm;
pub mod score;
pub mod segment;

// Re-export public items for easier access
pub use cli::Args;
pub use cohort::Campaign;
pub use data::{load_records, RawRecord};
pub use error::RfmError;
pub use export::write_ids;
pub use features::{derive_features, Channel, OrderRecord};
pub use pipeline::{segment_customers, ScoredCustomer, Segmentation};
pub use rfm::{aggregate, CustomerRfm, RfmData};
pub use score::{score_population, QuintileBins, RfmScore};
pub use segment::{classify, Segment, SEGMENT_RULES};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
