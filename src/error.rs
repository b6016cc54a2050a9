//! Domain error types for the segmentation stages

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised while deriving, scoring or classifying customers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RfmError {
    #[error("record {record}: missing value for `{field}`")]
    MissingField { record: usize, field: &'static str },

    #[error("record {record}: malformed `{field}` value {value:?} ({reason})")]
    MalformedRecord {
        record: usize,
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("input contains no customer records")]
    EmptyInput,

    #[error(
        "`{metric}` has {distinct} distinct values, at least {required} are needed for quintile scoring"
    )]
    InsufficientDistinctValues {
        metric: &'static str,
        distinct: usize,
        required: usize,
    },

    #[error("`{metric}` quantile bin edges are not unique: {edges:?}")]
    NonUniqueBinEdges { metric: &'static str, edges: Vec<f64> },

    #[error("no segment rule matches RF code {0:?}")]
    UnmatchedSegment(String),

    #[error("frame operation failed: {0}")]
    Frame(String),
}

impl From<PolarsError> for RfmError {
    fn from(err: PolarsError) -> Self {
        RfmError::Frame(err.to_string())
    }
}

impl RfmError {
    pub(crate) fn malformed(
        record: usize,
        field: &'static str,
        value: &str,
        reason: impl Into<String>,
    ) -> Self {
        RfmError::MalformedRecord {
            record,
            field,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RfmError::malformed(7, "order_num_total_ever_online", "abc", "not a number");
        assert_eq!(
            err.to_string(),
            "record 7: malformed `order_num_total_ever_online` value \"abc\" (not a number)"
        );

        let err = RfmError::UnmatchedSegment("66".into());
        assert!(err.to_string().contains("\"66\""));
    }

    #[test]
    fn test_insufficient_values_message() {
        let err = RfmError::InsufficientDistinctValues {
            metric: "recency",
            distinct: 3,
            required: 5,
        };
        assert!(err.to_string().starts_with("`recency` has 3 distinct values"));
    }

    #[test]
    fn test_frame_error_from_polars() {
        let err = RfmError::from(PolarsError::ColumnNotFound("recency".into()));
        assert!(matches!(&err, RfmError::Frame(message) if message.contains("recency")));
    }
}
