//! Quintile scoring of recency, frequency and monetary values
//!
//! Scores depend on the whole population, so scoring is two-pass: bin edges
//! are fitted on a metric's full distribution first ([`QuintileBins::fit`]),
//! then every customer is assigned a bin.

use tracing::debug;

use crate::error::RfmError;
use crate::rfm::{RfmData, FREQUENCY, MONETARY, RECENCY};

/// Number of ordinal scores per metric
pub const BINS: usize = 5;

/// Whether larger values get larger scores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Recency, frequency and monetary scores for one customer, each in 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RfmScore {
    pub recency: u8,
    pub frequency: u8,
    pub monetary: u8,
}

impl RfmScore {
    /// Recency digit followed by frequency digit, e.g. `"54"`
    pub fn rf_code(&self) -> String {
        format!("{}{}", self.recency, self.frequency)
    }
}

/// Equal-frequency bin edges fitted on one metric
///
/// Edges are the 0/20/40/60/80/100th percentiles, linearly interpolated
/// between closest ranks. Bins are right-closed; the first bin also holds
/// its lower edge.
#[derive(Debug, Clone, PartialEq)]
pub struct QuintileBins {
    edges: [f64; BINS + 1],
}

impl QuintileBins {
    /// Fit edges on the full distribution of `values`
    ///
    /// Fails when fewer than `BINS` distinct values exist or when ties make
    /// two edges coincide; bins are never merged.
    pub fn fit(metric: &'static str, values: &[f64]) -> Result<Self, RfmError> {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let mut distinct = sorted.clone();
        distinct.dedup();
        if distinct.len() < BINS {
            return Err(RfmError::InsufficientDistinctValues {
                metric,
                distinct: distinct.len(),
                required: BINS,
            });
        }

        let mut edges = [0.0; BINS + 1];
        for (i, edge) in edges.iter_mut().enumerate() {
            *edge = percentile(&sorted, i);
        }

        if edges.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(RfmError::NonUniqueBinEdges {
                metric,
                edges: edges.to_vec(),
            });
        }

        debug!(metric, ?edges, "fitted quintile edges");
        Ok(QuintileBins { edges })
    }

    /// Zero-based bin of `value`
    pub fn bin(&self, value: f64) -> usize {
        self.edges[1..BINS]
            .iter()
            .filter(|&&edge| value > edge)
            .count()
    }

    /// Score in 1..=BINS for `value`
    pub fn score(&self, value: f64, direction: Direction) -> u8 {
        let bin = self.bin(value);
        let score = match direction {
            Direction::Ascending => bin + 1,
            Direction::Descending => BINS - bin,
        };
        score as u8
    }
}

/// Percentile `i / BINS` of sorted values
///
/// The interpolation position `i * (n - 1) / BINS` is split into integer and
/// fractional parts exactly, so values sitting on an edge are not shifted by
/// float rounding.
fn percentile(sorted: &[f64], i: usize) -> f64 {
    let scaled = i * (sorted.len() - 1);
    let lower = scaled / BINS;
    let remainder = scaled % BINS;
    if remainder == 0 {
        return sorted[lower];
    }
    let fraction = remainder as f64 / BINS as f64;
    sorted[lower] + (sorted[lower + 1] - sorted[lower]) * fraction
}

/// Unique 1-based ranks, ties broken by position ("first" method)
pub fn rank_first(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    // Stable sort keeps earlier positions ahead of later equal values.
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    for (rank, index) in order.into_iter().enumerate() {
        ranks[index] = (rank + 1) as f64;
    }
    ranks
}

/// Score `values` into quintiles in one direction
pub fn quintile_scores(
    metric: &'static str,
    values: &[f64],
    direction: Direction,
) -> Result<Vec<u8>, RfmError> {
    let bins = QuintileBins::fit(metric, values)?;
    Ok(values
        .iter()
        .map(|&value| bins.score(value, direction))
        .collect())
}

/// Score every customer of the population
///
/// * Recency: smaller is better, so the lowest quintile scores 5.
/// * Frequency: ranked first so equal counts spread across bins, then
///   binned ascending.
/// * Monetary: binned ascending on the values; equal spend shares a bin.
///
/// # Returns
/// * One `RfmScore` per row of `rfm`, in row order
pub fn score_population(rfm: &RfmData) -> Result<Vec<RfmScore>, RfmError> {
    let raw_features = rfm.raw_features();
    let recency = raw_features.column(RECENCY).to_vec();
    let frequency = raw_features.column(FREQUENCY).to_vec();
    let monetary = raw_features.column(MONETARY).to_vec();

    let recency_scores = quintile_scores("recency", &recency, Direction::Descending)?;
    let frequency_scores =
        quintile_scores("frequency", &rank_first(&frequency), Direction::Ascending)?;
    let monetary_scores = quintile_scores("monetary", &monetary, Direction::Ascending)?;

    Ok(recency_scores
        .into_iter()
        .zip(frequency_scores)
        .zip(monetary_scores)
        .map(|((recency, frequency), monetary)| RfmScore {
            recency,
            frequency,
            monetary,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_to(n: usize) -> Vec<f64> {
        (1..=n).map(|v| v as f64).collect()
    }

    fn bin_sizes(scores: &[u8]) -> [usize; BINS] {
        let mut sizes = [0; BINS];
        for &score in scores {
            sizes[score as usize - 1] += 1;
        }
        sizes
    }

    #[test]
    fn test_edges_interpolate_linearly() {
        let bins = QuintileBins::fit("recency", &one_to(10)).unwrap();
        let expected = [1.0, 2.8, 4.6, 6.4, 8.2, 10.0];
        for (edge, want) in bins.edges.iter().zip(expected) {
            assert!((edge - want).abs() < 1e-9, "{edge} != {want}");
        }
    }

    #[test]
    fn test_descending_scores_reward_small_values() {
        let scores = quintile_scores("recency", &one_to(10), Direction::Descending).unwrap();
        assert_eq!(scores, vec![5, 5, 4, 4, 3, 3, 2, 2, 1, 1]);
    }

    #[test]
    fn test_values_on_an_edge_fall_in_the_lower_bin() {
        // Edges for 0..=5 land exactly on 1, 2, 3, 4.
        let values: Vec<f64> = (0..=5).map(|v| v as f64).collect();
        let scores = quintile_scores("monetary", &values, Direction::Ascending).unwrap();
        assert_eq!(scores, vec![1, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_equal_monetary_values_share_a_bin() {
        let values = [5.0, 5.0, 1.0, 2.0, 3.0, 4.0, 6.0, 7.0, 8.0, 9.0];
        let scores = quintile_scores("monetary", &values, Direction::Ascending).unwrap();
        assert_eq!(scores[0], scores[1]);
        assert_eq!(scores[0], 3);
    }

    #[test]
    fn test_rank_first_breaks_ties_by_position() {
        let ranks = rank_first(&[3.0, 1.0, 3.0, 1.0, 2.0]);
        assert_eq!(ranks, vec![4.0, 1.0, 5.0, 2.0, 3.0]);
    }

    #[test]
    fn test_ranked_frequency_bins_are_balanced() {
        for n in [5, 7, 10, 13, 24, 101] {
            let frequency = vec![1.0; n];
            let scores =
                quintile_scores("frequency", &rank_first(&frequency), Direction::Ascending)
                    .unwrap();
            let lower = n / BINS;
            for size in bin_sizes(&scores) {
                assert!(
                    size + 1 >= lower && size <= lower + 1,
                    "n={n}: bin size {size} not within {lower}+-1"
                );
            }
            // Identical counts are ordered by position.
            assert!(scores.windows(2).all(|pair| pair[0] <= pair[1]));
        }
    }

    #[test]
    fn test_too_few_distinct_values() {
        let values = [1.0, 1.0, 2.0, 3.0, 4.0, 4.0];
        assert_eq!(
            QuintileBins::fit("recency", &values),
            Err(RfmError::InsufficientDistinctValues {
                metric: "recency",
                distinct: 4,
                required: BINS,
            })
        );
    }

    #[test]
    fn test_heavy_ties_give_duplicate_edges() {
        let values = [10.0, 10.0, 10.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0];
        assert!(matches!(
            QuintileBins::fit("monetary", &values),
            Err(RfmError::NonUniqueBinEdges { metric: "monetary", .. })
        ));
    }

    #[test]
    fn test_rf_code() {
        let score = RfmScore {
            recency: 5,
            frequency: 4,
            monetary: 1,
        };
        assert_eq!(score.rf_code(), "54");
    }
}
