// Similarity metrics over normalized histograms.
//
// Scores from different metrics live on different scales and point in
// different directions; never compare or average them across metrics.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::histogram::NormalizedHistogram;
use crate::error::{DedupError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMetric {
    /// Correlation of the bin vectors, higher is more similar.
    Correlation,
    /// L2 distance between bin vectors, lower is more similar.
    Euclidean,
    /// Overlap of the probability-scaled histograms, higher is more similar.
    Intersection,
}

impl SimilarityMetric {
    pub fn score(self, a: &NormalizedHistogram, b: &NormalizedHistogram) -> Result<f64> {
        match self {
            Self::Correlation => correlation(a, b),
            Self::Euclidean => Ok(euclidean(a, b)),
            Self::Intersection => intersection(a, b),
        }
    }

    pub fn higher_is_similar(self) -> bool {
        !matches!(self, Self::Euclidean)
    }

    pub fn default_threshold(self) -> f64 {
        match self {
            Self::Correlation => 0.9,
            Self::Euclidean => 0.0,
            Self::Intersection => 0.9,
        }
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Correlation => "correlation",
            Self::Euclidean => "euclidean",
            Self::Intersection => "intersection",
        };
        f.write_str(name)
    }
}

/// One scored pair. `first` precedes `second` in discovery order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityResult {
    pub first: String,
    pub second: String,
    pub score: f64,
    pub metric: SimilarityMetric,
}

/// `sum(a*b) / (|a| * |b|)`.
pub fn correlation(a: &NormalizedHistogram, b: &NormalizedHistogram) -> Result<f64> {
    let norm_a = a.l2_norm();
    let norm_b = b.l2_norm();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(DedupError::DegenerateHistogram(
            "zero-norm histogram in correlation".to_string(),
        ));
    }

    let products: f64 = a
        .bins()
        .iter()
        .zip(b.bins().iter())
        .map(|(x, y)| x * y)
        .sum();
    Ok(products / (norm_a * norm_b))
}

/// `sqrt(sum((a-b)^2))`. Zero only for bin-for-bin identical histograms.
pub fn euclidean(a: &NormalizedHistogram, b: &NormalizedHistogram) -> f64 {
    a.bins()
        .iter()
        .zip(b.bins().iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// `sum(min(p, q))` where p and q are the histograms rescaled to sum to 1.
pub fn intersection(a: &NormalizedHistogram, b: &NormalizedHistogram) -> Result<f64> {
    let sum_a = a.sum();
    let sum_b = b.sum();
    if sum_a == 0.0 || sum_b == 0.0 {
        return Err(DedupError::DegenerateHistogram(
            "zero-mass histogram in intersection".to_string(),
        ));
    }

    Ok(a.bins()
        .iter()
        .zip(b.bins().iter())
        .map(|(x, y)| (x / sum_a).min(y / sum_b))
        .sum())
}
