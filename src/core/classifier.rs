use crate::core::metric::{SimilarityMetric, SimilarityResult};
use crate::error::{DedupError, Result};

/// Thresholds a score from one fixed metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuplicateClassifier {
    metric: SimilarityMetric,
    threshold: f64,
}

impl DuplicateClassifier {
    pub fn new(metric: SimilarityMetric, threshold: f64) -> Self {
        Self { metric, threshold }
    }

    pub fn with_default_threshold(metric: SimilarityMetric) -> Self {
        Self::new(metric, metric.default_threshold())
    }

    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Similarity metrics are duplicates at or above the threshold, distance
    /// metrics at or below it.
    pub fn is_duplicate(&self, result: &SimilarityResult) -> Result<bool> {
        if result.metric != self.metric {
            return Err(DedupError::MetricMismatch {
                expected: self.metric,
                actual: result.metric,
            });
        }

        if self.metric.higher_is_similar() {
            Ok(result.score >= self.threshold)
        } else {
            Ok(result.score <= self.threshold)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(metric: SimilarityMetric, score: f64) -> SimilarityResult {
        SimilarityResult {
            first: "a.jpg".to_string(),
            second: "b.jpg".to_string(),
            score,
            metric,
        }
    }

    #[test]
    fn test_correlation_threshold_inclusive() {
        let classifier = DuplicateClassifier::with_default_threshold(SimilarityMetric::Correlation);

        assert!(classifier.is_duplicate(&result(SimilarityMetric::Correlation, 0.9)).unwrap());
        assert!(classifier.is_duplicate(&result(SimilarityMetric::Correlation, 1.0)).unwrap());
        assert!(!classifier.is_duplicate(&result(SimilarityMetric::Correlation, 0.89)).unwrap());
    }

    #[test]
    fn test_euclidean_default_requires_exact_match() {
        let classifier = DuplicateClassifier::with_default_threshold(SimilarityMetric::Euclidean);

        assert!(classifier.is_duplicate(&result(SimilarityMetric::Euclidean, 0.0)).unwrap());
        assert!(!classifier.is_duplicate(&result(SimilarityMetric::Euclidean, 1e-9)).unwrap());
    }

    #[test]
    fn test_euclidean_tolerance_is_configurable() {
        let classifier = DuplicateClassifier::new(SimilarityMetric::Euclidean, 0.25);

        assert!(classifier.is_duplicate(&result(SimilarityMetric::Euclidean, 0.2)).unwrap());
        assert!(!classifier.is_duplicate(&result(SimilarityMetric::Euclidean, 0.3)).unwrap());
    }

    #[test]
    fn test_rejects_scores_from_another_metric() {
        let classifier = DuplicateClassifier::with_default_threshold(SimilarityMetric::Correlation);
        let err = classifier
            .is_duplicate(&result(SimilarityMetric::Intersection, 0.95))
            .unwrap_err();

        assert!(matches!(
            err,
            DedupError::MetricMismatch {
                expected: SimilarityMetric::Correlation,
                actual: SimilarityMetric::Intersection,
            }
        ));
    }
}
