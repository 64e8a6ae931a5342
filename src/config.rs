use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::classifier::DuplicateClassifier;
use crate::core::metric::SimilarityMetric;
use crate::error::{DedupError, Result};

pub const DEFAULT_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Settings for one scan. Every field has a default, so a JSON config file
/// only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    pub metric: SimilarityMetric,
    /// Falls back to the metric's default when unset.
    pub threshold: Option<f64>,
    pub extensions: Vec<String>,
    /// Ask for a y/n confirmation before each delete or archive.
    pub confirm: bool,
    /// Where archives go; next to the original when unset.
    pub archive_dir: Option<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            metric: SimilarityMetric::Correlation,
            threshold: None,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            confirm: false,
            archive_dir: None,
        }
    }
}

impl ScanConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| DedupError::io(path, e))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| DedupError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
            .unwrap_or_else(|| self.metric.default_threshold())
    }

    pub fn classifier(&self) -> DuplicateClassifier {
        DuplicateClassifier::new(self.metric, self.threshold())
    }

    /// Extensions compared case-insensitively, without the leading dot.
    pub fn accepts_extension(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.');
        self.extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }

    pub fn validate(&self) -> Result<()> {
        let threshold = self.threshold();
        if !threshold.is_finite() {
            return Err(DedupError::Config(format!(
                "threshold must be finite, got {threshold}"
            )));
        }

        let (low, high) = match self.metric {
            SimilarityMetric::Correlation => (-1.0, 1.0),
            SimilarityMetric::Intersection => (0.0, 1.0),
            SimilarityMetric::Euclidean => (0.0, f64::INFINITY),
        };
        if threshold < low || threshold > high {
            return Err(DedupError::Config(format!(
                "{} threshold {} outside [{}, {}]",
                self.metric, threshold, low, high
            )));
        }

        if self.extensions.iter().all(|e| e.trim_start_matches('.').is_empty()) {
            return Err(DedupError::Config(
                "at least one image extension is required".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();

        assert_eq!(config.metric, SimilarityMetric::Correlation);
        assert_eq!(config.threshold(), 0.9);
        assert!(config.accepts_extension("JPG"));
        assert!(config.accepts_extension("jpeg"));
        assert!(config.accepts_extension(".png"));
        assert!(!config.accepts_extension("gif"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threshold_follows_metric() {
        let config = ScanConfig {
            metric: SimilarityMetric::Euclidean,
            ..ScanConfig::default()
        };
        assert_eq!(config.threshold(), 0.0);
        assert_eq!(config.classifier().metric(), SimilarityMetric::Euclidean);
    }

    #[test]
    fn test_load_partial_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("histdup.json");
        fs::write(&path, r#"{ "metric": "intersection", "threshold": 0.8, "confirm": true }"#)
            .unwrap();

        let config = ScanConfig::load(&path).unwrap();
        assert_eq!(config.metric, SimilarityMetric::Intersection);
        assert_eq!(config.threshold(), 0.8);
        assert!(config.confirm);
        assert_eq!(config.extensions.len(), 3);
    }

    #[test]
    fn test_load_rejects_unknown_keys_and_bad_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");

        fs::write(&path, r#"{ "metrik": "correlation" }"#).unwrap();
        assert!(matches!(ScanConfig::load(&path), Err(DedupError::Config(_))));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(ScanConfig::load(&path), Err(DedupError::Config(_))));

        assert!(matches!(
            ScanConfig::load(&temp_dir.path().join("absent.json")),
            Err(DedupError::Io { .. })
        ));
    }

    #[test]
    fn test_validate_ranges() {
        let bad = [
            (SimilarityMetric::Correlation, 1.5),
            (SimilarityMetric::Intersection, -0.1),
            (SimilarityMetric::Euclidean, -1.0),
            (SimilarityMetric::Correlation, f64::NAN),
        ];
        for (metric, threshold) in bad {
            let config = ScanConfig {
                metric,
                threshold: Some(threshold),
                ..ScanConfig::default()
            };
            assert!(config.validate().is_err(), "{metric} {threshold}");
        }

        let no_extensions = ScanConfig {
            extensions: vec![],
            ..ScanConfig::default()
        };
        assert!(no_extensions.validate().is_err());
    }
}
