use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metrics::ComplexityThresholds;

/// Tunables for a [`BuilderSession`](crate::BuilderSession).
///
/// Every field has a default, so a JSON document only needs the keys it
/// changes: `{"thresholds": {"high": 40}}` is a complete configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Field path pre-filled into conditions added through the session.
    pub default_field: String,
    pub thresholds: ComplexityThresholds,
    /// Whether tree-view groups start expanded.
    pub expanded_by_default: bool,
    /// Snapshots kept for undo. Zero disables undo.
    pub history_limit: usize,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            default_field: String::new(),
            thresholds: ComplexityThresholds::default(),
            expanded_by_default: true,
            history_limit: 100,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("medium threshold ({medium}) must be below high threshold ({high})")]
    Thresholds { medium: usize, high: usize },
}

impl BuilderConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for unreadable JSON and
    /// [`ConfigError::Thresholds`] when the thresholds are out of order.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Thresholds`] unless `medium < high`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ComplexityThresholds { medium, high } = self.thresholds;
        if medium < high {
            Ok(())
        } else {
            Err(ConfigError::Thresholds { medium, high })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BuilderConfig::default();
        assert_eq!(config.thresholds, ComplexityThresholds { medium: 10, high: 25 });
        assert!(config.expanded_by_default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = BuilderConfig::from_json_str(r#"{"thresholds": {"high": 40}}"#).unwrap();
        assert_eq!(config.thresholds, ComplexityThresholds { medium: 10, high: 40 });
        assert_eq!(config.history_limit, 100);
        assert_eq!(config.default_field, "");
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(BuilderConfig::from_json_str("{}").unwrap(), BuilderConfig::default());
    }

    #[test]
    fn out_of_order_thresholds_rejected() {
        let err = BuilderConfig::from_json_str(r#"{"thresholds": {"medium": 30, "high": 30}}"#)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "medium threshold (30) must be below high threshold (30)"
        );
    }

    #[test]
    fn bad_json_rejected() {
        assert!(matches!(
            BuilderConfig::from_json_str("{\"history_limit\": -1}"),
            Err(ConfigError::Json(_))
        ));
    }
}
