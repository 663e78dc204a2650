use thiserror::Error;

use crate::config::ConfigError;
use crate::serial::{MalformedRule, SerializeError};
use crate::sink::{EvaluationUnavailable, SinkError};
use crate::validate::ValidationFailed;
use crate::EditError;

/// Unified error type covering editing, validation, serialization, and the
/// external sinks.
///
/// Returned by the [`BuilderSession`](crate::BuilderSession) flows that touch
/// more than one of these concerns.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Validation(#[from] ValidationFailed),

    #[error(transparent)]
    Malformed(#[from] MalformedRule),

    #[error(transparent)]
    Serialize(#[from] SerializeError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationUnavailable),

    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid JSON data: {0}")]
    InvalidData(serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NodePath, RuleTree};

    #[test]
    fn wraps_component_errors() {
        let err: RuleError = EditError::IndexOutOfRange { index: 1, len: 0 }.into();
        assert_eq!(
            err.to_string(),
            "child index 1 out of range for group with 0 children"
        );

        let err: RuleError = MalformedRule {
            path: NodePath::from(vec![0]),
            reason: "missing 'field'".to_owned(),
        }
        .into();
        assert!(matches!(err, RuleError::Malformed(_)));

        let err: RuleError = SinkError::new("disk full").into();
        assert_eq!(err.to_string(), "sink error: disk full");
    }

    #[test]
    fn validation_failure_lists_messages() {
        let err: RuleError = crate::validate(&RuleTree::new())
            .into_result()
            .unwrap_err()
            .into();
        assert!(err.to_string().contains("Rule name is required"));
    }

    #[test]
    fn invalid_data_message() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(
            RuleError::InvalidData(json_err)
                .to_string()
                .starts_with("Invalid JSON data: ")
        );
    }
}
