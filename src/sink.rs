//! Interfaces to the collaborators that store and evaluate rules.
//!
//! The builder never talks to a network itself; a host application
//! implements these traits over whatever transport it uses.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Failure reported by a sink implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SinkError {
    message: String,
}

impl SinkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The evaluation service could not produce a result. The session keeps the
/// rule and the test data so the call can be retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("evaluation unavailable: {reason}")]
pub struct EvaluationUnavailable {
    pub reason: String,
}

/// Receives finished rules.
pub trait SaveSink {
    /// `envelope` is the output of [`crate::serial::to_json`].
    fn save(&mut self, envelope: &Value) -> Result<(), SinkError>;
}

/// Evaluates a rule against a data document.
pub trait EvaluationSink {
    fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationResponse, SinkError>;
}

/// Supplies an example data document for the tester.
pub trait SampleDataSource {
    fn sample(&self) -> Result<Value, SinkError>;
}

/// Body sent to the evaluation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    #[serde(rename = "businessLogic")]
    pub business_logic: Value,
    pub data: Value,
}

/// Answer from the evaluation service. `result` is whether the data
/// satisfies the rule; it is only meaningful when `success` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResponse {
    pub success: bool,
    #[serde(default)]
    pub result: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvaluationResponse {
    /// Turn a `success: false` answer into an error, keeping the service's message.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationUnavailable`] when `success` is false.
    pub fn into_result(self) -> Result<bool, EvaluationUnavailable> {
        if self.success {
            Ok(self.result)
        } else {
            Err(EvaluationUnavailable {
                reason: self
                    .error
                    .unwrap_or_else(|| "An error occurred during evaluation".to_owned()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_uses_camel_case_key() {
        let request = EvaluationRequest {
            business_logic: json!({ "type": "AND", "conditions": [] }),
            data: json!({ "amount": 5 }),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["businessLogic"]["type"], "AND");
        assert_eq!(value["data"]["amount"], 5);
        assert!(value.get("business_logic").is_none());
    }

    #[test]
    fn response_defaults() {
        let response: EvaluationResponse = serde_json::from_value(json!({ "success": true })).unwrap();
        assert!(!response.result);
        assert_eq!(response.error, None);
    }

    #[test]
    fn passing_response() {
        let response: EvaluationResponse =
            serde_json::from_value(json!({ "success": true, "result": true })).unwrap();
        assert_eq!(response.into_result(), Ok(true));
    }

    #[test]
    fn result_must_be_boolean() {
        for result in [json!({ "x": 1 }), json!("true"), json!(1)] {
            let reply = json!({ "success": true, "result": result });
            assert!(serde_json::from_value::<EvaluationResponse>(reply).is_err());
        }
    }

    #[test]
    fn failed_response_keeps_service_message() {
        let response: EvaluationResponse =
            serde_json::from_value(json!({ "success": false, "error": "bad path $.x" })).unwrap();
        assert_eq!(
            response.into_result(),
            Err(EvaluationUnavailable {
                reason: "bad path $.x".to_owned()
            })
        );
    }

    #[test]
    fn failed_response_without_message() {
        let response = EvaluationResponse {
            success: false,
            result: false,
            error: None,
        };
        assert_eq!(
            response.into_result().unwrap_err().to_string(),
            "evaluation unavailable: An error occurred during evaluation"
        );
    }

    #[test]
    fn sink_error_message() {
        assert_eq!(SinkError::new("connection refused").to_string(), "connection refused");
    }
}
