use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Validation,
    PermissionDenied,
    Conflict,
    Internal,
}

/// Failure reported by the authoring service inside an otherwise delivered response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code:?}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stack_trace: Vec<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            stack_trace: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_stack_trace(mut self, stack_trace: Vec<String>) -> Self {
        self.stack_trace = stack_trace;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omits_empty_details_on_the_wire() {
        let json = serde_json::to_value(ApiError::new(ErrorCode::NotFound, "missing")).unwrap();
        assert_eq!(json, serde_json::json!({"code": "not_found", "message": "missing"}));

        let error: ApiError = serde_json::from_value(serde_json::json!({
            "code": "internal",
            "message": "boom",
            "details": "disk full",
            "stack_trace": ["a", "b"],
        }))
        .unwrap();
        assert_eq!(error.details.as_deref(), Some("disk full"));
        assert_eq!(error.stack_trace.len(), 2);
        assert_eq!(error.to_string(), "Internal: boom");
    }
}
