//! Error envelope: `{"error": {"code": "<CODE>", "details": <DETAILS>}}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Machine-readable error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    Unauthorized,
    Forbidden,
    NotFound,
    ServerError,
}

impl ErrorCode {
    /// HTTP status paired with the code.
    pub fn status(self) -> u16 {
        match self {
            Self::ValidationError => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::ServerError => 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub details: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

impl ErrorEnvelope {
    /// Wrap `details`, normalising bare lists and strings to `{"detail": [...]}`.
    pub fn new(code: ErrorCode, details: impl Into<Value>) -> Self {
        Self {
            error: ErrorBody {
                code,
                details: normalize_details(details.into()),
            },
        }
    }

    /// `{"detail": [message]}` under `code`.
    pub fn message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(code, json!([message.into()]))
    }
}

/// Mappings pass through; anything else ends up under `detail`.
fn normalize_details(details: Value) -> Value {
    match details {
        Value::Object(_) => details,
        Value::Array(_) => wrap(details),
        Value::Null => wrap(Value::Array(Vec::new())),
        other => wrap(Value::Array(vec![other])),
    }
}

fn wrap(list: Value) -> Value {
    let mut map = Map::new();
    map.insert("detail".to_string(), list);
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_list_is_normalised() {
        let envelope = ErrorEnvelope::new(ErrorCode::ValidationError, json!(["bad input"]));

        assert_eq!(envelope.error.details, json!({"detail": ["bad input"]}));
    }

    #[test]
    fn test_bare_string_is_normalised() {
        let envelope = ErrorEnvelope::new(ErrorCode::Forbidden, "nope");

        assert_eq!(envelope.error.details, json!({"detail": ["nope"]}));
    }

    #[test]
    fn test_mapping_passes_through() {
        let details = json!({"title": ["Must be between 5 and 200 characters."]});
        let envelope = ErrorEnvelope::new(ErrorCode::ValidationError, details.clone());

        assert_eq!(envelope.error.details, details);
    }

    #[test]
    fn test_wire_shape() {
        let envelope = ErrorEnvelope::message(
            ErrorCode::Unauthorized,
            "Authentication credentials were not provided.",
        );

        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "error": {
                    "code": "UNAUTHORIZED",
                    "details": {"detail": ["Authentication credentials were not provided."]}
                }
            })
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorCode::ValidationError.status(), 400);
        assert_eq!(ErrorCode::Unauthorized.status(), 401);
        assert_eq!(ErrorCode::Forbidden.status(), 403);
        assert_eq!(ErrorCode::NotFound.status(), 404);
        assert_eq!(ErrorCode::ServerError.status(), 500);
    }
}
