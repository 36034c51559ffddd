//! Shape checks applied to live payloads before they are accepted.
//!
//! Only the outer shape is checked here. Row contents are the cleaner's business;
//! a payload that passes this check can still have every row dropped downstream.

use serde_json::Value;

use crate::errors::MarketDataError;
use crate::models::DatasetKind;

/// Accepts a decoded body if it has a tabular shape for `kind`.
///
/// Market feeds return an array of coin objects (a single object is tolerated).
/// News feeds return `{"articles": [...]}` or a bare array of articles.
pub fn check_shape(kind: DatasetKind, payload: &Value) -> Result<usize, MarketDataError> {
    let rows = match (kind, payload) {
        (_, Value::Array(rows)) => rows.len(),
        (DatasetKind::Market, Value::Object(_)) => 1,
        (DatasetKind::News, Value::Object(map)) => match map.get("articles") {
            Some(Value::Array(articles)) => articles.len(),
            Some(_) => {
                return Err(MarketDataError::MalformedPayload {
                    kind,
                    message: "'articles' is not an array".to_string(),
                })
            }
            None => {
                let message = map
                    .get("message")
                    .and_then(Value::as_str)
                    .map(|m| format!("no 'articles' field ({})", m))
                    .unwrap_or_else(|| "no 'articles' field".to_string());
                return Err(MarketDataError::MalformedPayload { kind, message });
            }
        },
        (_, other) => {
            return Err(MarketDataError::MalformedPayload {
                kind,
                message: format!("expected an array or object, got {}", json_type(other)),
            })
        }
    };

    if rows == 0 {
        return Err(MarketDataError::EmptyPayload { kind });
    }
    Ok(rows)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_market_array_accepted() {
        let payload = json!([{"id": "bitcoin"}, {"id": "ethereum"}]);
        assert_eq!(check_shape(DatasetKind::Market, &payload).unwrap(), 2);
    }

    #[test]
    fn test_news_articles_accepted() {
        let payload = json!({"status": "ok", "articles": [{"title": "a"}]});
        assert_eq!(check_shape(DatasetKind::News, &payload).unwrap(), 1);
    }

    #[test]
    fn test_news_error_body_rejected() {
        let payload = json!({"status": "error", "message": "apiKey missing"});
        let err = check_shape(DatasetKind::News, &payload).unwrap_err();
        assert!(err.to_string().contains("apiKey missing"));
    }

    #[test]
    fn test_scalar_rejected() {
        let err = check_shape(DatasetKind::Market, &json!("oops")).unwrap_err();
        assert!(matches!(err, MarketDataError::MalformedPayload { .. }));
    }

    #[test]
    fn test_empty_array_rejected() {
        let err = check_shape(DatasetKind::Market, &json!([])).unwrap_err();
        assert!(matches!(err, MarketDataError::EmptyPayload { .. }));
    }
}
