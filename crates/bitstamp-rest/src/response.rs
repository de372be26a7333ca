//! Response classification
//!
//! Every transport response ends up as exactly one of: success, HTTP error,
//! parse error, or API error.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

use crate::config::ParseFailurePolicy;
use crate::error::{CallError, CallResult};
use crate::transport::HttpResponse;

/// Stand-in for an empty error response body
pub const NO_BODY: &str = "no body";

/// Body of a successful call
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Parsed JSON document
    Json(Value),
    /// Raw text, kept because it was not JSON and the gateway passes it through
    Raw(String),
}

/// Successful call outcome
#[derive(Debug, Clone, PartialEq)]
pub struct CallResponse {
    /// HTTP status
    pub status: u16,
    /// Response headers (lowercase names)
    pub headers: HashMap<String, String>,
    /// Response body
    pub body: ResponseBody,
}

impl CallResponse {
    /// Parsed JSON body, if the body was JSON
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Raw(_) => None,
        }
    }

    /// Take the parsed JSON body
    pub fn into_json(self) -> Option<Value> {
        match self.body {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Raw(_) => None,
        }
    }

    /// Look up a response header by name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Deserialize the JSON body into a typed value
    pub fn decode<T: DeserializeOwned>(&self) -> CallResult<T> {
        match &self.body {
            ResponseBody::Json(value) => {
                serde_json::from_value(value.clone()).map_err(|e| CallError::Parse {
                    message: e.to_string(),
                    raw: value.to_string(),
                })
            }
            ResponseBody::Raw(raw) => Err(CallError::Parse {
                message: "response body is not JSON".to_string(),
                raw: raw.clone(),
            }),
        }
    }
}

/// Turn a transport response into a call outcome
pub(crate) fn classify(response: HttpResponse, policy: ParseFailurePolicy) -> CallResult<CallResponse> {
    let HttpResponse {
        status,
        headers,
        body,
    } = response;

    if !(200..300).contains(&status) {
        let body = if body.is_empty() {
            NO_BODY.to_string()
        } else {
            body
        };
        return Err(CallError::Http { status, body });
    }

    let value: Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(e) => {
            return match policy {
                ParseFailurePolicy::Fail => Err(CallError::Parse {
                    message: e.to_string(),
                    raw: body,
                }),
                ParseFailurePolicy::Passthrough => {
                    warn!(status, "non-JSON success body passed through");
                    Ok(CallResponse {
                        status,
                        headers,
                        body: ResponseBody::Raw(body),
                    })
                }
            };
        }
    };

    if let Some(reason) = api_error_reason(&value) {
        return Err(CallError::Api { reason });
    }

    Ok(CallResponse {
        status,
        headers,
        body: ResponseBody::Json(value),
    })
}

/// Extract the failure reason from an application-level error body
///
/// Bitstamp signals these as `{"status": "error", "reason": ...}` or with a
/// top-level `error` field, both over HTTP 200.
fn api_error_reason(value: &Value) -> Option<String> {
    let object = value.as_object()?;
    let status_error = object.get("status").and_then(Value::as_str) == Some("error");
    let error_field = object.get("error").is_some_and(|v| !v.is_null());
    if !status_error && !error_field {
        return None;
    }

    let reason = ["reason", "message", "error"]
        .iter()
        .filter_map(|key| object.get(*key))
        .find(|v| !v.is_null())
        .map(render_reason)
        .unwrap_or_else(|| "unknown error".to_string());
    Some(reason)
}

fn render_reason(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok(body: &str) -> HttpResponse {
        HttpResponse::new(200, body)
    }

    #[test]
    fn test_success() {
        let response = classify(ok(r#"{"last":"100.0"}"#), ParseFailurePolicy::Fail).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.json(), Some(&json!({"last": "100.0"})));
    }

    #[test]
    fn test_api_error_over_200() {
        let err = classify(
            ok(r#"{"status":"error","reason":"x"}"#),
            ParseFailurePolicy::Fail,
        )
        .unwrap_err();
        assert!(matches!(err, CallError::Api { ref reason } if reason == "x"));
    }

    #[test]
    fn test_api_error_field() {
        let err = classify(ok(r#"{"error":"Invalid nonce"}"#), ParseFailurePolicy::Fail).unwrap_err();
        assert!(matches!(err, CallError::Api { ref reason } if reason == "Invalid nonce"));

        // Structured reasons are rendered as JSON
        let err = classify(
            ok(r#"{"status":"error","reason":{"__all__":["Not enough money"]}}"#),
            ParseFailurePolicy::Fail,
        )
        .unwrap_err();
        assert!(matches!(err, CallError::Api { ref reason } if reason.contains("Not enough money")));
    }

    #[test]
    fn test_null_error_is_success() {
        let response = classify(ok(r#"{"error":null,"id":"1"}"#), ParseFailurePolicy::Fail).unwrap();
        assert!(response.json().is_some());
    }

    #[test]
    fn test_http_error_keeps_body() {
        let err = classify(HttpResponse::new(401, "denied"), ParseFailurePolicy::Fail).unwrap_err();
        assert!(matches!(err, CallError::Http { status: 401, ref body } if body == "denied"));
    }

    #[test]
    fn test_http_error_without_body() {
        let err = classify(HttpResponse::new(502, ""), ParseFailurePolicy::Fail).unwrap_err();
        assert!(matches!(err, CallError::Http { status: 502, ref body } if body == NO_BODY));
    }

    #[test]
    fn test_parse_failure_policies() {
        let err = classify(ok("<html>"), ParseFailurePolicy::Fail).unwrap_err();
        assert!(matches!(err, CallError::Parse { ref raw, .. } if raw == "<html>"));

        let response = classify(ok("<html>"), ParseFailurePolicy::Passthrough).unwrap();
        assert_eq!(response.body, ResponseBody::Raw("<html>".to_string()));
        assert!(response.decode::<Value>().is_err());
    }

    #[test]
    fn test_arrays_are_not_api_errors() {
        let response = classify(ok(r#"[{"id":1}]"#), ParseFailurePolicy::Fail).unwrap();
        assert_eq!(response.json(), Some(&json!([{"id": 1}])));
    }
}
