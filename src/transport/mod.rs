//! Data-access layer for the remote service.
//!
//! The rest of the crate only sees the [`Transport`] trait: given a method
//! name and its parameters, return the decoded response document or fail.
//! Production code uses [`HttpTransport`]; tests substitute
//! [`mocks::MockTransport`].

mod http;

use serde_json::Value;

use crate::error::{ApiError, Error, Result};

pub use http::{DEFAULT_BASE_URL, HttpTransport};

/// Request parameters, in the order they were given.
pub type Params<'a> = [(&'a str, &'a str)];

/// Something that can call a remote API method.
pub trait Transport: Send + Sync {
    /// Call `method` (e.g. `"artist.getInfo"`) with `params`.
    ///
    /// Returns the decoded response document. A structured error from the
    /// service surfaces as [`Error::Api`].
    fn call(&self, method: &str, params: &Params<'_>) -> Result<Value>;
}

/// Turn a response document into either the document or an [`ApiError`].
///
/// The service reports errors in-band as `{"error": <code>, "message": ..}`,
/// sometimes with the code as a string.
pub fn decode_response(document: Value) -> Result<Value> {
    let Some(code) = document.get("error") else {
        return Ok(document);
    };

    let code = match code {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| Error::parse(format!("unrecognized error code {code}")))?;

    let message = document
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    Err(ApiError::new(code as u32, message).into())
}

/// Mock transport for testing.
///
/// Returns canned responses keyed by method and parameters, and records every
/// call so tests can count fetches.
#[cfg(test)]
pub mod mocks {
    use std::collections::HashMap;

    use parking_lot::Mutex;

    use super::*;

    /// A recorded call.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Call {
        pub method: String,
        pub params: Vec<(String, String)>,
    }

    impl Call {
        pub fn param(&self, name: &str) -> Option<&str> {
            self.params
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        }
    }

    /// Mock transport with canned responses.
    #[derive(Default)]
    pub struct MockTransport {
        responses: Mutex<HashMap<String, Value>>,
        calls: Mutex<Vec<Call>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer `method` called with exactly `params` (any order) with
        /// `response`. Responses containing `"error"` decode to API errors.
        pub fn respond(&self, method: &str, params: &Params<'_>, response: Value) -> &Self {
            self.responses
                .lock()
                .insert(request_key(method, params), response);
            self
        }

        /// Every call so far, oldest first.
        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().len()
        }

        /// Number of calls to one method.
        pub fn calls_to(&self, method: &str) -> usize {
            self.calls.lock().iter().filter(|c| c.method == method).count()
        }
    }

    fn request_key(method: &str, params: &Params<'_>) -> String {
        let mut pairs: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        pairs.sort();
        format!("{method}?{}", pairs.join("&"))
    }

    impl Transport for MockTransport {
        fn call(&self, method: &str, params: &Params<'_>) -> Result<Value> {
            self.calls.lock().push(Call {
                method: method.to_string(),
                params: params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            });

            let key = request_key(method, params);
            let response = self.responses.lock().get(&key).cloned();
            match response {
                Some(document) => decode_response(document),
                None => Err(Error::Network(format!("no canned response for {key}"))),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use serde_json::json;

        #[test]
        fn test_mock_matches_params_in_any_order() {
            let mock = MockTransport::new();
            mock.respond("album.getInfo", &[("artist", "Cher"), ("album", "Believe")], json!({"ok": 1}));

            let result = mock
                .call("album.getInfo", &[("album", "Believe"), ("artist", "Cher")])
                .unwrap();
            assert_eq!(result, json!({"ok": 1}));
            assert_eq!(mock.call_count(), 1);
            assert_eq!(mock.calls()[0].param("artist"), Some("Cher"));
        }

        #[test]
        fn test_mock_unknown_request_is_network_error() {
            let mock = MockTransport::new();
            let result = mock.call("artist.getInfo", &[("artist", "Nobody")]);
            assert!(matches!(result, Err(Error::Network(_))));
            assert_eq!(mock.calls_to("artist.getInfo"), 1);
        }

        #[test]
        fn test_mock_decodes_api_errors() {
            let mock = MockTransport::new();
            mock.respond(
                "artist.getInfo",
                &[("artist", "Nobody")],
                json!({"error": 6, "message": "The artist you supplied could not be found"}),
            );
            let err = mock.call("artist.getInfo", &[("artist", "Nobody")]).unwrap_err();
            assert_eq!(err.api_error().map(|e| e.code), Some(6));
        }
    }
}
