//! Credential encoding for authentication exchanges

use std::collections::HashMap;

use base64::Engine;
use serde_json::{json, Value};

use crate::error::{CredoError, Result};

/// A username/password pair held only in its encoded wire form.
///
/// The plaintext pair is transformed at construction into the Base64
/// `username:password` encoding used by the Basic scheme; it is only
/// transiently decoded when an alternate wire shape (the cookie exchange
/// payload) is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    encoded: String,
}

impl Credential {
    /// Encode a username/password pair.
    pub fn new(username: &str, password: &str) -> Self {
        let pair = format!("{}:{}", username, password);
        let encoded = base64::engine::general_purpose::STANDARD.encode(pair.as_bytes());
        Self { encoded }
    }

    /// Wrap an already-encoded credential. The encoding is validated lazily
    /// by [`Credential::decode`].
    pub fn from_encoded(encoded: &str) -> Self {
        Self {
            encoded: encoded.to_string(),
        }
    }

    /// The Base64 `username:password` encoding.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// Recover the username/password pair, splitting on the first `:`.
    pub fn decode(&self) -> Result<(String, String)> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(self.encoded.as_bytes())
            .map_err(|e| CredoError::MalformedCredential(format!("invalid base64: {}", e)))?;
        let text = String::from_utf8(bytes)
            .map_err(|e| CredoError::MalformedCredential(format!("invalid UTF-8: {}", e)))?;

        match text.split_once(':') {
            Some((username, password)) => Ok((username.to_string(), password.to_string())),
            None => Err(CredoError::MalformedCredential(
                "no ':' separator in decoded credential".to_string(),
            )),
        }
    }

    /// The `Authorization` header value for the Basic scheme.
    pub fn basic_value(&self) -> String {
        format!("Basic {}", self.encoded)
    }

    /// The Basic scheme header fragment, ready to merge into a request.
    pub fn basic_header(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), self.basic_value());
        headers
    }

    /// The plaintext pair as a request body for a cookie-issuing endpoint.
    /// Only ever sent over a secured transport by callers.
    pub fn cookie_payload(&self) -> Result<Value> {
        let (username, password) = self.decode()?;
        Ok(json!({
            "username": username,
            "password": password,
        }))
    }
}
