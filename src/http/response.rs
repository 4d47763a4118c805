//! HTTP response capture and structured-parse helpers

use reqwest::header::{HeaderMap, SET_COOKIE};
use reqwest::StatusCode;
use serde_json::{Map, Value};

use crate::error::{CredoError, Result};

/// Immutable snapshot of one response: status, headers, and exactly one of
/// success body / error body depending on the status class.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    cookie: Option<String>,
    content: Option<String>,
    error_content: Option<String>,
}

impl Response {
    /// Drain a transport response into an immutable snapshot. Reading the
    /// body is the only fallible step; failure there is a transport error.
    pub(crate) async fn capture(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        // Verbatim Set-Cookie, last value wins. No cookie-jar semantics.
        let cookie = headers
            .get_all(SET_COOKIE)
            .iter()
            .last()
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let text = response.text().await?;
        let (content, error_content) = if status.is_success() {
            (Some(text), None)
        } else if text.is_empty() {
            // Not every error response carries a body; its absence is not an
            // error, just an absent error body.
            (None, None)
        } else {
            (None, Some(text))
        };

        Ok(Self {
            status,
            headers,
            cookie,
            content,
            error_content,
        })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn status_message(&self) -> &str {
        self.status.canonical_reason().unwrap_or("")
    }

    /// The `"code : message"` form used in soft-failure logs.
    pub fn verbose_status(&self) -> String {
        format!("{} : {}", self.status_code(), self.status_message())
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The verbatim `Set-Cookie` header value, if any.
    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    /// The success body, present iff the transport reported success.
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// The error body, present iff the transport reported failure and the
    /// server sent one.
    pub fn error_content(&self) -> Option<&str> {
        self.error_content.as_deref()
    }

    /// Whichever of the two bodies is authoritative for this response.
    pub fn text(&self) -> &str {
        self.content
            .as_deref()
            .or(self.error_content.as_deref())
            .unwrap_or("")
    }

    /// Parse the authoritative body as JSON.
    pub fn json(&self) -> Result<Value> {
        serde_json::from_str(self.text()).map_err(|e| CredoError::PayloadParse(e.to_string()))
    }

    /// Parse the authoritative body as a JSON object.
    pub fn json_object(&self) -> Result<Map<String, Value>> {
        match self.json()? {
            Value::Object(map) => Ok(map),
            other => Err(CredoError::PayloadParse(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Parse the authoritative body as a JSON array.
    pub fn json_array(&self) -> Result<Vec<Value>> {
        match self.json()? {
            Value::Array(values) => Ok(values),
            other => Err(CredoError::PayloadParse(format!(
                "expected a JSON array, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
