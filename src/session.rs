//! Session facade
//!
//! A [`Session`] owns at most one [`AuthProtocol`] and merges its cached
//! fragment and trust material into every request it executes.

use std::collections::HashMap;

use serde_json::Value;

use crate::auth::AuthProtocol;
use crate::error::Result;
use crate::http::{self, HttpMethod, Request, Response};
use crate::trust::TrustStore;

/// One logical client session, authenticated or not.
#[derive(Default)]
pub struct Session {
    protocol: Option<AuthProtocol>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt an authentication protocol and report the resulting state.
    pub fn authorize(&mut self, protocol: AuthProtocol) -> bool {
        self.protocol = Some(protocol);
        self.is_authenticated()
    }

    pub fn is_authenticated(&self) -> bool {
        self.protocol
            .as_ref()
            .is_some_and(AuthProtocol::is_authenticated)
    }

    /// Reset and discard the adopted protocol. Idempotent.
    pub fn de_authenticate(&mut self) {
        if let Some(mut protocol) = self.protocol.take() {
            protocol.de_authenticate();
        }
    }

    pub fn protocol(&self) -> Option<&AuthProtocol> {
        self.protocol.as_ref()
    }

    /// Execute a request with the session's cached authentication fragment
    /// merged in. Caller-supplied headers win over cached ones.
    pub async fn request(&self, request: &Request) -> Result<Response> {
        let mut headers: HashMap<String, String> = match &self.protocol {
            Some(protocol) => protocol.cache().clone(),
            None => HashMap::new(),
        };
        headers.extend(request.headers.clone());

        let merged = Request {
            url: request.url.clone(),
            method: request.method,
            headers,
            body: request.body.clone(),
        };
        http::execute(&merged, self.trust_store()).await
    }

    pub async fn get(&self, url: &str) -> Result<Response> {
        self.request(&Request::new(url)).await
    }

    pub async fn post(&self, url: &str, body: Value) -> Result<Response> {
        self.request(&Request::new(url).method(HttpMethod::Post).body(body))
            .await
    }

    pub async fn put(&self, url: &str, body: Value) -> Result<Response> {
        self.request(&Request::new(url).method(HttpMethod::Put).body(body))
            .await
    }

    pub async fn delete(&self, url: &str) -> Result<Response> {
        self.request(&Request::new(url).method(HttpMethod::Delete)).await
    }

    fn trust_store(&self) -> Option<&TrustStore> {
        self.protocol.as_ref().and_then(AuthProtocol::trust_store)
    }
}
