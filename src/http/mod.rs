//! HTTP connection execution
//!
//! One logical request per call: a fresh transport client is configured per
//! [`execute`], optionally from a [`TrustStore`], the request is written in
//! full before any response is read, and the result is captured as an
//! immutable [`Response`]. Non-2xx statuses are data for the caller, never
//! errors; only transport-level failure is reported as an error.

use reqwest::header::{ACCEPT, CONTENT_TYPE};

use crate::error::Result;
use crate::trust::TrustStore;
use crate::utils::UrlUtils;

pub mod request;
pub mod response;

pub use request::{HttpMethod, Request};
pub use response::Response;

const JSON_MEDIA_TYPE: &str = "application/json";
const MAX_REDIRECTS: usize = 10;

/// Execute one request, consulting `trust` for TLS material when the target
/// scheme is secure.
///
/// Fails with [`CredoError::InvalidUrl`](crate::CredoError::InvalidUrl) on an
/// unparseable target and [`CredoError::Connection`](crate::CredoError::Connection)
/// when the transport cannot be established or the response cannot be read at
/// all. Every obtained response, whatever its status, is returned.
pub async fn execute(request: &Request, trust: Option<&TrustStore>) -> Result<Response> {
    let url = UrlUtils::validate_url(&request.url)?;

    let mut builder = match trust {
        Some(store) if UrlUtils::is_secure(&url) => store.client_builder(None)?,
        _ => reqwest::ClientBuilder::new(),
    };
    builder = builder.redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS));
    let client = builder.build()?;

    let mut outbound = client.request(request.method.as_reqwest(), url);
    for (key, value) in &request.headers {
        outbound = outbound.header(key, value);
    }
    if let Some(body) = &request.body {
        outbound = outbound
            .header(CONTENT_TYPE, JSON_MEDIA_TYPE)
            .header(ACCEPT, JSON_MEDIA_TYPE)
            .json(body);
    }

    log::debug!("{} {}", request.method, request.url);
    let response = outbound.send().await?;
    Response::capture(response).await
}
