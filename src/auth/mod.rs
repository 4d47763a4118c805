//! Authentication protocol state machine
//!
//! One [`AuthProtocol`] drives one authentication exchange against a locale
//! URL, produces a cached header/cookie fragment, and tracks
//! authenticated/unauthenticated state. The two schemes (Basic, Cookie) are
//! a tagged variant dispatched inside a single `authorize` entry point.

use std::collections::HashMap;
use std::fmt;

use url::Url;

use crate::error::{CredoError, Result};
use crate::http::{self, HttpMethod, Request};
use crate::trust::TrustStore;
use crate::utils::UrlUtils;

pub mod credential;

pub use credential::Credential;

/// Canonical key for the Basic scheme's cached fragment.
pub const AUTHORIZATION_HEADER: &str = "Authorization";
/// Canonical key for the Cookie scheme's cached fragment.
pub const COOKIE_HEADER: &str = "Cookie";

/// Authentication scheme variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Basic,
    Cookie,
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthScheme::Basic => write!(f, "basic"),
            AuthScheme::Cookie => write!(f, "cookie"),
        }
    }
}

/// Outcome of an authorization exchange that did not hard-fail.
///
/// A 401 is the one status reported as an error
/// ([`CredoError::NotAuthorized`]); every other non-success outcome is a
/// `Failed` value carrying whatever status was observed (`None` when the
/// transport never produced one).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated,
    Failed { status: Option<u16> },
}

impl AuthOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthOutcome::Authenticated)
    }
}

/// Authentication state machine for one logical session.
///
/// Not intended to be shared across concurrent `authorize` calls; each
/// logical session owns one instance.
pub struct AuthProtocol {
    scheme: AuthScheme,
    locale: Url,
    authenticated: bool,
    credential: Option<Credential>,
    cache: HashMap<String, String>,
    trust: Option<TrustStore>,
}

impl AuthProtocol {
    /// A protocol instance for `scheme` against the given locale URL.
    pub fn new(scheme: AuthScheme, locale: Url) -> Self {
        Self {
            scheme,
            locale,
            authenticated: false,
            credential: None,
            cache: HashMap::new(),
            trust: None,
        }
    }

    /// A Basic-scheme protocol for the locale given as a string.
    pub fn basic(locale: &str) -> Result<Self> {
        Ok(Self::new(AuthScheme::Basic, UrlUtils::validate_url(locale)?))
    }

    /// A Cookie-scheme protocol for the locale given as a string.
    pub fn cookie(locale: &str) -> Result<Self> {
        Ok(Self::new(AuthScheme::Cookie, UrlUtils::validate_url(locale)?))
    }

    pub fn scheme(&self) -> AuthScheme {
        self.scheme
    }

    pub fn locale(&self) -> &Url {
        &self.locale
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// The cached fragment(s) produced by the last successful exchange.
    /// Empty whenever unauthenticated.
    pub fn cache(&self) -> &HashMap<String, String> {
        &self.cache
    }

    /// The attached trust store, if the caller opted in at authorization.
    pub fn trust_store(&self) -> Option<&TrustStore> {
        self.trust.as_ref()
    }

    /// Run one authentication exchange against the locale.
    ///
    /// On a 200 the scheme's fragment is cached and the protocol becomes
    /// authenticated; `use_trust_store` additionally attaches the default
    /// [`TrustStore`]. A 401 fails with [`CredoError::NotAuthorized`]. Any
    /// other status, and any transport-level failure, is a soft failure:
    /// logged, `Ok(AuthOutcome::Failed)`, state left unauthenticated.
    ///
    /// Calling this while already authenticated de-authenticates first; no
    /// stacked credentials.
    pub async fn authorize(
        &mut self,
        username: &str,
        password: &str,
        use_trust_store: bool,
    ) -> Result<AuthOutcome> {
        if self.authenticated {
            self.de_authenticate();
        }

        let credential = Credential::new(username, password);
        let request = match self.scheme {
            AuthScheme::Basic => Request {
                url: self.locale.to_string(),
                method: HttpMethod::Get,
                headers: credential.basic_header(),
                body: None,
            },
            AuthScheme::Cookie => Request {
                url: self.locale.to_string(),
                method: HttpMethod::Post,
                headers: HashMap::new(),
                body: Some(credential.cookie_payload()?),
            },
        };

        let response = match http::execute(&request, None).await {
            Ok(response) => response,
            Err(err) => {
                log::warn!(
                    "authorization exchange with {} failed: {}",
                    self.locale,
                    err
                );
                return Ok(AuthOutcome::Failed { status: None });
            }
        };

        match response.status_code() {
            200 => {
                let mut cache = HashMap::new();
                match self.scheme {
                    AuthScheme::Basic => {
                        cache.insert(AUTHORIZATION_HEADER.to_string(), credential.basic_value());
                    }
                    AuthScheme::Cookie => match response.cookie() {
                        Some(cookie) => {
                            cache.insert(COOKIE_HEADER.to_string(), cookie.to_string());
                        }
                        None => {
                            log::warn!(
                                "{} accepted the exchange but returned no Set-Cookie header",
                                self.locale
                            );
                            return Ok(AuthOutcome::Failed { status: Some(200) });
                        }
                    },
                }

                self.cache = cache;
                self.credential = Some(credential);
                self.authenticated = true;
                if use_trust_store {
                    match TrustStore::default_store() {
                        Ok(store) => self.trust = Some(store),
                        Err(err) => {
                            log::warn!("default trust store unavailable: {}", err);
                        }
                    }
                }
                log::info!("{} authentication protocol authenticated", self.scheme);
                Ok(AuthOutcome::Authenticated)
            }
            401 => {
                self.de_authenticate();
                Err(CredoError::NotAuthorized)
            }
            _ => {
                log::warn!(
                    "couldn't authorize against {}, received {}",
                    self.locale,
                    response.verbose_status()
                );
                Ok(AuthOutcome::Failed {
                    status: Some(response.status_code()),
                })
            }
        }
    }

    /// Reset all state unconditionally. Calling this twice is a no-op the
    /// second time.
    pub fn de_authenticate(&mut self) {
        self.authenticated = false;
        self.credential = None;
        self.cache = HashMap::new();
        self.trust = None;
        log::debug!("credential and authentication cache cleared");
    }
}
