//! URL validation helpers

use crate::error::{CredoError, Result};
use url::Url;

/// URL validation and parsing utilities
pub struct UrlUtils;

impl UrlUtils {
    /// Parse and validate an absolute http(s) URL.
    pub fn validate_url(input: &str) -> Result<Url> {
        let url = Url::parse(input)
            .map_err(|e| CredoError::InvalidUrl(format!("invalid URL '{}': {}", input, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(CredoError::InvalidUrl(format!(
                "unsupported scheme '{}' in '{}'",
                other, input
            ))),
        }
    }

    /// Whether the URL uses a secured transport.
    pub fn is_secure(url: &Url) -> bool {
        url.scheme() == "https"
    }
}

#[cfg(test)]
mod tests {
    use super::UrlUtils;
    use crate::error::CredoError;

    #[test]
    fn validate_url_accepts_http_and_https() {
        let url = UrlUtils::validate_url("http://example.com/login").expect("valid url");
        assert_eq!(url.host_str(), Some("example.com"));
        assert!(!UrlUtils::is_secure(&url));

        let url = UrlUtils::validate_url("https://example.com").expect("valid url");
        assert!(UrlUtils::is_secure(&url));
    }

    #[test]
    fn validate_url_rejects_other_schemes() {
        let err = UrlUtils::validate_url("ftp://example.com").expect_err("ftp rejected");
        assert!(matches!(err, CredoError::InvalidUrl(_)));
    }

    #[test]
    fn validate_url_rejects_garbage() {
        let err = UrlUtils::validate_url("not a url").expect_err("garbage rejected");
        assert!(matches!(err, CredoError::InvalidUrl(_)));
    }
}
