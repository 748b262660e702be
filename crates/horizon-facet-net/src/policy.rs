//! Request policy: base URL, default headers and timeout.
//!
//! A policy is a plain value. Applications create one at startup and hand
//! it to every [`RequestClient`](crate::RequestClient) they build.

use std::time::Duration;

use http::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::error::{RequestError, Result};

/// Settings shared by every request a client issues.
#[derive(Debug, Clone)]
pub struct RequestPolicy {
    base_url: Option<Url>,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Self {
            base_url: None,
            default_headers,
            timeout: Some(Duration::from_secs(30)),
            user_agent: Some(format!("horizon-facet/{}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

impl RequestPolicy {
    /// Create the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL relative paths resolve against.
    ///
    /// A trailing slash is added when missing so that the last path segment
    /// of the base is kept.
    pub fn with_base_url(mut self, base: &str) -> Result<Self> {
        let mut url = Url::parse(base)?;
        if url.cannot_be_a_base() {
            return Err(RequestError::InvalidUrl(format!("{base} cannot be a base URL")));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        self.base_url = Some(url);
        Ok(self)
    }

    /// Add a header sent with every request.
    pub fn with_header<K, V>(mut self, name: K, value: V) -> Result<Self>
    where
        K: TryInto<HeaderName>,
        K::Error: Into<http::Error>,
        V: TryInto<HeaderValue>,
        V::Error: Into<http::Error>,
    {
        let name = name
            .try_into()
            .map_err(|e| RequestError::InvalidHeader(e.into().to_string()))?;
        let value = value
            .try_into()
            .map_err(|e| RequestError::InvalidHeader(e.into().to_string()))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable the request timeout.
    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// The base URL, if any.
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Headers sent with every request.
    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// The request timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The user agent, if any.
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// Resolve a request path into a full URL.
    ///
    /// Absolute URLs pass through unchanged. Relative paths are joined onto
    /// the base URL with any leading slash dropped, so `"/users"` against
    /// `https://api.test/v1/` becomes `https://api.test/v1/users`.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        match Url::parse(path) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self.base_url.as_ref().ok_or_else(|| {
                    RequestError::InvalidUrl(format!("relative path {path:?} without a base URL"))
                })?;
                Ok(base.join(path.trim_start_matches('/'))?)
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RequestPolicy::default();
        assert!(policy.base_url().is_none());
        assert_eq!(policy.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(
            policy.default_headers().get(ACCEPT).map(HeaderValue::as_bytes),
            Some(&b"application/json"[..])
        );
    }

    #[test]
    fn test_resolve_relative_paths() {
        let policy = RequestPolicy::new().with_base_url("https://api.test/v1").unwrap();
        assert_eq!(policy.base_url().unwrap().as_str(), "https://api.test/v1/");
        assert_eq!(policy.resolve("/users").unwrap().as_str(), "https://api.test/v1/users");
        assert_eq!(
            policy.resolve("users/7?full=1").unwrap().as_str(),
            "https://api.test/v1/users/7?full=1"
        );
    }

    #[test]
    fn test_resolve_absolute_url_ignores_base() {
        let policy = RequestPolicy::new().with_base_url("https://api.test/").unwrap();
        assert_eq!(
            policy.resolve("https://other.test/x").unwrap().as_str(),
            "https://other.test/x"
        );
    }

    #[test]
    fn test_relative_path_without_base() {
        let err = RequestPolicy::new().resolve("/users").unwrap_err();
        assert!(matches!(err, RequestError::InvalidUrl(_)));
    }

    #[test]
    fn test_invalid_header() {
        let err = RequestPolicy::new().with_header("bad header", "x").unwrap_err();
        assert!(matches!(err, RequestError::InvalidHeader(_)));

        let policy = RequestPolicy::new().with_header("x-api-key", "secret").unwrap();
        assert!(policy.default_headers().contains_key("x-api-key"));
    }

    #[test]
    fn test_invalid_base() {
        assert!(RequestPolicy::new().with_base_url("not a url").is_err());
        assert!(RequestPolicy::new().with_base_url("mailto:a@b.c").is_err());
    }
}
