//! Service URL type.

use std::fmt;
use std::str::FromStr;
use url::Url;

use super::{Environment, Scope};
use crate::error::{Error, InvalidInputError};

/// Host used when no other is configured.
pub const DEFAULT_HOST: &str = "https://api.apple-cloudkit.com";

/// A validated web service base URL.
///
/// This type ensures the URL is absolute, uses HTTPS (or HTTP for localhost),
/// and is normalized for database endpoint construction.
///
/// # Example
///
/// ```
/// use ckws::{Environment, Scope, ServiceUrl};
///
/// let host = ServiceUrl::new("https://api.apple-cloudkit.com").unwrap();
/// assert_eq!(
///     host.database_path("iCloud.com.example.app", Environment::Development, Scope::Public, "records/modify"),
///     "/database/1/iCloud.com.example.app/development/public/records/modify"
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ServiceUrl(Url);

impl ServiceUrl {
    /// Create a new service URL from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not valid or doesn't meet requirements.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let url = Url::parse(s).map_err(|e| InvalidInputError::ServiceUrl {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;

        Ok(Self(url))
    }

    /// Returns the signed path for a database operation.
    ///
    /// The path (not the full URL) is what the request signature covers.
    pub fn database_path(
        &self,
        container: &str,
        environment: Environment,
        scope: Scope,
        operation: &str,
    ) -> String {
        format!(
            "/database/1/{}/{}/{}/{}",
            container,
            environment.as_str(),
            scope.as_str(),
            operation
        )
    }

    /// Returns the absolute URL for a signed path.
    pub fn url_for(&self, path: &str) -> String {
        // The URL crate always adds a trailing slash to root paths
        let base = self.0.as_str().trim_end_matches('/');
        format!("{}{}", base, path)
    }

    /// Returns the base URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the host string.
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        if url.cannot_be_a_base() {
            return Err(InvalidInputError::ServiceUrl {
                value: original.to_string(),
                reason: "must be an absolute URL".to_string(),
            }
            .into());
        }

        let scheme = url.scheme();
        let is_localhost = url
            .host_str()
            .is_some_and(|h| h == "localhost" || h == "127.0.0.1" || h == "[::1]");

        if scheme != "https" && !(scheme == "http" && is_localhost) {
            return Err(InvalidInputError::ServiceUrl {
                value: original.to_string(),
                reason: "must use HTTPS (HTTP allowed only for localhost)".to_string(),
            }
            .into());
        }

        if url.host_str().is_none() {
            return Err(InvalidInputError::ServiceUrl {
                value: original.to_string(),
                reason: "must have a host".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

impl Default for ServiceUrl {
    fn default() -> Self {
        Self(Url::parse(DEFAULT_HOST).expect("default host is a valid URL"))
    }
}

impl fmt::Display for ServiceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ServiceUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_https_url() {
        let host = ServiceUrl::new("https://api.apple-cloudkit.com").unwrap();
        assert_eq!(host.host(), Some("api.apple-cloudkit.com"));
    }

    #[test]
    fn valid_localhost_http() {
        let host = ServiceUrl::new("http://127.0.0.1:8080").unwrap();
        assert_eq!(host.host(), Some("127.0.0.1"));
    }

    #[test]
    fn url_for_strips_trailing_slash() {
        let host = ServiceUrl::new("https://api.apple-cloudkit.com/").unwrap();
        assert_eq!(
            host.url_for("/database/1/c/development/public/records/lookup"),
            "https://api.apple-cloudkit.com/database/1/c/development/public/records/lookup"
        );
    }

    #[test]
    fn database_path_uses_environment_and_scope() {
        let host = ServiceUrl::default();
        assert_eq!(
            host.database_path("iCloud.a.b", Environment::Production, Scope::Private, "records/query"),
            "/database/1/iCloud.a.b/production/private/records/query"
        );
    }

    #[test]
    fn invalid_http_non_localhost() {
        assert!(ServiceUrl::new("http://api.apple-cloudkit.com").is_err());
    }

    #[test]
    fn invalid_relative_url() {
        assert!(ServiceUrl::new("/database/1").is_err());
    }
}
