//! Client configuration.

use crate::auth::{PrivateKey, RequestSigner};
use crate::types::{Environment, ServiceUrl};

/// What a save does with an asset field whose upload produced no result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingAssetPolicy {
    /// Leave the field out of the saved record.
    #[default]
    Omit,
    /// Fail the save with [`InvalidInputError::MissingUpload`](crate::error::InvalidInputError::MissingUpload).
    Error,
}

/// Immutable settings shared by every request a client makes.
///
/// # Example
///
/// ```no_run
/// use ckws::{Config, Environment, PrivateKey};
///
/// # fn main() -> ckws::Result<()> {
/// let key = PrivateKey::from_file("eckey.pem")?;
/// let config = Config::new("iCloud.com.example.app", "1234567890", key)
///     .with_environment(Environment::Production);
/// assert_eq!(config.key_id(), "1234567890");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    host: ServiceUrl,
    container: String,
    environment: Environment,
    signer: RequestSigner,
    missing_asset_policy: MissingAssetPolicy,
}

impl Config {
    /// Configuration for `container` against the default host and the
    /// development environment.
    pub fn new(container: impl Into<String>, key_id: impl Into<String>, key: PrivateKey) -> Self {
        Self::with_signer(container, RequestSigner::new(key_id, key))
    }

    pub fn with_signer(container: impl Into<String>, signer: RequestSigner) -> Self {
        Self {
            host: ServiceUrl::default(),
            container: container.into(),
            environment: Environment::default(),
            signer,
            missing_asset_policy: MissingAssetPolicy::default(),
        }
    }

    pub fn with_host(mut self, host: ServiceUrl) -> Self {
        self.host = host;
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_missing_asset_policy(mut self, policy: MissingAssetPolicy) -> Self {
        self.missing_asset_policy = policy;
        self
    }

    pub fn host(&self) -> &ServiceUrl {
        &self.host
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn key_id(&self) -> &str {
        self.signer.key_id()
    }

    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    pub fn missing_asset_policy(&self) -> MissingAssetPolicy {
        self.missing_asset_policy
    }
}
