//! Connection settings shared by every subcommand.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use ckws::{Config, Container, Database, Environment, PrivateKey, RequestSigner, Scope, ServiceUrl};

#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Web service host (defaults to the public CloudKit endpoint)
    #[arg(long, env = "CKWS_HOST", global = true)]
    pub host: Option<String>,

    /// Container identifier (e.g., iCloud.com.example.app)
    #[arg(long, env = "CKWS_CONTAINER", global = true)]
    pub container: Option<String>,

    /// Container environment: development or production
    #[arg(long, env = "CKWS_ENVIRONMENT", default_value = "development", global = true)]
    pub environment: String,

    /// Database scope: public, private or shared
    #[arg(long, env = "CKWS_DATABASE", default_value = "public", global = true)]
    pub database: String,

    /// Server-to-server key id
    #[arg(long, env = "CKWS_KEY_ID", global = true)]
    pub key_id: Option<String>,

    /// PEM file holding the P-256 private key
    #[arg(long, env = "CKWS_KEY_FILE", global = true)]
    pub key_file: Option<PathBuf>,
}

impl ConnectionArgs {
    pub fn signer(&self) -> Result<RequestSigner> {
        let key_id = self
            .key_id
            .as_ref()
            .context("No key id. Pass --key-id or set CKWS_KEY_ID.")?;
        let path = self
            .key_file
            .as_ref()
            .context("No key file. Pass --key-file or set CKWS_KEY_FILE.")?;
        let key = PrivateKey::from_file(path)
            .with_context(|| format!("Failed to load key from {}", path.display()))?;
        tracing::debug!(key_id = %key_id, key_file = %path.display(), "loaded signing key");
        Ok(RequestSigner::new(key_id.clone(), key))
    }

    pub fn config(&self) -> Result<Config> {
        let container = self
            .container
            .as_ref()
            .context("No container. Pass --container or set CKWS_CONTAINER.")?;
        let environment: Environment = self
            .environment
            .parse()
            .context("Invalid environment")?;

        let mut config = Config::with_signer(container.clone(), self.signer()?).with_environment(environment);
        if let Some(host) = &self.host {
            config = config.with_host(ServiceUrl::new(host).context("Invalid host URL")?);
        }
        tracing::debug!(
            container = %container,
            environment = %environment,
            host = %config.host(),
            "resolved connection settings"
        );
        Ok(config)
    }

    pub fn scope(&self) -> Result<Scope> {
        self.database.parse().context("Invalid database scope")
    }

    pub fn database(&self) -> Result<Database> {
        let scope = self.scope()?;
        Ok(Container::new(self.config()?).database(scope))
    }
}
