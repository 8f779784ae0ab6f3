// src/utils/settings.rs
//! Signing-domain configuration.
//!
//! Settings are layered: an optional TOML/JSON/YAML file first, then
//! environment variables prefixed with `EIP712_`, e.g.
//!
//! ```text
//! EIP712_NAME=Krebit
//! EIP712_VERSION=0.1
//! EIP712_CHAIN_ID=4
//! EIP712_VERIFYING_CONTRACT=0xa533e32144b5be3f76446f47696bbe0764d5339b
//! ```
//!
//! A `.env` file in the working directory is loaded before the environment is read.

use crate::error::Result;
use crate::models::domain::SigningDomain;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

/// File name (without extension) searched for by [`DomainSettings::load`].
pub const DEFAULT_SETTINGS_FILE: &str = "eip712vc";

/// Environment variable prefix for domain settings.
pub const ENV_PREFIX: &str = "EIP712";

/// Raw signing-domain settings as read from configuration sources.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DomainSettings {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: String,
}

impl DomainSettings {
    /// Loads settings from `eip712vc.*` (if present) and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_SETTINGS_FILE)
    }

    /// Loads settings from the given file (if present) and the environment.
    ///
    /// # Errors
    /// Returns `Config` if a source cannot be read or a required key is missing.
    pub fn load_from(path: &str) -> Result<Self> {
        dotenv::dotenv().ok();

        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let loaded: Self = settings.try_deserialize()?;
        log::debug!("loaded signing domain settings for `{}` v{}", loaded.name, loaded.version);
        Ok(loaded)
    }

    /// Parses settings from an in-memory TOML document.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Validates the settings and produces an immutable signing domain.
    ///
    /// # Errors
    /// Returns `InvalidAddress` if `verifying_contract` is not an address.
    pub fn into_domain(self) -> Result<SigningDomain> {
        SigningDomain::new(self.name, self.version, self.chain_id, &self.verifying_contract)
    }
}
