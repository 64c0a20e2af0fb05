// src/config.rs
// Immutable per-invocation configuration and its validation

use std::fmt;
use std::path::PathBuf;

use reqwest::header::HeaderValue;
use tracing::warn;
use url::Url;

use crate::error::{Result, TransitError};

/// Token used when `--token` is not given.
pub const DEFAULT_TOKEN: &str = "nil";
/// Mount path of the transit engine when `--mount` is not given.
pub const DEFAULT_MOUNT: &str = "transit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Sign,
    Verify,
}

/// Connection settings for the Vault server.
#[derive(Clone, PartialEq, Eq)]
pub struct VaultConfig {
    pub address: Url,
    pub token: String,
    pub mount: String,
    /// PEM bundle to trust in addition to the system roots.
    pub ca_cert: Option<PathBuf>,
}

impl VaultConfig {
    /// Parse and check the raw flag values.
    pub fn new(address: &str, token: &str, mount: &str, ca_cert: Option<PathBuf>) -> Result<Self> {
        let address = address.trim();
        if address.is_empty() {
            return Err(TransitError::config("vault address must not be empty"));
        }
        let address = Url::parse(address)
            .map_err(|e| TransitError::config(format!("invalid vault address {address:?}: {e}")))?;
        if !matches!(address.scheme(), "http" | "https") {
            return Err(TransitError::config(format!(
                "unsupported vault address scheme {:?}",
                address.scheme()
            )));
        }
        if address.cannot_be_a_base() {
            return Err(TransitError::config("vault address cannot be used as a base URL"));
        }

        if token.is_empty() {
            return Err(TransitError::config("token must not be empty"));
        }
        if HeaderValue::from_str(token).is_err() {
            return Err(TransitError::config(
                "token contains characters not allowed in an HTTP header",
            ));
        }

        let mount = mount.trim_matches('/');
        if mount.is_empty() {
            return Err(TransitError::config("transit mount must not be empty"));
        }

        Ok(Self {
            address,
            token: token.to_string(),
            mount: mount.to_string(),
            ca_cert,
        })
    }

    /// Non-fatal findings worth telling the operator about.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.token == DEFAULT_TOKEN {
            warnings.push(
                "no --token given, Vault will most likely reject the request".to_string(),
            );
        }
        if self.address.scheme() == "http" {
            warnings.push(format!(
                "vault address {} is not TLS, the token is sent in clear text",
                self.address
            ));
        }
        warnings
    }
}

// Keeps the token out of logs and panic messages.
impl fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultConfig")
            .field("address", &self.address.as_str())
            .field("token", &"<redacted>")
            .field("mount", &self.mount)
            .field("ca_cert", &self.ca_cert)
            .finish()
    }
}

/// Optional transit parameters, forwarded only when set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyOptions {
    pub hash_algorithm: Option<String>,
    /// Sign only; verify reads the version from the signature itself.
    pub key_version: Option<u32>,
}

/// One CLI run. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub mode: Mode,
    pub vault: VaultConfig,
    pub key: String,
    pub key_options: KeyOptions,
    pub input: PathBuf,
    pub signature: PathBuf,
}

impl Invocation {
    pub fn new(
        mode: Mode,
        vault: VaultConfig,
        key: String,
        key_options: KeyOptions,
        input: PathBuf,
        signature: PathBuf,
    ) -> Result<Self> {
        if key.trim().is_empty() {
            return Err(TransitError::config("key name must not be empty"));
        }
        if input.as_os_str().is_empty() {
            return Err(TransitError::config("input path must not be empty"));
        }
        if signature.as_os_str().is_empty() {
            return Err(TransitError::config("signature path must not be empty"));
        }

        Ok(Self {
            mode,
            vault,
            key,
            key_options,
            input,
            signature,
        })
    }

    /// Log configuration warnings.
    pub fn log_warnings(&self) {
        for w in self.vault.warnings() {
            warn!("{}", w);
        }
    }
}
