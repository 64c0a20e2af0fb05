use std::fs;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::{KeyOptions, VaultConfig};
use crate::error::{Result, TransitError};
use crate::transit::TransitEngine;

const TOKEN_HEADER: &str = "X-Vault-Token";
const USER_AGENT: &str = concat!("transit_vault/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct SignRequest<'a> {
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hash_algorithm: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key_version: Option<u32>,
}

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    input: String,
    signature: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    hash_algorithm: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct SignData {
    signature: String,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    valid: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<String>,
}

/// Blocking client for the transit secrets engine.
pub struct VaultClient {
    client: Client,
    address: Url,
    token: String,
    mount: String,
}

impl VaultClient {
    /// Build a client. No request is sent until `sign`/`verify`.
    pub fn new(config: &VaultConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT);

        if let Some(ca_path) = &config.ca_cert {
            let pem = fs::read(ca_path).map_err(|source| TransitError::Read {
                path: ca_path.clone(),
                source,
            })?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                TransitError::config(format!("invalid CA certificate {}: {}", ca_path.display(), e))
            })?;
            builder = builder.add_root_certificate(cert);
            debug!(ca_cert = %ca_path.display(), "trusting extra CA certificate");
        }

        let client = builder
            .build()
            .map_err(|e| TransitError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(VaultClient {
            client,
            address: config.address.clone(),
            token: config.token.clone(),
            mount: config.mount.clone(),
        })
    }

    /// `{address}/v1/{mount}/{action}/{key}`, each segment percent-encoded.
    fn endpoint(&self, action: &str, key: &str) -> Result<Url> {
        let mut url = self.address.clone();
        url.set_query(None);
        url.set_fragment(None);
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| TransitError::config("vault address cannot be used as a base URL"))?;
            segments
                .pop_if_empty()
                .push("v1")
                .extend(self.mount.split('/'))
                .push(action)
                .push(key);
        }
        Ok(url)
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, url: Url, body: &B) -> Result<T> {
        debug!(%url, "POST");

        let response = self
            .client
            .post(url.clone())
            .header(TOKEN_HEADER, &self.token)
            .json(body)
            .send()
            .map_err(|e| TransitError::Network {
                message: format!("request to {} failed: {}", url, e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().unwrap_or_default();
            let message = error_message(status, &error_text);
            debug!(status = status.as_u16(), %message, "vault request failed");
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    TransitError::PermissionDenied { message }
                }
                _ => TransitError::Remote {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let envelope: Envelope<T> = response.json().map_err(|e| TransitError::InvalidResponse {
            message: format!("failed to parse response from {}: {}", url, e),
        })?;
        Ok(envelope.data)
    }
}

impl TransitEngine for VaultClient {
    fn sign(&self, key: &str, plaintext: &[u8], options: &KeyOptions) -> Result<String> {
        let url = self.endpoint("sign", key)?;
        let request = SignRequest {
            input: STANDARD.encode(plaintext),
            hash_algorithm: options.hash_algorithm.as_deref(),
            key_version: options.key_version,
        };

        let data: SignData = self.post(url, &request)?;
        if data.signature.is_empty() {
            return Err(TransitError::InvalidResponse {
                message: "vault returned an empty signature".to_string(),
            });
        }
        Ok(data.signature)
    }

    fn verify(
        &self,
        key: &str,
        plaintext: &[u8],
        signature: &str,
        options: &KeyOptions,
    ) -> Result<bool> {
        let url = self.endpoint("verify", key)?;
        let request = VerifyRequest {
            input: STANDARD.encode(plaintext),
            signature,
            hash_algorithm: options.hash_algorithm.as_deref(),
        };

        let data: VerifyData = self.post(url, &request)?;
        Ok(data.valid)
    }
}

/// Vault reports failures as `{"errors": [...]}`; fall back to the raw body.
fn error_message(status: StatusCode, body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    if !parsed.errors.is_empty() {
        return parsed.errors.join("; ");
    }
    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        body.to_string()
    }
}
