//! Sign and verify operations.
//!
//! Each operation reads its files, makes at most one call to the transit
//! engine and reports the result. Nothing here exits the process.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::client::VaultClient;
use crate::config::{Invocation, KeyOptions, Mode};
use crate::error::{Result, TransitError};

/// A service that signs and verifies data with keys it never hands out.
pub trait TransitEngine {
    /// Sign `plaintext` with `key`, returning the opaque signature.
    fn sign(&self, key: &str, plaintext: &[u8], options: &KeyOptions) -> Result<String>;

    /// Check `signature` over `plaintext` with `key`.
    fn verify(
        &self,
        key: &str,
        plaintext: &[u8],
        signature: &str,
        options: &KeyOptions,
    ) -> Result<bool>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOutcome {
    pub input: PathBuf,
    pub signature_path: PathBuf,
    pub signature: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Signed(SignOutcome),
    Verified(Verdict),
}

/// Build a Vault client for the invocation and run it.
pub fn run(invocation: &Invocation) -> Result<Outcome> {
    let client = VaultClient::new(&invocation.vault)?;
    match invocation.mode {
        Mode::Sign => sign(&client, invocation).map(Outcome::Signed),
        Mode::Verify => verify(&client, invocation).map(Outcome::Verified),
    }
}

/// Sign the input file and store the signature.
///
/// The signature file is only created once the engine has answered.
pub fn sign<E: TransitEngine + ?Sized>(engine: &E, invocation: &Invocation) -> Result<SignOutcome> {
    let plaintext = read_file(&invocation.input)?;
    debug!(key = %invocation.key, bytes = plaintext.len(), "signing");

    let signature = engine.sign(&invocation.key, &plaintext, &invocation.key_options)?;
    write_signature(&invocation.signature, &signature)?;
    info!(
        input = %invocation.input.display(),
        signature = %invocation.signature.display(),
        "signature written"
    );

    Ok(SignOutcome {
        input: invocation.input.clone(),
        signature_path: invocation.signature.clone(),
        signature,
    })
}

/// Check the stored signature against the input file.
pub fn verify<E: TransitEngine + ?Sized>(engine: &E, invocation: &Invocation) -> Result<Verdict> {
    let plaintext = read_file(&invocation.input)?;
    let raw = read_file(&invocation.signature)?;

    // Vault signatures are ASCII and Vault rejects an empty one as a
    // malformed request; neither can ever verify.
    if raw.is_empty() {
        info!(signature = %invocation.signature.display(), "signature file is empty");
        return Ok(Verdict::Invalid);
    }
    let signature = match String::from_utf8(raw) {
        Ok(signature) => signature,
        Err(e) => {
            info!(
                signature = %invocation.signature.display(),
                error = %e,
                "signature is not UTF-8"
            );
            return Ok(Verdict::Invalid);
        }
    };

    debug!(key = %invocation.key, bytes = plaintext.len(), "verifying");
    let valid = engine.verify(
        &invocation.key,
        &plaintext,
        &signature,
        &invocation.key_options,
    )?;

    Ok(if valid { Verdict::Valid } else { Verdict::Invalid })
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| TransitError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write_signature(path: &Path, signature: &str) -> Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o666);
    }

    let to_write_error = |source| TransitError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = options.open(path).map_err(to_write_error)?;
    file.write_all(signature.as_bytes()).map_err(to_write_error)?;
    Ok(())
}
