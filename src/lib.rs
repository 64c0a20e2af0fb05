pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod transit;

pub use client::VaultClient;
pub use config::{Invocation, KeyOptions, Mode, VaultConfig};
pub use error::{Result, TransitError};
pub use transit::{Outcome, SignOutcome, TransitEngine, Verdict};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
