//! Process exit codes. These are part of the CLI contract.

pub const SUCCESS: i32 = 0;
pub const INVALID_SIGNATURE: i32 = 1; // Signature checked and rejected
pub const USAGE: i32 = 2; // Bad flags or configuration (same code clap uses)
pub const IO_ERROR: i32 = 3; // Input/signature/CA file unreadable or unwritable
pub const REMOTE_ERROR: i32 = 4; // Vault unreachable, denied, or errored
