use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::config::{Invocation, KeyOptions, Mode, VaultConfig, DEFAULT_MOUNT, DEFAULT_TOKEN};
use crate::error::Result;

const EXAMPLES: &str = "\
Examples:
  To sign a document/file:
    transit_vault sign -key test123bacd -input main.go -signature main.go.signature -token s.0wtcFid -vaultaddress https://vault1:8200

  To verify a document/file:
    transit_vault verify -key test123bacd -input main.go -signature main.go.signature -token s.0wtcFid -vaultaddress https://vault1:8200";

/// Long flags that may also be written Go-style with a single dash.
const LONG_FLAGS: &[&str] = &[
    "vaultaddress",
    "token",
    "key",
    "input",
    "signature",
    "mount",
    "ca-cert",
    "hash-algorithm",
    "key-version",
    "cmd",
    "help",
    "version",
];

#[derive(Parser, Debug)]
#[command(name = "transit_vault", version)]
#[command(about = "Sign and verify files with a Vault transit key", long_about = None)]
#[command(after_help = EXAMPLES)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log more (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign a file and save the signature
    Sign {
        #[command(flatten)]
        args: TransitArgs,

        /// Key version to sign with (default: latest)
        #[arg(long = "key-version", value_name = "N")]
        key_version: Option<u32>,
    },

    /// Verify a file against a saved signature
    Verify {
        #[command(flatten)]
        args: TransitArgs,
    },
}

#[derive(Args, Debug)]
pub struct TransitArgs {
    /// Vault address e.g. (https://xxx.xxx.xxx.xxx:8200)
    #[arg(long = "vaultaddress", value_name = "URL")]
    pub vault_address: String,

    /// Vault token
    #[arg(long, default_value = DEFAULT_TOKEN)]
    pub token: String,

    /// Key to use to sign/verify
    #[arg(long)]
    pub key: String,

    /// Input file to sign/verify
    #[arg(long, value_name = "PATH")]
    pub input: PathBuf,

    /// Where to save/read the signature
    #[arg(long, value_name = "PATH")]
    pub signature: PathBuf,

    /// Mount path of the transit engine
    #[arg(long, default_value = DEFAULT_MOUNT)]
    pub mount: String,

    /// PEM file with extra CA certificates to trust
    #[arg(long = "ca-cert", value_name = "PEM")]
    pub ca_cert: Option<PathBuf>,

    /// Hash algorithm passed to Vault (e.g. sha2-256)
    #[arg(long = "hash-algorithm", value_name = "ALG")]
    pub hash_algorithm: Option<String>,
}

impl Cli {
    /// Parse raw process arguments, accepting Go-style flags.
    pub fn try_parse_args<I, S>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::try_parse_from(normalize_args(args))
    }

    /// Validate the parsed flags into an immutable invocation.
    pub fn into_invocation(self) -> Result<Invocation> {
        let (mode, args, key_version) = match self.command {
            Commands::Sign { args, key_version } => (Mode::Sign, args, key_version),
            Commands::Verify { args } => (Mode::Verify, args, None),
        };

        let vault = VaultConfig::new(&args.vault_address, &args.token, &args.mount, args.ca_cert)?;
        let key_options = KeyOptions {
            hash_algorithm: args.hash_algorithm,
            key_version,
        };
        Invocation::new(mode, vault, args.key, key_options, args.input, args.signature)
    }
}

/// Rewrite `-flag` to `--flag` for known long flags and turn the flat
/// `-cmd sign|verify` form into a subcommand.
pub fn normalize_args<I, S>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut iter = args.into_iter().map(Into::into);
    let mut out: Vec<String> = iter.next().into_iter().collect();
    let mut command: Option<String> = None;

    while let Some(arg) = iter.next() {
        if arg == "--" {
            out.push(arg);
            out.extend(iter.by_ref());
            break;
        }

        let rewritten = match arg.strip_prefix('-') {
            Some(rest) if !rest.starts_with('-') && is_long_flag(rest) => Some(format!("--{rest}")),
            _ => None,
        };
        let arg = rewritten.unwrap_or(arg);

        if arg == "--cmd" {
            command = iter.next();
            continue;
        }
        if let Some(value) = arg.strip_prefix("--cmd=") {
            command = Some(value.to_string());
            continue;
        }
        out.push(arg);
    }

    if let Some(command) = command {
        let at = out.len().min(1);
        out.insert(at, command);
    }
    out
}

fn is_long_flag(arg: &str) -> bool {
    let name = arg.split_once('=').map_or(arg, |(name, _)| name);
    LONG_FLAGS.contains(&name)
}
