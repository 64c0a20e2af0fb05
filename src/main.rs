use colored::Colorize;
use tracing::Level;
use transit_vault::cli::Cli;
use transit_vault::transit::{self, Outcome, Verdict};
use transit_vault::{exit_codes, Result};

fn main() {
    let cli = Cli::try_parse_args(std::env::args()).unwrap_or_else(|e| e.exit());
    init_logging(cli.verbose);

    let code = match execute(cli) {
        Ok(outcome) => report(&outcome),
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            e.exit_code()
        }
    };

    std::process::exit(code);
}

fn execute(cli: Cli) -> Result<Outcome> {
    let invocation = cli.into_invocation()?;
    invocation.log_warnings();
    transit::run(&invocation)
}

fn report(outcome: &Outcome) -> i32 {
    match outcome {
        Outcome::Signed(signed) => {
            println!(
                "File {} correctly signed. Signature is in file {}",
                signed.input.display(),
                signed.signature_path.display()
            );
            exit_codes::SUCCESS
        }
        Outcome::Verified(Verdict::Valid) => {
            println!("Signature is valid! {}", "OK".green().bold());
            exit_codes::SUCCESS
        }
        Outcome::Verified(Verdict::Invalid) => {
            println!("Signature is not valid! {}", "KO".red().bold());
            exit_codes::INVALID_SIGNATURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
