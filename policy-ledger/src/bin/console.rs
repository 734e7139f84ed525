//! Interactive policy ledger console
//!
//! Reads one command per line from stdin:
//!
//! ```text
//! submit --holder "Jane Doe" --premium 120.50 --policy-type flight-delay
//! chain [--json]
//! verify
//! reset
//! metrics
//! exit
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use policy_ledger::{
    config::LoggingConfig,
    metrics::Metrics,
    types::PolicyType,
    view::ChainView,
    Config, Error, Ledger, LedgerHandle,
};
use rust_decimal::Decimal;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Policy ledger console
#[derive(Debug, Parser)]
#[command(name = "ledger-console", version, about)]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

/// A single console line
#[derive(Debug, Parser)]
#[command(multicall = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Issue a policy and seal it into a new block
    Submit {
        /// Policy holder name
        #[arg(long)]
        holder: String,

        /// Premium amount
        #[arg(long)]
        premium: Decimal,

        /// Policy category
        #[arg(long, value_enum)]
        policy_type: PolicyKind,
    },

    /// List sealed blocks, newest first
    Chain {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the chain integrity audit
    Verify,

    /// Discard the ledger and start a new chain
    Reset,

    /// Print Prometheus metrics
    Metrics,

    /// Leave the console
    #[command(alias = "quit")]
    Exit,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyKind {
    FlightDelay,
    CropInsurance,
    CryptoTheft,
}

impl From<PolicyKind> for PolicyType {
    fn from(kind: PolicyKind) -> Self {
        match kind {
            PolicyKind::FlightDelay => PolicyType::FlightDelay,
            PolicyKind::CropInsurance => PolicyType::CropInsurance,
            PolicyKind::CryptoTheft => PolicyType::CryptoTheft,
        }
    }
}

fn init_tracing(logging: &LoggingConfig, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json || logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Split a line into words, keeping double-quoted segments together
fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quoted {
        return Err("unterminated quote".to_string());
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Returns false when the session should end
async fn dispatch(command: Command, ledger: &LedgerHandle, config: &Config) -> anyhow::Result<bool> {
    match command {
        Command::Submit {
            holder,
            premium,
            policy_type,
        } => {
            match ledger
                .issue_policy(
                    &config.issuance,
                    &holder,
                    premium,
                    policy_type.into(),
                    config.ledger.seal_proof,
                )
                .await
            {
                Ok(block) => println!("Successfully added Block #{}", block.index()),
                Err(Error::Validation(message)) => println!("{}", message),
                Err(e) => return Err(e.into()),
            }
        }

        Command::Chain { json } => {
            let view = ChainView::from_blocks(&ledger.chain().await?);
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print!("{}", view);
            }
        }

        Command::Verify => {
            println!("{}", ledger.audit().await?);
        }

        Command::Reset => {
            ledger.reset().await?;
            println!("Ledger reset: genesis block re-created.");
        }

        Command::Metrics => {
            print!("{}", ledger.metrics().render()?);
        }

        Command::Exit => return Ok(false),
    }

    Ok(true)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    init_tracing(&config.logging, cli.json_logs);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        "Starting policy ledger console"
    );

    let ledger = policy_ledger::spawn_ledger_actor(
        Ledger::from_config(&config),
        config.actor.mailbox_capacity,
        Metrics::new()?,
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("ledger> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let words = match split_words(&line) {
            Ok(words) if words.is_empty() => continue,
            Ok(words) => words,
            Err(e) => {
                println!("error: {}", e);
                continue;
            }
        };

        let command = match Line::try_parse_from(words) {
            Ok(line) => line.command,
            Err(e) => {
                // Help and usage errors are printed, not fatal
                let _ = e.print();
                continue;
            }
        };

        if !dispatch(command, &ledger, &config).await? {
            break;
        }
    }

    ledger.shutdown().await?;
    tracing::info!("Shutting down policy ledger console");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words() {
        assert_eq!(
            split_words(r#"submit --holder "Jane Doe" --premium 10"#).unwrap(),
            vec!["submit", "--holder", "Jane Doe", "--premium", "10"]
        );
        assert_eq!(split_words("   ").unwrap(), Vec::<String>::new());
        assert!(split_words(r#"submit --holder "Jane"#).is_err());
    }

    #[test]
    fn test_parse_submit() {
        let line = Line::try_parse_from([
            "submit",
            "--holder",
            "Alice",
            "--premium",
            "120.50",
            "--policy-type",
            "crop-insurance",
        ])
        .unwrap();

        match line.command {
            Command::Submit {
                holder,
                premium,
                policy_type,
            } => {
                assert_eq!(holder, "Alice");
                assert_eq!(premium, Decimal::new(12050, 2));
                assert_eq!(PolicyType::from(policy_type), PolicyType::CropInsurance);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_quit_alias() {
        let line = Line::try_parse_from(["quit"]).unwrap();
        assert!(matches!(line.command, Command::Exit));
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
        Line::command().debug_assert();
    }
}
