use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use bizstruct_cli::{commands, logging};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Compares running a Malaysian business as a sole proprietorship or as a
/// Sdn Bhd.
#[derive(Debug, Parser)]
#[command(name = "bizstruct", version, about)]
struct Cli {
    /// TOML file overriding the YA2025 rules.
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// CSV file replacing bracket or contribution tables.
    #[arg(long, global = true)]
    rate_tables: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `bizstruct_core=trace`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append log output to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compare the two structures for a TOML profile.
    Compare {
        profile: PathBuf,

        /// Print the cash-flow waterfalls.
        #[arg(long)]
        waterfall: bool,
    },
    /// Compare every profile in a CSV file and print one summary line each.
    Batch { profiles: PathBuf },
    /// Print the rule tables in effect.
    Rules,
}

// ─── entry point ─────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level.as_deref(), cli.log_file.as_deref())?;

    let rules = commands::load_rules(cli.rules.as_deref(), cli.rate_tables.as_deref())?;
    debug!(year = rules.year_of_assessment, "rules ready");

    match cli.command {
        Command::Compare { profile, waterfall } => {
            print!("{}", commands::compare(&rules, &profile, waterfall)?);
        }
        Command::Batch { profiles } => {
            let outcome = commands::batch(&rules, &profiles)?;
            print!("{}", outcome.summary);
            for report in &outcome.rejected {
                eprint!("{report}");
            }
            if !outcome.rejected.is_empty() {
                anyhow::bail!("{} profile(s) had invalid inputs", outcome.rejected.len());
            }
        }
        Command::Rules => print!("{}", commands::rules_report(&rules)),
    }

    Ok(())
}
