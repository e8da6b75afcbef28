// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use cmd::commands::{build, check, watch};
use cmd::common::{SiteArgs, SiteContext, load_dotenv};
use sitegen::SiteEnv;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "site")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Log build detail (overrides SITEGEN_LOG with debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the site once
    Build(SiteArgs),
    /// Build, then rebuild whenever a watched file changes
    Watch(WatchArgs),
    /// Validate the configuration and show what a build would use
    Check(SiteArgs),
}

#[derive(Args)]
struct WatchArgs {
    #[command(flatten)]
    site: SiteArgs,

    /// Polling interval in milliseconds
    #[arg(long, default_value_t = 500)]
    interval_ms: u64,
}

#[allow(clippy::print_stdout)]
fn main() -> Result<()> {
    // Loaded before logging starts so .env can set SITEGEN_LOG
    let dotenv = load_dotenv();

    let cli = Cli::parse();
    if cli.verbose {
        diagnostics::init_with("debug");
    } else {
        diagnostics::init();
    }
    if let Err(e) = dotenv {
        let reason = e.to_string();
        diagnostics::warn!("Ignoring .env: {reason}", reason: reason.as_str());
    }

    let env = SiteEnv::from_env();

    match cli.command {
        Commands::Build(args) => {
            let ctx = SiteContext::load(&args)?;
            let report = build::build_command(&ctx, &env)?;
            println!("{}", build::summary(&ctx, &report));
        }
        Commands::Watch(args) => {
            let ctx = SiteContext::load(&args.site)?;
            watch::watch_command(&ctx, &env, Duration::from_millis(args.interval_ms))?;
        }
        Commands::Check(args) => {
            let ctx = SiteContext::load(&args)?;
            let report = check::check_command(&ctx)?;
            for line in report.lines(&ctx) {
                println!("{}", line);
            }
        }
    }
    Ok(())
}
