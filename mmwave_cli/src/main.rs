//! `mmwave` binary: replay recordings or drive the simulated radar through the
//! tracker and print entity updates.

mod cli;
mod error_fmt;
mod logging;
mod output;
mod run;

use clap::Parser;
use cli::{Cli, Commands, JSON_MODE};
use error_fmt::{exit_code_for_error, format_error_json, humanize};
use eyre::{Result, WrapErr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        tracing::debug!(error = ?e, "exiting with error");
        std::process::exit(exit_code_for_error(&e));
    }
}

fn real_main(cli: Cli) -> Result<()> {
    if !cli.json {
        // Only the first install wins; a failure leaves the default hook in place.
        let _ = color_eyre::install();
    }
    let cfg = run::load_config(&cli.config)?;
    logging::init_tracing(&cli, &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "config loaded");

    match cli.cmd {
        Commands::Replay { ref frames, ref limits } => {
            let summary = run::run_replay(&cfg, frames, limits, cli.json)?;
            summary.print(cli.json);
        }
        Commands::Simulate {
            people,
            seed,
            period_ms,
            dropout,
            duration_ms,
            realtime,
            ref limits,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = shutdown.clone();
            ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
                .wrap_err("failed to install Ctrl-C handler")?;
            let opts = run::SimOptions {
                people: usize::from(people),
                seed,
                period_ms,
                dropout,
                duration_ms,
                realtime,
            };
            let summary = run::run_simulate(&cfg, &opts, limits, cli.json, shutdown)?;
            summary.print(cli.json);
        }
        Commands::CheckConfig => run::check_config(&cfg, cli.json)?,
    }
    Ok(())
}
