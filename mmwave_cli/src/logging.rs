//! Tracing setup: console layer plus an optional file sink from `[logging]`.

use crate::cli::{Cli, FILE_GUARD};
use eyre::{Result, WrapErr};
use mmwave_config::Logging;
use std::path::Path;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

pub fn init_tracing(cli: &Cli, logging: &Logging) -> Result<()> {
    // RUST_LOG wins over --log-level
    let console_filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(&cli.log_level)
            .wrap_err_with(|| format!("invalid --log-level '{}'", cli.log_level))?,
    };
    let console = if cli.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    }
    .with_filter(console_filter);

    let file = match logging.file.as_deref() {
        Some(path) => {
            let level = logging
                .level
                .as_deref()
                .unwrap_or("info")
                .parse::<LevelFilter>()
                .wrap_err("logging.level must be one of off|error|warn|info|debug|trace")?;
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file '{}' has no file name", path.display()))?;
            let appender = match logging.rotation.as_deref().unwrap_or("never") {
                "daily" => tracing_appender::rolling::daily(dir, name),
                "hourly" => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_filter(level),
            )
        }
        None => None,
    };

    // A second init (tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init();
    Ok(())
}
