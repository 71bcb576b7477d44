// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Subscriber initialisation

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::{LogFormat, LoggingConfig};

/// Keeps the file writer alive; drop it last so buffered lines are flushed
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Filter for `config` with the debug flags layered on top
///
/// `RUST_LOG` wins when set.
pub fn build_filter(config: &LoggingConfig, flags: &CrateDebugFlags) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directives = flags.to_filter_string(&config.level);
    EnvFilter::try_new(&directives).with_context(|| format!("invalid log filter '{}'", directives))
}

/// Install the global subscriber
///
/// `log` records from the link crates are bridged into `tracing`. Fails if a
/// global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig, flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    let filter = build_filter(config, flags)?;

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    layers.push(match config.format {
        LogFormat::Text => fmt::layer().with_target(true).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(false).boxed(),
    });

    #[cfg(feature = "file-logging")]
    let file_guard = match &config.file_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            let file_name = format!("aci_{}.log", chrono::Local::now().format("%Y%m%d_%H%M%S"));
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(fmt::layer().with_writer(writer).with_ansi(false).boxed());
            Some(guard)
        }
        None => None,
    };

    Registry::default()
        .with(layers)
        .with(filter)
        .try_init()
        .context("a global logger is already installed")?;

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guard: file_guard,
    })
}
