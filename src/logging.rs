//! Global `tracing` subscriber setup.
//!
//! `RUST_LOG`, when set and valid, takes precedence over the configured
//! filter directive.

use crate::config::LoggingConfig;

use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, EnvFilter};

const FALLBACK_DIRECTIVE: &str = "info";

pub fn init(config: &LoggingConfig) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(config.ansi).with_target(true))
        .with(build_filter(&config.filter))
        .try_init()
}

fn build_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_DIRECTIVE))
}
