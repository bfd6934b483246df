//! `oasbundle` — OpenAPI v3 multi-file bundler
//!
//! Merges a multi-file OpenAPI v3 document (a root file plus whatever it
//! reaches through relative `$ref`s) into a single self-contained YAML
//! document, and optionally serves the result with an interactive viewer.
//!
//! The document model, pointer algebra, and resolver live in
//! [`oasbundle_core`]; this crate is the CLI and HTTP surface around it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod serve;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Set up the global tracing subscriber.
///
/// # Errors
///
/// Never actually fails today, but returns a `Result` so a future
/// misconfigured filter can be reported the same way every other start-up
/// failure is.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber.with(fmt::layer().json()).init();
        }
        _ => {
            subscriber.with(fmt::layer()).init();
        }
    }

    Ok(())
}
