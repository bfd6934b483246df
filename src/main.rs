//! `oasbundle` — bundles a multi-file OpenAPI v3 document into one
//! self-contained YAML document, and can serve it with an interactive
//! viewer.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use oasbundle::cli::{Cli, Command, Template};
use oasbundle::config::Config;
use oasbundle::{Result, serve, setup_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Command::Merge { file, output } => run_merge(&file, output.as_deref()),
        Command::Serve {
            file,
            template,
            base_url,
            host,
            port,
            config,
        } => run_serve(file, template, base_url, host, port, config.as_deref()).await,
    };

    if let Err(e) = result {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run_merge(file: &Path, output: Option<&Path>) -> Result<()> {
    info!(file = %file.display(), "Bundling OpenAPI document");
    let bytes = oasbundle_core::open(file)?;

    match output {
        Some(out) => {
            std::fs::write(out, &bytes)?;
            info!(output = %out.display(), "Wrote bundled document");
        }
        None => {
            std::io::stdout().write_all(&bytes)?;
        }
    }

    Ok(())
}

async fn run_serve(
    file: std::path::PathBuf,
    template: Template,
    base_url: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = Config::load(config_path)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(base_url) = base_url {
        config.server.base_url = base_url;
    }

    serve::run(file, template, config.server).await
}
