//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Bundles a multi-file OpenAPI v3 document into a single self-contained YAML document
#[derive(Parser, Debug)]
#[command(name = "oasbundle")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "OASBUNDLE_LOG_LEVEL", global = true)]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "OASBUNDLE_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Template used by `serve` to render the bundled document
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Template {
    /// Swagger UI
    SwaggerUi,
    /// Redoc
    Redoc,
}

/// Top-level subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bundle a multi-file OpenAPI document into one YAML document
    Merge {
        /// Root OpenAPI document to bundle
        file: PathBuf,

        /// Write the bundled document here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Bundle a document and serve it with an interactive viewer
    Serve {
        /// Root OpenAPI document to bundle and serve
        file: PathBuf,

        /// Viewer template
        #[arg(long, value_enum, default_value_t = Template::SwaggerUi)]
        template: Template,

        /// Base URL path the viewer and bundled-document endpoint are mounted under
        #[arg(long)]
        base_url: Option<String>,

        /// Host to bind to
        #[arg(long, env = "OASBUNDLE_HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(long, env = "OASBUNDLE_PORT")]
        port: Option<u16>,

        /// Path to configuration file (YAML)
        #[arg(short, long, env = "OASBUNDLE_CONFIG")]
        config: Option<PathBuf>,
    },
}
