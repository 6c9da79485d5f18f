// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `sitepipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sitepipe",
    version,
    about = "Build a static site, serve it with live reload, and rebuild on file changes.",
    long_about = None
)]
pub struct CliArgs {
    /// Pipeline to run. Defaults to `dev` when omitted.
    #[command(subcommand)]
    pub command: Option<PipelineCommand>,

    /// Path to the config file (TOML).
    ///
    /// When the file does not exist, built-in defaults are used
    /// (src/ + public/ + dist/ layout).
    #[arg(long, value_name = "PATH", default_value = "Sitepipe.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Entry pipelines exposed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum PipelineCommand {
    /// Build everything once, start the dev server, watch and rebuild.
    Dev,
    /// Delete generated output (dist plus built files under the serve root).
    Clean,
    /// Produce the production bundle under the dist root.
    Build,
    /// Convert raster images under the serve root to webp, in place.
    Webp,
    /// Convert raster images under the dist root to webp, in place.
    WebpBuild,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
