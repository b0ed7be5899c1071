//! CLI module for Lore
//!
//! Command-line parsing for the lore-server binary (clap) and the
//! `config` subcommand, which prints and validates the effective settings.

pub mod output;

use crate::utils::toml_config::{LoreConfig, ProviderConfig};
use clap::{Parser, Subcommand};
use output::Output;
use std::path::{Path, PathBuf};

/// Lore - research job server
///
/// Accepts a prompt (optionally with an image and context text), researches it
/// against an encyclopedia and produces a cited report as downloadable files.
#[derive(Parser, Debug)]
#[command(
    name = "lore-server",
    version,
    about = "Lore - research job server",
    long_about = "Accepts research prompts over HTTP, runs them as background jobs and\n\
                  serves the resulting markdown report, PDF and source trace.\n\n\
                  Run without arguments to start the server.",
    after_help = "EXAMPLES:\n    \
                  lore-server                            # Start the server (lore.toml optional)\n    \
                  lore-server --config my.toml           # Use a custom config file\n    \
                  lore-server config --validate          # Check a config file and exit"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "lore.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the effective configuration
    Config {
        /// Exit with an error if the configuration is invalid
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn output(&self) -> Output {
        if self.no_color {
            Output::no_color()
        } else {
            Output::new()
        }
    }
}

/// Print the configuration summary used by `lore-server config`.
pub fn print_config(output: &Output, path: &Path, config: &LoreConfig) {
    output.header("Configuration");
    output.kv("file", &path.display().to_string());
    if !path.exists() {
        output.warning("file not found, showing defaults");
    }

    output.header("Server");
    output.kv("address", &format!("{}:{}", config.server.host, config.server.port));
    output.kv("log", &format!("{} ({})", config.server.log_level, config.server.log_format));
    output.kv("max upload bytes", &config.server.max_upload_bytes.to_string());

    output.header("LLM");
    match &config.llm.provider {
        ProviderConfig::OpenAI {
            api_key_env,
            api_base,
            model,
        } => {
            output.kv("provider", "openai");
            output.kv("api base", api_base);
            output.kv("model", model);
            output.kv("api key env", api_key_env);
        }
        ProviderConfig::Ollama { base_url, model } => {
            output.kv("provider", "ollama");
            output.kv("base url", base_url);
            output.kv("model", model);
        }
    }
    output.kv("request timeout", &format!("{} s", config.llm.request_timeout_secs));

    output.header("Research");
    output.kv("knowledge api", &config.knowledge.api_url);
    output.kv(
        "titles",
        &format!(
            "search {}, fetch {}",
            config.research.search_limit, config.research.top_k
        ),
    );
    output.kv(
        "context",
        &format!(
            "threshold {}, chunk {}, look-back {}",
            config.context.threshold, config.context.chunk_size, config.context.lookback
        ),
    );

    output.header("Jobs");
    output.kv("workers", &config.jobs.workers.to_string());
    output.kv("timeout", &format!("{} s", config.jobs.job_timeout_secs));
}
