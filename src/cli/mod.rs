pub mod annotate;
pub mod probe;
pub mod schema;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use snafu::ResultExt;

use crate::config::user_config::{ProviderType, UserConfig};
use crate::error::{annotator_error, Result};
use crate::provider::ProviderSettings;

#[derive(Parser)]
#[command(
    name = "diagram-annotator",
    version,
    about = "Technical descriptions for diagrams embedded in markdown"
)]
pub struct Cli {
    /// Show per-stage progress
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify and describe every diagram in a markdown file
    Annotate {
        /// Source markdown file
        #[arg(long)]
        input: PathBuf,

        /// Where to write the annotated markdown
        #[arg(long)]
        output: PathBuf,

        /// Where to write the diagram summary
        #[arg(long)]
        summary: PathBuf,

        /// JSON file with categories and description prompts
        #[arg(long)]
        categories: PathBuf,

        /// Characters of context to analyze around images
        #[arg(long, default_value_t = crate::config::DEFAULT_CONTEXT_SIZE)]
        context_size: usize,

        /// Skip images larger than this many MiB
        #[arg(long, default_value_t = 5)]
        max_image_mb: u64,

        /// Classify from the image alone, without the context prediction stage
        #[arg(long)]
        no_context: bool,

        #[command(flatten)]
        provider: ProviderArgs,
    },

    /// Ask the model for a short description of one image
    Probe {
        /// Image file to describe
        image: PathBuf,

        #[command(flatten)]
        provider: ProviderArgs,
    },

    /// Print the JSON Schema of the category configuration file
    Schema,
}

/// Model service overrides shared by subcommands that call a model.
#[derive(Args, Debug, Clone, Default)]
pub struct ProviderArgs {
    /// Model service to use (default from ~/.diagram-annotator.toml, else ollama)
    #[arg(long, value_enum)]
    pub provider: Option<ProviderType>,

    /// Vision model name
    #[arg(long)]
    pub model: Option<String>,

    /// Chat endpoint URL (ollama only)
    #[arg(long)]
    pub url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl ProviderArgs {
    /// Merge flags over the user-level config.
    pub fn settings(&self) -> Result<ProviderSettings> {
        let user = UserConfig::load().context(annotator_error::ConfigSnafu)?;
        Ok(self.apply(ProviderSettings::from_user_config(user)))
    }

    fn apply(&self, mut settings: ProviderSettings) -> ProviderSettings {
        if let Some(provider) = self.provider {
            settings.provider_type = provider;
        }
        if let Some(model) = &self.model {
            settings.model = Some(model.clone());
        }
        if let Some(url) = &self.url {
            settings.url = Some(url.clone());
        }
        if let Some(secs) = self.timeout_secs {
            settings.timeout = Some(Duration::from_secs(secs));
        }
        settings
    }
}
