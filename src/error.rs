use snafu::Snafu;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub), module(annotator_error))]
pub enum AnnotatorError {
    #[snafu(display("cannot read input document {}: {source}", path.display()))]
    ReadDocument {
        path: PathBuf,
        source: std::io::Error,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("cannot write {}: {source}", path.display()))]
    WriteOutput {
        path: PathBuf,
        source: std::io::Error,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("config error: {source}"))]
    Config {
        source: ConfigError,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("provider error: {source}"))]
    Provider {
        source: ProviderError,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("image error: {source}"))]
    Image {
        source: ImageError,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("JSON error: {source}"))]
    Json {
        source: serde_json::Error,
        #[snafu(implicit)]
        location: snafu::Location,
    },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub), module(config_error))]
pub enum ConfigError {
    #[snafu(display("cannot read category configuration {}: {source}", path.display()))]
    ReadCategories {
        path: PathBuf,
        source: std::io::Error,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("malformed category configuration {}: {source}", path.display()))]
    ParseCategories {
        path: PathBuf,
        source: serde_json::Error,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("no categories in configuration"))]
    EmptyCategories {
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("could not determine home directory"))]
    NoHomeDirectory {
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("cannot read {path}: {source}"))]
    ReadUserConfig {
        path: String,
        source: std::io::Error,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("invalid user config: {source}"))]
    ParseUserConfig {
        source: toml::de::Error,
        #[snafu(implicit)]
        location: snafu::Location,
    },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub), module(provider_error))]
pub enum ProviderError {
    #[snafu(display("HTTP error: {source}"))]
    Http {
        source: Box<ureq::Transport>,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("API error: {message}"))]
    Api {
        message: String,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("failed to parse response: {message}"))]
    ParseResponse {
        message: String,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("API key variable {var} is not set"))]
    MissingApiKey {
        var: String,
        #[snafu(implicit)]
        location: snafu::Location,
    },
}

/// Why an image reference could not be sent to the model.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub), module(image_error))]
pub enum ImageError {
    #[snafu(display("image file not found: {}", resolved.display()))]
    Missing {
        raw_path: String,
        resolved: PathBuf,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("invalid image {}: {message}", resolved.display()))]
    Invalid {
        raw_path: String,
        resolved: PathBuf,
        message: String,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("image {} is {size} bytes, limit is {limit}", resolved.display()))]
    Oversized {
        resolved: PathBuf,
        size: u64,
        limit: u64,
        #[snafu(implicit)]
        location: snafu::Location,
    },
}

impl ImageError {
    /// Placeholder description written in place of a model-generated one.
    pub fn diagnostic(&self) -> String {
        match self {
            ImageError::Missing { raw_path, .. } => {
                format!("⚠️ Image file not found: `{raw_path}`")
            }
            ImageError::Invalid { raw_path, .. } => {
                format!("⚠️ Invalid image file: `{raw_path}`")
            }
            ImageError::Oversized { limit, .. } => {
                format!("⚠️ Image too large (>{} MB)", limit / 1024 / 1024)
            }
        }
    }
}

pub type Result<T, E = AnnotatorError> = std::result::Result<T, E>;
