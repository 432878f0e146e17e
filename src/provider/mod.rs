pub mod anthropic;
pub mod ollama;

pub use anthropic::AnthropicProvider;
pub use ollama::OllamaProvider;

use std::time::Duration;

use crate::config::user_config::{ProviderType, UserConfig};
use crate::error::ProviderError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// A vision-capable text generation service. Each call is one blocking
/// round trip; implementations do not retry.
pub trait VisionProvider: Send + Sync {
    /// Generate text for `request`. An empty string is a valid reply.
    fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError>;
    fn name(&self) -> &str;
    fn model(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub image: Option<ImageAttachment>,
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
            temperature,
        }
    }

    pub fn with_image(prompt: impl Into<String>, image: &ImageAttachment, temperature: f32) -> Self {
        Self {
            prompt: prompt.into(),
            image: Some(image.clone()),
            temperature,
        }
    }
}

/// Raw image bytes ready to be sent alongside a prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttachment {
    pub bytes: Vec<u8>,
    /// MIME type, e.g. `image/png`.
    pub media_type: String,
}

impl ImageAttachment {
    pub fn base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

/// Resolved provider settings after merging user config and command-line flags.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub provider_type: ProviderType,
    pub model: Option<String>,
    pub url: Option<String>,
    pub api_key_env: Option<String>,
    pub timeout: Option<Duration>,
}

impl ProviderSettings {
    /// Start from the user-level config, if any.
    pub fn from_user_config(config: Option<UserConfig>) -> Self {
        let Some(config) = config else {
            return Self::default();
        };
        let p = config.provider;
        Self {
            provider_type: p.provider_type,
            model: p.model,
            url: p.url,
            api_key_env: p.api_key_env,
            timeout: p.timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Build the configured provider.
///
/// Ollama needs nothing beyond a reachable URL. Anthropic requires its API key
/// variable (`ANTHROPIC_API_KEY` unless overridden) to be set and non-empty.
pub fn discover_provider(
    settings: &ProviderSettings,
) -> Result<Box<dyn VisionProvider>, ProviderError> {
    let timeout = settings.timeout.unwrap_or(DEFAULT_TIMEOUT);
    match settings.provider_type {
        ProviderType::Ollama => Ok(Box::new(OllamaProvider::new(
            settings.url.clone(),
            settings.model.clone(),
            timeout,
        ))),
        ProviderType::Anthropic => {
            let key_env = settings
                .api_key_env
                .clone()
                .unwrap_or_else(|| "ANTHROPIC_API_KEY".to_string());
            match std::env::var(&key_env) {
                Ok(api_key) if !api_key.is_empty() => Ok(Box::new(AnthropicProvider::new(
                    api_key,
                    settings.model.clone(),
                    timeout,
                ))),
                _ => crate::error::provider_error::MissingApiKeySnafu { var: key_env }.fail(),
            }
        }
    }
}
