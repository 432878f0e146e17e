use std::time::Duration;

use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::error::provider_error::{ApiSnafu, HttpSnafu};
use crate::error::ProviderError;
use crate::provider::{GenerationRequest, VisionProvider};

pub const DEFAULT_URL: &str = "http://localhost:11434/api/chat";
pub const DEFAULT_MODEL: &str = "qwen3-vl:30b";

/// Local Ollama server, spoken to through its non-streaming chat endpoint.
pub struct OllamaProvider {
    url: String,
    model: String,
    agent: ureq::Agent,
}

impl OllamaProvider {
    pub fn new(url: Option<String>, model: Option<String>, timeout: Duration) -> Self {
        Self {
            url: url.unwrap_or_else(|| DEFAULT_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

// -- Ollama API request/response types --

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    options: ChatOptions,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ChatReply>,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

fn build_body<'a>(model: &'a str, request: &'a GenerationRequest) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content: &request.prompt,
            images: request.image.iter().map(|i| i.base64()).collect(),
        }],
        options: ChatOptions {
            temperature: request.temperature,
        },
        stream: false,
    }
}

impl VisionProvider for OllamaProvider {
    fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let body = build_body(&self.model, request);

        match self.agent.post(&self.url).send_json(&body) {
            Ok(resp) => {
                let chat: ChatResponse =
                    resp.into_json().map_err(|e| ProviderError::ParseResponse {
                        message: e.to_string(),
                        location: snafu::Location::default(),
                    })?;
                Ok(chat
                    .message
                    .map(|m| m.content.trim().to_string())
                    .unwrap_or_default())
            }
            Err(ureq::Error::Status(code, resp)) => {
                let error_body = resp.into_string().unwrap_or_default();
                let message = serde_json::from_str::<ErrorResponse>(&error_body)
                    .map(|e| format!("status {code}: {}", e.error))
                    .unwrap_or_else(|_| format!("status {code}: {error_body}"));
                ApiSnafu { message }.fail()
            }
            Err(ureq::Error::Transport(t)) => Err(Box::new(t)).context(HttpSnafu),
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ImageAttachment;

    #[test]
    fn test_body_without_image() {
        let request = GenerationRequest::text("Which diagram?", 0.1);
        let body = serde_json::to_value(build_body("llava", &request)).unwrap();
        assert_eq!(body["model"], "llava");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Which diagram?");
        assert!(body["messages"][0].get("images").is_none());
        assert!((body["options"]["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_body_with_image() {
        let image = ImageAttachment {
            bytes: vec![1, 2, 3],
            media_type: "image/png".to_string(),
        };
        let request = GenerationRequest::with_image("Describe", &image, 0.0);
        let body = serde_json::to_value(build_body("llava", &request)).unwrap();
        assert_eq!(body["messages"][0]["images"][0], "AQID");
        assert_eq!(body["options"]["temperature"], 0.0);
    }

    #[test]
    fn test_defaults() {
        let provider = OllamaProvider::new(None, None, Duration::from_secs(5));
        assert_eq!(provider.url, DEFAULT_URL);
        assert_eq!(provider.model(), DEFAULT_MODEL);
    }
}
