use std::time::Duration;

use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::error::provider_error::{ApiSnafu, HttpSnafu};
use crate::error::ProviderError;
use crate::provider::{GenerationRequest, VisionProvider};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 2048;

pub struct AnthropicProvider {
    api_key: String,
    model: String,
    agent: ureq::Agent,
}

impl AnthropicProvider {
    pub fn new(api_key: String, model: Option<String>, timeout: Duration) -> Self {
        Self {
            api_key,
            model: model.unwrap_or_else(|| "claude-sonnet-4-5-20250929".to_string()),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

// -- Anthropic API request/response types --

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ApiMessage<'a>>,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: Vec<ApiContentBlock<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContentBlock<'a> {
    Image { source: ImageSource<'a> },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'a str,
    data: String,
}

#[derive(Deserialize)]
struct ApiResponse {
    content: Vec<ApiReplyBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiReplyBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn build_body<'a>(model: &'a str, request: &'a GenerationRequest) -> ApiRequest<'a> {
    let mut content = Vec::new();
    if let Some(image) = &request.image {
        content.push(ApiContentBlock::Image {
            source: ImageSource {
                kind: "base64",
                media_type: &image.media_type,
                data: image.base64(),
            },
        });
    }
    content.push(ApiContentBlock::Text {
        text: &request.prompt,
    });
    ApiRequest {
        model,
        max_tokens: MAX_TOKENS,
        temperature: request.temperature,
        messages: vec![ApiMessage {
            role: "user",
            content,
        }],
    }
}

fn reply_text(blocks: Vec<ApiReplyBlock>) -> String {
    blocks
        .into_iter()
        .filter_map(|b| match b {
            ApiReplyBlock::Text { text } => Some(text),
            ApiReplyBlock::Other => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

impl VisionProvider for AnthropicProvider {
    fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let body = build_body(&self.model, request);

        match self
            .agent
            .post(API_URL)
            .set("x-api-key", &self.api_key)
            .set("anthropic-version", ANTHROPIC_VERSION)
            .set("content-type", "application/json")
            .send_json(&body)
        {
            Ok(resp) => {
                let api_resp: ApiResponse =
                    resp.into_json().map_err(|e| ProviderError::ParseResponse {
                        message: e.to_string(),
                        location: snafu::Location::default(),
                    })?;
                Ok(reply_text(api_resp.content))
            }
            Err(ureq::Error::Status(code, resp)) => {
                let error_body = resp.into_string().unwrap_or_default();
                let message = serde_json::from_str::<ApiErrorResponse>(&error_body)
                    .map(|e| e.error.message)
                    .unwrap_or_else(|_| format!("status {code}: {error_body}"));
                ApiSnafu { message }.fail()
            }
            Err(ureq::Error::Transport(t)) => Err(Box::new(t)).context(HttpSnafu),
        }
    }

    fn name(&self) -> &str {
        "anthropic"
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
    fn test_image_block_precedes_text() {
        let image = ImageAttachment {
            bytes: vec![0xff],
            media_type: "image/jpeg".to_string(),
        };
        let request = GenerationRequest::with_image("Classify", &image, 0.0);
        let body = serde_json::to_value(build_body("claude", &request)).unwrap();
        let content = &body["messages"][0]["content"];
        assert_eq!(content[0]["type"], "image");
        assert_eq!(content[0]["source"]["type"], "base64");
        assert_eq!(content[0]["source"]["media_type"], "image/jpeg");
        assert_eq!(content[1]["type"], "text");
        assert_eq!(content[1]["text"], "Classify");
    }

    #[test]
    fn test_reply_text_skips_other_blocks() {
        let resp: ApiResponse = serde_json::from_str(
            r#"{"content": [{"type": "thinking", "thinking": "..."}, {"type": "text", "text": " flowchart \n"}]}"#,
        )
        .unwrap();
        assert_eq!(reply_text(resp.content), "flowchart");
    }
}
