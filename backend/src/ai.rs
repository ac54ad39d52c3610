//! Image analysis through the OpenRouter chat completions API.
//!
//! The model is asked for a filename, alt text and description as JSON. The
//! first `{...}` block of the reply is parsed; anything else yields an empty
//! suggestion. Without an API key no request is made at all.

use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use common::model::media::MediaSuggestion;
use log::{debug, warn};
use regex::Regex;
use serde::Deserialize;
use serde_json::json;

use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};

const ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
const APP_TITLE: &str = "iSPEAK Media Library";

const PROMPT: &str = "Analyze this image and provide:
1. A descriptive filename (lowercase, hyphens, no extension, max 50 chars)
2. An SEO-friendly alt text (max 125 chars)
3. A brief description (max 200 chars)

Respond in JSON format only:
{\"filename\": \"...\", \"alt\": \"...\", \"description\": \"...\"}";

static JSON_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[\s\S]*\}").expect("valid JSON block regex"));

#[derive(Clone)]
pub struct ImageAnalyzer {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
}

#[derive(Deserialize)]
struct RawSuggestion {
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    alt: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

fn clip(value: Option<String>, max_chars: usize) -> Option<String> {
    value
        .map(|v| v.trim().chars().take(max_chars).collect::<String>())
        .filter(|v| !v.is_empty())
}

/// Pulls the suggestion out of a model reply.
pub fn extract_suggestion(content: &str) -> MediaSuggestion {
    let Some(block) = JSON_BLOCK.find(content) else {
        return MediaSuggestion::default();
    };
    match serde_json::from_str::<RawSuggestion>(block.as_str()) {
        Ok(raw) => MediaSuggestion {
            filename: clip(raw.filename, 50),
            alt: clip(raw.alt, 125),
            description: clip(raw.description, 200),
        },
        Err(e) => {
            debug!("Unparseable analysis reply: {}", e);
            MediaSuggestion::default()
        }
    }
}

impl ImageAnalyzer {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.openrouter_api_key.clone(),
            model: config.openrouter_model.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn analyze(&self, bytes: &[u8], mime_type: &str) -> ApiResult<MediaSuggestion> {
        let Some(api_key) = &self.api_key else {
            return Ok(MediaSuggestion::default());
        };
        let data_url = format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes));
        let body = json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": PROMPT },
                    { "type": "image_url", "image_url": { "url": data_url } }
                ]
            }],
            "max_tokens": 200
        });

        let response = self
            .client
            .post(ENDPOINT)
            .bearer_auth(api_key)
            .header("X-Title", APP_TITLE)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Upstream(e.to_string()))?;
        let status = response.status();
        let reply: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ApiError::Upstream(e.to_string()))?;
        if !status.is_success() {
            warn!("Image analysis returned {}: {}", status, reply);
            return Err(ApiError::Upstream(format!("analysis service returned {}", status)));
        }

        let content = reply["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default();
        Ok(extract_suggestion(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestion_is_read_from_the_first_json_block() {
        let reply = "Sure! Here it is:\n```json\n{\"filename\": \"kids-drumming\", \
                     \"alt\": \"Children playing drums\", \"description\": \"\"}\n```";
        let suggestion = extract_suggestion(reply);
        assert_eq!(suggestion.filename.as_deref(), Some("kids-drumming"));
        assert_eq!(suggestion.alt.as_deref(), Some("Children playing drums"));
        assert_eq!(suggestion.description, None);
    }

    #[test]
    fn replies_without_json_give_an_empty_suggestion() {
        assert!(extract_suggestion("I cannot see the image.").is_empty());
        assert!(extract_suggestion("{not json}").is_empty());
    }

    #[test]
    fn long_values_are_clipped() {
        let long = "a".repeat(300);
        let reply = format!("{{\"filename\": \"{}\", \"alt\": \"{}\"}}", long, long);
        let suggestion = extract_suggestion(&reply);
        assert_eq!(suggestion.filename.map(|f| f.len()), Some(50));
        assert_eq!(suggestion.alt.map(|a| a.len()), Some(125));
    }

    #[actix_web::test]
    async fn unconfigured_analyzer_makes_no_request() {
        let analyzer = ImageAnalyzer::new(&ServerConfig::default());
        assert!(!analyzer.is_configured());
        assert!(analyzer.analyze(b"bytes", "image/png").await.unwrap().is_empty());
    }
}
