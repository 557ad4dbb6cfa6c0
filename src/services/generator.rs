//! Workout generation through an Azure OpenAI chat deployment

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::workout::{parse_wod, Wod, WodRequest};

const API_VERSION: &str = "2024-04-01-preview";
const MAX_COMPLETION_TOKENS: u32 = 2000;

const SYSTEM_PROMPT: &str = r#"You are a professional CrossFit coach and workout programmer.

You will receive a single JSON object containing free-text fields such as:
- goal
- available_equipment
- preferences
- limitations
- notes

Using that information, create ONE CrossFit-style WOD, including a warm-up, main workout, and optional cooldown.

Respond with JSON only. Do not include commentary, extra text, or markdown. Follow this exact schema:

{
  "wod_title": string,
  "format": string,
  "time_cap_minutes": number,
  "sections": [
    {
      "name": string,
      "items": [string]
    }
  ],
  "equipment": [string],
  "notes": string
}

Rules:
- Always include at least "Warm-up" and "Workout" sections. Add a "Cooldown" section if appropriate.
- Use short, whiteboard-style lines inside "items".
- The main workout must have a realistic time cap.
- Use only equipment listed in the input.
- Output valid JSON only, with no markdown or explanation."#;

/// Why a workout could not be generated
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Workout generation is not configured")]
    NotConfigured,

    #[error("Generation service error: {0}")]
    Upstream(String),

    #[error("Invalid workout returned by generation service: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for GenerateError {
    fn from(e: reqwest::Error) -> Self {
        GenerateError::Upstream(e.to_string())
    }
}

#[derive(Serialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
    max_completion_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Connection details for the chat deployment
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
}

impl GeneratorConfig {
    /// Full chat completions URL for the deployment
    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            API_VERSION
        )
    }
}

/// Client that turns a [`WodRequest`] into a [`Wod`]
#[derive(Debug, Clone)]
pub struct WodGenerator {
    config: GeneratorConfig,
    client: reqwest::Client,
}

impl WodGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Generate one workout. Makes a single request; no retries.
    pub async fn generate(&self, request: &WodRequest) -> Result<Wod, GenerateError> {
        request.validate().map_err(GenerateError::InvalidRequest)?;

        let user_message = serde_json::to_string_pretty(request)
            .map_err(|e| GenerateError::InvalidRequest(e.to_string()))?;

        let body = ChatRequest {
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_message,
                },
            ],
            max_completion_tokens: MAX_COMPLETION_TOKENS,
        };

        debug!("Requesting workout from deployment {}", self.config.deployment);

        let resp = self
            .client
            .post(self.config.completions_url())
            .header("api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(GenerateError::Upstream(format!("{}: {}", status, text)));
        }

        let chat: ChatResponse = resp.json().await?;
        let content = first_content(chat)
            .ok_or_else(|| GenerateError::InvalidResponse("no content returned".to_string()))?;

        let wod = parse_wod(&content).map_err(GenerateError::InvalidResponse)?;
        info!("Generated workout: {} ({})", wod.wod_title, wod.format);
        Ok(wod)
    }
}

fn first_content(chat: ChatResponse) -> Option<String> {
    chat.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: &str) -> GeneratorConfig {
        GeneratorConfig {
            endpoint: endpoint.to_string(),
            api_key: "key".to_string(),
            deployment: "coach".to_string(),
        }
    }

    #[test]
    fn builds_url_without_double_slash() {
        let expected = "https://example.openai.azure.com/openai/deployments/coach/chat/completions?api-version=2024-04-01-preview";
        assert_eq!(config("https://example.openai.azure.com/").completions_url(), expected);
        assert_eq!(config("https://example.openai.azure.com").completions_url(), expected);
    }

    #[test]
    fn extracts_first_choice_content() {
        let chat: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"{}"}},{"message":{"content":"second"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_content(chat).as_deref(), Some("{}"));

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(first_content(empty), None);

        let blank: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"  "}}]}"#).unwrap();
        assert_eq!(first_content(blank), None);
    }

    #[tokio::test]
    async fn invalid_request_fails_before_any_network_call() {
        let generator = WodGenerator::new(config("http://127.0.0.1:9"));
        let err = generator.generate(&WodRequest::default()).await.unwrap_err();
        assert!(matches!(err, GenerateError::InvalidRequest(_)));
    }
}
