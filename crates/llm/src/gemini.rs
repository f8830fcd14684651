use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use jobwatch_core::AiConfig;

use crate::provider::{LlmError, LlmProvider, Message, Role};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            // Accept both "gemini-x" and "models/gemini-x".
            model: model.trim_start_matches("models/").to_string(),
        }
    }

    /// Build from the AI section of the bot config.
    pub fn from_config(config: &AiConfig) -> Result<Self, LlmError> {
        let key = config
            .gemini_api_key
            .clone()
            .ok_or_else(|| LlmError::NotConfigured("GEMINI_API_KEY not set".into()))?;
        Ok(Self::new(key, config.gemini_model.clone()))
    }

    /// Request body for `generateContent`. System messages go into
    /// `system_instruction`; the reply is requested as JSON.
    fn build_request_body(messages: &[Message], temperature: f32, max_tokens: u32) -> serde_json::Value {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        let contents: Vec<serde_json::Value> = messages
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| json!({ "role": "user", "parts": [{ "text": m.content }] }))
            .collect();

        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "temperature": temperature,
                "maxOutputTokens": max_tokens,
                "responseMimeType": "application/json",
            },
        });

        if !system.is_empty() {
            body["system_instruction"] = json!({ "parts": [{ "text": system.join("\n\n") }] });
        }

        body
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let url = format!("{API_BASE}/models/{}:generateContent", self.model);
        let body = Self::build_request_body(&messages, temperature, max_tokens);

        debug!(model = %self.model, "Gemini request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, body });
        }

        let resp: serde_json::Value = response.json().await?;
        resp["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| LlmError::ParseError("missing candidates[0].content.parts[0].text".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_separates_system_prompt() {
        let messages = vec![
            Message::system("You rate vacancies."),
            Message::user("Rate this one"),
        ];
        let body = GeminiProvider::build_request_body(&messages, 0.2, 512);

        assert_eq!(
            body["system_instruction"]["parts"][0]["text"].as_str().unwrap(),
            "You rate vacancies."
        );
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 512);
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn user_turns_keep_order_without_system_prompt() {
        let messages = vec![Message::user("a"), Message::user("b")];
        let body = GeminiProvider::build_request_body(&messages, 0.0, 10);
        assert!(body.get("system_instruction").is_none());
        assert_eq!(body["contents"][0]["parts"][0]["text"], "a");
        assert_eq!(body["contents"][1]["role"], "user");
    }

    #[test]
    fn from_config_requires_key() {
        let cfg = AiConfig {
            enabled: true,
            gemini_api_key: None,
            gemini_model: "gemini-flash-latest".into(),
            min_score: 60,
        };
        assert!(matches!(GeminiProvider::from_config(&cfg), Err(LlmError::NotConfigured(_))));

        let cfg = AiConfig { gemini_api_key: Some("k".into()), gemini_model: "models/gemini-pro".into(), ..cfg };
        let provider = GeminiProvider::from_config(&cfg).unwrap();
        assert_eq!(provider.model, "gemini-pro");
    }
}
