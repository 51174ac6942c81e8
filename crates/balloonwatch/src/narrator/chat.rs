//! OpenAI-compatible chat-completion backend.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use ureq::Agent;

use super::{prompts, Narrator};
use crate::config::NarratorConfig;
use crate::error::{Error, Result};

const BACKEND: &str = "chat";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Narrator backed by a `/chat/completions` endpoint.
#[derive(Debug)]
pub struct ChatNarrator {
    agent: Agent,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f64,
}

impl ChatNarrator {
    /// Build a narrator from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NarratorUnavailable`] if no API key is configured.
    pub fn from_config(config: &NarratorConfig, timeout: Duration) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::NarratorUnavailable(
                    "chat backend needs narrator.api_key (or BALLOONWATCH_NARRATOR__API_KEY)"
                        .to_string(),
                )
            })?;

        Ok(Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// The URL requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: [
                ChatMessage {
                    role: "system",
                    content: prompts::SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        debug!(endpoint = %self.endpoint, model = %self.model, "Requesting completion");
        let response: ChatResponse = self
            .agent
            .post(&self.endpoint)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(&request)
            .map_err(|e| Error::narrator(BACKEND, e.to_string()))?
            .into_json()
            .map_err(|e| Error::narrator(BACKEND, format!("unreadable response: {e}")))?;

        extract_text(response)
    }
}

fn extract_text(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| Error::narrator(BACKEND, "response contained no text"))
}

impl Narrator for ChatNarrator {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn answer_question(&self, data_summary: &str, question: &str) -> Result<String> {
        self.complete(&prompts::question_prompt(data_summary, question))
    }

    fn narrate_anomalies(&self, anomaly_summary: &str) -> Result<String> {
        self.complete(&prompts::anomaly_prompt(anomaly_summary))
    }

    fn recommend_launch_sites(&self, data_summary: &str) -> Result<String> {
        self.complete(&prompts::launch_prompt(data_summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key(key: Option<&str>) -> NarratorConfig {
        NarratorConfig {
            api_key: key.map(String::from),
            api_base: "http://127.0.0.1:9/v1/".to_string(),
            ..NarratorConfig::default()
        }
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let err = ChatNarrator::from_config(&config_with_key(None), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, Error::NarratorUnavailable(_)));

        let err = ChatNarrator::from_config(&config_with_key(Some("  ")), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, Error::NarratorUnavailable(_)));
    }

    #[test]
    fn test_endpoint_joins_api_base() {
        let narrator =
            ChatNarrator::from_config(&config_with_key(Some("sk-test")), Duration::from_secs(1))
                .unwrap();
        assert_eq!(narrator.endpoint(), "http://127.0.0.1:9/v1/chat/completions");
        assert_eq!(narrator.name(), "chat");
    }

    #[test]
    fn test_unreachable_endpoint_is_narrator_error() {
        let narrator =
            ChatNarrator::from_config(&config_with_key(Some("sk-test")), Duration::from_secs(2))
                .unwrap();
        let err = narrator.narrate_anomalies("nothing").unwrap_err();
        assert!(matches!(err, Error::Narrator { backend: "chat", .. }));
    }

    #[test]
    fn test_extract_text_trims_first_choice() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "  All nominal.\n"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "All nominal.");
    }

    #[test]
    fn test_extract_text_rejects_empty_choices() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(extract_text(response).is_err());

        let response: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert!(extract_text(response).is_err());
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "m",
            temperature: 0.0,
            messages: [
                ChatMessage {
                    role: "system",
                    content: "s",
                },
                ChatMessage {
                    role: "user",
                    content: "u",
                },
            ],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["messages"][1]["role"], "user");
    }
}
