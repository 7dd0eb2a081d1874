use std::fmt;
use std::time::Duration;

use serde_json::{json, Value};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const MODEL: &str = "gemini-1.5-flash";
const MAX_ATTEMPTS: u32 = 3;
const BASE_DELAY_MS: u64 = 2000;

#[derive(Debug)]
pub enum AssistantError {
    Overloaded,
    Upstream(String),
}

impl fmt::Display for AssistantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssistantError::Overloaded => {
                write!(f, "Assistant service is currently overloaded")
            }
            AssistantError::Upstream(message) => write!(f, "{message}"),
        }
    }
}

/// Single generateContent call with bounded retry: the overloaded signal is
/// retried up to three times with a doubling delay, everything else surfaces
/// immediately.
#[derive(Clone)]
pub struct AssistantClient {
    http: reqwest::Client,
    api_key: String,
}

impl AssistantClient {
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        Self { http, api_key }
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, AssistantError> {
        let mut delay = Duration::from_millis(BASE_DELAY_MS);
        for attempt in 1..=MAX_ATTEMPTS {
            match self.generate_once(prompt).await {
                Ok(text) => return Ok(text),
                Err(AssistantError::Overloaded) if attempt < MAX_ATTEMPTS => {
                    log::info!("Assistant attempt {attempt} overloaded, retrying in {delay:?}");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(err) => return Err(err),
            }
        }
        Err(AssistantError::Overloaded)
    }

    async fn generate_once(&self, prompt: &str) -> Result<String, AssistantError> {
        let url = format!(
            "{GEMINI_API_BASE}/{MODEL}:generateContent?key={key}",
            key = self.api_key
        );
        let response = self
            .http
            .post(url)
            .json(&json!({
                "contents": [
                    { "role": "user", "parts": [{ "text": prompt }] }
                ]
            }))
            .send()
            .await
            .map_err(|err| AssistantError::Upstream(err.to_string()))?;

        if response.status().as_u16() == 503 {
            return Err(AssistantError::Overloaded);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::Upstream(format!(
                "assistant returned {status}: {body}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|err| AssistantError::Upstream(err.to_string()))?;
        extract_text(&body)
            .ok_or_else(|| AssistantError::Upstream("Invalid response structure".to_string()))
    }
}

pub fn extract_text(body: &Value) -> Option<String> {
    body["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(String::from)
}

/// Grounds the model in the active-hall dataset and fences off anything else.
pub fn grounded_prompt(halls_json: &str, question: &str) -> String {
    format!(
        r#"Here is the halls data in JSON format: {halls_json}
If the user greets you, answer the greeting and ask how you can help.
Don't tell the user that you only have halls knowledge; if they ask about anything else, simply say sorry, you can't assist with that type of information.
Please answer the user's question ONLY based on this data.
If the question is not related to the halls data, politely apologize and say you can't answer.

User question: "{question}"

Keep the response concise and helpful."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_data_and_question() {
        let prompt = grounded_prompt(r#"[{"name":"Crystal Palace"}]"#, "Which halls seat 500?");
        assert!(prompt.contains("Crystal Palace"));
        assert!(prompt.contains("Which halls seat 500?"));
        assert!(prompt.contains("ONLY based on this data"));
    }

    #[test]
    fn candidate_text_is_extracted() {
        let body = serde_json::json!({
            "candidates": [
                { "content": { "parts": [{ "text": "Two halls match." }] } }
            ]
        });
        assert_eq!(extract_text(&body).unwrap(), "Two halls match.");
    }

    #[test]
    fn malformed_response_yields_none() {
        assert!(extract_text(&serde_json::json!({ "candidates": [] })).is_none());
        assert!(extract_text(&serde_json::json!({})).is_none());
    }
}
