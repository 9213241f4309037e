use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use anyhow::{Result, anyhow};

use crate::generative::GenerationClient;
use crate::provider::Provider;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Free-tier models, best first.
const FREE_MODEL_PRIORITY: [&str; 5] = [
    "gemini-2.0-flash",
    "gemini-2.0-flash-lite",
    "gemini-2.0-flash-exp",
    "gemini-1.5-flash-8b",
    "gemini-1.5-flash",
];

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    system_instruction: GeminiContent,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiModel {
    name: String,
}

#[derive(Deserialize)]
struct GeminiModelsResponse {
    #[serde(default)]
    models: Vec<GeminiModel>,
}

/// Blocking client for the Generative Language API; call it from a worker thread.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// First candidate's first text part.
    pub fn generate_content(&self, instruction: &str, user: &str) -> Result<Option<String>> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: user.to_string(),
                }],
            }],
            system_instruction: GeminiContent {
                parts: vec![GeminiPart {
                    text: instruction.to_string(),
                }],
            },
        };

        let response = self.client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let text = brief(&response.text().unwrap_or_default());
            let hint = status_hint(status.as_u16())
                .map(|hint| format!(": {}", hint))
                .unwrap_or_default();
            let detail = if text.trim().is_empty() {
                String::new()
            } else {
                format!(": {}", text)
            };
            return Err(anyhow!(
                "Gemini request failed (HTTP {}){}{}",
                status.as_u16(),
                hint,
                detail
            ));
        }

        let gemini_response: GeminiResponse = response.json()?;
        Ok(first_candidate_text(gemini_response))
    }

    pub fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/models", self.base_url);

        let response = self.client
            .get(&url)
            .query(&[("key", &self.api_key)])
            .send()?;

        if !response.status().is_success() {
            return Err(anyhow!("Failed to list models: {}", response.status()));
        }

        let models_response: GeminiModelsResponse = response.json()?;
        Ok(model_names(models_response))
    }

    /// Sends a trivial request; any 2xx means key and model are usable.
    pub fn test_connection(&self) -> Result<()> {
        self.generate_content(
            "You are a JSON echoer.",
            "Return {\"components\":[]}",
        )
        .map(|_| ())
    }
}

impl GenerationClient for GeminiClient {
    fn generate(&self, provider: Provider, instruction: &str, user: &str) -> Result<Option<String>> {
        if provider != Provider::Gemini {
            return Err(anyhow!("Gemini client cannot serve the {} dialect", provider));
        }
        self.generate_content(instruction, user)
    }
}

/// Pick a free-tier model from what the key can see.
pub fn recommend_free_model(models: &[String]) -> String {
    FREE_MODEL_PRIORITY
        .iter()
        .find(|preferred| models.iter().any(|m| m == *preferred))
        .map(|m| m.to_string())
        .or_else(|| models.iter().find(|m| m.contains("flash")).cloned())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string())
}

fn status_hint(code: u16) -> Option<&'static str> {
    match code {
        400 => Some("Bad request. Check model name."),
        401 | 403 => Some("Invalid API key or unauthorized."),
        404 => Some("Model not found."),
        429 => Some("Rate limited. Try later."),
        _ => None,
    }
}

fn brief(text: &str) -> String {
    text.replace('\n', " ").chars().take(140).collect()
}

fn first_candidate_text(response: GeminiResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
}

fn model_names(response: GeminiModelsResponse) -> Vec<String> {
    response
        .models
        .into_iter()
        .map(|model| {
            model
                .name
                .strip_prefix("models/")
                .map(str::to_string)
                .unwrap_or(model.name)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_recommend_prefers_priority_order() {
        let models = names(&["gemini-1.5-flash", "gemini-2.0-flash-lite", "gemini-pro"]);
        assert_eq!(recommend_free_model(&models), "gemini-2.0-flash-lite");
    }

    #[test]
    fn test_recommend_falls_back_to_any_flash() {
        let models = names(&["gemini-pro", "gemini-9-flash-preview"]);
        assert_eq!(recommend_free_model(&models), "gemini-9-flash-preview");
    }

    #[test]
    fn test_recommend_defaults_when_nothing_fits() {
        assert_eq!(recommend_free_model(&names(&["gemini-pro"])), DEFAULT_MODEL);
        assert_eq!(recommend_free_model(&[]), DEFAULT_MODEL);
    }

    #[test]
    fn test_first_candidate_text() {
        let response: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"components\":[]}"},{"text":"ignored"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(first_candidate_text(response).as_deref(), Some(r#"{"components":[]}"#));

        let blocked: GeminiResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert_eq!(first_candidate_text(blocked), None);

        let empty: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(first_candidate_text(empty), None);
    }

    #[test]
    fn test_model_names_strip_prefix() {
        let response: GeminiModelsResponse = serde_json::from_str(
            r#"{"models":[{"name":"models/gemini-2.0-flash"},{"name":"tuned-x"}]}"#,
        )
        .unwrap();
        assert_eq!(model_names(response), names(&["gemini-2.0-flash", "tuned-x"]));
    }

    #[test]
    fn test_request_shape() {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: "user".to_string() }],
            }],
            system_instruction: GeminiContent {
                parts: vec![GeminiPart { text: "sys".to_string() }],
            },
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "contents": [{ "parts": [{ "text": "user" }] }],
                "systemInstruction": { "parts": [{ "text": "sys" }] }
            })
        );
    }

    #[test]
    fn test_status_hints() {
        assert_eq!(status_hint(404), Some("Model not found."));
        assert_eq!(status_hint(403), status_hint(401));
        assert_eq!(status_hint(500), None);
    }

    #[test]
    fn test_rejects_other_dialect() {
        let client = GeminiClient::new("key", DEFAULT_MODEL, Duration::from_secs(1)).unwrap();
        assert!(client.generate(Provider::OpenAI, "sys", "user").is_err());
    }
}
