//! Model-backed interpretation with fallback
//!
//! One attempt per prompt, no retries. Blank output, unparsable output and a
//! failing client all end the same way: the fallback interpreter answers.
//! The client call blocks, so callers should run `interpret` on a thread that
//! may block.

use serde_json::Value;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::interpreter::PromptInterpreter;
use crate::model::{self, UiDescription};
use crate::provider::Provider;
use crate::templates;

/// Something that turns an instruction/user pair into raw model text.
///
/// `Ok(None)`, a blank string and `Err` are all treated as a failed call.
pub trait GenerationClient: Send + Sync {
    fn generate(
        &self,
        provider: Provider,
        system_or_instruction: &str,
        user: &str,
    ) -> anyhow::Result<Option<String>>;
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("empty response from model")]
    Empty,
    #[error("unparsable response: {0}")]
    Parse(String),
    #[error("generation request failed: {0}")]
    Transport(#[source] anyhow::Error),
}

pub struct GenerativeInterpreter {
    client: Arc<dyn GenerationClient>,
    fallback: Arc<dyn PromptInterpreter>,
    provider: Provider,
    enabled: bool,
    model_name: Option<String>,
    has_key: Option<bool>,
}

impl GenerativeInterpreter {
    /// Starts disabled; call [`enabled`](Self::enabled) to route prompts to the client.
    pub fn new(
        client: Arc<dyn GenerationClient>,
        fallback: Arc<dyn PromptInterpreter>,
        provider: Provider,
    ) -> Self {
        Self {
            client,
            fallback,
            provider,
            enabled: false,
            model_name: None,
            has_key: None,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_model(mut self, model_name: &str) -> Self {
        self.model_name = Some(model_name.to_string());
        self
    }

    /// Only reported in diagnostics.
    pub fn with_key_present(mut self, has_key: bool) -> Self {
        self.has_key = Some(has_key);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// The single generation attempt, with its outcome made explicit.
    pub fn generate_description(&self, prompt: &str) -> Result<UiDescription, GenerationError> {
        let (system_or_instruction, user) = templates::build_prompt(self.provider, prompt);
        let request_id = request_id();
        let context = self.context();

        tracing::debug!(
            "request: id={}, {}, user_prompt='{}', instruction_len={}, user_len={}",
            request_id,
            context,
            preview(prompt, 120),
            system_or_instruction.len(),
            user.len()
        );

        let started = Instant::now();
        let raw = self
            .client
            .generate(self.provider, &system_or_instruction, &user)
            .map_err(GenerationError::Transport)?
            .unwrap_or_default();

        tracing::debug!(
            "response: id={}, {}, took_ms={}, raw_len={}, preview='{}'",
            request_id,
            context,
            started.elapsed().as_millis(),
            raw.len(),
            preview(&raw, 160)
        );

        if raw.trim().is_empty() {
            return Err(GenerationError::Empty);
        }

        let ui = parse_response(&raw)?;
        tracing::debug!(
            "parsed: id={}, description with {} components",
            request_id,
            ui.len()
        );
        Ok(ui)
    }

    fn context(&self) -> String {
        let mut context = format!("provider={}", self.provider);
        if let Some(model) = &self.model_name {
            context.push_str(&format!(", model='{}'", model));
        }
        if let Some(has_key) = self.has_key {
            context.push_str(&format!(", has_key={}", has_key));
        }
        context
    }
}

impl PromptInterpreter for GenerativeInterpreter {
    fn interpret(&self, prompt: &str) -> UiDescription {
        if !self.enabled {
            tracing::debug!("generation disabled, delegating to fallback");
            return self.fallback.interpret(prompt);
        }

        match self.generate_description(prompt) {
            Ok(ui) => ui,
            Err(e) => {
                tracing::warn!("generation failed ({}), falling back", e);
                self.fallback.interpret(prompt)
            }
        }
    }
}

/// Parse `{ "components": [...] }` from model output.
pub fn parse_response(raw: &str) -> Result<UiDescription, GenerationError> {
    let root: Value =
        serde_json::from_str(raw.trim()).map_err(|e| GenerationError::Parse(e.to_string()))?;
    let obj = root.as_object().ok_or_else(|| {
        GenerationError::Parse(format!(
            "expected a JSON object, got {}",
            model::json_kind(&root)
        ))
    })?;

    model::parse_description(obj, |component| {
        tracing::debug!("skipping component without type: {}", component);
    })
    .map_err(|e| GenerationError::Parse(e.to_string()))
}

fn request_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("{:x}", millis)
}

fn preview(text: &str, max_chars: usize) -> String {
    text.replace('\n', " ").chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::model::UiComponent;
    use anyhow::anyhow;
    use std::sync::Mutex;

    /// Replies with a canned response and records what it was asked.
    struct FakeClient {
        response: Option<String>,
        calls: Mutex<Vec<(Provider, String, String)>>,
    }

    impl FakeClient {
        fn new(response: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                response: response.map(str::to_string),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl GenerationClient for FakeClient {
        fn generate(
            &self,
            provider: Provider,
            system_or_instruction: &str,
            user: &str,
        ) -> anyhow::Result<Option<String>> {
            self.calls.lock().unwrap().push((
                provider,
                system_or_instruction.to_string(),
                user.to_string(),
            ));
            Ok(self.response.clone())
        }
    }

    struct FailingClient;

    impl GenerationClient for FailingClient {
        fn generate(&self, _: Provider, _: &str, _: &str) -> anyhow::Result<Option<String>> {
            Err(anyhow!("connection refused"))
        }
    }

    fn fallback() -> Arc<dyn PromptInterpreter> {
        Arc::new(|prompt: &str| UiDescription::new(vec![UiComponent::title(&format!("fallback:{}", prompt))]))
    }

    #[test]
    fn test_well_formed_json_returns_description() {
        let client = FakeClient::new(Some(
            r#"{"components":[{"type":"title","text":"X"},{"type":"background","color":"blue"}]}"#,
        ));
        let interpreter =
            GenerativeInterpreter::new(client, fallback(), Provider::OpenAI).enabled(true);

        let ui = interpreter.interpret("any");
        assert_eq!(
            ui.components,
            vec![UiComponent::title("X"), UiComponent::background("blue")]
        );
    }

    #[test]
    fn test_blank_null_or_garbage_falls_back() {
        for response in [Some(""), Some("   \n"), None, Some("not json"), Some("[1,2]"), Some("```json\n{}\n```")] {
            let interpreter = GenerativeInterpreter::new(
                FakeClient::new(response),
                fallback(),
                Provider::Gemini,
            )
            .enabled(true);
            assert_eq!(interpreter.interpret("x"), fallback().interpret("x"), "{:?}", response);
        }
    }

    #[test]
    fn test_client_error_falls_back() {
        let interpreter =
            GenerativeInterpreter::new(Arc::new(FailingClient), fallback(), Provider::OpenAI)
                .enabled(true);
        assert_eq!(interpreter.interpret("p"), fallback().interpret("p"));
    }

    #[test]
    fn test_disabled_never_calls_client() {
        let client = FakeClient::new(Some(r#"{"components":[{"type":"title","text":"LLM"}]}"#));
        let interpreter =
            GenerativeInterpreter::new(client.clone(), fallback(), Provider::OpenAI);

        assert!(!interpreter.is_enabled());
        for prompt in ["a", "Make background blue", ""] {
            assert_eq!(interpreter.interpret(prompt), fallback().interpret(prompt));
        }
        assert_eq!(client.call_count(), 0);
    }

    #[test]
    fn test_single_attempt_per_call() {
        let client = FakeClient::new(None);
        let interpreter =
            GenerativeInterpreter::new(client.clone(), fallback(), Provider::OpenAI).enabled(true);
        interpreter.interpret("once");
        assert_eq!(client.call_count(), 1);
    }

    #[test]
    fn test_request_uses_dialect_templates() {
        let client = FakeClient::new(Some(r#"{"components":[]}"#));
        let interpreter =
            GenerativeInterpreter::new(client.clone(), fallback(), Provider::Gemini).enabled(true);
        interpreter.interpret("  Add Save button ");

        let calls = client.calls.lock().unwrap();
        let expected = templates::build_gemini_prompt("Add Save button");
        assert_eq!(calls[0].0, Provider::Gemini);
        assert_eq!(calls[0].1, expected.instruction);
        assert_eq!(calls[0].2, "Add Save button");
    }

    #[test]
    fn test_empty_components_is_a_valid_answer() {
        let interpreter = GenerativeInterpreter::new(
            FakeClient::new(Some(r#"{"components":[]}"#)),
            fallback(),
            Provider::OpenAI,
        )
        .enabled(true);
        assert!(interpreter.interpret("reset").is_empty());
    }

    #[test]
    fn test_parse_skips_untyped_and_stringifies_properties() {
        let ui = parse_response(
            r#"{"components":[
                {"text":"no type"},
                {"type":"card","properties":{"title":"Profile","extra":{"a":[1,2]}}}
            ]}"#,
        )
        .unwrap();

        assert_eq!(ui.len(), 1);
        assert_eq!(ui.components[0].properties["title"], "Profile");
        assert_eq!(ui.components[0].properties["extra"], r#"{"a":[1,2]}"#);
    }

    #[test]
    fn test_parse_errors_are_classified() {
        assert!(matches!(parse_response("{"), Err(GenerationError::Parse(_))));
        assert!(matches!(parse_response("\"text\""), Err(GenerationError::Parse(_))));
        assert!(matches!(
            parse_response(r#"{"components":{}}"#),
            Err(GenerationError::Parse(_))
        ));
        assert!(matches!(
            parse_response(r#"{"components":null}"#),
            Err(GenerationError::Parse(_))
        ));
    }

    #[test]
    fn test_null_components_falls_back() {
        let interpreter = GenerativeInterpreter::new(
            FakeClient::new(Some(r#"{"components":null}"#)),
            fallback(),
            Provider::OpenAI,
        )
        .enabled(true);
        assert_eq!(interpreter.interpret("p"), fallback().interpret("p"));
    }

    #[test]
    fn test_generate_description_reports_failure_kind() {
        let blank = GenerativeInterpreter::new(FakeClient::new(Some(" ")), fallback(), Provider::OpenAI);
        assert!(matches!(blank.generate_description("x"), Err(GenerationError::Empty)));

        let failing = GenerativeInterpreter::new(Arc::new(FailingClient), fallback(), Provider::OpenAI);
        assert!(matches!(
            failing.generate_description("x"),
            Err(GenerationError::Transport(_))
        ));
    }

    #[test]
    fn test_logs_request_response_and_fallback() {
        let diagnostics = Diagnostics::capture();
        let interpreter = GenerativeInterpreter::new(
            FakeClient::new(Some("nope")),
            fallback(),
            Provider::Gemini,
        )
        .enabled(true)
        .with_model("gemini-2.0-flash")
        .with_key_present(true);

        diagnostics.in_scope(|| interpreter.interpret("Make it pop"));

        let log = diagnostics.log();
        assert!(log.contains("user_prompt='Make it pop'"));
        assert!(log.contains("model='gemini-2.0-flash'"));
        assert!(log.contains("has_key=true"));
        assert!(log.contains("raw_len=4"));
        assert!(log.contains("falling back"));
    }

    #[test]
    fn test_preview_flattens_and_truncates() {
        assert_eq!(preview("a\nb", 10), "a b");
        assert_eq!(preview("abcdef", 3), "abc");
    }
}
