use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::Dispatch;

use promptui_core::{
    Config, GeminiClient, GenerationClient, GenerativeInterpreter, OpenAIClient, PromptInterpreter,
    PromptOutcome, Provider, ScreenState, TableLookupInterpreter, UiDescription, UiStateStore,
};

/// What happened to one submitted prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Applied(PromptOutcome),
    /// The interpreter didn't answer in time; its result will be dropped.
    TimedOut,
}

/// One frontend session: the active interpreter, the store it feeds and the
/// screen reduced from it.
///
/// Holds blocking HTTP clients, so build it and drop it off the async
/// runtime (see [`Session::open`] and [`Session::close`]).
pub struct Session {
    interpreter: Arc<dyn PromptInterpreter>,
    store: UiStateStore,
    screen: ScreenState,
    timeout: Duration,
    dispatch: Dispatch,
    label: String,
}

impl Session {
    pub fn new(interpreter: Arc<dyn PromptInterpreter>, timeout: Duration, dispatch: Dispatch) -> Self {
        Self {
            interpreter,
            store: UiStateStore::default(),
            screen: ScreenState::new(),
            timeout,
            dispatch,
            label: "custom".to_string(),
        }
    }

    /// Builds the interpreter the config selects, on a blocking thread.
    pub async fn open(config: Config, dispatch: Dispatch) -> Result<Self> {
        let build_dispatch = dispatch.clone();
        tokio::task::spawn_blocking(move || {
            tracing::dispatcher::with_default(&build_dispatch, || Self::build(&config, dispatch))
        })
        .await?
    }

    pub fn build(config: &Config, dispatch: Dispatch) -> Result<Self> {
        let table = match &config.prompts_path {
            Some(path) => TableLookupInterpreter::from_path(path),
            None => TableLookupInterpreter::bundled(),
        };
        let table: Arc<dyn PromptInterpreter> = Arc::new(table);

        let (interpreter, label): (Arc<dyn PromptInterpreter>, String) = match config.provider() {
            None => (table, "table lookup".to_string()),
            Some(provider) => {
                let model = config
                    .model
                    .clone()
                    .unwrap_or_else(|| provider.default_model().to_string());
                let key = api_key(provider);
                if key.is_none() {
                    tracing::warn!(
                        "{} is not set; {} prompts will use the table only",
                        provider.api_key_var(),
                        provider.display_name()
                    );
                }

                let client = generation_client(provider, key.as_deref().unwrap_or(""), &model, config.timeout())?;
                let generative = GenerativeInterpreter::new(client, table, provider)
                    .enabled(key.is_some())
                    .with_model(&model)
                    .with_key_present(key.is_some());
                (Arc::new(generative), format!("{} ({})", provider, model))
            }
        };

        let mut session = Self::new(interpreter, config.timeout(), dispatch);
        session.label = label;
        Ok(session)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn store(&self) -> &UiStateStore {
        &self.store
    }

    pub fn screen(&self) -> &ScreenState {
        &self.screen
    }

    pub fn current(&self) -> Arc<UiDescription> {
        self.store.current()
    }

    /// Interprets on a blocking thread, then applies the result.
    ///
    /// Nothing is touched until a description has fully arrived, so a
    /// timeout needs no rollback.
    pub async fn submit(&mut self, prompt: &str) -> Result<Submission> {
        let interpreter = Arc::clone(&self.interpreter);
        let dispatch = self.dispatch.clone();
        let owned = prompt.to_string();

        let task = tokio::task::spawn_blocking(move || {
            tracing::dispatcher::with_default(&dispatch, || interpreter.interpret(&owned))
        });

        let ui = match tokio::time::timeout(self.timeout, task).await {
            Ok(joined) => joined?,
            Err(_) => {
                tracing::warn!(
                    "prompt='{}' timed out after {}ms, discarding late result",
                    prompt,
                    self.timeout.as_millis()
                );
                return Ok(Submission::TimedOut);
            }
        };

        let outcome = self.screen.apply_outcome(prompt, &ui);
        match outcome {
            PromptOutcome::Apply => self.store.update(ui),
            PromptOutcome::Reset => self.store.reset(),
            PromptOutcome::Unknown | PromptOutcome::Ignored => {}
        }
        Ok(Submission::Applied(outcome))
    }

    pub fn reset(&mut self) {
        self.store.reset();
        self.screen.reset();
    }

    /// Drops the interpreter (and any HTTP client inside it) on a blocking thread.
    pub async fn close(self) -> Result<()> {
        tokio::task::spawn_blocking(move || drop(self)).await?;
        Ok(())
    }
}

pub fn api_key(provider: Provider) -> Option<String> {
    std::env::var(provider.api_key_var())
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

fn generation_client(
    provider: Provider,
    key: &str,
    model: &str,
    timeout: Duration,
) -> Result<Arc<dyn GenerationClient>> {
    Ok(match provider {
        Provider::OpenAI => Arc::new(OpenAIClient::new(key, model, timeout)?),
        Provider::Gemini => Arc::new(GeminiClient::new(key, model, timeout)?),
    })
}
