//! Deterministic prompt table
//!
//! Source format (array):
//!
//! ```json
//! [
//!   { "prompt": "Make background blue",
//!     "uiDescription": { "components": [ { "type": "background", "color": "blue" } ] } }
//! ]
//! ```
//!
//! Keys are matched after trimming and lowercasing. Broken entries are skipped
//! one by one; a source that can't be parsed at all gives an empty table.

use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use crate::interpreter::PromptInterpreter;
use crate::model::{self, UiDescription};

const BUNDLED_PROMPTS: &str = include_str!("../assets/prompts.json");

/// Trim and lowercase, the key form used on both load and lookup.
pub fn normalize_prompt(prompt: &str) -> String {
    prompt.trim().to_lowercase()
}

pub struct TableLookupInterpreter {
    table: HashMap<String, UiDescription>,
}

impl TableLookupInterpreter {
    pub fn from_json(source: &str) -> Self {
        let root: Value = match serde_json::from_str(source) {
            Ok(root) => root,
            Err(e) => {
                tracing::warn!("error parsing prompt table: {}", e);
                return Self::empty();
            }
        };

        let entries = match root {
            Value::Array(entries) => entries,
            other => {
                tracing::warn!(
                    "prompt table must be an array, got {}",
                    model::json_kind(&other)
                );
                return Self::empty();
            }
        };

        let mut table = HashMap::new();
        for entry in &entries {
            let prompt = entry.get("prompt").and_then(Value::as_str);
            let description = entry.get("uiDescription").and_then(Value::as_object);
            let (prompt, description) = match (prompt, description) {
                (Some(prompt), Some(description)) => (prompt, description),
                _ => {
                    tracing::debug!("skipping malformed entry: {}", entry);
                    continue;
                }
            };

            let ui = match model::parse_description(description, |component| {
                tracing::debug!("ignoring unknown/malformed component: {}", component);
            }) {
                Ok(ui) => ui,
                Err(e) => {
                    tracing::debug!("skipping entry '{}': {}", prompt, e);
                    continue;
                }
            };

            // later entries win on duplicate keys
            table.insert(normalize_prompt(prompt), ui);
        }

        tracing::info!("loaded {} prompts", table.len());
        Self { table }
    }

    pub fn from_path(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(source) => Self::from_json(&source),
            Err(e) => {
                tracing::warn!("error loading {}: {}", path.display(), e);
                Self::empty()
            }
        }
    }

    /// The prompt set shipped with the crate.
    pub fn bundled() -> Self {
        Self::from_json(BUNDLED_PROMPTS)
    }

    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn contains(&self, prompt: &str) -> bool {
        self.table.contains_key(&normalize_prompt(prompt))
    }

    /// Known prompts in their normalized form, sorted.
    pub fn prompts(&self) -> Vec<&str> {
        let mut prompts: Vec<&str> = self.table.keys().map(String::as_str).collect();
        prompts.sort_unstable();
        prompts
    }
}

impl PromptInterpreter for TableLookupInterpreter {
    fn interpret(&self, prompt: &str) -> UiDescription {
        match self.table.get(&normalize_prompt(prompt)) {
            Some(ui) => {
                tracing::debug!("prompt='{}' matched ({} components)", prompt, ui.len());
                ui.clone()
            }
            None => {
                tracing::debug!("prompt='{}' unknown (0 components)", prompt);
                UiDescription::empty()
            }
        }
    }
}
