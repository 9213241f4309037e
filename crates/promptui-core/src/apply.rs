//! Screen state built from projected components
//!
//! This is the consumer side of the pipeline: it folds render components into
//! a single value per category, the last component of a category winning. It
//! also decides what an empty interpretation means for a given prompt, since
//! an interpreter can't tell "reset" apart from "no idea".

use regex::Regex;
use std::sync::OnceLock;

use crate::model::{ComponentKind, UiComponent, UiDescription};
use crate::render::{self, ColorName, RenderComponent};

pub const DEFAULT_TITLE: &str = "My Profile";
pub const UNKNOWN_PROMPT_NOTICE: &str = "Unknown prompt";

// Whole word only: "preset" or "resetting" are not reset requests.
fn reset_intent() -> &'static Regex {
    static RESET: OnceLock<Regex> = OnceLock::new();
    RESET.get_or_init(|| Regex::new(r"(?i)\breset\b").expect("static regex"))
}

/// What the frontend should do with an interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    Apply,
    Reset,
    Unknown,
    Ignored,
}

impl PromptOutcome {
    pub fn classify(prompt: &str, ui: &UiDescription) -> Self {
        if !ui.is_empty() {
            PromptOutcome::Apply
        } else if reset_intent().is_match(prompt) {
            PromptOutcome::Reset
        } else if prompt.trim().is_empty() {
            PromptOutcome::Ignored
        } else {
            PromptOutcome::Unknown
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonState {
    pub text: String,
    pub action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenState {
    pub title: String,
    pub background: ColorName,
    pub card_title: Option<String>,
    pub card_background: Option<ColorName>,
    pub extra_button: Option<ButtonState>,
    /// Color of the built-in Save button; `None` keeps the theme default.
    pub save_button_color: Option<ColorName>,
    pub notice: Option<String>,
}

impl Default for ScreenState {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            background: ColorName::Unknown,
            card_title: None,
            card_background: None,
            extra_button: None,
            save_button_color: None,
            notice: None,
        }
    }
}

impl ScreenState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        tracing::debug!("apply: restoring defaults");
        *self = Self::default();
    }

    /// Fold components in order over the current state.
    pub fn apply(&mut self, components: &[RenderComponent]) {
        self.notice = None;
        if let Some(background) = render::authoritative_background(components) {
            tracing::debug!("apply: background {} -> {}", self.background, background);
            self.background = background;
        }

        for component in components {
            match component {
                RenderComponent::Background(_) => {}
                RenderComponent::Title(text) => {
                    tracing::debug!("apply: title='{}'", text);
                    self.title = text.clone();
                }
                RenderComponent::Card { title, background } => {
                    tracing::debug!("apply: card title={:?}", title);
                    self.card_title = title.clone();
                    self.card_background = Some(*background);
                }
                RenderComponent::Button { text, action } => {
                    tracing::debug!("apply: button text='{}'", text);
                    self.extra_button = Some(ButtonState {
                        text: text.clone(),
                        action: action.clone(),
                    });
                }
            }
        }
    }

    /// Apply a whole description.
    ///
    /// A `button` titled "Save" that carries a color recolors the built-in
    /// Save button rather than adding an extra one. The render model has no
    /// button color, so this reads the raw components.
    pub fn apply_description(&mut self, ui: &UiDescription) {
        let mut components = Vec::with_capacity(ui.len());
        for component in &ui.components {
            match save_button_color(component) {
                Some(color) => {
                    tracing::debug!("apply: save button color {}", color);
                    self.save_button_color = Some(color);
                }
                None => components.extend(render::project_component(component)),
            }
        }
        self.apply(&components);
    }

    /// Handle one prompt's interpretation the way the Apply button does.
    pub fn apply_outcome(&mut self, prompt: &str, ui: &UiDescription) -> PromptOutcome {
        let outcome = PromptOutcome::classify(prompt, ui);
        match outcome {
            PromptOutcome::Apply => self.apply_description(ui),
            PromptOutcome::Reset => self.reset(),
            PromptOutcome::Unknown => self.notice = Some(UNKNOWN_PROMPT_NOTICE.to_string()),
            PromptOutcome::Ignored => {}
        }
        outcome
    }
}

fn save_button_color(component: &UiComponent) -> Option<ColorName> {
    if component.kind() != Some(ComponentKind::Button) {
        return None;
    }
    let color = component
        .color
        .as_deref()
        .map(str::trim)
        .filter(|color| !color.is_empty())?;
    let is_save = component
        .text
        .as_deref()
        .is_some_and(|text| text.trim().eq_ignore_ascii_case("save"));
    is_save.then(|| ColorName::resolve(Some(color)))
}
