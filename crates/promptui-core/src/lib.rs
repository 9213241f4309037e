pub mod ai;
pub mod apply;
pub mod config;
pub mod diagnostics;
pub mod generative;
pub mod interpreter;
pub mod lookup;
pub mod model;
pub mod provider;
pub mod render;
pub mod store;
pub mod templates;

// Re-export main types for convenience
pub use ai::{GeminiClient, OpenAIClient};
pub use apply::{PromptOutcome, ScreenState};
pub use config::Config;
pub use diagnostics::{DebugLog, Diagnostics, LogEntry};
pub use generative::{GenerationClient, GenerationError, GenerativeInterpreter};
pub use interpreter::PromptInterpreter;
pub use lookup::TableLookupInterpreter;
pub use model::{ComponentKind, UiComponent, UiDescription};
pub use provider::Provider;
pub use render::{project, ActionHandler, ColorName, RenderComponent, Renderer};
pub use store::UiStateStore;
