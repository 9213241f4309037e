use crate::model::UiDescription;

/// Converts prompt text into a UI description.
///
/// Implementations never fail outward: anything that goes wrong inside is
/// absorbed and surfaces as an empty description or a fallback's result.
pub trait PromptInterpreter: Send + Sync {
    fn interpret(&self, prompt: &str) -> UiDescription;
}

impl<F> PromptInterpreter for F
where
    F: Fn(&str) -> UiDescription + Send + Sync,
{
    fn interpret(&self, prompt: &str) -> UiDescription {
        self(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UiComponent;
    use std::sync::Arc;

    #[test]
    fn test_closure_interpreter() {
        let interpreter = |_: &str| UiDescription::empty();
        assert!(interpreter.interpret("anything").is_empty());
    }

    #[test]
    fn test_shared_trait_object_delegates() {
        let shared: Arc<dyn PromptInterpreter> =
            Arc::new(|p: &str| UiDescription::new(vec![UiComponent::title(p)]));

        let ui = shared.interpret("hello");
        assert_eq!(ui.components, vec![UiComponent::title("hello")]);
    }
}
