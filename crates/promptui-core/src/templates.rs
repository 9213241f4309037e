//! Instruction text for generation providers
//!
//! Both dialects share one body (schema, rules, few-shot examples) and differ
//! only in field naming and the closing line. Output is a pure function of the
//! prompt and dialect.

use crate::provider::Provider;
use crate::render::ColorName;

/// Substitute the model is told to use for colors outside the vocabulary.
pub const DEFAULT_COLOR: ColorName = ColorName::White;

const OPENAI_CLOSING: &str = "When you answer, respond with JSON only. Do not wrap with ```.";
const GEMINI_CLOSING: &str = "Return JSON only. No backticks. No prose.";

/// (user prompt, expected response)
const FEW_SHOT_EXAMPLES: [(&str, &str); 4] = [
    (
        "Make background blue",
        r#"{"components":[{"type":"background","color":"blue"}]}"#,
    ),
    (
        "Show title My Profile",
        r#"{"components":[{"type":"title","text":"My Profile"}]}"#,
    ),
    (
        "Add a profile card",
        r#"{"components":[{"type":"card","properties":{"title":"Profile","backgroundColor":"white"}}]}"#,
    ),
    (
        "Add Save button",
        r#"{"components":[{"type":"button","text":"Save","action":"saveProfile"}]}"#,
    ),
];

/// Chat-completions framing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiPrompt {
    pub system: String,
    pub user: String,
}

/// Gemini framing; `instruction` goes to the system instruction slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiPrompt {
    pub instruction: String,
    pub user: String,
}

pub fn build_openai_prompt(user_prompt: &str) -> OpenAiPrompt {
    OpenAiPrompt {
        system: with_closing(OPENAI_CLOSING),
        user: user_prompt.trim().to_string(),
    }
}

pub fn build_gemini_prompt(user_prompt: &str) -> GeminiPrompt {
    GeminiPrompt {
        instruction: with_closing(GEMINI_CLOSING),
        user: user_prompt.trim().to_string(),
    }
}

/// `(system or instruction, user)` for the given dialect.
pub fn build_prompt(provider: Provider, user_prompt: &str) -> (String, String) {
    match provider {
        Provider::OpenAI => {
            let prompt = build_openai_prompt(user_prompt);
            (prompt.system, prompt.user)
        }
        Provider::Gemini => {
            let prompt = build_gemini_prompt(user_prompt);
            (prompt.instruction, prompt.user)
        }
    }
}

fn with_closing(closing: &str) -> String {
    let mut text = shared_instruction_body();
    text.push('\n');
    text.push_str(closing);
    text.trim().to_string()
}

fn shared_instruction_body() -> String {
    let colors: Vec<&str> = ColorName::ALL.iter().map(ColorName::as_str).collect();

    let mut body = String::new();
    body.push_str("You are a UI layout planner. Turn the user's request into one JSON object that matches this schema exactly:\n");
    body.push('\n');
    body.push_str("Schema:\n");
    body.push_str("{\n");
    body.push_str("  \"components\": [\n");
    body.push_str("    {\n");
    body.push_str("      \"type\": string  // one of: title, background, card, button\n");
    body.push_str("      // title:      { \"type\": \"title\", \"text\": string }\n");
    body.push_str("      // background: { \"type\": \"background\", \"color\": string }\n");
    body.push_str("      // card:       { \"type\": \"card\", \"properties\": { \"title\": string?, \"backgroundColor\": string? } }\n");
    body.push_str("      // button:     { \"type\": \"button\", \"text\": string, \"action\": string? }\n");
    body.push_str("    }\n");
    body.push_str("  ]\n");
    body.push_str("}\n");
    body.push('\n');
    body.push_str("Rules:\n");
    body.push_str("- Output MUST be strictly valid UTF-8 JSON with double-quoted keys and strings. No markdown fences, no comments, no trailing text.\n");
    body.push_str("- Only include the fields defined above. Leave out null fields entirely.\n");
    body.push_str("- type values are lowercase: title, background, card, button.\n");
    body.push_str(&format!(
        "- color and backgroundColor must be one of: {}. If the color is unknown, use \"{}\".\n",
        colors.join(", "),
        DEFAULT_COLOR.as_str()
    ));
    body.push_str("- If the request is ambiguous, make the smallest reasonable change. Do not invent unrelated components.\n");
    body.push_str("- If the request asks to reset, or its intent is unclear, return { \"components\": [] }.\n");
    body.push('\n');
    body.push_str("Few-shot Examples:\n");
    for (user, response) in FEW_SHOT_EXAMPLES {
        body.push_str(&format!("User: {}\nResponse:\n{}\n\n", user, response));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ComponentKind;

    #[test]
    fn test_openai_prompt_contains_schema_rules_examples() {
        let prompt = build_openai_prompt("Make background blue  ");
        assert!(prompt.system.contains("\"components\""));
        assert!(prompt.system.contains("Schema:"));
        assert!(prompt.system.contains("Rules:"));
        assert!(prompt.system.contains("Few-shot Examples:"));
        assert!(prompt.system.contains("JSON only"));
        assert!(prompt.system.ends_with(OPENAI_CLOSING));
        assert_eq!(prompt.user, "Make background blue");
    }

    #[test]
    fn test_gemini_prompt_contains_schema_rules_examples() {
        let prompt = build_gemini_prompt("Add Save button");
        assert!(prompt.instruction.contains("\"components\""));
        assert!(prompt.instruction.contains("Rules:"));
        assert!(prompt.instruction.contains("Few-shot Examples:"));
        assert!(prompt.instruction.contains("JSON only"));
        assert!(prompt.instruction.ends_with(GEMINI_CLOSING));
        assert_eq!(prompt.user, "Add Save button");
    }

    #[test]
    fn test_dialects_share_body() {
        let openai = build_openai_prompt("x").system;
        let gemini = build_gemini_prompt("x").instruction;
        let openai_body = openai.strip_suffix(OPENAI_CLOSING).unwrap();
        let gemini_body = gemini.strip_suffix(GEMINI_CLOSING).unwrap();
        assert_eq!(openai_body, gemini_body);
    }

    #[test]
    fn test_lists_every_color_and_default() {
        let (instruction, _) = build_prompt(Provider::Gemini, "x");
        for color in ColorName::ALL {
            assert!(instruction.contains(color.as_str()), "missing {}", color.as_str());
        }
        assert!(instruction.contains("use \"white\""));
        assert!(instruction.contains("return { \"components\": [] }"));
    }

    #[test]
    fn test_examples_cover_every_component_type() {
        let (system, _) = build_prompt(Provider::OpenAI, "x");
        assert_eq!(system.matches("User: ").count(), 4);
        for kind in ComponentKind::all() {
            let needle = format!("\"type\":\"{}\"", kind.as_str());
            assert!(system.contains(&needle), "no example for {}", kind.as_str());
        }
    }

    #[test]
    fn test_examples_are_valid_json() {
        for (_, response) in FEW_SHOT_EXAMPLES {
            let value: serde_json::Value = serde_json::from_str(response).unwrap();
            assert!(value["components"].is_array());
        }
    }

    #[test]
    fn test_output_is_deterministic() {
        assert_eq!(build_prompt(Provider::OpenAI, " a "), build_prompt(Provider::OpenAI, "a"));
        assert_eq!(build_prompt(Provider::Gemini, "a"), build_prompt(Provider::Gemini, "a"));
    }
}
