//! Projection from a UI description to render-ready components
//!
//! [`project`] is pure and total: unknown component types contribute nothing,
//! unknown colors become [`ColorName::Unknown`]. It keeps one output per input
//! in order and never collapses duplicates; a consumer wanting a single value
//! per category takes the last one (see [`authoritative_background`]).

use crate::model::{ComponentKind, UiComponent, UiDescription};

/// The closed color vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorName {
    Blue,
    Green,
    White,
    Red,
    Black,
    Purple,
    Yellow,
    Unknown,
}

impl ColorName {
    /// Every named color, excluding `Unknown`.
    pub const ALL: [ColorName; 7] = [
        ColorName::Blue,
        ColorName::Green,
        ColorName::White,
        ColorName::Red,
        ColorName::Black,
        ColorName::Purple,
        ColorName::Yellow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorName::Blue => "blue",
            ColorName::Green => "green",
            ColorName::White => "white",
            ColorName::Red => "red",
            ColorName::Black => "black",
            ColorName::Purple => "purple",
            ColorName::Yellow => "yellow",
            ColorName::Unknown => "unknown",
        }
    }

    /// Case-insensitive, whitespace-tolerant; anything else is `Unknown`.
    pub fn resolve(name: Option<&str>) -> ColorName {
        let Some(name) = name else {
            return ColorName::Unknown;
        };
        let name = name.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|color| color.as_str() == name)
            .unwrap_or(ColorName::Unknown)
    }
}

impl std::fmt::Display for ColorName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderComponent {
    Background(ColorName),
    Title(String),
    Card {
        title: Option<String>,
        background: ColorName,
    },
    Button {
        text: String,
        action: Option<String>,
    },
}

pub fn project(ui: &UiDescription) -> Vec<RenderComponent> {
    ui.components.iter().filter_map(project_component).collect()
}

/// One component's projection, or `None` when it renders nothing.
pub fn project_component(component: &UiComponent) -> Option<RenderComponent> {
    match component.kind()? {
        ComponentKind::Background => Some(RenderComponent::Background(ColorName::resolve(
            component.color.as_deref(),
        ))),
        ComponentKind::Title => component.text.clone().map(RenderComponent::Title),
        ComponentKind::Card => Some(RenderComponent::Card {
            title: component.properties.get("title").cloned(),
            background: ColorName::resolve(
                component.properties.get("backgroundColor").map(String::as_str),
            ),
        }),
        ComponentKind::Button => Some(RenderComponent::Button {
            text: component.text.clone().unwrap_or_default(),
            action: component.action.clone(),
        }),
    }
}

/// The background a renderer should paint: the last one wins.
pub fn authoritative_background(components: &[RenderComponent]) -> Option<ColorName> {
    components.iter().rev().find_map(|component| match component {
        RenderComponent::Background(color) => Some(*color),
        _ => None,
    })
}

/// Receives actions from buttons the user triggers.
pub trait ActionHandler {
    fn handle(&self, action: &str);
}

impl<F: Fn(&str)> ActionHandler for F {
    fn handle(&self, action: &str) {
        self(action)
    }
}

/// Something that can draw a UI description.
pub trait Renderer {
    fn render_ui(&mut self, ui: &UiDescription, actions: &dyn ActionHandler);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn one(component: UiComponent) -> Vec<RenderComponent> {
        project(&UiDescription::new(vec![component]))
    }

    #[test]
    fn test_background_mapping() {
        assert_eq!(
            one(UiComponent::background("blue")),
            vec![RenderComponent::Background(ColorName::Blue)]
        );
    }

    #[test]
    fn test_title_mapping() {
        assert_eq!(
            one(UiComponent::title("My Profile")),
            vec![RenderComponent::Title("My Profile".to_string())]
        );
    }

    #[test]
    fn test_title_without_text_is_dropped() {
        assert!(one(UiComponent::new("title")).is_empty());
    }

    #[test]
    fn test_card_mapping() {
        assert_eq!(
            one(UiComponent::card(Some("Profile"), Some("white"))),
            vec![RenderComponent::Card {
                title: Some("Profile".to_string()),
                background: ColorName::White,
            }]
        );
        assert_eq!(
            one(UiComponent::card(None, None)),
            vec![RenderComponent::Card {
                title: None,
                background: ColorName::Unknown,
            }]
        );
    }

    #[test]
    fn test_button_mapping() {
        assert_eq!(
            one(UiComponent::button("Save", Some("saveProfile"))),
            vec![RenderComponent::Button {
                text: "Save".to_string(),
                action: Some("saveProfile".to_string()),
            }]
        );
        assert_eq!(
            one(UiComponent::new("button")),
            vec![RenderComponent::Button {
                text: String::new(),
                action: None,
            }]
        );
    }

    #[test]
    fn test_unknown_type_ignored() {
        assert!(one(UiComponent::new("unknown")).is_empty());
    }

    #[test]
    fn test_type_is_case_insensitive() {
        assert_eq!(
            one(UiComponent::new("BACKGROUND").with_color("Green")),
            vec![RenderComponent::Background(ColorName::Green)]
        );
    }

    #[test]
    fn test_resolve_color() {
        assert_eq!(ColorName::resolve(Some("  PURPLE ")), ColorName::Purple);
        assert_eq!(ColorName::resolve(Some("teal")), ColorName::Unknown);
        assert_eq!(ColorName::resolve(Some("")), ColorName::Unknown);
        assert_eq!(ColorName::resolve(Some("unknown")), ColorName::Unknown);
        assert_eq!(ColorName::resolve(None), ColorName::Unknown);
        for color in ColorName::ALL {
            assert_eq!(ColorName::resolve(Some(color.as_str())), color);
        }
    }

    #[test]
    fn test_order_and_duplicates_preserved() {
        let ui = UiDescription::new(vec![
            UiComponent::background("blue"),
            UiComponent::new("slider"),
            UiComponent::title("A"),
            UiComponent::background("purple"),
        ]);
        assert_eq!(
            project(&ui),
            vec![
                RenderComponent::Background(ColorName::Blue),
                RenderComponent::Title("A".to_string()),
                RenderComponent::Background(ColorName::Purple),
            ]
        );
    }

    #[test]
    fn test_last_background_wins() {
        let components = vec![
            RenderComponent::Background(ColorName::Blue),
            RenderComponent::Title("x".to_string()),
            RenderComponent::Background(ColorName::Purple),
        ];
        assert_eq!(authoritative_background(&components), Some(ColorName::Purple));
        assert_eq!(authoritative_background(&[]), None);
    }

    #[test]
    fn test_closure_action_handler() {
        let seen = RefCell::new(Vec::new());
        let handler = |action: &str| seen.borrow_mut().push(action.to_string());
        handler.handle("saveProfile");
        assert_eq!(*seen.borrow(), vec!["saveProfile".to_string()]);
    }
}
