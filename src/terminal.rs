use colored::*;
use std::io::Write;

use promptui_core::render::authoritative_background;
use promptui_core::{project, ActionHandler, ColorName, RenderComponent, Renderer, ScreenState, UiDescription};

/// Prints projected components as text.
///
/// Terminal output isn't clickable, so buttons are pressed through the
/// frontend (`:press`), which calls the action handler itself.
pub struct TerminalRenderer<W: Write> {
    out: W,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn render_screen(&mut self, screen: &ScreenState) -> std::io::Result<()> {
        writeln!(self.out, "{}", "Screen".bold().blue())?;
        writeln!(self.out, "  background  {}", swatch(screen.background))?;
        writeln!(self.out, "  title       {}", screen.title.bold())?;
        if let Some(card) = &screen.card_title {
            let background = screen.card_background.unwrap_or(ColorName::Unknown);
            writeln!(self.out, "  card        {} on {}", card, swatch(background))?;
        }
        if let Some(button) = &screen.extra_button {
            writeln!(
                self.out,
                "  button      [{}] {}",
                button.text,
                button.action.as_deref().unwrap_or("-").dimmed()
            )?;
        }
        if let Some(color) = screen.save_button_color {
            writeln!(self.out, "  save        {}", swatch(color))?;
        }
        if let Some(notice) = &screen.notice {
            writeln!(self.out, "  {}", notice.red())?;
        }
        Ok(())
    }

    fn write_components(&mut self, ui: &UiDescription) -> std::io::Result<()> {
        let components = project(ui);
        let background = authoritative_background(&components);

        writeln!(
            self.out,
            "{} ({} of {} components renderable)",
            "Components".bold().green(),
            components.len(),
            ui.len()
        )?;
        if let Some(background) = background {
            writeln!(self.out, "  painted background: {}", swatch(background))?;
        }

        for (i, component) in components.iter().enumerate() {
            let line = match component {
                RenderComponent::Background(color) => format!("background {}", swatch(*color)),
                RenderComponent::Title(text) => format!("title \"{}\"", text),
                RenderComponent::Card { title, background } => format!(
                    "card \"{}\" on {}",
                    title.as_deref().unwrap_or(""),
                    swatch(*background)
                ),
                RenderComponent::Button { text, action } => format!(
                    "button [{}] -> {}",
                    text,
                    action.as_deref().unwrap_or("no action")
                ),
            };
            writeln!(self.out, "  {}. {}", (i + 1).to_string().dimmed(), line)?;
        }
        Ok(())
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render_ui(&mut self, ui: &UiDescription, _actions: &dyn ActionHandler) {
        if let Err(e) = self.write_components(ui) {
            tracing::warn!("failed to write to terminal: {}", e);
        }
    }
}

/// The action a button with this label triggers, if any.
pub fn find_action(ui: &UiDescription, label: &str) -> Option<String> {
    project(ui).into_iter().rev().find_map(|component| match component {
        RenderComponent::Button { text, action } if text.eq_ignore_ascii_case(label.trim()) => action,
        _ => None,
    })
}

fn swatch(color: ColorName) -> ColoredString {
    let name = color.to_string();
    match color {
        ColorName::Blue => name.blue(),
        ColorName::Green => name.green(),
        ColorName::White => name.white(),
        ColorName::Red => name.red(),
        ColorName::Black => name.black().on_white(),
        ColorName::Purple => name.magenta(),
        ColorName::Yellow => name.yellow(),
        ColorName::Unknown => name.dimmed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptui_core::UiComponent;

    fn render(ui: &UiDescription) -> String {
        colored::control::set_override(false);
        let mut renderer = TerminalRenderer::new(Vec::new());
        renderer.render_ui(ui, &|_: &str| {});
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn test_renders_components_in_order() {
        let output = render(&UiDescription::new(vec![
            UiComponent::background("blue"),
            UiComponent::new("hologram"),
            UiComponent::title("Hello"),
            UiComponent::background("purple"),
        ]));

        assert!(output.contains("3 of 4 components renderable"));
        assert!(output.contains("painted background: PURPLE"));
        let blue = output.find("background BLUE").unwrap();
        let title = output.find("title \"Hello\"").unwrap();
        assert!(blue < title);
    }

    #[test]
    fn test_renders_screen_notice() {
        colored::control::set_override(false);
        let mut screen = ScreenState::new();
        screen.notice = Some("Unknown prompt".to_string());
        screen.save_button_color = Some(ColorName::Yellow);

        let mut renderer = TerminalRenderer::new(Vec::new());
        renderer.render_screen(&screen).unwrap();
        let output = String::from_utf8(renderer.into_inner()).unwrap();

        assert!(output.contains("My Profile"));
        assert!(output.contains("Unknown prompt"));
        assert!(output.contains("save        YELLOW"));
    }

    #[test]
    fn test_find_action_matches_label_case_insensitively() {
        let ui = UiDescription::new(vec![
            UiComponent::button("Save", Some("saveProfile")),
            UiComponent::button("Help", None),
        ]);
        assert_eq!(find_action(&ui, " save "), Some("saveProfile".to_string()));
        assert_eq!(find_action(&ui, "Help"), None);
        assert_eq!(find_action(&ui, "Missing"), None);
    }
}
