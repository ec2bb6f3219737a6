//! Settings screen: static app information, features and capabilities.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use netsense_core::{SettingsSection, SettingsState};

use crate::action::Action;
use crate::component::Component;
use crate::theme;

pub struct SettingsScreen {
    state: SettingsState,
    scroll: u16,
}

impl SettingsScreen {
    pub fn new(state: SettingsState) -> Self {
        Self { state, scroll: 0 }
    }

    fn section_lines(section: &SettingsSection) -> Vec<Line<'static>> {
        section
            .rows
            .iter()
            .map(|(label, value)| {
                if value.is_empty() {
                    Line::from(vec![
                        Span::styled("  • ", Style::default().fg(theme::NEON_CYAN)),
                        Span::styled(label.clone(), theme::value()),
                    ])
                } else {
                    Line::from(vec![
                        Span::styled(format!("  {label:<16}"), theme::label()),
                        Span::styled(value.clone(), theme::value()),
                    ])
                }
            })
            .collect()
    }
}

impl Component for SettingsScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        Ok(match key.code {
            KeyCode::Char('j') | KeyCode::Down => Some(Action::ScrollDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::ScrollUp),
            _ => None,
        })
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::ScrollDown => self.scroll = self.scroll.saturating_add(1),
            Action::ScrollUp => self.scroll = self.scroll.saturating_sub(1),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let constraints: Vec<Constraint> = self
            .state
            .sections
            .iter()
            .map(|s| Constraint::Length(u16::try_from(s.rows.len() + 2).unwrap_or(u16::MAX)))
            .chain(std::iter::once(Constraint::Min(0)))
            .collect();
        let areas = Layout::vertical(constraints).split(area);

        // Scrolling skips whole sections from the top.
        let skip = usize::from(self.scroll).min(self.state.sections.len().saturating_sub(1));
        for (section, area) in self.state.sections.iter().skip(skip).zip(areas.iter()) {
            let block = theme::panel(section.title);
            frame.render_widget(Paragraph::new(Self::section_lines(section)).block(block), *area);
        }
    }

    fn key_hints(&self) -> &'static [(&'static str, &'static str)] {
        &[("j/k", "scroll")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_items_render_as_bullets() {
        let state = SettingsState::new("simulated", None);
        let features = state
            .sections
            .iter()
            .find(|s| s.title == "Features")
            .unwrap();
        let lines = SettingsScreen::section_lines(features);
        assert_eq!(lines.len(), features.rows.len());
        assert_eq!(lines[0].spans[0].content, "  • ");
    }
}
