//! Sensors screen: fused motion, environment and location, plus a
//! browsable list of every sensor on the device.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, ListState, Paragraph, Wrap};

use netsense_core::{SensorType, SensorsState};

use crate::action::{Action, Notification};
use crate::component::Component;
use crate::theme;
use crate::widgets::fmt;

pub struct SensorsScreen {
    state: Arc<SensorsState>,
    selected: usize,
}

fn row(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {label:<13}"), theme::label()),
        Span::styled(value, theme::value()),
    ])
}

impl SensorsScreen {
    pub fn new() -> Self {
        Self {
            state: Arc::new(SensorsState::default()),
            selected: 0,
        }
    }

    fn selected_sensor(&self) -> Option<SensorType> {
        self.state.available_sensors.iter().nth(self.selected).copied()
    }

    fn render_motion(&self, frame: &mut Frame, area: Rect) {
        let block = theme::panel("Motion");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(m) = self.state.motion.as_ref() else {
            frame.render_widget(
                Paragraph::new(Span::styled("  No motion sensors", theme::muted())),
                inner,
            );
            return;
        };

        let lines = vec![
            row("Accel", fmt::fmt_axes(&m.accelerometer)),
            row("Gyro", fmt::fmt_axes(&m.gyroscope)),
            row("Magnetic", fmt::fmt_axes(&m.magnetometer)),
            row("Gravity", fmt::fmt_axes(&m.gravity)),
            row("Linear", fmt::fmt_axes(&m.linear_acceleration)),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_environment(&self, frame: &mut Frame, area: Rect) {
        let block = theme::panel("Environment");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(env) = self.state.environment.as_ref() else {
            frame.render_widget(
                Paragraph::new(Span::styled("  No ambient sensors", theme::muted())),
                inner,
            );
            return;
        };

        let lines = vec![
            row("Temperature", fmt::fmt_reading(env.temperature, "°C")),
            row("Humidity", fmt::fmt_reading(env.humidity, "%")),
            row("Pressure", fmt::fmt_reading(env.pressure, "hPa")),
            row("Light", fmt::fmt_reading(env.light_level, "lx")),
            row("Proximity", fmt::fmt_reading(env.proximity, "cm")),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_location(&self, frame: &mut Frame, area: Rect) {
        let block = theme::panel("Location");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines = match (self.state.location.as_ref(), self.state.error.as_ref()) {
            (Some(loc), _) => vec![
                row("Latitude", format!("{:.6}", loc.latitude)),
                row("Longitude", format!("{:.6}", loc.longitude)),
                row("Altitude", format!("{:.1} m", loc.altitude)),
                row("Accuracy", format!("{:.1} m", loc.accuracy)),
                row("Provider", loc.provider.clone()),
            ],
            (None, Some(err)) => vec![Line::from(Span::styled(
                format!("  {err}"),
                Style::default().fg(theme::ERROR_RED),
            ))],
            (None, None) => vec![Line::from(Span::styled("  Waiting for a fix...", theme::muted()))],
        };
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_sensor_list(&self, frame: &mut Frame, area: Rect) {
        let block = theme::panel("Available Sensors");

        let items: Vec<ListItem> = self
            .state
            .available_sensors
            .iter()
            .map(|kind| {
                let reading = self.state.readings.get(kind).map_or_else(
                    || fmt::DASH.to_owned(),
                    |r| {
                        let value = r.values.first().copied().unwrap_or_default();
                        format!("{value:.2} {}", kind.unit())
                    },
                );
                let color = if self.state.active_sensors.contains(kind) {
                    theme::SUCCESS_GREEN
                } else {
                    theme::BORDER_GRAY
                };
                ListItem::new(Line::from(vec![
                    Span::styled("● ", Style::default().fg(color)),
                    Span::styled(format!("{:<20}", kind.label()), theme::label()),
                    Span::styled(reading, theme::value()),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(theme::table_selected())
            .highlight_symbol("▸ ");
        let mut list_state = ListState::default().with_selected(
            (!self.state.available_sensors.is_empty()).then_some(self.selected),
        );
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_description(&self, frame: &mut Frame, area: Rect) {
        let block = theme::panel("Details");
        let text = self
            .selected_sensor()
            .and_then(|kind| self.state.descriptions.get(&kind))
            .map_or("No sensor selected", String::as_str);
        let lines: Vec<Line> = text
            .lines()
            .map(|l| Line::from(Span::styled(l.to_owned(), theme::value())))
            .collect();
        frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
    }
}

impl Component for SensorsScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        Ok(match key.code {
            KeyCode::Char('j') | KeyCode::Down => Some(Action::ScrollDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::ScrollUp),
            _ => None,
        })
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::SensorsUpdated(state) => {
                let previous = std::mem::replace(&mut self.state, Arc::clone(state));
                let count = state.available_sensors.len();
                self.selected = self.selected.min(count.saturating_sub(1));
                if let (None, Some(err)) = (&previous.error, &state.error) {
                    return Ok(Some(Action::Notify(Notification::warning(err.clone()))));
                }
            }
            Action::ScrollDown => {
                let count = self.state.available_sensors.len();
                if self.selected + 1 < count {
                    self.selected += 1;
                }
            }
            Action::ScrollUp => self.selected = self.selected.saturating_sub(1),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::vertical([Constraint::Length(7), Constraint::Min(6)]).split(area);
        let top = Layout::horizontal([
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ])
        .split(rows[0]);
        let bottom = Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[1]);

        self.render_motion(frame, top[0]);
        self.render_environment(frame, top[1]);
        self.render_location(frame, top[2]);
        self.render_sensor_list(frame, bottom[0]);
        self.render_description(frame, bottom[1]);
    }

    fn key_hints(&self) -> &'static [(&'static str, &'static str)] {
        &[("j/k", "select sensor")]
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use pretty_assertions::assert_eq;

    use super::*;

    fn with_sensors(kinds: &[SensorType]) -> Arc<SensorsState> {
        Arc::new(SensorsState {
            available_sensors: kinds.iter().copied().collect::<BTreeSet<_>>(),
            descriptions: kinds
                .iter()
                .map(|k| (*k, format!("Name: {}", k.label())))
                .collect::<BTreeMap<_, _>>(),
            is_loading: false,
            ..SensorsState::default()
        })
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut screen = SensorsScreen::new();
        screen
            .update(&Action::SensorsUpdated(with_sensors(&[
                SensorType::Accelerometer,
                SensorType::Light,
            ])))
            .unwrap();

        screen.update(&Action::ScrollDown).unwrap();
        screen.update(&Action::ScrollDown).unwrap();
        assert_eq!(screen.selected_sensor(), Some(SensorType::Light));

        screen.update(&Action::ScrollUp).unwrap();
        screen.update(&Action::ScrollUp).unwrap();
        assert_eq!(screen.selected_sensor(), Some(SensorType::Accelerometer));

        screen.update(&Action::SensorsUpdated(with_sensors(&[]))).unwrap();
        assert_eq!(screen.selected_sensor(), None);
    }

    #[test]
    fn location_error_warns_once() {
        let mut screen = SensorsScreen::new();
        let failed = Arc::new(SensorsState {
            error: Some("Permission denied: location".into()),
            ..SensorsState::default()
        });

        let first = screen.update(&Action::SensorsUpdated(Arc::clone(&failed))).unwrap();
        assert!(matches!(first, Some(Action::Notify(_))));
        let second = screen.update(&Action::SensorsUpdated(failed)).unwrap();
        assert!(second.is_none());
    }
}
