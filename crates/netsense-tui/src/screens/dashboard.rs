//! Dashboard screen, the home screen.
//!
//! ┌─ Network ─────────────┐ ┌─ Quick Stats ─────────────────┐
//! │ type, name, signal    │ │ Signal  Speed  Sensors  Uptime │
//! │ download, latency     │ └───────────────────────────────┘
//! └───────────────────────┘ ┌─ Recent Activity ─────────────┐
//! ┌─ Sensors ─────────────┐ │ newest first, up to ten       │
//! │ ● Accelerometer ...   │ │                               │
//! └───────────────────────┘ └───────────────────────────────┘

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use throbber_widgets_tui::{Throbber, ThrobberState};

use netsense_core::{ActivityKind, DashboardState};

use crate::action::{Action, Intent, Notification};
use crate::component::Component;
use crate::theme;
use crate::widgets::{fmt, signal_bars};

pub struct DashboardScreen {
    state: Arc<DashboardState>,
    throbber_state: ThrobberState,
}

impl DashboardScreen {
    pub fn new() -> Self {
        Self {
            state: Arc::new(DashboardState::default()),
            throbber_state: ThrobberState::default(),
        }
    }

    fn render_network(&self, frame: &mut Frame, area: Rect) {
        let block = theme::panel("Network");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(info) = self.state.network_info.as_ref() else {
            let msg = if self.state.is_loading { "  Detecting network..." } else { "  No network" };
            frame.render_widget(Paragraph::new(Span::styled(msg, theme::muted())), inner);
            return;
        };

        let lines = vec![
            Line::from(""),
            Line::from(vec![
                Span::styled("  Type     ", theme::label()),
                Span::styled(info.connection_type.label(), theme::value()),
            ]),
            Line::from(vec![
                Span::styled("  Name     ", theme::label()),
                Span::styled(fmt::or_dash(info.network_name.as_deref()), theme::value()),
            ]),
            Line::from(vec![
                Span::styled("  Signal   ", theme::label()),
                signal_bars::signal_span(info.signal_strength),
                Span::styled(format!(" {}/5", info.signal_strength), theme::muted()),
            ]),
            Line::from(vec![
                Span::styled("  Download ", theme::label()),
                Span::styled(fmt::fmt_mbps(info.download_mbps), Style::default().fg(theme::CORAL)),
            ]),
            Line::from(vec![
                Span::styled("  Latency  ", theme::label()),
                Span::styled(fmt::fmt_latency(info.latency_ms), theme::value()),
            ]),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_sensor_statuses(&self, frame: &mut Frame, area: Rect) {
        let block = theme::panel("Sensors");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines: Vec<Line> = self
            .state
            .sensor_statuses
            .iter()
            .map(|s| {
                let (dot, color) = if s.is_active {
                    ("●", theme::SUCCESS_GREEN)
                } else {
                    ("○", theme::BORDER_GRAY)
                };
                Line::from(vec![
                    Span::styled(format!("  {dot} "), Style::default().fg(color)),
                    Span::styled(s.name, theme::label()),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_quick_stats(&self, frame: &mut Frame, area: Rect) {
        let block = theme::panel("Quick Stats");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut spans = vec![Span::raw("  ")];
        for stat in &self.state.quick_stats {
            spans.push(Span::styled(format!("{} ", stat.label), theme::label()));
            spans.push(Span::styled(
                stat.value.clone(),
                theme::value().add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::raw("    "));
        }
        frame.render_widget(Paragraph::new(vec![Line::from(""), Line::from(spans)]), inner);
    }

    fn render_speed_test(&self, frame: &mut Frame, area: Rect) {
        if self.state.is_speed_test_running {
            let throbber = Throbber::default()
                .label("  Running speed test...")
                .style(Style::default().fg(theme::NEON_CYAN))
                .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
            frame.render_stateful_widget(throbber, area, &mut self.throbber_state.clone());
        } else {
            let line = Line::from(vec![
                Span::styled("  s ", theme::key_hint_key()),
                Span::styled("run speed test", theme::key_hint()),
            ]);
            frame.render_widget(Paragraph::new(line), area);
        }
    }

    fn render_activity(&self, frame: &mut Frame, area: Rect) {
        let block = theme::panel("Recent Activity");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let width = usize::from(inner.width.saturating_sub(12));
        let mut lines: Vec<Line> = self
            .state
            .recent_activities
            .iter()
            .take(usize::from(inner.height))
            .map(|entry| {
                let color = match entry.kind {
                    ActivityKind::Network => theme::NEON_CYAN,
                    ActivityKind::Temperature => theme::CORAL,
                    ActivityKind::Location => theme::SUCCESS_GREEN,
                    ActivityKind::SpeedTest => theme::ELECTRIC_PURPLE,
                    ActivityKind::Failure => theme::ERROR_RED,
                };
                let text: String = format!("{}: {}", entry.title, entry.description)
                    .chars()
                    .take(width)
                    .collect();
                Line::from(vec![
                    Span::styled(
                        format!("  {}  ", entry.time_label()),
                        Style::default().fg(theme::ELECTRIC_YELLOW),
                    ),
                    Span::styled(text, Style::default().fg(color)),
                ])
            })
            .collect();

        if lines.is_empty() {
            lines.push(Line::from(Span::styled("  No activity yet", theme::muted())));
        }
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

/// Toast for a speed test that just stopped running.
fn speed_test_outcome(state: &DashboardState) -> Notification {
    match (&state.error, state.network_info.as_ref()) {
        (Some(err), _) => Notification::error(err.clone()),
        (None, Some(info)) => {
            Notification::success(format!("Speed test: {}", fmt::fmt_mbps(info.download_mbps)))
        }
        (None, None) => Notification::success("Speed test finished"),
    }
}

impl Component for DashboardScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        Ok(match key.code {
            KeyCode::Char('s') if !self.state.is_speed_test_running => {
                Some(Action::Request(Intent::StartSpeedTest))
            }
            _ => None,
        })
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::DashboardUpdated(state) => {
                let finished = self.state.is_speed_test_running && !state.is_speed_test_running;
                self.state = Arc::clone(state);
                if finished {
                    return Ok(Some(Action::Notify(speed_test_outcome(&self.state))));
                }
            }
            Action::Tick if self.state.is_speed_test_running => {
                self.throbber_state.calc_next();
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let left_width = 34_u16.min(area.width / 2);
        let columns = Layout::horizontal([Constraint::Length(left_width), Constraint::Min(30)])
            .split(area);

        let left = Layout::vertical([Constraint::Length(8), Constraint::Min(4)]).split(columns[0]);
        self.render_network(frame, left[0]);
        self.render_sensor_statuses(frame, left[1]);

        let right = Layout::vertical([
            Constraint::Length(4),
            Constraint::Length(1),
            Constraint::Min(4),
        ])
        .split(columns[1]);
        self.render_quick_stats(frame, right[0]);
        self.render_speed_test(frame, right[1]);
        self.render_activity(frame, right[2]);
    }

    fn key_hints(&self) -> &'static [(&'static str, &'static str)] {
        &[("s", "speed test")]
    }
}
