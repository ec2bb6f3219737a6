//! Network screen: connection summary, speed test, Wi-Fi and cellular details.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use throbber_widgets_tui::{Throbber, ThrobberState};

use netsense_core::{CellularInfo, NetworkState, WifiInfo};

use crate::action::{Action, Intent, Notification};
use crate::component::Component;
use crate::theme;
use crate::widgets::{fmt, signal_bars};

pub struct NetworkScreen {
    state: Arc<NetworkState>,
    throbber_state: ThrobberState,
}

fn row(label: &str, value: impl Into<String>) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {label:<12}"), theme::label()),
        Span::styled(value.into(), theme::value()),
    ])
}

impl NetworkScreen {
    pub fn new() -> Self {
        Self {
            state: Arc::new(NetworkState::default()),
            throbber_state: ThrobberState::default(),
        }
    }

    fn render_connection(&self, frame: &mut Frame, area: Rect) {
        let block = theme::panel("Connection");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(info) = self.state.network_info.as_ref() else {
            let msg = if self.state.is_loading { "  Loading..." } else { "  No network" };
            frame.render_widget(Paragraph::new(Span::styled(msg, theme::muted())), inner);
            return;
        };

        let lines = vec![
            row("Type", info.connection_type.label()),
            row("Name", fmt::or_dash(info.network_name.as_deref())),
            Line::from(vec![
                Span::styled(format!("  {:<12}", "Signal"), theme::label()),
                signal_bars::signal_span(info.signal_strength),
            ]),
            row("Updated", info.timestamp.format("%H:%M:%S").to_string()),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_speed_test(&self, frame: &mut Frame, area: Rect) {
        let block = theme::panel("Speed Test");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::vertical([Constraint::Length(1), Constraint::Min(1)]).split(inner);

        if self.state.is_speed_test_running {
            let throbber = Throbber::default()
                .label("  Measuring...")
                .style(Style::default().fg(theme::NEON_CYAN))
                .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
            frame.render_stateful_widget(throbber, rows[0], &mut self.throbber_state.clone());
        } else if let Some(err) = &self.state.error {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    format!("  {err}"),
                    Style::default().fg(theme::ERROR_RED),
                )),
                rows[0],
            );
        }

        let Some(result) = self.state.speed_test_result.as_ref() else {
            if !self.state.is_speed_test_running {
                frame.render_widget(
                    Paragraph::new(Line::from(vec![
                        Span::styled("  s ", theme::key_hint_key()),
                        Span::styled("start a test", theme::key_hint()),
                    ])),
                    rows[1],
                );
            }
            return;
        };

        let lines = vec![
            Line::from(vec![
                Span::styled(format!("  {:<12}", "Download"), theme::label()),
                Span::styled(
                    fmt::fmt_mbps(result.download_mbps),
                    Style::default().fg(theme::CORAL).add_modifier(Modifier::BOLD),
                ),
            ]),
            row("Upload", fmt::fmt_mbps(result.upload_mbps)),
            row("Latency", fmt::fmt_latency(result.latency_ms)),
            row("Duration", fmt::fmt_duration(result.test_duration)),
        ];
        frame.render_widget(Paragraph::new(lines), rows[1]);
    }

    fn render_wifi(&self, frame: &mut Frame, area: Rect) {
        let block = theme::panel("Wi-Fi");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines = match self.state.wifi_info.as_ref() {
            Some(wifi) if *wifi != WifiInfo::empty() => vec![
                row("SSID", fmt::or_dash(wifi.ssid.as_deref())),
                row("BSSID", fmt::or_dash(wifi.bssid.as_deref())),
                row("IP", fmt::or_dash(wifi.ip_address.as_deref())),
                row("Band", wifi.band().unwrap_or(fmt::DASH)),
                row("Frequency", format!("{} MHz", wifi.frequency_mhz)),
                row("Link", format!("{} Mbps", wifi.link_speed_mbps)),
                row("RSSI", format!("{} dBm", wifi.rssi)),
            ],
            Some(_) => vec![Line::from(Span::styled("  Not connected", theme::muted()))],
            None => vec![Line::from(Span::styled("  Loading...", theme::muted()))],
        };
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_cellular(&self, frame: &mut Frame, area: Rect) {
        let block = theme::panel("Cellular");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines = match self.state.cellular_info.as_ref() {
            Some(cell) if *cell != CellularInfo::unknown() => vec![
                row("Type", cell.network_type.clone()),
                row("Operator", fmt::or_dash(cell.operator_name.as_deref())),
                row("MCC", fmt::or_dash(cell.mcc.as_deref())),
                row("MNC", fmt::or_dash(cell.mnc.as_deref())),
            ],
            Some(_) => vec![Line::from(Span::styled("  No cellular radio", theme::muted()))],
            None => vec![Line::from(Span::styled("  Loading...", theme::muted()))],
        };
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

impl Component for NetworkScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        Ok(match key.code {
            KeyCode::Char('s') if !self.state.is_speed_test_running => {
                Some(Action::Request(Intent::StartSpeedTest))
            }
            KeyCode::Char('r') => Some(Action::Request(Intent::RefreshNetwork)),
            _ => None,
        })
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::NetworkUpdated(state) => {
                let previous = std::mem::replace(&mut self.state, Arc::clone(state));
                if previous.is_speed_test_running && !state.is_speed_test_running {
                    let toast = match (&state.error, state.speed_test_result.as_ref()) {
                        (Some(err), _) => Notification::error(err.clone()),
                        (None, Some(r)) => Notification::success(format!(
                            "Speed test: {} down, {}",
                            fmt::fmt_mbps(r.download_mbps),
                            fmt::fmt_latency(r.latency_ms)
                        )),
                        (None, None) => Notification::success("Speed test finished"),
                    };
                    return Ok(Some(Action::Notify(toast)));
                }
                if previous.is_loading && !state.is_loading && previous.network_info.is_some() {
                    return Ok(Some(Action::Notify(Notification::info("Network refreshed"))));
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
        let rows = Layout::vertical([Constraint::Length(8), Constraint::Min(6)]).split(area);
        let top = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[0]);
        let bottom = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);

        self.render_connection(frame, top[0]);
        self.render_speed_test(frame, top[1]);
        self.render_wifi(frame, bottom[0]);
        self.render_cellular(frame, bottom[1]);
    }

    fn key_hints(&self) -> &'static [(&'static str, &'static str)] {
        &[("s", "speed test"), ("r", "refresh")]
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn refresh_key_always_requests() {
        let mut screen = NetworkScreen::new();
        let running = Arc::new(NetworkState {
            is_speed_test_running: true,
            ..NetworkState::default()
        });
        screen.update(&Action::NetworkUpdated(running)).unwrap();

        assert!(screen.handle_key_event(KeyEvent::from(KeyCode::Char('s'))).unwrap().is_none());
        assert!(matches!(
            screen.handle_key_event(KeyEvent::from(KeyCode::Char('r'))).unwrap(),
            Some(Action::Request(Intent::RefreshNetwork))
        ));
    }

    #[test]
    fn finished_without_result_reports_error() {
        let mut screen = NetworkScreen::new();
        let running = Arc::new(NetworkState {
            is_speed_test_running: true,
            is_loading: false,
            ..NetworkState::default()
        });
        screen.update(&Action::NetworkUpdated(running)).unwrap();

        let failed = Arc::new(NetworkState {
            is_loading: false,
            error: Some("Speed test failed: No speed test probe succeeded".into()),
            ..NetworkState::default()
        });
        let follow_up = screen.update(&Action::NetworkUpdated(failed)).unwrap();
        let Some(Action::Notify(n)) = follow_up else {
            panic!("expected a toast, got {follow_up:?}");
        };
        assert_eq!(n.level, crate::action::NotificationLevel::Error);
    }
}
