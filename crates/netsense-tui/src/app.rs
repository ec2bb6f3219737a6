//! Application core: event loop, screen switching, action dispatch.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs},
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use netsense_core::{SettingsState, Telemetry};

use crate::action::{Action, Notification, NotificationLevel};
use crate::component::Component;
use crate::data_bridge::{BridgeHandle, spawn_data_bridge};
use crate::event::{Event, EventReader};
use crate::screen::ScreenId;
use crate::screens::create_screens;
use crate::theme;
use crate::tui::Tui;

const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Top-level application state and event loop.
pub struct App {
    telemetry: Telemetry,
    /// Label of the platform backend, shown in the status bar.
    backend: String,
    active_screen: ScreenId,
    previous_screen: Option<ScreenId>,
    screens: HashMap<ScreenId, Box<dyn Component>>,
    /// Live feed for the active screen. Replaced on every switch.
    bridge: Option<BridgeHandle>,
    running: bool,
    help_visible: bool,
    notification: Option<(Notification, Instant)>,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    pub fn new(telemetry: Telemetry, settings: SettingsState, backend: impl Into<String>) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        let screens: HashMap<ScreenId, Box<dyn Component>> =
            create_screens(settings).into_iter().collect();

        Self {
            telemetry,
            backend: backend.into(),
            active_screen: ScreenId::default(),
            previous_screen: None,
            screens,
            bridge: None,
            running: true,
            help_visible: false,
            notification: None,
            action_tx,
            action_rx,
        }
    }

    /// Run the main event loop until the user quits.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        self.activate(self.active_screen);

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        let (width, height) = tui.size().unwrap_or((80, 24));
        info!(backend = %self.backend, width, height, "TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        events.stop();
        self.bridge = None;
        drop(tui);
        info!("TUI event loop ended");
        Ok(())
    }

    /// Start the live feed for `screen`, stopping the previous one.
    fn activate(&mut self, screen: ScreenId) {
        self.bridge = None;
        self.bridge = spawn_data_bridge(&self.telemetry, screen, self.action_tx.clone());
        if let Some(bridge) = &self.bridge {
            debug!(screen = %bridge.screen(), "data bridge started");
        } else {
            debug!(%screen, "screen has no live feed");
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c'))
            | (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),

            (KeyModifiers::NONE, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),

            (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='4')) => {
                let screen = c
                    .to_digit(10)
                    .and_then(|n| u8::try_from(n).ok())
                    .and_then(ScreenId::from_number);
                if let Some(screen) = screen {
                    return Ok(Some(Action::SwitchScreen(screen)));
                }
            }

            (KeyModifiers::NONE, KeyCode::Tab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.next())));
            }
            (KeyModifiers::SHIFT, KeyCode::BackTab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.prev())));
            }

            (KeyModifiers::NONE, KeyCode::Esc) => {
                if self.notification.is_some() {
                    return Ok(Some(Action::DismissNotification));
                }
                return Ok(Some(Action::GoBack));
            }

            _ => {}
        }

        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            return screen.handle_key_event(key);
        }
        Ok(None)
    }

    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::SwitchScreen(target) => {
                if *target != self.active_screen {
                    debug!("switching screen: {} → {target}", self.active_screen);
                    self.previous_screen = Some(self.active_screen);
                    self.active_screen = *target;
                    self.activate(*target);
                }
            }

            Action::GoBack => {
                if let Some(prev) = self.previous_screen.take() {
                    self.action_tx.send(Action::SwitchScreen(prev))?;
                }
            }

            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::Request(intent) => {
                let delivered = self.bridge.as_ref().is_some_and(|b| b.send(*intent));
                if !delivered {
                    warn!(?intent, screen = %self.active_screen, "no live feed for request");
                    self.action_tx.send(Action::Notify(Notification::warning(format!(
                        "{} has no live feed",
                        self.active_screen
                    ))))?;
                }
            }

            Action::Notify(n) => self.notification = Some((n.clone(), Instant::now())),
            Action::DismissNotification => self.notification = None,

            Action::Tick => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, shown)| shown.elapsed() >= NOTIFICATION_TTL)
                {
                    self.notification = None;
                }
                self.forward_to_active(action)?;
            }

            Action::Resize(w, h) => debug!(w, h, "terminal resized"),
            Action::Render => {}

            // Snapshots from a bridge that was replaced mid-flight still
            // land on their own screen; the rest go to the active one.
            Action::DashboardUpdated(_) => self.forward_to(ScreenId::Dashboard, action)?,
            Action::NetworkUpdated(_) => self.forward_to(ScreenId::Network, action)?,
            Action::SensorsUpdated(_) => self.forward_to(ScreenId::Sensors, action)?,

            Action::ScrollUp | Action::ScrollDown => self.forward_to_active(action)?,
        }
        Ok(())
    }

    fn forward_to_active(&mut self, action: &Action) -> Result<()> {
        self.forward_to(self.active_screen, action)
    }

    fn forward_to(&mut self, id: ScreenId, action: &Action) -> Result<()> {
        if let Some(screen) = self.screens.get_mut(&id) {
            if let Some(follow_up) = screen.update(action)? {
                // Toasts from a screen the user already left are stale.
                if id == self.active_screen {
                    self.action_tx.send(follow_up)?;
                }
            }
        }
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let layout = Layout::vertical([
            Constraint::Min(1),    // Screen content
            Constraint::Length(1), // Tab bar
            Constraint::Length(1), // Status bar
        ])
        .split(area);

        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, layout[0]);
        }
        self.render_tab_bar(frame, layout[1]);
        self.render_status_bar(frame, layout[2]);

        if self.help_visible {
            Self::render_help_overlay(frame, area);
        }
        if let Some((notif, _)) = &self.notification {
            Self::render_notification(frame, area, notif);
        }
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = ScreenId::ALL
            .iter()
            .map(|&id| {
                let style = if id == self.active_screen {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                Line::from(Span::styled(format!(" {} {} ", id.number(), id.label()), style))
            })
            .collect();

        let selected = ScreenId::ALL
            .iter()
            .position(|&s| s == self.active_screen)
            .unwrap_or(0);
        let tabs = Tabs::new(titles)
            .divider(Span::styled(" ", theme::key_hint()))
            .select(selected);

        frame.render_widget(tabs, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let indicator = if self.bridge.is_some() {
            Span::styled(format!("● {}", self.backend), Style::default().fg(theme::SUCCESS_GREEN))
        } else {
            Span::styled(format!("○ {}", self.backend), theme::muted())
        };

        let mut spans = vec![Span::raw(" "), indicator, Span::styled(" │", theme::key_hint())];
        if let Some(screen) = self.screens.get(&self.active_screen) {
            for (key, desc) in screen.key_hints() {
                spans.push(Span::styled(format!(" {key} "), theme::key_hint_key()));
                spans.push(Span::styled(*desc, theme::key_hint()));
            }
        }
        spans.push(Span::styled(" │ ? help  q quit", theme::key_hint()));

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_help_overlay(frame: &mut Frame, area: Rect) {
        let help_width = 50u16.min(area.width.saturating_sub(4));
        let help_height = 18u16.min(area.height.saturating_sub(4));
        let help_area = Rect::new(
            area.x + area.width.saturating_sub(help_width) / 2,
            area.y + area.height.saturating_sub(help_height) / 2,
            help_width,
            help_height,
        );

        frame.render_widget(Clear, help_area);
        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            help_area,
        );

        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());
        let inner = block.inner(help_area);
        frame.render_widget(block, help_area);

        let heading = |text: &'static str| {
            Line::from(Span::styled(format!("  {text}"), Style::default().fg(theme::NEON_CYAN)))
        };
        let key = |k: &'static str, desc: &'static str| {
            Line::from(vec![
                Span::styled(format!("  {k:<10}"), theme::key_hint_key()),
                Span::styled(desc, theme::key_hint()),
            ])
        };

        let help_text = vec![
            Line::from(""),
            heading("Navigation"),
            key("1-4", "Jump to screen"),
            key("Tab", "Next screen"),
            key("S-Tab", "Previous screen"),
            key("Esc", "Back / dismiss toast"),
            Line::from(""),
            heading("Screens"),
            key("s", "Run speed test"),
            key("r", "Refresh network"),
            key("j / k", "Select / scroll"),
            Line::from(""),
            heading("General"),
            key("?", "Toggle this help"),
            key("q", "Quit"),
        ];
        frame.render_widget(Paragraph::new(help_text), inner);
    }

    /// Toast in the bottom-right corner, above the status bar.
    fn render_notification(frame: &mut Frame, area: Rect, notif: &Notification) {
        let msg_len = u16::try_from(notif.message.chars().count()).unwrap_or(u16::MAX);
        let width = msg_len.saturating_add(6).clamp(20, 60).min(area.width);
        let height = 3u16;

        let toast_area = Rect::new(
            area.x + area.width.saturating_sub(width + 1),
            area.y + area.height.saturating_sub(height + 2),
            width,
            height.min(area.height),
        );

        let (border_color, icon) = match notif.level {
            NotificationLevel::Success => (theme::SUCCESS_GREEN, "✓"),
            NotificationLevel::Error => (theme::ERROR_RED, "✗"),
            NotificationLevel::Warning => (theme::ELECTRIC_YELLOW, "!"),
            NotificationLevel::Info => (theme::NEON_CYAN, "·"),
        };

        frame.render_widget(Clear, toast_area);
        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            toast_area,
        );

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color));
        let inner = block.inner(toast_area);
        frame.render_widget(block, toast_area);

        let line = Line::from(vec![
            Span::styled(format!(" {icon} "), Style::default().fg(border_color)),
            Span::styled(notif.message.as_str(), Style::default().fg(theme::DIM_WHITE)),
        ]);
        frame.render_widget(Paragraph::new(line), inner);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use netsense_api::Platform;
    use netsense_api::platform::simulated::SimulatedPlatform;
    use netsense_core::SourceConfig;
    use pretty_assertions::assert_eq;

    use super::*;

    fn app() -> App {
        let platform = Platform::from_backend(Arc::new(SimulatedPlatform::handset()));
        let telemetry = Telemetry::new(platform, &SourceConfig::default()).unwrap();
        App::new(telemetry, SettingsState::new("simulated", None), "simulated")
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn number_keys_switch_screens() {
        let mut app = app();
        let action = app.handle_key_event(key(KeyCode::Char('3'))).unwrap();
        assert!(matches!(action, Some(Action::SwitchScreen(ScreenId::Sensors))));
        assert!(app.handle_key_event(key(KeyCode::Char('9'))).unwrap().is_none());
    }

    #[tokio::test]
    async fn switching_replaces_the_bridge() {
        let mut app = app();
        app.activate(ScreenId::Dashboard);
        app.process_action(&Action::SwitchScreen(ScreenId::Network)).unwrap();
        assert_eq!(app.bridge.as_ref().map(BridgeHandle::screen), Some(ScreenId::Network));

        app.process_action(&Action::SwitchScreen(ScreenId::Settings)).unwrap();
        assert!(app.bridge.is_none());

        app.process_action(&Action::GoBack).unwrap();
        let queued = app.action_rx.try_recv().unwrap();
        assert!(matches!(queued, Action::SwitchScreen(ScreenId::Network)));
    }

    #[tokio::test]
    async fn request_without_feed_warns() {
        let mut app = app();
        app.process_action(&Action::SwitchScreen(ScreenId::Settings)).unwrap();
        app.process_action(&Action::Request(crate::action::Intent::StartSpeedTest)).unwrap();

        let Ok(Action::Notify(n)) = app.action_rx.try_recv() else {
            panic!("expected a warning toast");
        };
        assert_eq!(n.level, NotificationLevel::Warning);
    }

    #[tokio::test]
    async fn help_overlay_swallows_keys() {
        let mut app = app();
        app.process_action(&Action::ToggleHelp).unwrap();
        assert!(app.handle_key_event(key(KeyCode::Char('q'))).unwrap().is_none());
        assert!(matches!(
            app.handle_key_event(key(KeyCode::Esc)).unwrap(),
            Some(Action::ToggleHelp)
        ));
    }
}
