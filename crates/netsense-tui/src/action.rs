//! UI actions. Every state transition in the TUI goes through one.

use std::sync::Arc;

use netsense_core::{DashboardState, NetworkState, SensorsState};

use crate::screen::ScreenId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A toast notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Warning,
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }
}

/// User intents forwarded to the active screen's state holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    StartSpeedTest,
    RefreshNetwork,
}

#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Navigation ────────────────────────────────────────────────
    SwitchScreen(ScreenId),
    GoBack,
    ScrollUp,
    ScrollDown,

    // ── Data (from the state holders) ─────────────────────────────
    DashboardUpdated(Arc<DashboardState>),
    NetworkUpdated(Arc<NetworkState>),
    SensorsUpdated(Arc<SensorsState>),

    // ── Intents ───────────────────────────────────────────────────
    Request(Intent),

    // ── Overlays ──────────────────────────────────────────────────
    ToggleHelp,
    Notify(Notification),
    DismissNotification,
}
