//! Screen identifiers and tab order.

use std::fmt;

/// The four primary screens, navigable by number keys 1-4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenId {
    #[default]
    Dashboard,
    Network,
    Sensors,
    Settings,
}

impl ScreenId {
    /// All screens in tab-bar order.
    pub const ALL: [ScreenId; 4] = [Self::Dashboard, Self::Network, Self::Sensors, Self::Settings];

    pub fn number(self) -> u8 {
        match self {
            Self::Dashboard => 1,
            Self::Network => 2,
            Self::Sensors => 3,
            Self::Settings => 4,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Dashboard),
            2 => Some(Self::Network),
            3 => Some(Self::Sensors),
            4 => Some(Self::Settings),
            _ => None,
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|&s| s == self).unwrap_or(0)
    }

    /// Next screen in tab order (wraps around).
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Previous screen in tab order (wraps around).
    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Network => "Network",
            Self::Sensors => "Sensors",
            Self::Settings => "Settings",
        }
    }

    /// Whether the screen has live data behind it.
    pub fn has_feed(self) -> bool {
        !matches!(self, Self::Settings)
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_keys_round_trip() {
        for id in ScreenId::ALL {
            assert_eq!(ScreenId::from_number(id.number()), Some(id));
        }
        assert_eq!(ScreenId::from_number(0), None);
        assert_eq!(ScreenId::from_number(5), None);
    }

    #[test]
    fn tab_order_wraps() {
        assert_eq!(ScreenId::Settings.next(), ScreenId::Dashboard);
        assert_eq!(ScreenId::Dashboard.prev(), ScreenId::Settings);
        assert_eq!(ScreenId::Network.next(), ScreenId::Sensors);
    }
}
