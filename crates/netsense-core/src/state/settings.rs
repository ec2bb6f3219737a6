// ── Settings screen state ──
//
// Static text; nothing to acquire.

use serde::Serialize;

/// A titled block of label/value rows. Rows with an empty value render as
/// plain list items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsSection {
    pub title: &'static str,
    pub rows: Vec<(String, String)>,
}

impl SettingsSection {
    fn items(title: &'static str, items: &[&str]) -> Self {
        Self {
            title,
            rows: items.iter().map(|i| ((*i).to_owned(), String::new())).collect(),
        }
    }
}

const FEATURES: &[&str] = &[
    "Network speed testing (Wi-Fi, LTE, GPRS)",
    "Real-time sensor monitoring",
    "GPS location tracking",
    "Environmental sensors",
    "Motion detection",
    "Terminal dashboard",
];

const CAPABILITIES: &[(&str, &str)] = &[
    ("Internet access", "speed testing"),
    ("Location access", "GPS tracking"),
    ("Network state", "connection monitoring"),
    ("Sensor access", "device sensors"),
    ("Phone state", "cellular info"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsState {
    pub sections: Vec<SettingsSection>,
}

impl SettingsState {
    /// `backend` names the active platform backend; `config_path` is the
    /// file settings were loaded from, if any.
    pub fn new(backend: &str, config_path: Option<String>) -> Self {
        let build = if cfg!(debug_assertions) { "Debug" } else { "Release" };
        let mut app_info = vec![
            ("Version".to_owned(), env!("CARGO_PKG_VERSION").to_owned()),
            ("Build".to_owned(), build.to_owned()),
            ("Platform".to_owned(), backend.to_owned()),
        ];
        if let Some(path) = config_path {
            app_info.push(("Config".to_owned(), path));
        }

        Self {
            sections: vec![
                SettingsSection {
                    title: "App Information",
                    rows: app_info,
                },
                SettingsSection::items("Features", FEATURES),
                SettingsSection {
                    title: "Capabilities",
                    rows: CAPABILITIES
                        .iter()
                        .map(|(name, purpose)| ((*name).to_owned(), format!("for {purpose}")))
                        .collect(),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_sections_in_order() {
        let state = SettingsState::new("simulated", None);
        let titles: Vec<&str> = state.sections.iter().map(|s| s.title).collect();
        assert_eq!(titles, ["App Information", "Features", "Capabilities"]);
        assert_eq!(state.sections[2].rows.len(), 5);
    }

    #[test]
    fn config_path_row_only_when_known() {
        let without = SettingsState::new("linux", None);
        let with = SettingsState::new("linux", Some("/tmp/config.toml".into()));
        assert_eq!(without.sections[0].rows.len(), 3);
        assert_eq!(
            with.sections[0].rows.last(),
            Some(&("Config".to_owned(), "/tmp/config.toml".to_owned()))
        );
    }
}
