pub mod dashboard;
pub mod network;
pub mod sensors;
pub mod settings;

use netsense_core::SettingsState;

use crate::component::Component;
use crate::screen::ScreenId;

/// One component per screen, in tab order.
pub fn create_screens(settings: SettingsState) -> Vec<(ScreenId, Box<dyn Component>)> {
    vec![
        (ScreenId::Dashboard, Box::new(dashboard::DashboardScreen::new())),
        (ScreenId::Network, Box::new(network::NetworkScreen::new())),
        (ScreenId::Sensors, Box::new(sensors::SensorsScreen::new())),
        (ScreenId::Settings, Box::new(settings::SettingsScreen::new(settings))),
    ]
}
