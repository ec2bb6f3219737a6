// ── Telemetry facade ──
//
// Bundles both sources over one platform and builds the screen holders.

use netsense_api::Platform;

use crate::config::SourceConfig;
use crate::error::CoreError;
use crate::source::{NetworkSource, SensorSource};
use crate::state::{DashboardHolder, NetworkHolder, SensorsHolder};

/// Both telemetry sources, sharing one platform.
#[derive(Clone)]
pub struct Telemetry {
    network: NetworkSource,
    sensors: SensorSource,
}

impl Telemetry {
    /// Build the sources. Fails only if the HTTP client cannot be built.
    pub fn new(platform: Platform, config: &SourceConfig) -> Result<Self, CoreError> {
        let network = NetworkSource::from_config(platform.clone(), config.speed_test.clone())?;
        let sensors = SensorSource::new(platform, config.sensors.clone());
        Ok(Self { network, sensors })
    }

    pub fn network(&self) -> &NetworkSource {
        &self.network
    }

    pub fn sensors(&self) -> &SensorSource {
        &self.sensors
    }

    /// Fresh, started dashboard holder. Requires a Tokio runtime.
    pub fn dashboard(&self) -> DashboardHolder {
        let holder = DashboardHolder::new(self.network.clone(), self.sensors.clone());
        holder.start();
        holder
    }

    /// Fresh, started network-screen holder. Requires a Tokio runtime.
    pub fn network_screen(&self) -> NetworkHolder {
        let holder = NetworkHolder::new(self.network.clone());
        holder.start();
        holder
    }

    /// Fresh, started sensors-screen holder. Requires a Tokio runtime.
    pub fn sensors_screen(&self) -> SensorsHolder {
        let holder = SensorsHolder::new(self.sensors.clone());
        holder.start();
        holder
    }
}
