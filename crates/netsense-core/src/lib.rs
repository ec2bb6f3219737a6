//! Telemetry layer between `netsense-api` and the terminal UI.
//!
//! - **Sources** ([`NetworkSource`], [`SensorSource`]) turn platform
//!   services into values and streams: network classification, Wi-Fi and
//!   cellular details, the crude speed test, raw sensor readings, fused
//!   motion and ambient snapshots, and location fixes.
//!
//! - **[`SensorStream<T>`]** owns the platform listeners behind a stream;
//!   dropping it unregisters them.
//!
//! - **Screen state** ([`state`]) holders publish immutable snapshots over
//!   [`StateStream<S>`] and accept user intents such as starting a speed
//!   test.
//!
//! - **[`Telemetry`]** bundles both sources over one platform and builds
//!   started holders on demand.

pub mod config;
pub mod convert;
pub mod error;
pub mod fusion;
pub mod model;
pub mod source;
pub mod state;
pub mod stream;
pub mod telemetry;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{SensorConfig, SourceConfig, SpeedTestConfig};
pub use error::CoreError;
pub use source::{NetworkSource, SensorSource, throughput_mbps};
pub use state::{
    ActivityEntry, ActivityKind, ActivityLog, DashboardHolder, DashboardState, NetworkHolder,
    NetworkState, QuickStat, SensorStatus, SensorsHolder, SensorsState, SettingsSection,
    SettingsState,
};
pub use stream::{SensorStream, StateStream};
pub use telemetry::Telemetry;

pub use model::{
    CellularInfo, ConnectionType, DeviceMotion, EnvironmentalData, LocationData, NetworkInfo,
    SensorReading, SensorType, SpeedTestResult, WifiInfo,
};
