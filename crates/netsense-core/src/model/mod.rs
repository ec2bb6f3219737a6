// ── Domain model ──
//
// Immutable value snapshots produced by the telemetry sources.

pub mod network;
pub mod sensor;

pub use network::{CellularInfo, ConnectionType, NetworkInfo, SpeedTestResult, WifiInfo};
pub use sensor::{DeviceMotion, EnvironmentalData, LocationData, SensorReading, SensorType};
