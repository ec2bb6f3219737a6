// ── Telemetry sources ──
//
// The two leaf services of the app. Both are constructed explicitly from
// a `Platform` and shared by cloning.

pub mod network;
pub mod sensor;

pub use network::{NetworkSource, throughput_mbps};
pub use sensor::SensorSource;
