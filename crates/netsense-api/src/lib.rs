// netsense-api: platform service traits, host backends and HTTP probes

pub mod error;
pub mod platform;
pub mod probe;
pub mod transport;

pub use error::Error;
pub use platform::Platform;
pub use probe::{DownloadSample, ProbeClient, ReachabilitySample};
pub use transport::TransportConfig;
