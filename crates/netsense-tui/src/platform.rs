//! Platform backend selection.

use std::path::Path;
use std::sync::Arc;

use netsense_api::Platform;
#[cfg(target_os = "linux")]
use netsense_api::platform::linux::LinuxPlatform;
use netsense_api::platform::simulated::SimulatedPlatform;
use netsense_config::{Backend, PlatformSettings};
use tracing::info;

/// Resolve `Auto` against what the host actually exposes.
pub fn resolve_backend(settings: &PlatformSettings, simulate: bool) -> Backend {
    if simulate {
        return Backend::Simulated;
    }
    match settings.backend {
        Backend::Auto if has_sysfs_net(&settings.sysfs_root) => Backend::Linux,
        Backend::Auto => Backend::Simulated,
        other => other,
    }
}

fn has_sysfs_net(root: &Path) -> bool {
    cfg!(target_os = "linux") && root.join("sys/class/net").is_dir()
}

/// Build the platform for a resolved backend.
pub fn build_platform(backend: Backend, settings: &PlatformSettings) -> Platform {
    info!(backend = backend.as_str(), root = %settings.sysfs_root.display(), "building platform");
    match backend {
        Backend::Linux => host_platform(settings),
        Backend::Simulated | Backend::Auto => {
            Platform::from_backend(Arc::new(SimulatedPlatform::handset()))
        }
    }
}

#[cfg(target_os = "linux")]
fn host_platform(settings: &PlatformSettings) -> Platform {
    Platform::from_backend(Arc::new(LinuxPlatform::with_root(settings.sysfs_root.clone())))
}

#[cfg(not(target_os = "linux"))]
fn host_platform(_settings: &PlatformSettings) -> Platform {
    tracing::warn!("linux backend is not available on this host, using the simulated handset");
    Platform::from_backend(Arc::new(SimulatedPlatform::handset()))
}
