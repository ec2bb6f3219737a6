use thiserror::Error;

/// Top-level error type for the `netsense-api` crate.
///
/// Covers every failure mode of the platform services and the HTTP probe.
/// `netsense-core` maps these into user-facing diagnostics or, more often,
/// swallows them and substitutes a placeholder value.
#[derive(Debug, Error)]
pub enum Error {
    // ── Platform capabilities ───────────────────────────────────────
    /// The caller lacks the capability needed to query this service.
    #[error("Permission denied: {capability}")]
    PermissionDenied { capability: &'static str },

    /// The requested hardware is not present on this device.
    #[error("Hardware unavailable: {what}")]
    HardwareUnavailable { what: String },

    /// A location provider exists but is switched off.
    #[error("Location provider disabled: {provider}")]
    ProviderDisabled { provider: String },

    /// The backend has no implementation of this service.
    #[error("Unsupported on this platform: {0}")]
    Unsupported(&'static str),

    /// Backend-specific failure with no better classification.
    #[error("Platform error: {0}")]
    Platform(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Probe timed out.
    #[error("Probe timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Host name did not resolve to any address.
    #[error("Could not resolve host: {host}")]
    Unresolvable { host: String },

    // ── Host data ───────────────────────────────────────────────────
    /// Reading a sysfs/procfs file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A host data file had unexpected contents.
    #[error("Failed to parse {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },
}

impl Error {
    /// Returns `true` if the failure is a missing capability grant.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    /// Returns `true` if the hardware or provider simply isn't there.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::HardwareUnavailable { .. } | Self::ProviderDisabled { .. } | Self::Unsupported(_)
        )
    }

    /// Returns `true` if this is a transient network error.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }
}
