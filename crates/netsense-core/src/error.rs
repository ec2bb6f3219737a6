// ── Core error types ──
//
// User-facing errors from netsense-core. Consumers never see reqwest or
// sysfs failures directly; the `From<netsense_api::Error>` impl folds
// them into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    // ── Capability errors ────────────────────────────────────────────
    #[error("Permission denied: {capability}")]
    PermissionDenied { capability: String },

    #[error("Not available on this device: {what}")]
    Unavailable { what: String },

    // ── Measurement errors ───────────────────────────────────────────
    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("No speed test probe succeeded")]
    NoSuccessfulProbe,

    // ── Platform errors ──────────────────────────────────────────────
    #[error("Platform error: {message}")]
    Platform { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}

// ── Conversion from platform/transport errors ────────────────────────

impl From<netsense_api::Error> for CoreError {
    fn from(err: netsense_api::Error) -> Self {
        use netsense_api::Error as Api;

        match err {
            Api::PermissionDenied { capability } => CoreError::PermissionDenied {
                capability: capability.to_owned(),
            },
            Api::HardwareUnavailable { what } => CoreError::Unavailable { what },
            Api::ProviderDisabled { provider } => CoreError::Unavailable {
                what: format!("{provider} location provider"),
            },
            Api::Unsupported(what) => CoreError::Unavailable {
                what: what.to_owned(),
            },
            Api::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            Api::Transport(ref e) if e.is_timeout() => CoreError::Timeout { timeout_secs: 0 },
            Api::Transport(e) => CoreError::Network {
                message: e.to_string(),
            },
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid probe URL: {e}"),
            },
            Api::Unresolvable { host } => CoreError::Network {
                message: format!("could not resolve {host}"),
            },
            Api::Io(e) => CoreError::Platform {
                message: e.to_string(),
            },
            Api::Parse {
                source_name,
                message,
            } => CoreError::Platform {
                message: format!("{source_name}: {message}"),
            },
            Api::Platform(message) => CoreError::Platform { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_maps_through() {
        let err: CoreError = netsense_api::Error::PermissionDenied {
            capability: "location",
        }
        .into();
        assert!(err.is_permission_denied());
        assert_eq!(err.to_string(), "Permission denied: location");
    }

    #[test]
    fn unsupported_becomes_unavailable() {
        let err: CoreError = netsense_api::Error::Unsupported("telephony").into();
        assert_eq!(
            err,
            CoreError::Unavailable {
                what: "telephony".into()
            }
        );
    }
}
