// ── Network screen state ──

use std::pin::pin;
use std::sync::Arc;

use futures_util::StreamExt;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{StateCell, spawn_scoped};
use crate::error::CoreError;
use crate::model::{CellularInfo, NetworkInfo, SpeedTestResult, WifiInfo};
use crate::source::NetworkSource;
use crate::stream::StateStream;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkState {
    pub network_info: Option<NetworkInfo>,
    pub speed_test_result: Option<SpeedTestResult>,
    pub wifi_info: Option<WifiInfo>,
    pub cellular_info: Option<CellularInfo>,
    pub is_speed_test_running: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Default for NetworkState {
    fn default() -> Self {
        Self {
            network_info: None,
            speed_test_result: None,
            wifi_info: None,
            cellular_info: None,
            is_speed_test_running: false,
            is_loading: true,
            error: None,
        }
    }
}

/// Drives the network screen: network details plus the speed test.
pub struct NetworkHolder {
    inner: Arc<NetworkInner>,
}

struct NetworkInner {
    network: NetworkSource,
    state: StateCell<NetworkState>,
    cancel: CancellationToken,
}

impl NetworkInner {
    async fn load(self: Arc<Self>) {
        let info = self.network.current_network_info().await;
        let wifi = self.network.wifi_details();
        let cellular = self.network.cellular_details();
        self.state.update(|s| {
            s.network_info = Some(info);
            s.wifi_info = Some(wifi);
            s.cellular_info = Some(cellular);
            s.is_loading = false;
        });
    }

    async fn run_speed_test(self: Arc<Self>) {
        let mut results = pin!(self.network.perform_speed_test());
        let mut completed = 0_usize;
        while let Some(result) = results.next().await {
            completed += 1;
            self.state.update(|s| s.speed_test_result = Some(result));
        }

        self.state.update(|s| {
            s.is_speed_test_running = false;
            if completed == 0 {
                s.error = Some(format!("Speed test failed: {}", CoreError::NoSuccessfulProbe));
            }
        });
        debug!(completed, "network screen speed test done");
    }
}

impl NetworkHolder {
    pub fn new(network: NetworkSource) -> Self {
        Self {
            inner: Arc::new(NetworkInner {
                network,
                state: StateCell::new(NetworkState::default()),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Load network info, Wi-Fi and cellular details.
    pub fn start(&self) {
        spawn_scoped(&self.inner.cancel, Arc::clone(&self.inner).load());
        info!("network screen started");
    }

    /// Re-read everything `start` loads.
    pub fn refresh(&self) {
        self.inner.state.update(|s| {
            s.is_loading = true;
            s.error = None;
        });
        spawn_scoped(&self.inner.cancel, Arc::clone(&self.inner).load());
    }

    /// Run the full speed test unless one is already in flight.
    pub fn start_speed_test(&self) {
        let started = self.inner.state.update_if(
            |s| !s.is_speed_test_running,
            |s| {
                s.is_speed_test_running = true;
                s.speed_test_result = None;
                s.error = None;
            },
        );
        if started {
            spawn_scoped(&self.inner.cancel, Arc::clone(&self.inner).run_speed_test());
        }
    }

    pub fn snapshot(&self) -> Arc<NetworkState> {
        self.inner.state.snapshot()
    }

    pub fn subscribe(&self) -> StateStream<NetworkState> {
        self.inner.state.subscribe()
    }

    pub fn stop(&self) {
        self.inner.cancel.cancel();
    }
}

impl Drop for NetworkHolder {
    fn drop(&mut self) {
        self.inner.cancel.cancel();
    }
}
