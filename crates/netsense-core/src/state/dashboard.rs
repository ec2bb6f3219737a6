// ── Dashboard screen state ──

use std::pin::pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{ActivityEntry, ActivityKind, ActivityLog, StateCell, spawn_scoped};
use crate::error::CoreError;
use crate::model::{NetworkInfo, SensorType};
use crate::source::{NetworkSource, SensorSource};
use crate::stream::StateStream;

/// One headline number on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickStat {
    pub label: &'static str,
    pub value: String,
}

/// Presence of one of the sensors the dashboard tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorStatus {
    pub name: &'static str,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardState {
    pub network_info: Option<NetworkInfo>,
    pub is_speed_test_running: bool,
    pub quick_stats: Vec<QuickStat>,
    pub sensor_statuses: Vec<SensorStatus>,
    pub recent_activities: ActivityLog,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            network_info: None,
            is_speed_test_running: false,
            quick_stats: Vec::new(),
            sensor_statuses: Vec::new(),
            recent_activities: ActivityLog::default(),
            is_loading: true,
            error: None,
        }
    }
}

impl DashboardState {
    fn refresh_quick_stats(&mut self, uptime: Duration) {
        self.quick_stats = quick_stats(self.network_info.as_ref(), &self.sensor_statuses, uptime);
    }
}

/// Compact uptime: `45s`, `12m`, `3h 05m`, `2d 4h`.
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    match secs {
        0..60 => format!("{secs}s"),
        60..3600 => format!("{}m", secs / 60),
        3600..86_400 => format!("{}h {:02}m", secs / 3600, (secs % 3600) / 60),
        _ => format!("{}d {}h", secs / 86_400, (secs % 86_400) / 3600),
    }
}

/// Signal, speed, active sensor count and uptime.
pub fn quick_stats(
    network_info: Option<&NetworkInfo>,
    statuses: &[SensorStatus],
    uptime: Duration,
) -> Vec<QuickStat> {
    let signal = network_info.map_or(0, |n| n.signal_strength);
    let speed = network_info.map_or(0.0, |n| n.download_mbps);
    let active = statuses.iter().filter(|s| s.is_active).count();
    vec![
        QuickStat {
            label: "Signal",
            value: format!("{signal}/5"),
        },
        QuickStat {
            label: "Speed",
            value: format!("{speed:.1}M"),
        },
        QuickStat {
            label: "Sensors",
            value: active.to_string(),
        },
        QuickStat {
            label: "Uptime",
            value: format_uptime(uptime),
        },
    ]
}

/// Drives the dashboard: one network read, ambient and location feeds for
/// the activity log, and the speed-test intent.
pub struct DashboardHolder {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    network: NetworkSource,
    sensors: SensorSource,
    state: StateCell<DashboardState>,
    cancel: CancellationToken,
    started: Instant,
}

impl DashboardInner {
    fn update(&self, f: impl FnOnce(&mut DashboardState)) {
        let uptime = self.started.elapsed();
        self.state.update(|s| {
            f(s);
            s.refresh_quick_stats(uptime);
        });
    }

    fn sensor_statuses(&self) -> Vec<SensorStatus> {
        let available = self.sensors.available_sensors();
        let has = |kind: SensorType| available.contains(&kind);
        vec![
            SensorStatus {
                name: "Accelerometer",
                is_active: has(SensorType::Accelerometer),
            },
            SensorStatus {
                name: "Gyroscope",
                is_active: has(SensorType::Gyroscope),
            },
            SensorStatus {
                name: "GPS",
                is_active: self.sensors.location_available(),
            },
            SensorStatus {
                name: "Temperature",
                is_active: has(SensorType::Temperature),
            },
            SensorStatus {
                name: "Pressure",
                is_active: has(SensorType::Pressure),
            },
            SensorStatus {
                name: "Light",
                is_active: has(SensorType::Light),
            },
        ]
    }

    async fn load_network(self: Arc<Self>) {
        let info = self.network.current_network_info().await;
        let description = format!(
            "{} - {}",
            info.connection_type,
            info.network_name.as_deref().unwrap_or("unknown")
        );
        self.update(|s| {
            s.network_info = Some(info);
            s.is_loading = false;
            s.recent_activities.push(ActivityEntry::new(
                ActivityKind::Network,
                "Network Connected",
                description,
            ));
        });
    }

    async fn collect_environment(self: Arc<Self>) {
        let mut readings = self.sensors.environmental_data();
        while let Some(env) = readings.next().await {
            self.update(|s| {
                if let Some(temp) = env.temperature {
                    s.recent_activities.push(ActivityEntry::new(
                        ActivityKind::Temperature,
                        "Temperature Reading",
                        format!("{temp:.1}°C"),
                    ));
                }
            });
        }
    }

    async fn collect_location(self: Arc<Self>) {
        let mut fixes = self.sensors.location_data();
        while let Some(fix) = fixes.next().await {
            match fix {
                Ok(loc) => self.update(|s| {
                    s.recent_activities.push(ActivityEntry::new(
                        ActivityKind::Location,
                        "Location Update",
                        format!("Lat: {:.4}, Lng: {:.4}", loc.latitude, loc.longitude),
                    ));
                }),
                Err(e) => debug!(error = %e, "dashboard location feed ended"),
            }
        }
    }

    async fn run_speed_test(self: Arc<Self>) {
        let mut results = pin!(self.network.perform_speed_test());
        let mut completed = 0_usize;
        while let Some(result) = results.next().await {
            completed += 1;
            self.update(|s| {
                if let Some(info) = s.network_info.as_mut() {
                    info.download_mbps = result.download_mbps;
                    info.upload_mbps = result.upload_mbps;
                    info.latency_ms = result.latency_ms;
                }
                s.recent_activities.push(ActivityEntry::new(
                    ActivityKind::SpeedTest,
                    "Speed Test Completed",
                    format!(
                        "↓{:.1}Mbps ↑{:.1}Mbps",
                        result.download_mbps, result.upload_mbps
                    ),
                ));
            });
        }

        self.update(|s| {
            s.is_speed_test_running = false;
            if completed == 0 {
                let reason = CoreError::NoSuccessfulProbe.to_string();
                s.error = Some(format!("Speed test failed: {reason}"));
                s.recent_activities.push(ActivityEntry::new(
                    ActivityKind::Failure,
                    "Speed Test Failed",
                    reason,
                ));
            }
        });
    }
}

impl DashboardHolder {
    pub fn new(network: NetworkSource, sensors: SensorSource) -> Self {
        Self {
            inner: Arc::new(DashboardInner {
                network,
                sensors,
                state: StateCell::new(DashboardState::default()),
                cancel: CancellationToken::new(),
                started: Instant::now(),
            }),
        }
    }

    /// Begin acquisition. Must be called from within a Tokio runtime.
    pub fn start(&self) {
        let statuses = self.inner.sensor_statuses();
        self.inner.update(|s| s.sensor_statuses = statuses);

        let cancel = &self.inner.cancel;
        spawn_scoped(cancel, Arc::clone(&self.inner).load_network());
        spawn_scoped(cancel, Arc::clone(&self.inner).collect_environment());
        spawn_scoped(cancel, Arc::clone(&self.inner).collect_location());
        info!("dashboard started");
    }

    /// Run the full speed test unless one is already in flight.
    pub fn start_speed_test(&self) {
        let started = self.inner.state.update_if(
            |s| !s.is_speed_test_running,
            |s| {
                s.is_speed_test_running = true;
                s.error = None;
            },
        );
        if !started {
            debug!("speed test already running");
            return;
        }
        spawn_scoped(&self.inner.cancel, Arc::clone(&self.inner).run_speed_test());
    }

    pub fn snapshot(&self) -> Arc<DashboardState> {
        self.inner.state.snapshot()
    }

    pub fn subscribe(&self) -> StateStream<DashboardState> {
        self.inner.state.subscribe()
    }

    /// Cancel all acquisition tasks, releasing their platform listeners.
    pub fn stop(&self) {
        self.inner.cancel.cancel();
    }
}

impl Drop for DashboardHolder {
    fn drop(&mut self) {
        self.inner.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(Duration::from_secs(42)), "42s");
        assert_eq!(format_uptime(Duration::from_secs(12 * 60 + 5)), "12m");
        assert_eq!(format_uptime(Duration::from_secs(3 * 3600 + 5 * 60)), "3h 05m");
        assert_eq!(format_uptime(Duration::from_secs(2 * 86_400 + 4 * 3600)), "2d 4h");
    }

    #[test]
    fn quick_stats_without_network() {
        let statuses = [
            SensorStatus {
                name: "GPS",
                is_active: true,
            },
            SensorStatus {
                name: "Light",
                is_active: false,
            },
        ];
        let stats = quick_stats(None, &statuses, Duration::from_secs(5));
        let values: Vec<&str> = stats.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(values, ["0/5", "0.0M", "1", "5s"]);
    }
}
