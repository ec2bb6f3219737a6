#![allow(clippy::unwrap_used)]
// Integration tests for the screen state holders.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use netsense_api::Platform;
use netsense_api::platform::simulated::SimulatedPlatform;
use netsense_api::platform::{
    HardwareSensor, LocationFix, LocationProvider, SensorEvent, Transport, WifiConnection,
};
use netsense_core::{
    ActivityKind, DashboardState, SensorConfig, SensorType, SourceConfig, SpeedTestConfig,
    StateStream, Telemetry,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn mock_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0_u8; 4096]))
        .mount(&server)
        .await;
    server
}

fn source_config(server: &MockServer, urls: Vec<String>) -> SourceConfig {
    let addr = server.address();
    SourceConfig {
        speed_test: SpeedTestConfig {
            urls,
            quick_url: format!("{}/quick", server.uri()),
            latency_host: addr.ip().to_string(),
            latency_port: addr.port(),
            latency_timeout: Duration::from_secs(2),
            read_timeout: Duration::from_secs(5),
            ..SpeedTestConfig::default()
        },
        sensors: SensorConfig::default(),
    }
}

fn lab_wifi() -> WifiConnection {
    WifiConnection {
        ssid: Some("\"lab\"".into()),
        rssi: -60,
        frequency_mhz: 2437,
        ..WifiConnection::default()
    }
}

fn telemetry(sim: &Arc<SimulatedPlatform>, config: &SourceConfig) -> Telemetry {
    Telemetry::new(Platform::from_backend(Arc::clone(sim)), config).unwrap()
}

async fn wait_for<S: Send + Sync + 'static>(
    sub: &mut StateStream<S>,
    pred: impl Fn(&S) -> bool,
) -> Arc<S> {
    tokio::time::timeout(Duration::from_secs(5), async {
        let latest = sub.latest();
        if pred(&latest) {
            return latest;
        }
        loop {
            let snap = sub.changed().await.unwrap();
            if pred(&snap) {
                return snap;
            }
        }
    })
    .await
    .unwrap()
}

async fn wait_until(cond: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
}

fn has_activity(state: &DashboardState, title: &str) -> bool {
    state.recent_activities.iter().any(|a| a.title == title)
}

// ── Dashboard ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_dashboard_collects_activity() {
    let server = mock_server().await;
    let sim = Arc::new(
        SimulatedPlatform::builder()
            .transports([Transport::Wifi])
            .wifi(lab_wifi())
            .sensors([HardwareSensor::Accelerometer, HardwareSensor::AmbientTemperature])
            .location_providers([LocationProvider::Gps])
            .build(),
    );
    let telemetry = telemetry(&sim, &source_config(&server, Vec::new()));

    let dashboard = telemetry.dashboard();
    let mut sub = dashboard.subscribe();

    let loaded = wait_for(&mut sub, |s| !s.is_loading).await;
    let statuses: Vec<(&str, bool)> = loaded
        .sensor_statuses
        .iter()
        .map(|s| (s.name, s.is_active))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("Accelerometer", true),
            ("Gyroscope", false),
            ("GPS", true),
            ("Temperature", true),
            ("Pressure", false),
            ("Light", false),
        ]
    );
    let connected = loaded
        .recent_activities
        .iter()
        .find(|a| a.kind == ActivityKind::Network)
        .unwrap();
    assert_eq!(connected.description, "Wi-Fi - lab");
    assert_eq!(loaded.quick_stats[2].value, "3");

    wait_until(|| sim.sensor_listener_count() == 1 && sim.location_listener_count() == 1).await;
    sim.inject_sensor_event(&SensorEvent {
        sensor: HardwareSensor::AmbientTemperature,
        values: vec![21.0],
        accuracy: 3,
        timestamp_ns: 0,
    });
    let warm = wait_for(&mut sub, |s| has_activity(s, "Temperature Reading")).await;
    assert_eq!(warm.recent_activities.latest().unwrap().description, "21.0°C");

    sim.inject_fix(
        LocationProvider::Gps,
        &LocationFix {
            latitude: 52.52,
            longitude: 13.405,
            altitude: 0.0,
            accuracy: 3.0,
            speed: 0.0,
            bearing: 0.0,
            provider: Some("gps".into()),
        },
    );
    let located = wait_for(&mut sub, |s| has_activity(s, "Location Update")).await;
    assert_eq!(
        located.recent_activities.latest().unwrap().description,
        "Lat: 52.5200, Lng: 13.4050"
    );

    drop(dashboard);
    wait_until(|| sim.sensor_listener_count() == 0 && sim.location_listener_count() == 0).await;
}

#[tokio::test]
async fn test_dashboard_speed_test_failure_is_reported() {
    let server = mock_server().await;
    let sim = Arc::new(SimulatedPlatform::builder().build());
    let config = source_config(&server, vec!["http://127.0.0.1:1/bytes".into()]);
    let telemetry = telemetry(&sim, &config);

    let dashboard = telemetry.dashboard();
    let mut sub = dashboard.subscribe();
    dashboard.start_speed_test();
    assert!(dashboard.snapshot().is_speed_test_running);

    let done = wait_for(&mut sub, |s| has_activity(s, "Speed Test Failed")).await;
    assert!(!done.is_speed_test_running);
    assert_eq!(
        done.error.as_deref(),
        Some("Speed test failed: No speed test probe succeeded")
    );
}

#[tokio::test]
async fn test_dashboard_speed_test_updates_network_info() {
    let server = mock_server().await;
    let sim = Arc::new(
        SimulatedPlatform::builder()
            .transports([Transport::Wifi])
            .wifi(lab_wifi())
            .build(),
    );
    let config = source_config(&server, vec![format!("{}/bytes", server.uri())]);
    let telemetry = telemetry(&sim, &config);

    let dashboard = telemetry.dashboard();
    let mut sub = dashboard.subscribe();
    wait_for(&mut sub, |s| !s.is_loading).await;

    dashboard.start_speed_test();
    // a second request while running is ignored
    dashboard.start_speed_test();

    let done = wait_for(&mut sub, |s| {
        !s.is_speed_test_running && has_activity(s, "Speed Test Completed")
    })
    .await;
    let completed = done
        .recent_activities
        .iter()
        .filter(|a| a.kind == ActivityKind::SpeedTest)
        .count();
    assert_eq!(completed, 1);
    assert!(done.error.is_none());
    assert!(done.network_info.as_ref().unwrap().download_mbps > 0.0);
}

// ── Network screen ──────────────────────────────────────────────────

#[tokio::test]
async fn test_network_screen_loads_details_and_runs_speed_test() {
    let server = mock_server().await;
    let sim = Arc::new(
        SimulatedPlatform::builder()
            .transports([Transport::Wifi])
            .wifi(lab_wifi())
            .dhcp_ip(0x0A00_000A)
            .build(),
    );
    let config = source_config(&server, vec![format!("{}/bytes", server.uri())]);
    let telemetry = telemetry(&sim, &config);

    let holder = telemetry.network_screen();
    let mut sub = holder.subscribe();
    let loaded = wait_for(&mut sub, |s| !s.is_loading).await;

    let wifi = loaded.wifi_info.as_ref().unwrap();
    assert_eq!(wifi.ssid.as_deref(), Some("lab"));
    assert_eq!(wifi.ip_address.as_deref(), Some("10.0.0.10"));
    assert_eq!(wifi.band(), Some("2.4 GHz"));
    assert_eq!(loaded.cellular_info.as_ref().unwrap().network_type, "Unknown");

    holder.start_speed_test();
    let done = wait_for(&mut sub, |s| !s.is_speed_test_running).await;
    assert!(done.speed_test_result.is_some());
    assert!(done.error.is_none());

    holder.refresh();
    let refreshed = wait_for(&mut sub, |s| !s.is_loading).await;
    assert!(refreshed.network_info.is_some());
}

// ── Sensors screen ──────────────────────────────────────────────────

#[tokio::test]
async fn test_sensors_screen_tracks_readings_and_releases_listeners() {
    let server = mock_server().await;
    let sim = Arc::new(
        SimulatedPlatform::builder()
            .sensors([HardwareSensor::Light, HardwareSensor::Gyroscope])
            .build(),
    );
    let telemetry = telemetry(&sim, &source_config(&server, Vec::new()));

    let holder = telemetry.sensors_screen();
    let mut sub = holder.subscribe();
    let started = wait_for(&mut sub, |s| !s.is_loading).await;
    assert_eq!(started.available_sensors.len(), 2);
    // every present sensor counts as active before its first reading
    assert_eq!(started.active_sensors, started.available_sensors);
    assert!(started.readings.is_empty());
    assert!(holder.sensor_info(SensorType::Light).starts_with("Name: "));

    // one per sensor, plus the motion and ambient feeds
    wait_until(|| sim.sensor_listener_count() == 4).await;
    sim.inject_sensor_event(&SensorEvent {
        sensor: HardwareSensor::Light,
        values: vec![250.0],
        accuracy: 2,
        timestamp_ns: 5,
    });

    let lit = wait_for(&mut sub, |s| {
        s.readings.contains_key(&SensorType::Light)
            && s.environment.as_ref().is_some_and(|e| e.light_level.is_some())
    })
    .await;
    assert!(lit.active_sensors.contains(&SensorType::Light));
    assert!(lit.active_sensors.contains(&SensorType::Gyroscope));
    assert!(!lit.readings.contains_key(&SensorType::Gyroscope));

    drop(holder);
    wait_until(|| sim.sensor_listener_count() == 0).await;
}

#[tokio::test]
async fn test_sensors_screen_reports_location_permission() {
    let server = mock_server().await;
    let sim = Arc::new(
        SimulatedPlatform::builder()
            .location_providers([LocationProvider::Gps])
            .deny_location()
            .build(),
    );
    let telemetry = telemetry(&sim, &source_config(&server, Vec::new()));

    let holder = telemetry.sensors_screen();
    let mut sub = holder.subscribe();
    let denied = wait_for(&mut sub, |s| s.error.is_some()).await;
    assert_eq!(denied.error.as_deref(), Some("Permission denied: location"));
    assert!(denied.location.is_none());
}
