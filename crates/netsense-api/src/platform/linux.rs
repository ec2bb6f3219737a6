//! Linux host backend.
//!
//! Reads connectivity from `/sys/class/net`, Wi-Fi signal from
//! `/proc/net/wireless`, the local IPv4 address from `/proc/net/fib_trie`
//! and sensors from the IIO subsystem under `/sys/bus/iio/devices`.
//! Telephony and location have no portable kernel interface and report
//! themselves unavailable.
//!
//! All paths are resolved against a configurable root so tests can point
//! the backend at a fake tree.

use std::fs;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use dashmap::DashMap;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{
    Connectivity, HardwareSensor, ListenerId, LocationFix, LocationManager, LocationProvider,
    RadioTechnology, SamplingRate, SensorDescriptor, SensorEvent, SensorManager, Telephony,
    Transport, UpdateRequest, WifiConnection, WifiManager,
};
use crate::error::Error;

/// ARPHRD_ETHER: also reported by Wi-Fi interfaces.
const ARPHRD_ETHER: &str = "1";
/// ARPHRD_NONE: tun/wireguard style interfaces.
const ARPHRD_NONE: &str = "65534";

/// A system-service backend over the running Linux host.
pub struct LinuxPlatform {
    root: PathBuf,
    listeners: DashMap<ListenerId, CancellationToken>,
    next_id: AtomicU64,
    started: Instant,
    cancel: CancellationToken,
}

impl Default for LinuxPlatform {
    fn default() -> Self {
        Self::with_root("/")
    }
}

impl LinuxPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `/sys` and `/proc` under `root` instead of `/`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            listeners: DashMap::new(),
            next_id: AtomicU64::new(1),
            started: Instant::now(),
            cancel: CancellationToken::new(),
        }
    }

    fn net_class(&self) -> PathBuf {
        self.root.join("sys/class/net")
    }

    fn iio_devices(&self) -> PathBuf {
        self.root.join("sys/bus/iio/devices")
    }

    /// Interfaces that are administratively and operationally up, sorted.
    fn up_interfaces(&self) -> Vec<(String, PathBuf)> {
        let Ok(entries) = fs::read_dir(self.net_class()) else {
            return Vec::new();
        };
        let mut ifaces: Vec<(String, PathBuf)> = entries
            .filter_map(Result::ok)
            .filter_map(|e| Some((e.file_name().into_string().ok()?, e.path())))
            .filter(|(name, _)| name != "lo")
            .filter(|(_, path)| read_trimmed(&path.join("operstate")).as_deref() == Some("up"))
            .collect();
        ifaces.sort();
        ifaces
    }

    fn wireless_interface(&self) -> Option<(String, PathBuf)> {
        self.up_interfaces()
            .into_iter()
            .find(|(_, path)| is_wireless(path))
    }

    fn iio_device_for(&self, kind: HardwareSensor) -> Option<PathBuf> {
        let prefix = iio_prefix(kind)?;
        let entries = fs::read_dir(self.iio_devices()).ok()?;
        let mut devices: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("iio:device"))
            })
            .collect();
        devices.sort();
        devices
            .into_iter()
            .find(|dev| read_sample(dev, kind, prefix).is_some())
    }
}

impl Drop for LinuxPlatform {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Connectivity ─────────────────────────────────────────────────────

fn is_wireless(iface: &Path) -> bool {
    iface.join("wireless").is_dir() || iface.join("phy80211").exists()
}

fn classify_interface(name: &str, path: &Path) -> Transport {
    if is_wireless(path) {
        return Transport::Wifi;
    }
    if name.starts_with("wwan") || name.starts_with("rmnet") {
        return Transport::Cellular;
    }
    match read_trimmed(&path.join("type")).as_deref() {
        Some(ARPHRD_ETHER) => Transport::Ethernet,
        Some(ARPHRD_NONE) => Transport::Vpn,
        _ => Transport::Other,
    }
}

impl Connectivity for LinuxPlatform {
    fn active_transports(&self) -> Result<Vec<Transport>, Error> {
        let mut transports = Vec::new();
        for (name, path) in self.up_interfaces() {
            let transport = classify_interface(&name, &path);
            if !transports.contains(&transport) {
                transports.push(transport);
            }
        }
        Ok(transports)
    }
}

// ── Wi-Fi ────────────────────────────────────────────────────────────

/// Signal level in dBm for `iface` from `/proc/net/wireless` contents.
pub fn parse_wireless_level(contents: &str, iface: &str) -> Option<i32> {
    contents.lines().skip(2).find_map(|line| {
        let (name, rest) = line.trim().split_once(':')?;
        if name.trim() != iface {
            return None;
        }
        // status, link quality, level, noise, ...
        let level = rest.split_whitespace().nth(2)?;
        let level: f32 = level.trim_end_matches('.').parse().ok()?;
        #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
        let dbm = level.round() as i32;
        Some(dbm)
    })
}

/// First non-loopback local IPv4 address listed in `/proc/net/fib_trie`.
pub fn parse_local_ipv4(contents: &str) -> Option<Ipv4Addr> {
    let mut last_leaf: Option<Ipv4Addr> = None;
    for line in contents.lines() {
        let line = line.trim();
        if let Some(addr) = line.strip_prefix("|-- ") {
            last_leaf = addr.parse().ok();
        } else if line.contains("/32 host LOCAL") {
            if let Some(addr) = last_leaf.filter(|a| !a.is_loopback()) {
                return Some(addr);
            }
        }
    }
    None
}

impl WifiManager for LinuxPlatform {
    fn connection_info(&self) -> Result<WifiConnection, Error> {
        let (name, path) = self
            .wireless_interface()
            .ok_or_else(|| Error::HardwareUnavailable {
                what: "wireless interface".into(),
            })?;

        let wireless_path = self.root.join("proc/net/wireless");
        let contents = fs::read_to_string(&wireless_path)?;
        let rssi = parse_wireless_level(&contents, &name).ok_or_else(|| Error::Parse {
            source_name: wireless_path.display().to_string(),
            message: format!("no signal level for {name}"),
        })?;

        let link_speed_mbps = read_trimmed(&path.join("speed"))
            .and_then(|s| s.parse::<i32>().ok())
            .filter(|s| *s > 0)
            .unwrap_or(0);

        Ok(WifiConnection {
            ssid: None,
            bssid: None,
            frequency_mhz: 0,
            link_speed_mbps,
            rssi,
            network_id: -1,
        })
    }

    fn dhcp_ip_address(&self) -> Result<u32, Error> {
        let path = self.root.join("proc/net/fib_trie");
        let contents = fs::read_to_string(&path)?;
        let addr = parse_local_ipv4(&contents).ok_or_else(|| Error::Parse {
            source_name: path.display().to_string(),
            message: "no local IPv4 address".into(),
        })?;
        Ok(u32::from_le_bytes(addr.octets()))
    }
}

// ── Telephony ────────────────────────────────────────────────────────

impl Telephony for LinuxPlatform {
    fn data_network_type(&self) -> Result<RadioTechnology, Error> {
        Err(Error::Unsupported("telephony"))
    }

    fn network_operator_name(&self) -> Result<Option<String>, Error> {
        Err(Error::Unsupported("telephony"))
    }

    fn network_operator(&self) -> Result<Option<String>, Error> {
        Err(Error::Unsupported("telephony"))
    }
}

// ── Sensors (IIO) ────────────────────────────────────────────────────

fn iio_prefix(kind: HardwareSensor) -> Option<&'static str> {
    match kind {
        HardwareSensor::Accelerometer => Some("in_accel"),
        HardwareSensor::Gyroscope => Some("in_anglvel"),
        HardwareSensor::MagneticField => Some("in_magn"),
        HardwareSensor::Light => Some("in_illuminance"),
        HardwareSensor::Pressure => Some("in_pressure"),
        HardwareSensor::AmbientTemperature => Some("in_temp"),
        HardwareSensor::RelativeHumidity => Some("in_humidityrelative"),
        HardwareSensor::Proximity => Some("in_proximity"),
        _ => None,
    }
}

/// Multiplier from IIO units to the units events are reported in.
fn unit_factor(kind: HardwareSensor) -> f32 {
    match kind {
        // gauss → µT
        HardwareSensor::MagneticField => 100.0,
        // kPa → hPa
        HardwareSensor::Pressure => 10.0,
        // milli-units → units
        HardwareSensor::AmbientTemperature | HardwareSensor::RelativeHumidity => 0.001,
        _ => 1.0,
    }
}

fn read_trimmed(path: &Path) -> Option<String> {
    let Ok(contents) = fs::read_to_string(path) else {
        return None;
    };
    Some(contents.trim().to_owned())
}

fn read_f32(path: &Path) -> Option<f32> {
    read_trimmed(path)?.parse().ok()
}

/// Read one IIO channel, preferring the processed `_input` attribute.
fn read_channel(dev: &Path, channel: &str, prefix: &str) -> Option<f32> {
    if let Some(v) = read_f32(&dev.join(format!("{channel}_input"))) {
        return Some(v);
    }
    let raw = read_f32(&dev.join(format!("{channel}_raw")))?;
    let scale = read_f32(&dev.join(format!("{channel}_scale")))
        .or_else(|| read_f32(&dev.join(format!("{prefix}_scale"))))
        .unwrap_or(1.0);
    let offset = read_f32(&dev.join(format!("{channel}_offset")))
        .or_else(|| read_f32(&dev.join(format!("{prefix}_offset"))))
        .unwrap_or(0.0);
    Some((raw + offset) * scale)
}

/// Read a full sample for `kind` from an IIO device directory.
fn read_sample(dev: &Path, kind: HardwareSensor, prefix: &str) -> Option<Vec<f32>> {
    let factor = unit_factor(kind);
    let values = if kind.value_count() == 3 {
        ["x", "y", "z"]
            .iter()
            .map(|axis| read_channel(dev, &format!("{prefix}_{axis}"), prefix))
            .collect::<Option<Vec<f32>>>()?
    } else {
        vec![read_channel(dev, prefix, prefix)?]
    };
    Some(values.into_iter().map(|v| v * factor).collect())
}

impl SensorManager for LinuxPlatform {
    fn default_sensor(&self, kind: HardwareSensor) -> Option<SensorDescriptor> {
        let dev = self.iio_device_for(kind)?;
        let prefix = iio_prefix(kind)?;
        let name = read_trimmed(&dev.join("name")).unwrap_or_else(|| kind.to_string());
        let resolution = read_f32(&dev.join(format!("{prefix}_scale"))).unwrap_or(0.0);
        Some(SensorDescriptor {
            kind,
            name,
            vendor: "Linux IIO".into(),
            version: 1,
            max_range: 0.0,
            resolution: resolution * unit_factor(kind),
            power_ma: 0.0,
            min_delay_us: 0,
        })
    }

    fn register_listener(
        &self,
        sensors: &[HardwareSensor],
        rate: SamplingRate,
        sink: UnboundedSender<SensorEvent>,
    ) -> Result<ListenerId, Error> {
        let channels: Vec<(HardwareSensor, PathBuf, &'static str)> = sensors
            .iter()
            .filter_map(|&kind| Some((kind, self.iio_device_for(kind)?, iio_prefix(kind)?)))
            .collect();
        if channels.is_empty() {
            return Err(Error::HardwareUnavailable {
                what: format!("{sensors:?}"),
            });
        }

        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Platform(format!("sensor polling needs a runtime: {e}")))?;

        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let cancel = self.cancel.child_token();
        self.listeners.insert(id, cancel.clone());

        let started = self.started;
        handle.spawn(async move {
            let mut tick = tokio::time::interval(rate.period());
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = tick.tick() => {
                        let timestamp_ns = i64::try_from(started.elapsed().as_nanos()).unwrap_or(i64::MAX);
                        for (kind, dev, prefix) in &channels {
                            // sysfs attribute reads are served from memory
                            let Some(values) = read_sample(dev, *kind, prefix) else {
                                debug!(sensor = %kind, dev = %dev.display(), "iio read failed");
                                continue;
                            };
                            let event = SensorEvent { sensor: *kind, values, accuracy: 3, timestamp_ns };
                            if sink.send(event).is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        });

        debug!(?id, "iio polling listener registered");
        Ok(id)
    }

    fn unregister_listener(&self, id: ListenerId) {
        if let Some((_, cancel)) = self.listeners.remove(&id) {
            cancel.cancel();
        }
    }
}

// ── Location ─────────────────────────────────────────────────────────

impl LocationManager for LinuxPlatform {
    fn is_provider_enabled(&self, _provider: LocationProvider) -> bool {
        false
    }

    fn request_location_updates(
        &self,
        request: UpdateRequest,
        _sink: UnboundedSender<LocationFix>,
    ) -> Result<ListenerId, Error> {
        warn!(provider = request.provider.as_str(), "no location provider on this host");
        Err(Error::ProviderDisabled {
            provider: request.provider.as_str().into(),
        })
    }

    fn remove_updates(&self, _id: ListenerId) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIRELESS: &str = "\
Inter-| sta-|   Quality        |   Discarded packets               | Missed | WE
 face | tus | link level noise |  nwid  crypt   frag  retry   misc | beacon | 22
wlp2s0: 0000   54.  -56.  -256        0      0      0      0    120        0
";

    const FIB_TRIE: &str = "\
Main:
  +-- 0.0.0.0/0 3 0 5
     |-- 0.0.0.0
        /0 universe UNICAST
     +-- 127.0.0.0/8 2 0 2
        |-- 127.0.0.1
           /32 host LOCAL
     +-- 192.168.1.0/24 2 0 2
        |-- 192.168.1.0
           /24 link UNICAST
        |-- 192.168.1.42
           /32 host LOCAL
";

    #[test]
    fn parses_wireless_level() {
        assert_eq!(parse_wireless_level(WIRELESS, "wlp2s0"), Some(-56));
        assert_eq!(parse_wireless_level(WIRELESS, "wlan0"), None);
    }

    #[test]
    fn parses_first_non_loopback_local_address() {
        assert_eq!(
            parse_local_ipv4(FIB_TRIE),
            Some(Ipv4Addr::new(192, 168, 1, 42))
        );
        assert_eq!(parse_local_ipv4("Main:\n"), None);
    }

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn classifies_up_interfaces_from_sysfs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "sys/class/net/lo/operstate", "unknown\n");
        write(root, "sys/class/net/eth0/operstate", "down\n");
        write(root, "sys/class/net/eth0/type", "1\n");
        write(root, "sys/class/net/wlp2s0/operstate", "up\n");
        write(root, "sys/class/net/wlp2s0/type", "1\n");
        fs::create_dir_all(root.join("sys/class/net/wlp2s0/wireless")).unwrap();
        write(root, "sys/class/net/wg0/operstate", "up\n");
        write(root, "sys/class/net/wg0/type", "65534\n");

        let platform = LinuxPlatform::with_root(root);
        let transports = platform.active_transports().unwrap();
        assert_eq!(transports, vec![Transport::Vpn, Transport::Wifi]);
    }

    #[test]
    fn wifi_details_from_proc() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "sys/class/net/wlp2s0/operstate", "up\n");
        fs::create_dir_all(root.join("sys/class/net/wlp2s0/wireless")).unwrap();
        write(root, "proc/net/wireless", WIRELESS);
        write(root, "proc/net/fib_trie", FIB_TRIE);

        let platform = LinuxPlatform::with_root(root);
        let info = platform.connection_info().unwrap();
        assert_eq!(info.rssi, -56);
        assert_eq!(info.ssid, None);
        assert_eq!(
            platform.dhcp_ip_address().unwrap(),
            u32::from_le_bytes([192, 168, 1, 42])
        );
    }

    #[test]
    fn no_wireless_interface_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let platform = LinuxPlatform::with_root(dir.path());
        assert!(platform.connection_info().unwrap_err().is_unavailable());
        assert!(platform.active_transports().unwrap().is_empty());
    }

    #[test]
    fn reads_scaled_iio_channels() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let dev = "sys/bus/iio/devices/iio:device0";
        write(root, &format!("{dev}/name"), "bmi160\n");
        write(root, &format!("{dev}/in_accel_x_raw"), "100\n");
        write(root, &format!("{dev}/in_accel_y_raw"), "-200\n");
        write(root, &format!("{dev}/in_accel_z_raw"), "4000\n");
        write(root, &format!("{dev}/in_accel_scale"), "0.0025\n");
        write(root, "sys/bus/iio/devices/iio:device1/in_temp_input", "21500\n");

        let platform = LinuxPlatform::with_root(root);
        let accel = platform
            .default_sensor(HardwareSensor::Accelerometer)
            .unwrap();
        assert_eq!(accel.name, "bmi160");
        assert!(platform.default_sensor(HardwareSensor::Gyroscope).is_none());

        let sample = read_sample(
            &root.join(dev),
            HardwareSensor::Accelerometer,
            "in_accel",
        )
        .unwrap();
        assert!((sample[0] - 0.25).abs() < 1e-4);
        assert!((sample[1] + 0.5).abs() < 1e-4);
        assert!((sample[2] - 10.0).abs() < 1e-4);

        let temp = read_sample(
            &root.join("sys/bus/iio/devices/iio:device1"),
            HardwareSensor::AmbientTemperature,
            "in_temp",
        )
        .unwrap();
        assert!((temp[0] - 21.5).abs() < 1e-4);
    }

    #[test]
    fn location_and_telephony_are_unavailable() {
        let platform = LinuxPlatform::new();
        assert!(!platform.is_provider_enabled(LocationProvider::Gps));
        assert!(platform.data_network_type().unwrap_err().is_unavailable());
    }
}
