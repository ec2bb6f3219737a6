//! Display formatting for telemetry values.

use std::time::Duration;

/// Placeholder for a value that hasn't arrived.
pub const DASH: &str = "─";

/// "12.3 Mbps", or a dash for zero.
pub fn fmt_mbps(mbps: f64) -> String {
    if mbps > 0.0 {
        format!("{mbps:.1} Mbps")
    } else {
        DASH.into()
    }
}

/// "42 ms", or a dash for zero.
pub fn fmt_latency(ms: u64) -> String {
    if ms > 0 {
        format!("{ms} ms")
    } else {
        DASH.into()
    }
}

/// Probe duration rounded to milliseconds, e.g. "1s 250ms".
pub fn fmt_duration(d: Duration) -> String {
    let rounded = Duration::from_millis(u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
    humantime::format_duration(rounded).to_string()
}

/// Optional string or a dash.
pub fn or_dash(value: Option<&str>) -> String {
    value.map_or_else(|| DASH.into(), str::to_owned)
}

/// Optional scalar with unit, or a dash.
pub fn fmt_reading(value: Option<f32>, unit: &str) -> String {
    value.map_or_else(|| DASH.into(), |v| format!("{v:.1} {unit}"))
}

/// Up to three axes as "x  y  z" with two decimals.
pub fn fmt_axes(values: &[f32]) -> String {
    values
        .iter()
        .take(3)
        .map(|v| format!("{v:>7.2}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn zero_values_render_as_dash() {
        assert_eq!(fmt_mbps(0.0), DASH);
        assert_eq!(fmt_latency(0), DASH);
        assert_eq!(fmt_mbps(12.34), "12.3 Mbps");
        assert_eq!(fmt_latency(42), "42 ms");
    }

    #[test]
    fn durations_drop_sub_millisecond_noise() {
        assert_eq!(fmt_duration(Duration::from_micros(1_250_400)), "1s 250ms");
    }

    #[test]
    fn axes_are_aligned() {
        assert_eq!(fmt_axes(&[0.1, -9.81, 0.0, 4.0]), "   0.10   -9.81    0.00");
        assert_eq!(fmt_reading(None, "hPa"), DASH);
        assert_eq!(fmt_reading(Some(1013.3), "hPa"), "1013.3 hPa");
    }
}
