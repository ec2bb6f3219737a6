pub mod fmt;
pub mod signal_bars;
