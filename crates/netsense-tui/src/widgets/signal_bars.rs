//! Signal strength bars for a 0-5 level.

use ratatui::style::Style;
use ratatui::text::Span;

use crate::theme;

const BARS: [&str; 6] = ["·    ", "▁    ", "▁▂   ", "▁▂▄  ", "▁▂▄▆ ", "▁▂▄▆█"];

/// Bars and color for a signal level. Levels above 5 clamp.
pub fn signal_span(level: u8) -> Span<'static> {
    let level = level.min(5);
    let color = match level {
        5 | 4 => theme::SUCCESS_GREEN,
        3 => theme::NEON_CYAN,
        2 => theme::ELECTRIC_YELLOW,
        1 => theme::CORAL,
        _ => theme::ERROR_RED,
    };
    Span::styled(BARS[usize::from(level)], Style::default().fg(color))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_above_five() {
        assert_eq!(signal_span(9).content, signal_span(5).content);
        assert_eq!(signal_span(0).content, "·    ");
    }
}
