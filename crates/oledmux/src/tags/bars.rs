//! Bar-graph rendering shared by the stats tags.

/// Character the custom glcd font renders as a solid bar segment.
pub const BAR_CHAR: char = '\u{7F}';

/// Render one labelled bar: `label[#####     ]`, scaled to `width` cells.
///
/// `value` is a fraction; anything non-finite or out of range is treated
/// as empty/full rather than corrupting the line.
pub fn bar_line(label: &str, value: f64, width: u8) -> String {
    let value = if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    };

    let bar_len = usize::from(width).saturating_sub(label.len() + 2);
    let filled = (bar_len as f64 * value).round() as usize;
    let bar: String = std::iter::repeat(BAR_CHAR).take(filled).collect();

    format!("{label}[{bar:<bar_len$}]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bar_is_all_padding() {
        let line = bar_line("CPU%", 0.0, 21);
        assert_eq!(line, format!("CPU%[{}]", " ".repeat(15)));
        assert_eq!(line.chars().count(), 21);
    }

    #[test]
    fn full_bar_fills_the_width() {
        let line = bar_line("Mem%", 1.0, 21);
        let bar: String = std::iter::repeat(BAR_CHAR).take(15).collect();
        assert_eq!(line, format!("Mem%[{bar}]"));
    }

    #[test]
    fn half_bar_rounds() {
        let line = bar_line("Disk", 0.5, 16);
        // 10 cells of bar, half filled rounds to 5.
        let filled = line.chars().filter(|&c| c == BAR_CHAR).count();
        assert_eq!(filled, 5);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        assert_eq!(bar_line("X", 2.0, 10), bar_line("X", 1.0, 10));
        assert_eq!(bar_line("X", -0.5, 10), bar_line("X", 0.0, 10));
        assert_eq!(bar_line("X", f64::NAN, 10), bar_line("X", 0.0, 10));
        assert_eq!(bar_line("X", f64::INFINITY, 10), bar_line("X", 0.0, 10));
    }

    #[test]
    fn label_wider_than_screen_degrades_to_empty_brackets() {
        assert_eq!(bar_line("Overlong", 0.7, 4), "Overlong[]");
    }
}
