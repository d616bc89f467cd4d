use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone)]
pub struct TextStyle {
    pub font_family: Option<String>,
    pub font_size: f64,
    pub font_weight: Option<String>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: None,
            font_size: 10.0,
            font_weight: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub line_count: usize,
}

/// Measures rendered text.
///
/// The layout engine reserves axis space from measured label boxes rather than from fixed
/// per-locale guesses, so hosts with access to real font metrics can plug them in here.
pub trait TextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics;
}

/// Font-independent measurer: every column of display width costs `char_width_factor × font
/// size`. East Asian wide characters count as two columns. Zero factors fall back to 0.6 and
/// 1.2 respectively.
#[derive(Debug, Clone, Default)]
pub struct DeterministicTextMeasurer {
    pub char_width_factor: f64,
    pub line_height_factor: f64,
}

impl DeterministicTextMeasurer {
    const FALLBACK_CHAR_WIDTH: f64 = 0.6;
    const FALLBACK_LINE_HEIGHT: f64 = 1.2;

    fn factor(value: f64, fallback: f64) -> f64 {
        if value > 0.0 { value } else { fallback }
    }
}

impl TextMeasurer for DeterministicTextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
        let font_size = style.font_size.max(1.0);
        let (columns, line_count) = text
            .split('\n')
            .fold((0usize, 0usize), |(widest, n), line| {
                (widest.max(line.width()), n + 1)
            });

        let em_width = Self::factor(self.char_width_factor, Self::FALLBACK_CHAR_WIDTH);
        let em_height = Self::factor(self.line_height_factor, Self::FALLBACK_LINE_HEIGHT);
        TextMetrics {
            width: columns as f64 * font_size * em_width,
            height: line_count as f64 * font_size * em_height,
            line_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_measurer_scales_with_font_size() {
        let m = DeterministicTextMeasurer::default();
        let small = m.measure(
            "100",
            &TextStyle {
                font_size: 10.0,
                ..Default::default()
            },
        );
        let large = m.measure(
            "100",
            &TextStyle {
                font_size: 20.0,
                ..Default::default()
            },
        );
        assert_eq!(small.width, 18.0);
        assert_eq!(large.width, 36.0);
        assert_eq!(small.line_count, 1);
    }

    #[test]
    fn wide_characters_take_two_columns() {
        let m = DeterministicTextMeasurer::default();
        let style = TextStyle::default();
        let ascii = m.measure("ab", &style);
        let cjk = m.measure("\u{4e2d}", &style);
        assert_eq!(ascii.width, cjk.width);
    }

    #[test]
    fn multiline_height_counts_lines() {
        let m = DeterministicTextMeasurer::default();
        let metrics = m.measure("a\nbbb", &TextStyle::default());
        assert_eq!(metrics.line_count, 2);
        assert_eq!(metrics.width, 18.0);
        assert_eq!(metrics.height, 24.0);
    }
}
