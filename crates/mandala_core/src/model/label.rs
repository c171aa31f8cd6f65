//! Display-length heuristic for cell labels.
//!
//! Half-width characters (ASCII and half-width katakana) weigh 0.5, every
//! other UTF-16 code unit weighs 1. The budget is a hint for the editor;
//! nothing in core rejects long labels.

/// Soft display budget for one cell.
pub const MAX_VISUAL_LENGTH: f64 = 30.0;

/// Returns the weighted display length of `text`.
pub fn visual_length(text: &str) -> f64 {
    text.chars()
        .map(|ch| {
            if is_half_width(ch) {
                0.5
            } else {
                ch.len_utf16() as f64
            }
        })
        .sum()
}

/// Returns whether `text` exceeds [`MAX_VISUAL_LENGTH`].
pub fn exceeds_budget(text: &str) -> bool {
    visual_length(text) > MAX_VISUAL_LENGTH
}

fn is_half_width(ch: char) -> bool {
    let code = u32::from(ch);
    code <= 0x7F || (0xFF61..=0xFF9F).contains(&code)
}

#[cfg(test)]
mod tests {
    use super::{exceeds_budget, visual_length};

    #[test]
    fn ascii_counts_half() {
        assert_eq!(visual_length("abcd"), 2.0);
        assert_eq!(visual_length(""), 0.0);
    }

    #[test]
    fn wide_and_half_width_katakana_mix() {
        // 2 full-width + 2 half-width katakana
        assert_eq!(visual_length("健康ｱｲ"), 3.0);
    }

    #[test]
    fn astral_chars_count_per_code_unit() {
        assert_eq!(visual_length("🎯"), 2.0);
    }

    #[test]
    fn budget_is_exclusive() {
        assert!(!exceeds_budget(&"あ".repeat(30)));
        assert!(exceeds_budget(&"あ".repeat(31)));
        assert!(!exceeds_budget(&"a".repeat(60)));
    }
}
