//! Markdown exchange format.
//!
//! # Responsibility
//! - Serialize a chart into a three-level outline (`#` / `##` / `- [ ]`).
//! - Parse such an outline back into a fresh chart.
//!
//! # Invariants
//! - `parse` never fails: unknown lines, a ninth `##` and surplus or
//!   orphan bullets are dropped.
//! - Sub-themes are written through `Grid::set_sub_theme`, so parsed charts
//!   always satisfy the mirror rule.
//! - `parse(&to_markdown(grid))` reproduces a consistent grid whose
//!   actions are packed from the first slot of each block; gaps close up.

use crate::model::grid::Grid;
use crate::model::layout::{ACTION_SLOTS, SATELLITE_BLOCKS};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

/// Written for an empty main theme; read back as empty.
pub const MAIN_THEME_PLACEHOLDER: &str = "無題のテーマ";

static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#+)\s*(.*)$").expect("valid heading regex"));
static BULLET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-*+•]\s*(.*)$").expect("valid bullet regex"));
static CHECKBOX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[[ xX\s]*?\]\s*").expect("valid checkbox regex"));

/// Placeholder written for the empty sub-theme of `block`.
///
/// Numbered `block + 1`, so the meta block's number 5 never appears.
pub fn sub_theme_placeholder(block: usize) -> String {
    format!("サブテーマ{}", block + 1)
}

/// Counters describing what `parse` kept and dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub sub_themes: usize,
    pub actions: usize,
    /// `##` headings beyond the eighth.
    pub dropped_headings: usize,
    /// Bullets before any `##` or beyond eight per block.
    pub dropped_bullets: usize,
}

/// Renders `grid` as markdown.
pub fn to_markdown(grid: &Grid) -> String {
    let main = non_empty_or(grid.main_theme(), MAIN_THEME_PLACEHOLDER);
    let mut text = format!("# {main}\n\n");

    for &block in SATELLITE_BLOCKS.iter() {
        let sub_theme = grid.sub_theme(block).unwrap_or_default();
        if sub_theme.is_empty() {
            text.push_str(&format!("## {}\n", sub_theme_placeholder(block)));
        } else {
            text.push_str(&format!("## {sub_theme}\n"));
        }
        for (_, action) in grid.actions(block).into_iter().flatten() {
            if !action.is_empty() {
                text.push_str(&format!("- [ ] {action}\n"));
            }
        }
        text.push('\n');
    }

    text
}

/// Parses markdown into a new chart.
///
/// Placeholder headings read back as empty, so a main theme equal to
/// [`MAIN_THEME_PLACEHOLDER`] or a sub-theme equal to its own
/// [`sub_theme_placeholder`] does not survive a round trip.
pub fn parse(text: &str) -> Grid {
    parse_with_stats(text).0
}

/// Parses markdown into a new chart and reports what was dropped.
pub fn parse_with_stats(text: &str) -> (Grid, ParseStats) {
    let mut grid = Grid::new();
    let mut stats = ParseStats::default();
    let mut next_sub_theme = 0usize;
    let mut active_block: Option<usize> = None;
    let mut next_action = 0usize;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(caps) = HEADING_RE.captures(trimmed) {
            let level = caps.get(1).map_or(0, |m| m.as_str().len());
            let title = caps.get(2).map_or("", |m| m.as_str()).trim();

            if level == 1 {
                if title.is_empty() {
                    continue;
                }
                let main = if title == MAIN_THEME_PLACEHOLDER { "" } else { title };
                grid.set_main_theme(main);
                continue;
            }

            let Some(&block) = SATELLITE_BLOCKS.get(next_sub_theme) else {
                stats.dropped_headings += 1;
                continue;
            };
            next_sub_theme += 1;
            let sub_theme = if title == sub_theme_placeholder(block) {
                ""
            } else {
                title
            };
            // SATELLITE_BLOCKS never contains the meta block.
            if grid.set_sub_theme(block, sub_theme).is_ok() {
                stats.sub_themes += 1;
            }
            active_block = Some(block);
            next_action = 0;
            continue;
        }

        if let Some(caps) = BULLET_RE.captures(trimmed) {
            let (Some(block), Some(&slot)) = (active_block, ACTION_SLOTS.get(next_action)) else {
                stats.dropped_bullets += 1;
                continue;
            };
            let body = caps.get(1).map_or("", |m| m.as_str());
            let item = CHECKBOX_RE.replace(body, "");
            if grid.set_block_cell(block, slot, item.trim()).is_ok() {
                stats.actions += 1;
            }
            next_action += 1;
        }
    }

    debug!(
        "event=markdown_parse module=codec status=ok sub_themes={} actions={} dropped_headings={} dropped_bullets={}",
        stats.sub_themes, stats.actions, stats.dropped_headings, stats.dropped_bullets
    );

    (grid, stats)
}

/// Fill-in-the-blanks outline shown to users before their first import.
pub fn import_template() -> String {
    let mut template = String::from("# メインテーマ\n\n");
    for i in 1..=SATELLITE_BLOCKS.len() {
        template.push_str(&format!("## サブテーマ{i}\n"));
        for j in 1..=ACTION_SLOTS.len() {
            template.push_str(&format!("- [ ] 行動{i}-{j}\n"));
        }
        template.push('\n');
    }
    template
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::{parse, parse_with_stats, to_markdown, MAIN_THEME_PLACEHOLDER};
    use crate::model::grid::Grid;
    use crate::model::layout::{global_index, MAIN_THEME_INDEX};

    #[test]
    fn empty_grid_serializes_placeholders() {
        let text = to_markdown(&Grid::new());
        assert!(text.starts_with(&format!("# {MAIN_THEME_PLACEHOLDER}\n\n## サブテーマ1\n")));
        assert!(text.contains("## サブテーマ4\n\n## サブテーマ6\n"));
        assert!(text.contains("## サブテーマ9\n"));
        assert!(!text.contains("## サブテーマ5\n"));
        assert!(!text.contains("- [ ]"));
    }

    #[test]
    fn labels_equal_to_their_placeholder_read_back_empty() {
        let grid = parse(&format!("# {MAIN_THEME_PLACEHOLDER}\n## サブテーマ1\n## サブテーマ1\n"));
        assert_eq!(grid.main_theme(), "");
        assert_eq!(grid.sub_theme(0).unwrap(), "");
        assert_eq!(grid.sub_theme(1).unwrap(), "サブテーマ1");
    }

    #[test]
    fn full_width_space_is_trimmed() {
        let grid = parse("\u{3000}# 健康\u{3000}\n## 食事\n\u{3000}- [ ] 野菜\n");
        assert_eq!(grid.main_theme(), "健康");
        assert_eq!(grid.cell(global_index(0, 0)).unwrap(), "野菜");
    }

    #[test]
    fn checkbox_variants_and_bullet_markers_are_stripped() {
        let (grid, stats) = parse_with_stats("## a\n- [x] one\n* [X] two\n+ three\n• [ ] four\n");
        assert_eq!(stats.actions, 4);
        let actions: Vec<&str> = grid.actions(0).unwrap().map(|(_, v)| v).collect();
        assert_eq!(&actions[..4], &["one", "two", "three", "four"]);
    }

    #[test]
    fn last_h1_wins() {
        let grid = parse("# first\n# second\n");
        assert_eq!(grid.cell(MAIN_THEME_INDEX).unwrap(), "second");
    }

    #[test]
    fn ninth_bullet_in_a_block_is_dropped() {
        let mut text = String::from("## a\n");
        for i in 0..9 {
            text.push_str(&format!("- item{i}\n"));
        }
        let (grid, stats) = parse_with_stats(&text);
        assert_eq!(stats.actions, 8);
        assert_eq!(stats.dropped_bullets, 1);
        assert_eq!(grid.cell(global_index(0, 8)).unwrap(), "item7");
    }

    #[test]
    fn deeper_headings_count_as_sub_themes() {
        let grid = parse("### deep\n");
        assert_eq!(grid.sub_theme(0).unwrap(), "deep");
    }
}
