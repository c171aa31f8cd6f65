//! Read-only outline export with box-drawing branches.
//!
//! Output shape:
//! ```text
//! ■ main
//!
//! ├─ 1. sub
//! │  ├─ 1-1. action
//! │  └─ 1-8. action
//! │
//! └─ 8. sub
//!    └─ 8-2. action
//! ```
//! Empty actions are skipped but keep their number; the last slot always
//! takes the closing branch.

use super::markdown::MAIN_THEME_PLACEHOLDER;
use crate::model::grid::Grid;
use crate::model::layout::SATELLITE_BLOCKS;

const UNSET_SUB_THEME: &str = "(未設定)";

/// Renders `grid` as a plain-text tree.
pub fn to_tree(grid: &Grid) -> String {
    let main = if grid.main_theme().is_empty() {
        MAIN_THEME_PLACEHOLDER
    } else {
        grid.main_theme()
    };
    let mut text = format!("■ {main}\n\n");
    let last_position = SATELLITE_BLOCKS.len() - 1;

    for (position, &block) in SATELLITE_BLOCKS.iter().enumerate() {
        let is_last_sub = position == last_position;
        let number = position + 1;
        let sub_theme = match grid.sub_theme(block) {
            Ok(value) if !value.is_empty() => value,
            _ => UNSET_SUB_THEME,
        };
        let branch = if is_last_sub { "└─ " } else { "├─ " };
        text.push_str(&format!("{branch}{number}. {sub_theme}\n"));

        let indent = if is_last_sub { "   " } else { "│  " };
        let actions: Vec<&str> = grid
            .actions(block)
            .into_iter()
            .flatten()
            .map(|(_, value)| value)
            .collect();
        let last_action = actions.len().saturating_sub(1);
        for (slot, action) in actions.iter().enumerate() {
            if action.is_empty() {
                continue;
            }
            let leaf = if slot == last_action { "└─ " } else { "├─ " };
            text.push_str(&format!("{indent}{leaf}{number}-{}. {action}\n", slot + 1));
        }

        if !is_last_sub {
            text.push_str("│\n");
        }
    }

    text
}
