//! Applying AI output to a chart.
//!
//! # Responsibility
//! - Pull the first JSON array/object out of a free-form model response.
//! - Write suggestions into empty cells only, through the grid mutators.
//!
//! # Invariants
//! - Non-empty cells are never overwritten, except the selected cell in
//!   `Single` mode when it still holds the seed text the user typed.
//! - Every write goes through `Grid::set_cell`/`set_sub_theme`, so the
//!   mirror rule holds after a fill.
//! - On error the grid is left untouched.

use super::client::{AiError, AiResult};
use super::prompt::FillMode;
use crate::model::grid::{Grid, GridError};
use crate::model::layout::{
    block_index, global_index, ACTION_SLOTS, META_BLOCK, SATELLITE_BLOCKS,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

static JSON_FRAGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[\s\S]*\]|\{[\s\S]*\}").expect("valid json fragment regex"));

/// Result of applying one AI response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillOutcome {
    pub mode: FillMode,
    /// Number of cells written (mirror writes not counted twice).
    pub filled: usize,
}

/// Where a fill was requested from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillTarget {
    /// Selected cell.
    pub index: usize,
    /// Text the user typed but has not committed yet, if any.
    pub seed: Option<String>,
}

impl FillTarget {
    pub fn new(index: usize) -> Self {
        Self { index, seed: None }
    }

    pub fn with_seed(index: usize, seed: impl Into<String>) -> Self {
        let seed = seed.into();
        Self {
            index,
            seed: (!seed.trim().is_empty()).then_some(seed),
        }
    }
}

#[derive(Deserialize)]
struct FullBlock {
    #[serde(default)]
    theme: String,
    #[serde(default)]
    actions: Vec<String>,
}

/// Extracts and decodes the first JSON fragment in `text`.
pub fn extract_json(text: &str) -> AiResult<Value> {
    let fragment = JSON_FRAGMENT_RE
        .find(text)
        .ok_or_else(|| AiError::Parse("JSON not found in response".to_string()))?;
    serde_json::from_str(fragment.as_str()).map_err(|err| AiError::Parse(err.to_string()))
}

/// Applies `response` to `grid` for `mode` requested at `target`.
///
/// The grid is modified only when the whole response decodes.
pub fn apply_fill(
    grid: &mut Grid,
    mode: FillMode,
    target: &FillTarget,
    response: &str,
) -> AiResult<FillOutcome> {
    let parsed = extract_json(response)?;
    let mut next = grid.clone();

    if let Some(seed) = &target.seed {
        next.set_cell(target.index, seed.as_str()).map_err(grid_error)?;
    }

    let filled = match mode {
        FillMode::Full => fill_full(&mut next, parsed)?,
        FillMode::Single => fill_single(&mut next, target, &parsed)?,
        FillMode::Block => fill_block(&mut next, block_index(target.index), &parsed)?,
        FillMode::SubThemes => fill_block(&mut next, META_BLOCK, &parsed)?,
    };

    *grid = next;
    Ok(FillOutcome { mode, filled })
}

fn fill_full(grid: &mut Grid, parsed: Value) -> AiResult<usize> {
    let blocks: Vec<Value> = match parsed {
        Value::Array(items) => items,
        _ => return Err(AiError::Parse("expected an array of themes".to_string())),
    };

    let mut filled = 0;
    for (item, &block) in blocks.into_iter().zip(SATELLITE_BLOCKS.iter()) {
        let Ok(entry) = serde_json::from_value::<FullBlock>(item) else {
            continue;
        };

        if grid.sub_theme(block).map_err(grid_error)?.is_empty() && !entry.theme.is_empty() {
            grid.set_sub_theme(block, entry.theme).map_err(grid_error)?;
            filled += 1;
        }

        let mut suggestions = entry.actions.into_iter().filter(|a| !a.is_empty());
        for local in ACTION_SLOTS {
            if !grid.block_cell(block, local).map_err(grid_error)?.is_empty() {
                continue;
            }
            let Some(action) = suggestions.next() else {
                break;
            };
            grid.set_block_cell(block, local, action).map_err(grid_error)?;
            filled += 1;
        }
    }

    Ok(filled)
}

fn fill_single(grid: &mut Grid, target: &FillTarget, parsed: &Value) -> AiResult<usize> {
    let suggestion = parsed
        .get("suggestion")
        .or_else(|| parsed.get(0))
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .ok_or(AiError::EmptyResponse)?;

    let current = grid.cell(target.index).map_err(grid_error)?;
    let replaceable = current.is_empty() || Some(current) == target.seed.as_deref();
    if !replaceable {
        return Ok(0);
    }
    grid.set_cell(target.index, suggestion).map_err(grid_error)?;
    Ok(1)
}

fn fill_block(grid: &mut Grid, block: usize, parsed: &Value) -> AiResult<usize> {
    let suggestions: Vec<&str> = parsed
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if suggestions.is_empty() {
        return Err(AiError::EmptyResponse);
    }

    let mut filled = 0;
    for local in ACTION_SLOTS {
        let index = global_index(block, local);
        if !grid.cell(index).map_err(grid_error)?.is_empty() {
            continue;
        }
        // Cycles when the model returns fewer than eight items.
        let item = suggestions[filled % suggestions.len()];
        grid.set_cell(index, item).map_err(grid_error)?;
        filled += 1;
    }

    Ok(filled)
}

fn grid_error(err: GridError) -> AiError {
    AiError::Parse(format!("suggestion does not fit the chart: {err}"))
}

#[cfg(test)]
mod tests {
    use super::{extract_json, AiError};

    #[test]
    fn extracts_array_from_chatty_response() {
        let value = extract_json("Sure! ```json\n[\"a\", \"b\"]\n``` hope it helps").unwrap();
        assert_eq!(value, serde_json::json!(["a", "b"]));
    }

    #[test]
    fn extracts_object() {
        let value = extract_json("{ \"suggestion\": \"walk\" }").unwrap();
        assert_eq!(value["suggestion"], "walk");
    }

    #[test]
    fn missing_or_broken_json_is_a_parse_error() {
        assert!(matches!(extract_json("no json here"), Err(AiError::Parse(_))));
        assert!(matches!(extract_json("[\"unterminated\"}"), Err(AiError::Parse(_))));
    }
}
