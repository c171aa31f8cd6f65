//! Index arithmetic for the 9x9 mandala grid.
//!
//! # Responsibility
//! - Map between global cell indices (0..81, row-major over the 9x9 matrix)
//!   and `(block, local)` pairs (both 0..9, row-major).
//! - Name the fixed positions that carry meaning (main theme, block centers).
//!
//! # Invariants
//! - `block_index(global_index(b, l)) == b` and
//!   `local_index(global_index(b, l)) == l` for every `b, l` in `0..9`.
//! - All functions are pure; callers guarantee indices are in range.

/// Number of cells in a chart.
pub const CELL_COUNT: usize = 81;
/// Cells per block and blocks per chart.
pub const BLOCK_SIZE: usize = 9;
/// Global index of the main theme (center of the center block).
pub const MAIN_THEME_INDEX: usize = 40;
/// The center ("meta") block that mirrors every satellite sub-theme.
pub const META_BLOCK: usize = 4;
/// Local index of a block center.
pub const CENTER_LOCAL: usize = 4;

/// Satellite blocks in row-major order. Also the sub-theme order used by
/// export/import and AI fill.
pub const SATELLITE_BLOCKS: [usize; 8] = [0, 1, 2, 3, 5, 6, 7, 8];

/// Local slots of a block that hold actions (everything except the center).
pub const ACTION_SLOTS: [usize; 8] = [0, 1, 2, 3, 5, 6, 7, 8];

/// Global indices of the nine block centers.
pub const BLOCK_CENTERS: [usize; 9] = [10, 13, 16, 37, 40, 43, 64, 67, 70];

const GRID_WIDTH: usize = 9;
const BLOCK_WIDTH: usize = 3;

/// Returns the block (0..9) that contains `global`.
pub fn block_index(global: usize) -> usize {
    let row = global / GRID_WIDTH;
    let col = global % GRID_WIDTH;
    (row / BLOCK_WIDTH) * BLOCK_WIDTH + col / BLOCK_WIDTH
}

/// Returns the row-major position (0..9) of `global` inside its block.
pub fn local_index(global: usize) -> usize {
    let row = global / GRID_WIDTH;
    let col = global % GRID_WIDTH;
    (row % BLOCK_WIDTH) * BLOCK_WIDTH + col % BLOCK_WIDTH
}

/// Returns the global index of slot `local` in block `block`.
pub fn global_index(block: usize, local: usize) -> usize {
    let block_row = block / BLOCK_WIDTH;
    let block_col = block % BLOCK_WIDTH;
    let local_row = local / BLOCK_WIDTH;
    let local_col = local % BLOCK_WIDTH;
    (block_row * BLOCK_WIDTH + local_row) * GRID_WIDTH + (block_col * BLOCK_WIDTH + local_col)
}

/// Returns whether `global` is the center of its block.
pub fn is_block_center(global: usize) -> bool {
    local_index(global) == CENTER_LOCAL
}

/// Returns the global index of the cell mirroring `global`, if any.
///
/// - Meta-block slot `b` (b != 4) pairs with the center of block `b`.
/// - Center of block `b` (b != 4) pairs with meta-block slot `b`.
/// - The main theme and action cells have no counterpart.
pub fn mirror_of(global: usize) -> Option<usize> {
    if global == MAIN_THEME_INDEX {
        return None;
    }
    let block = block_index(global);
    let local = local_index(global);
    if block == META_BLOCK {
        Some(global_index(local, CENTER_LOCAL))
    } else if local == CENTER_LOCAL {
        Some(global_index(META_BLOCK, block))
    } else {
        None
    }
}

/// Semantic role of a cell, derived from its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellRole {
    /// Cell 40.
    MainTheme,
    /// A meta-block slot or a satellite block center.
    SubTheme,
    /// One of the 64 leaf cells.
    Action,
}

impl CellRole {
    /// Classifies `global`.
    pub fn of(global: usize) -> Self {
        if global == MAIN_THEME_INDEX {
            Self::MainTheme
        } else if block_index(global) == META_BLOCK || is_block_center(global) {
            Self::SubTheme
        } else {
            Self::Action
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::MainTheme => "main_theme",
            Self::SubTheme => "sub_theme",
            Self::Action => "action",
        }
    }
}
