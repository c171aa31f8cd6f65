//! Mandala grid model.
//!
//! # Responsibility
//! - Own the 81 cell labels of one chart.
//! - Provide the only mutators allowed to touch cells, so the sub-theme
//!   mirror is maintained in one place.
//!
//! # Invariants
//! - Exactly [`CELL_COUNT`] cells, always.
//! - For every satellite block `b`, `cells[global_index(4, b)]` equals
//!   `cells[global_index(b, 4)]` after every public mutation.
//! - Cell 40 (main theme) has no mirror.

use super::layout::{
    block_index, global_index, is_block_center, local_index, mirror_of, ACTION_SLOTS,
    BLOCK_SIZE, CELL_COUNT, CENTER_LOCAL, MAIN_THEME_INDEX, META_BLOCK, SATELLITE_BLOCKS,
};
use log::warn;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Error for out-of-shape grid input or addressing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Cell index outside `0..81`.
    IndexOutOfRange(usize),
    /// Block index outside `0..9`.
    BlockOutOfRange(usize),
    /// Sub-theme writes address satellite blocks only.
    NotASatelliteBlock(usize),
    /// Area clearing starts from a block center.
    NotABlockCenter(usize),
    /// Serialized grids carry exactly 81 cells.
    WrongLength(usize),
}

impl Display for GridError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexOutOfRange(index) => {
                write!(f, "cell index {index} out of range 0..{CELL_COUNT}")
            }
            Self::BlockOutOfRange(block) => {
                write!(f, "block index {block} out of range 0..{BLOCK_SIZE}")
            }
            Self::NotASatelliteBlock(block) => {
                write!(f, "block {block} is not a satellite block")
            }
            Self::NotABlockCenter(index) => write!(f, "cell {index} is not a block center"),
            Self::WrongLength(len) => {
                write!(f, "grid must have {CELL_COUNT} cells, got {len}")
            }
        }
    }
}

impl Error for GridError {}

/// What an area clear removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearScope {
    /// The whole chart (main theme cleared).
    All,
    /// One block, plus its mirrored slot.
    Block(usize),
}

/// Fixed 81-cell mandala chart.
///
/// Serialized as a flat JSON array of 81 strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Grid {
    cells: Vec<String>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid {
    /// Creates an empty chart.
    pub fn new() -> Self {
        Self {
            cells: vec![String::new(); CELL_COUNT],
        }
    }

    /// Builds a chart from raw cells, repairing broken sub-theme pairs.
    ///
    /// When a pair disagrees, a non-empty meta-block slot wins; otherwise the
    /// satellite center is copied back into the meta block.
    ///
    /// # Errors
    /// - Returns `WrongLength` unless exactly 81 cells are provided.
    pub fn from_cells(cells: Vec<String>) -> Result<Self, GridError> {
        if cells.len() != CELL_COUNT {
            return Err(GridError::WrongLength(cells.len()));
        }

        let mut grid = Self { cells };
        let mut repaired = 0usize;
        for block in SATELLITE_BLOCKS {
            let meta = global_index(META_BLOCK, block);
            let center = global_index(block, CENTER_LOCAL);
            if grid.cells[meta] == grid.cells[center] {
                continue;
            }
            if grid.cells[meta].is_empty() {
                grid.cells[meta] = grid.cells[center].clone();
            } else {
                grid.cells[center] = grid.cells[meta].clone();
            }
            repaired += 1;
        }
        if repaired > 0 {
            warn!("event=grid_repair module=model status=ok repaired_pairs={repaired}");
        }

        Ok(grid)
    }

    /// Returns all cells in global order.
    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    /// Consumes the chart, returning its cells.
    pub fn into_cells(self) -> Vec<String> {
        self.cells
    }

    /// Returns one cell, or `None` when out of range.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }

    /// Returns one cell.
    pub fn cell(&self, index: usize) -> Result<&str, GridError> {
        self.get(index).ok_or(GridError::IndexOutOfRange(index))
    }

    pub fn main_theme(&self) -> &str {
        &self.cells[MAIN_THEME_INDEX]
    }

    /// Returns the sub-theme of a satellite block.
    pub fn sub_theme(&self, block: usize) -> Result<&str, GridError> {
        check_satellite(block)?;
        Ok(&self.cells[global_index(META_BLOCK, block)])
    }

    /// Returns the label at slot `local` of `block`.
    pub fn block_cell(&self, block: usize, local: usize) -> Result<&str, GridError> {
        check_block(block)?;
        check_block(local)?;
        Ok(&self.cells[global_index(block, local)])
    }

    /// Iterates `(slot, label)` over the eight action slots of `block`.
    pub fn actions(
        &self,
        block: usize,
    ) -> Result<impl Iterator<Item = (usize, &str)> + '_, GridError> {
        check_block(block)?;
        Ok(ACTION_SLOTS
            .iter()
            .map(move |&local| (local, self.cells[global_index(block, local)].as_str())))
    }

    /// Iterates the nine visual rows of the 9x9 matrix.
    pub fn rows(&self) -> impl Iterator<Item = &[String]> + '_ {
        self.cells.chunks(BLOCK_SIZE)
    }

    /// Returns whether every cell is empty.
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(String::is_empty)
    }

    /// Counts non-empty cells.
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|cell| !cell.is_empty()).count()
    }

    /// Writes `value` at `index` and its mirror, if it has one.
    pub fn set_cell(&mut self, index: usize, value: impl Into<String>) -> Result<(), GridError> {
        if index >= CELL_COUNT {
            return Err(GridError::IndexOutOfRange(index));
        }
        let value = value.into();
        if let Some(mirror) = mirror_of(index) {
            self.cells[mirror] = value.clone();
        }
        self.cells[index] = value;
        Ok(())
    }

    /// Writes the sub-theme of a satellite block into both mirrored cells.
    pub fn set_sub_theme(&mut self, block: usize, value: impl Into<String>) -> Result<(), GridError> {
        check_satellite(block)?;
        self.set_cell(global_index(META_BLOCK, block), value)
    }

    pub fn set_main_theme(&mut self, value: impl Into<String>) {
        self.cells[MAIN_THEME_INDEX] = value.into();
    }

    /// Writes slot `local` of `block` through [`Grid::set_cell`].
    pub fn set_block_cell(
        &mut self,
        block: usize,
        local: usize,
        value: impl Into<String>,
    ) -> Result<(), GridError> {
        check_block(block)?;
        check_block(local)?;
        self.set_cell(global_index(block, local), value)
    }

    /// Empties all nine cells of `block` and every mirror they have.
    ///
    /// For a satellite block this also empties its meta-block slot; for the
    /// meta block it also empties the eight satellite centers.
    pub fn clear_block(&mut self, block: usize) -> Result<(), GridError> {
        check_block(block)?;
        for local in 0..BLOCK_SIZE {
            self.set_cell(global_index(block, local), String::new())?;
        }
        Ok(())
    }

    /// Empties every cell.
    pub fn clear_all(&mut self) {
        self.cells.iter_mut().for_each(String::clear);
    }

    /// Area clear triggered from a block center.
    ///
    /// - Cell 40 clears the whole chart.
    /// - Any other block center clears its block.
    pub fn clear_area_at(&mut self, index: usize) -> Result<ClearScope, GridError> {
        if index >= CELL_COUNT {
            return Err(GridError::IndexOutOfRange(index));
        }
        if index == MAIN_THEME_INDEX {
            self.clear_all();
            return Ok(ClearScope::All);
        }
        if !is_block_center(index) {
            return Err(GridError::NotABlockCenter(index));
        }
        let block = block_index(index);
        self.clear_block(block)?;
        Ok(ClearScope::Block(block))
    }

    /// Returns the satellite blocks whose sub-theme pair disagrees.
    pub fn mirror_violations(&self) -> Vec<usize> {
        SATELLITE_BLOCKS
            .iter()
            .copied()
            .filter(|&block| {
                self.cells[global_index(META_BLOCK, block)]
                    != self.cells[global_index(block, CENTER_LOCAL)]
            })
            .collect()
    }

    /// Returns `(block, local)` for `index`.
    pub fn position_of(index: usize) -> Result<(usize, usize), GridError> {
        if index >= CELL_COUNT {
            return Err(GridError::IndexOutOfRange(index));
        }
        Ok((block_index(index), local_index(index)))
    }
}

impl TryFrom<Vec<String>> for Grid {
    type Error = GridError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_cells(value)
    }
}

impl From<Grid> for Vec<String> {
    fn from(value: Grid) -> Self {
        value.cells
    }
}

fn check_block(block: usize) -> Result<(), GridError> {
    if block >= BLOCK_SIZE {
        return Err(GridError::BlockOutOfRange(block));
    }
    Ok(())
}

fn check_satellite(block: usize) -> Result<(), GridError> {
    check_block(block)?;
    if block == META_BLOCK {
        return Err(GridError::NotASatelliteBlock(block));
    }
    Ok(())
}
