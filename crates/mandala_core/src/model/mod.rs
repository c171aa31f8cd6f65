//! Domain model for one mandala chart.
//!
//! # Responsibility
//! - Define the fixed 9x9 grid, its index arithmetic and mirror rule.
//! - Define presentation settings stored alongside the grid.
//!
//! # Invariants
//! - A chart always has exactly 81 cells.
//! - Sub-theme pairs (meta-block slot `b` / center of block `b`) never diverge.

pub mod grid;
pub mod label;
pub mod layout;
pub mod settings;
