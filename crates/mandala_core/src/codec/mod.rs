//! Text import/export for charts.
//!
//! # Responsibility
//! - Render charts as markdown (re-importable) or as a decorative tree.
//! - Parse markdown back into a chart.
//!
//! # Invariants
//! - Only the markdown flavor is a round-trip contract; the tree is
//!   display-only.

pub mod markdown;
pub mod tree;

use crate::model::grid::Grid;
use std::fmt::{Display, Formatter};

pub use markdown::{import_template, parse, parse_with_stats, ParseStats};

/// Text rendering flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFlavor {
    /// Box-drawing outline for reading and sharing.
    #[default]
    Tree,
    /// `#` / `##` / `- [ ]` outline accepted by [`parse`].
    Markdown,
}

impl ExportFlavor {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tree" | "text" => Some(Self::Tree),
            "markdown" | "md" => Some(Self::Markdown),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tree => "tree",
            Self::Markdown => "markdown",
        }
    }
}

impl Display for ExportFlavor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renders `grid` in the requested flavor.
pub fn serialize(grid: &Grid, flavor: ExportFlavor) -> String {
    match flavor {
        ExportFlavor::Tree => tree::to_tree(grid),
        ExportFlavor::Markdown => markdown::to_markdown(grid),
    }
}
