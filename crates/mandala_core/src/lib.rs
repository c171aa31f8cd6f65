//! Core domain logic for the mandala chart planner.
//! This crate is the single source of truth for chart invariants.

pub mod ai;
pub mod codec;
pub mod config;
pub mod db;
pub mod history;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use ai::{
    AiError, AiResult, FillMode, FillOutcome, FillTarget, GeminiClient, GenerationClient,
    GenerationRequest, ProxyClient,
};
pub use codec::{import_template, ExportFlavor, ParseStats};
pub use config::CoreConfig;
pub use history::{History, HISTORY_LIMIT};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::grid::{ClearScope, Grid, GridError};
pub use model::layout::{CellRole, CELL_COUNT, MAIN_THEME_INDEX};
pub use model::settings::{ChartSettings, ColorTheme};
pub use repo::chart_store::{ChartStore, SqliteChartStore, StoreError, StoreResult};
pub use service::{AiOutcome, AiTicket, ChartSession, SessionError, SessionResult, SessionStatus};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
