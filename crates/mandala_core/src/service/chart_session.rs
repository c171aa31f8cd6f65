//! Chart session: the single owner of editor state.
//!
//! # Responsibility
//! - Hold the live grid, undo/redo timeline, chart settings and the one
//!   outstanding AI request.
//! - Route every mutation through the grid mutators, record history and
//!   save after each change.
//!
//! # Invariants
//! - Only one edit session and one AI request are open at a time.
//! - A new AI request while one is outstanding is rejected with `Busy`;
//!   results for cancelled or superseded tickets are discarded.
//! - Load failures fall back to defaults; save failures are logged and
//!   returned, but the in-memory state is kept.
//! - Cell contents are never logged.

use crate::ai::client::{AiError, GenerationClient, GenerationRequest};
use crate::ai::fill::{apply_fill, FillOutcome, FillTarget};
use crate::ai::prompt::{advice_prompt, fill_prompt, FillMode};
use crate::codec::{self, ExportFlavor, ParseStats};
use crate::history::{EditSession, History};
use crate::model::grid::{ClearScope, Grid, GridError};
use crate::model::label::exceeds_budget;
use crate::model::layout::{block_index, CellRole, CELL_COUNT, MAIN_THEME_INDEX};
use crate::model::settings::{ChartSettings, ColorTheme};
use crate::repo::chart_store::{ChartStore, StoreError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Shown instead of advice when the generation call fails.
pub const ADVICE_UNAVAILABLE: &str = "申し訳ありません。現在AIアドバイス機能を利用できません。";

pub type SessionResult<T> = Result<T, SessionError>;

/// Error for session operations.
#[derive(Debug)]
pub enum SessionError {
    Grid(GridError),
    Store(StoreError),
    Ai(AiError),
    /// An AI request is already outstanding.
    Busy,
    /// AI actions need a main theme first.
    MainThemeRequired,
    /// `edit_cell`/`commit_edit` without `begin_edit`.
    NoEditInProgress,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Grid(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Ai(err) => write!(f, "{err}"),
            Self::Busy => write!(f, "an AI request is already in progress"),
            Self::MainThemeRequired => write!(f, "enter a main theme before using AI"),
            Self::NoEditInProgress => write!(f, "no cell is being edited"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Grid(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Ai(err) => Some(err),
            Self::Busy | Self::MainThemeRequired | Self::NoEditInProgress => None,
        }
    }
}

impl From<GridError> for SessionError {
    fn from(value: GridError) -> Self {
        Self::Grid(value)
    }
}

impl From<StoreError> for SessionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<AiError> for SessionError {
    fn from(value: AiError) -> Self {
        Self::Ai(value)
    }
}

/// Handle for one outstanding AI request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiTicket {
    pub id: u64,
    /// Request to send to the generation backend.
    pub request: GenerationRequest,
}

/// How an AI completion was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiOutcome {
    /// Fill response applied to the grid.
    Applied(FillOutcome),
    /// Coaching text (or the fallback apology).
    Advice(String),
    /// Ticket was cancelled or superseded; nothing changed.
    Discarded,
}

#[derive(Debug, Clone)]
enum PendingKind {
    Fill { mode: FillMode, target: FillTarget },
    Advice,
}

#[derive(Debug, Clone)]
struct PendingRequest {
    id: u64,
    kind: PendingKind,
}

/// Read-only status for UI toolbars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatus {
    pub can_undo: bool,
    pub can_redo: bool,
    pub ai_busy: bool,
    pub editing: Option<usize>,
    pub filled_cells: usize,
}

/// Editor state machine over one chart.
pub struct ChartSession<S: ChartStore> {
    store: S,
    history: History,
    settings: ChartSettings,
    editing: Option<EditSession>,
    pending: Option<PendingRequest>,
    next_ticket: u64,
}

impl<S: ChartStore> ChartSession<S> {
    /// Opens a session over `store`, loading saved data when readable.
    pub fn open(store: S) -> Self {
        let grid = match store.load_grid() {
            Ok(Some(grid)) => grid,
            Ok(None) => Grid::new(),
            Err(err) => {
                warn!("event=grid_load module=session status=fallback error={err}");
                Grid::new()
            }
        };
        let settings = match store.load_settings() {
            Ok(Some(settings)) => settings,
            Ok(None) => ChartSettings::default(),
            Err(err) => {
                warn!("event=settings_load module=session status=fallback error={err}");
                ChartSettings::default()
            }
        };
        info!(
            "event=session_open module=session status=ok filled_cells={}",
            grid.filled_count()
        );

        Self {
            store,
            history: History::new(grid),
            settings,
            editing: None,
            pending: None,
            next_ticket: 1,
        }
    }

    pub fn grid(&self) -> &Grid {
        self.history.current()
    }

    pub fn settings(&self) -> &ChartSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
            ai_busy: self.pending.is_some(),
            editing: self.editing.as_ref().map(|edit| edit.index),
            filled_cells: self.grid().filled_count(),
        }
    }

    // ---- cell editing -------------------------------------------------

    /// Selects `index` for editing and snapshots the grid.
    ///
    /// An edit still open on another cell is committed first.
    pub fn begin_edit(&mut self, index: usize) -> SessionResult<()> {
        if index >= CELL_COUNT {
            return Err(GridError::IndexOutOfRange(index).into());
        }
        if self.editing.is_some() {
            self.commit_edit()?;
        }
        self.editing = Some(EditSession::begin(index, self.history.current()));
        Ok(())
    }

    /// Writes `value` into the cell being edited (mirror included) and saves.
    pub fn edit_cell(&mut self, value: &str) -> SessionResult<()> {
        let index = self
            .editing
            .as_ref()
            .map(|edit| edit.index)
            .ok_or(SessionError::NoEditInProgress)?;
        self.history.current_mut().set_cell(index, value)?;
        self.persist()
    }

    /// Ends the edit session, recording one undo step if anything changed.
    ///
    /// Returns whether a step was recorded.
    pub fn commit_edit(&mut self) -> SessionResult<bool> {
        let edit = self.editing.take().ok_or(SessionError::NoEditInProgress)?;
        let recorded = self.history.commit(edit.before);
        let over_budget = self
            .history
            .current()
            .get(edit.index)
            .is_some_and(exceeds_budget);
        info!(
            "event=cell_edit module=session status=ok index={} role={} recorded={recorded} over_budget={over_budget}",
            edit.index,
            CellRole::of(edit.index).label()
        );
        Ok(recorded)
    }

    /// One-shot edit: begin, write, commit.
    pub fn set_cell(&mut self, index: usize, value: &str) -> SessionResult<bool> {
        self.begin_edit(index)?;
        if let Err(err) = self.edit_cell(value) {
            // Keep history consistent even when the save failed.
            self.commit_edit()?;
            return Err(err);
        }
        self.commit_edit()
    }

    // ---- history ------------------------------------------------------

    /// Steps back once. Returns `false` when there was nothing to undo.
    pub fn undo(&mut self) -> SessionResult<bool> {
        self.close_open_edit();
        if !self.history.undo() {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Steps forward once. Returns `false` when there was nothing to redo.
    pub fn redo(&mut self) -> SessionResult<bool> {
        self.close_open_edit();
        if !self.history.redo() {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    // ---- wholesale operations -----------------------------------------

    /// Empties the whole chart and drops the saved copy.
    pub fn reset(&mut self) -> SessionResult<()> {
        self.close_open_edit();
        self.history.replace(Grid::new());
        self.store.clear_grid()?;
        info!("event=chart_reset module=session status=ok");
        Ok(())
    }

    /// Area clear from a block center; cell 40 clears everything.
    pub fn clear_area(&mut self, index: usize) -> SessionResult<ClearScope> {
        self.close_open_edit();
        let mut next = self.history.current().clone();
        let scope = next.clear_area_at(index)?;
        self.history.replace(next);
        match scope {
            ClearScope::All => self.store.clear_grid()?,
            ClearScope::Block(_) => self.persist()?,
        }
        info!("event=area_clear module=session status=ok index={index} scope={scope:?}");
        Ok(scope)
    }

    /// Replaces the chart with parsed markdown.
    pub fn import_markdown(&mut self, text: &str) -> SessionResult<ParseStats> {
        self.close_open_edit();
        let (grid, stats) = codec::parse_with_stats(text);
        self.history.replace(grid);
        self.persist()?;
        info!(
            "event=markdown_import module=session status=ok sub_themes={} actions={}",
            stats.sub_themes, stats.actions
        );
        Ok(stats)
    }

    pub fn export(&self, flavor: ExportFlavor) -> String {
        codec::serialize(self.history.current(), flavor)
    }

    // ---- settings -----------------------------------------------------

    pub fn set_titles(&mut self, title: &str, subtitle: &str) -> SessionResult<()> {
        self.settings.set_titles(title, subtitle);
        self.store.save_settings(&self.settings)?;
        Ok(())
    }

    pub fn set_color_theme(&mut self, theme: ColorTheme) -> SessionResult<()> {
        self.settings.color_theme = theme;
        self.store.save_settings(&self.settings)?;
        Ok(())
    }

    // ---- AI -----------------------------------------------------------

    /// Opens a fill request and returns the ticket to send.
    ///
    /// # Errors
    /// - `Busy` when another request is outstanding.
    /// - `MainThemeRequired` when neither the chart nor the seed (on cell
    ///   40) provides a main theme.
    pub fn begin_ai_fill(&mut self, mode: FillMode, target: FillTarget) -> SessionResult<AiTicket> {
        self.ensure_idle()?;
        if target.index >= CELL_COUNT {
            return Err(GridError::IndexOutOfRange(target.index).into());
        }

        let grid = self.history.current();
        let main_theme = match (&target.seed, target.index == MAIN_THEME_INDEX) {
            (Some(seed), true) => seed.trim().to_string(),
            _ => grid.main_theme().trim().to_string(),
        };
        if main_theme.is_empty() {
            return Err(SessionError::MainThemeRequired);
        }

        // Seed, then the selected cell, then the sub-theme (none for the meta block).
        let block = block_index(target.index);
        let block_topic = target
            .seed
            .as_deref()
            .filter(|seed| !seed.trim().is_empty())
            .or_else(|| grid.get(target.index).filter(|text| !text.is_empty()))
            .or_else(|| grid.sub_theme(block).ok())
            .map(str::to_string);
        let prompt = fill_prompt(mode, &main_theme, block_topic.as_deref());

        Ok(self.open_ticket(prompt, PendingKind::Fill { mode, target }))
    }

    /// Opens a coaching-advice request.
    pub fn begin_advice(&mut self) -> SessionResult<AiTicket> {
        self.ensure_idle()?;
        if self.history.current().main_theme().trim().is_empty() {
            return Err(SessionError::MainThemeRequired);
        }
        let prompt = advice_prompt(self.history.current());
        Ok(self.open_ticket(prompt, PendingKind::Advice))
    }

    /// Drops the outstanding request; its result will be discarded.
    ///
    /// Returns whether a request was outstanding.
    pub fn cancel_ai_request(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                info!("event=ai_request module=session status=cancelled ticket={}", pending.id);
                true
            }
            None => false,
        }
    }

    /// Delivers the backend result for `ticket_id`.
    ///
    /// Fill errors abort the fill and leave the grid unchanged; advice
    /// errors degrade to [`ADVICE_UNAVAILABLE`].
    pub fn complete_ai_request(
        &mut self,
        ticket_id: u64,
        result: Result<String, AiError>,
    ) -> SessionResult<AiOutcome> {
        let pending = match self.pending.take() {
            Some(pending) if pending.id == ticket_id => pending,
            other => {
                self.pending = other;
                info!("event=ai_request module=session status=discarded ticket={ticket_id}");
                return Ok(AiOutcome::Discarded);
            }
        };

        match pending.kind {
            PendingKind::Advice => match result {
                Ok(text) => Ok(AiOutcome::Advice(text)),
                Err(err) => {
                    warn!("event=ai_advice module=session status=error error={err}");
                    Ok(AiOutcome::Advice(ADVICE_UNAVAILABLE.to_string()))
                }
            },
            PendingKind::Fill { mode, target } => {
                let response = result.map_err(|err| {
                    warn!(
                        "event=ai_fill module=session status=error mode={} error={err}",
                        mode.as_str()
                    );
                    SessionError::Ai(err)
                })?;

                self.close_open_edit();
                let mut next = self.history.current().clone();
                let outcome = apply_fill(&mut next, mode, &target, &response).map_err(|err| {
                    warn!(
                        "event=ai_fill module=session status=error mode={} error={err}",
                        mode.as_str()
                    );
                    SessionError::Ai(err)
                })?;
                if self.history.replace(next) {
                    self.persist()?;
                }
                info!(
                    "event=ai_fill module=session status=ok mode={} filled={}",
                    mode.as_str(),
                    outcome.filled
                );
                Ok(AiOutcome::Applied(outcome))
            }
        }
    }

    /// Synchronous fill: open ticket, call `client`, apply.
    pub fn run_ai_fill(
        &mut self,
        client: &dyn GenerationClient,
        mode: FillMode,
        target: FillTarget,
    ) -> SessionResult<AiOutcome> {
        let ticket = self.begin_ai_fill(mode, target)?;
        let result = client.generate(&ticket.request);
        self.complete_ai_request(ticket.id, result)
    }

    /// Synchronous advice: open ticket, call `client`, return the text.
    pub fn run_advice(&mut self, client: &dyn GenerationClient) -> SessionResult<String> {
        let ticket = self.begin_advice()?;
        let result = client.generate(&ticket.request);
        match self.complete_ai_request(ticket.id, result)? {
            AiOutcome::Advice(text) => Ok(text),
            _ => Ok(ADVICE_UNAVAILABLE.to_string()),
        }
    }

    // ---- internals ----------------------------------------------------

    fn ensure_idle(&self) -> SessionResult<()> {
        if self.pending.is_some() {
            return Err(SessionError::Busy);
        }
        Ok(())
    }

    fn open_ticket(&mut self, prompt: String, kind: PendingKind) -> AiTicket {
        let id = self.next_ticket;
        self.next_ticket += 1;
        self.pending = Some(PendingRequest { id, kind });
        info!("event=ai_request module=session status=start ticket={id}");
        AiTicket {
            id,
            request: GenerationRequest::new(prompt),
        }
    }

    fn close_open_edit(&mut self) {
        if let Some(edit) = self.editing.take() {
            self.history.commit(edit.before);
        }
    }

    fn persist(&self) -> SessionResult<()> {
        self.store
            .save_grid(self.history.current())
            .map_err(|err| {
                warn!("event=grid_save module=session status=error error={err}");
                SessionError::Store(err)
            })
    }
}
