//! FFI use-case API for the Flutter chart editor.
//!
//! # Responsibility
//! - Expose chart editing, history, text import/export and AI actions to Dart.
//! - Own the process-wide chart session behind a mutex.
//!
//! # Invariants
//! - Exported functions never panic across the FFI boundary.
//! - Every chart-mutating call returns a full snapshot so the UI can
//!   re-render without a second round trip.
//! - The session lock is not held while an AI request is on the network.

use log::warn;
use mandala_core::{
    core_version as core_version_inner, import_template, init_logging as init_logging_inner,
    ping as ping_inner, AiError, AiOutcome, ChartSession, ColorTheme, CoreConfig, ExportFlavor,
    FillMode, FillTarget, GenerationClient, GenerationRequest, SessionError, SqliteChartStore,
};
use std::sync::{Mutex, OnceLock};

static CONFIG: OnceLock<CoreConfig> = OnceLock::new();
static SESSION: Mutex<Option<ChartSession<SqliteChartStore>>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes core logging once per process.
///
/// # FFI contract
/// - Idempotent for the same `level + log_dir`.
/// - Returns empty string on success and the error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Full chart state handed back after each call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSnapshot {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Human-readable result for diagnostics/UI toasts.
    pub message: String,
    /// 81 cells in row-major order (empty when the session failed to open).
    pub cells: Vec<String>,
    pub can_undo: bool,
    pub can_redo: bool,
    pub ai_busy: bool,
    /// Cell currently being edited.
    pub editing: Option<u32>,
}

/// Text result for export, template and advice calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextResponse {
    pub ok: bool,
    pub text: String,
    pub message: String,
}

/// Title block and palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsResponse {
    pub ok: bool,
    pub title: String,
    pub subtitle: String,
    /// Palette id (`blue|cyan|...|white`).
    pub color_theme: String,
    pub message: String,
}

/// Loads (or reuses) the session and returns the current chart.
#[flutter_rust_bridge::frb(sync)]
pub fn chart_load() -> ChartSnapshot {
    snapshot_after(|_| Ok("Chart loaded.".to_string()))
}

/// Starts editing `index`; the undo step is recorded on commit.
#[flutter_rust_bridge::frb(sync)]
pub fn chart_begin_edit(index: u32) -> ChartSnapshot {
    snapshot_after(|session| {
        session.begin_edit(index as usize)?;
        Ok(String::new())
    })
}

/// Writes live input into the cell being edited.
#[flutter_rust_bridge::frb(sync)]
pub fn chart_edit_cell(value: String) -> ChartSnapshot {
    snapshot_after(|session| {
        session.edit_cell(&value)?;
        Ok(String::new())
    })
}

/// Closes the edit session.
#[flutter_rust_bridge::frb(sync)]
pub fn chart_commit_edit() -> ChartSnapshot {
    snapshot_after(|session| {
        let recorded = session.commit_edit()?;
        Ok(if recorded { "Saved." } else { "No changes." }.to_string())
    })
}

/// Sets one cell as a single undo step.
#[flutter_rust_bridge::frb(sync)]
pub fn chart_set_cell(index: u32, value: String) -> ChartSnapshot {
    snapshot_after(|session| {
        session.set_cell(index as usize, &value)?;
        Ok(String::new())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn chart_undo() -> ChartSnapshot {
    snapshot_after(|session| {
        Ok(if session.undo()? { "Undone." } else { "Nothing to undo." }.to_string())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn chart_redo() -> ChartSnapshot {
    snapshot_after(|session| {
        Ok(if session.redo()? { "Redone." } else { "Nothing to redo." }.to_string())
    })
}

/// Empties the chart and deletes the saved copy.
#[flutter_rust_bridge::frb(sync)]
pub fn chart_reset() -> ChartSnapshot {
    snapshot_after(|session| {
        session.reset()?;
        Ok("Chart reset.".to_string())
    })
}

/// Clears the area owned by a block center (cell 40 clears everything).
#[flutter_rust_bridge::frb(sync)]
pub fn chart_clear_area(index: u32) -> ChartSnapshot {
    snapshot_after(|session| {
        session.clear_area(index as usize)?;
        Ok("Area cleared.".to_string())
    })
}

/// Replaces the chart with parsed markdown.
#[flutter_rust_bridge::frb(sync)]
pub fn chart_import_markdown(text: String) -> ChartSnapshot {
    snapshot_after(|session| {
        let stats = session.import_markdown(&text)?;
        Ok(format!(
            "Imported {} sub-theme(s) and {} action(s).",
            stats.sub_themes, stats.actions
        ))
    })
}

/// Exports the chart as `tree` (default) or `markdown`.
#[flutter_rust_bridge::frb(sync)]
pub fn chart_export(flavor: Option<String>) -> TextResponse {
    let flavor = match flavor.as_deref().map(ExportFlavor::parse) {
        None => ExportFlavor::default(),
        Some(Some(flavor)) => flavor,
        Some(None) => return TextResponse::failure("chart_export failed: unknown flavor"),
    };
    match with_session(|session| Ok(session.export(flavor))) {
        Ok(text) => TextResponse::success(text, "Exported."),
        Err(err) => TextResponse::failure(format!("chart_export failed: {err}")),
    }
}

/// Returns the markdown starter template.
#[flutter_rust_bridge::frb(sync)]
pub fn chart_template() -> String {
    import_template()
}

#[flutter_rust_bridge::frb(sync)]
pub fn chart_settings() -> SettingsResponse {
    settings_after(|_| Ok(()))
}

#[flutter_rust_bridge::frb(sync)]
pub fn chart_set_titles(title: String, subtitle: String) -> SettingsResponse {
    settings_after(|session| session.set_titles(&title, &subtitle))
}

/// Switches palette by id; unknown ids are rejected.
#[flutter_rust_bridge::frb(sync)]
pub fn chart_set_color_theme(theme_id: String) -> SettingsResponse {
    let Some(theme) = ColorTheme::parse(&theme_id) else {
        return SettingsResponse {
            ok: false,
            title: String::new(),
            subtitle: String::new(),
            color_theme: String::new(),
            message: format!("unknown color theme `{}`", theme_id.trim()),
        };
    };
    settings_after(|session| session.set_color_theme(theme))
}

/// Runs an AI fill (`single|block|sub_themes|full`) from cell `index`.
///
/// `seed` is uncommitted text from the edit box.
///
/// # FFI contract
/// - Async call (network I/O).
/// - The session stays usable while the request runs; a second AI call
///   during that time fails with a busy message.
pub fn chart_ai_fill(mode: String, index: u32, seed: Option<String>) -> ChartSnapshot {
    let Some(mode) = FillMode::parse(&mode) else {
        return failed_snapshot(format!("unknown fill mode `{}`", mode.trim()));
    };
    let target = match seed {
        Some(seed) => FillTarget::with_seed(index as usize, seed),
        None => FillTarget::new(index as usize),
    };

    let ticket = match with_session(|session| session.begin_ai_fill(mode, target)) {
        Ok(ticket) => ticket,
        Err(err) => return failed_snapshot(format!("chart_ai_fill failed: {err}")),
    };
    let result = generate(&ticket.request);

    snapshot_after(move |session| match session.complete_ai_request(ticket.id, result)? {
        AiOutcome::Applied(outcome) => Ok(format!("Filled {} cell(s).", outcome.filled)),
        AiOutcome::Discarded => Ok("AI request was cancelled.".to_string()),
        AiOutcome::Advice(_) => Ok(String::new()),
    })
}

/// Requests coaching advice for the whole chart.
///
/// Backend failures yield the fixed apology text with `ok = true`.
pub fn chart_ai_advice() -> TextResponse {
    let ticket = match with_session(|session| session.begin_advice()) {
        Ok(ticket) => ticket,
        Err(err) => return TextResponse::failure(format!("chart_ai_advice failed: {err}")),
    };
    let result = generate(&ticket.request);

    match with_session(move |session| session.complete_ai_request(ticket.id, result)) {
        Ok(AiOutcome::Advice(text)) => TextResponse::success(text, "Advice ready."),
        Ok(_) => TextResponse::failure("AI request was cancelled."),
        Err(err) => TextResponse::failure(format!("chart_ai_advice failed: {err}")),
    }
}

/// Abandons the outstanding AI request; its late result is ignored.
#[flutter_rust_bridge::frb(sync)]
pub fn chart_ai_cancel() -> ChartSnapshot {
    snapshot_after(|session| {
        Ok(if session.cancel_ai_request() {
            "AI request cancelled."
        } else {
            "No AI request in progress."
        }
        .to_string())
    })
}

impl TextResponse {
    fn success(text: String, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            text,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            text: String::new(),
            message: message.into(),
        }
    }
}

fn config() -> &'static CoreConfig {
    CONFIG.get_or_init(CoreConfig::from_env)
}

fn generate(request: &GenerationRequest) -> Result<String, AiError> {
    config().ai_client()?.generate(request)
}

fn with_session<T>(
    f: impl FnOnce(&mut ChartSession<SqliteChartStore>) -> Result<T, SessionError>,
) -> Result<T, String> {
    let mut guard = SESSION.lock().map_err(|_| {
        warn!("event=session_lock module=ffi status=error reason=poisoned");
        "chart session is unavailable".to_string()
    })?;
    if guard.is_none() {
        let store = SqliteChartStore::open(&config().db_path)
            .map_err(|err| format!("chart DB open failed: {err}"))?;
        *guard = Some(ChartSession::open(store));
    }
    match guard.as_mut() {
        Some(session) => f(session).map_err(|err| err.to_string()),
        None => Err("chart session is unavailable".to_string()),
    }
}

fn snapshot_after(
    f: impl FnOnce(&mut ChartSession<SqliteChartStore>) -> Result<String, SessionError>,
) -> ChartSnapshot {
    let result = with_session(|session| {
        let outcome = f(session);
        let mut snapshot = snapshot_of(session);
        match outcome {
            Ok(message) => snapshot.message = message,
            Err(err) => {
                snapshot.ok = false;
                snapshot.message = err.to_string();
            }
        }
        Ok(snapshot)
    });
    result.unwrap_or_else(failed_snapshot)
}

fn snapshot_of(session: &ChartSession<SqliteChartStore>) -> ChartSnapshot {
    let status = session.status();
    ChartSnapshot {
        ok: true,
        message: String::new(),
        cells: session.grid().cells().to_vec(),
        can_undo: status.can_undo,
        can_redo: status.can_redo,
        ai_busy: status.ai_busy,
        editing: status.editing.map(|index| index as u32),
    }
}

fn failed_snapshot(message: String) -> ChartSnapshot {
    ChartSnapshot {
        ok: false,
        message,
        cells: Vec::new(),
        can_undo: false,
        can_redo: false,
        ai_busy: false,
        editing: None,
    }
}

fn settings_after(
    f: impl FnOnce(&mut ChartSession<SqliteChartStore>) -> Result<(), SessionError>,
) -> SettingsResponse {
    let result = with_session(|session| {
        let outcome = f(session);
        let settings = session.settings();
        Ok(SettingsResponse {
            ok: outcome.is_ok(),
            title: settings.title.clone(),
            subtitle: settings.subtitle.clone(),
            color_theme: settings.color_theme.id().to_string(),
            message: outcome.err().map(|err| err.to_string()).unwrap_or_default(),
        })
    });
    result.unwrap_or_else(|message| SettingsResponse {
        ok: false,
        title: String::new(),
        subtitle: String::new(),
        color_theme: String::new(),
        message,
    })
}
