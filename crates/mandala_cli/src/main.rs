//! Command-line front end for the mandala chart core.
//!
//! # Responsibility
//! - Map subcommands onto `ChartSession` operations against the saved chart.
//! - Offer an interactive shell so undo/redo can be used within one run.
//!
//! # Invariants
//! - Errors go to stderr with a non-zero exit code; chart output goes to stdout.

use clap::{Parser, Subcommand};
use log::{error, info};
use mandala_core::config::{ENV_AI_ENDPOINT, ENV_DB_PATH, ENV_LOG_DIR, ENV_LOG_LEVEL};
use mandala_core::logging::init_from_config;
use mandala_core::{
    import_template, AiError, AiOutcome, ChartSession, ColorTheme, CoreConfig, ExportFlavor,
    FillMode, FillTarget, SessionError, SqliteChartStore, CELL_COUNT,
};
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const EXIT_ERROR: u8 = 1;
const EXIT_USAGE: u8 = 2;
const EXIT_AI_NOT_CONFIGURED: u8 = 3;

const GRID_CELL_CHARS: usize = 6;

#[derive(Parser)]
#[command(name = "mandala")]
#[command(about = "Mandala chart planner (headless)")]
#[command(version)]
struct Cli {
    /// SQLite file holding the chart
    #[arg(long, global = true, env = ENV_DB_PATH)]
    db: Option<PathBuf>,

    /// Absolute directory for rolling log files
    #[arg(long, global = true, env = ENV_LOG_DIR)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true, env = ENV_LOG_LEVEL)]
    log_level: Option<String>,

    /// AI proxy URL (takes precedence over GEMINI_API_KEY)
    #[arg(long, global = true, env = ENV_AI_ENDPOINT)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the chart
    Show {
        /// grid, tree or markdown
        #[arg(long, short = 'f', default_value = "grid")]
        format: String,
    },

    /// Set one cell (sub-theme pairs are mirrored)
    Set {
        /// Cell index 0..=80 (40 is the main theme)
        index: usize,
        value: String,
    },

    /// Clear the area owned by a block center (40 clears everything)
    Clear { index: usize },

    /// Empty the chart and delete the saved copy
    Reset,

    /// Write the chart as text
    Export {
        /// tree or markdown
        #[arg(long, short = 'f', default_value = "tree")]
        format: String,

        /// Output file (omit for stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Replace the chart with a markdown outline
    #[command(after_help = "\
Examples:
  mandala template > plan.md
  mandala import plan.md
  cat plan.md | mandala import -")]
    Import {
        /// Markdown file, or `-` for stdin
        input: PathBuf,
    },

    /// Print the markdown starter template
    Template,

    /// Ask the AI to fill cells
    Fill {
        /// single, block, sub_themes or full
        mode: String,

        /// Selected cell
        #[arg(default_value_t = 40)]
        index: usize,

        /// Text to place in the selected cell first
        #[arg(long)]
        seed: Option<String>,
    },

    /// Ask the AI for coaching advice on the chart
    Advice,

    /// Show or change title, subtitle and palette
    Settings {
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        subtitle: Option<String>,

        /// Palette id (blue, cyan, green, yellow, gold, red, pink, purple, gray, white)
        #[arg(long)]
        theme: Option<String>,
    },

    /// Interactive editing with undo/redo
    Shell,
}

struct CliError {
    code: u8,
    message: String,
}

impl CliError {
    fn usage(message: impl Into<String>) -> Self {
        Self {
            code: EXIT_USAGE,
            message: message.into(),
        }
    }
}

impl From<SessionError> for CliError {
    fn from(value: SessionError) -> Self {
        let code = match &value {
            SessionError::Ai(AiError::NotConfigured(_)) => EXIT_AI_NOT_CONFIGURED,
            SessionError::Grid(_) | SessionError::MainThemeRequired => EXIT_USAGE,
            _ => EXIT_ERROR,
        };
        Self {
            code,
            message: value.to_string(),
        }
    }
}

impl From<AiError> for CliError {
    fn from(value: AiError) -> Self {
        SessionError::Ai(value).into()
    }
}

impl From<io::Error> for CliError {
    fn from(value: io::Error) -> Self {
        Self {
            code: EXIT_ERROR,
            message: value.to_string(),
        }
    }
}

type Session = ChartSession<SqliteChartStore>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = resolve_config(&cli);

    if let Err(message) = init_from_config(&config) {
        eprintln!("warning: logging disabled: {message}");
    }

    let name = command_name(&cli.command);
    match run(cli.command, &config) {
        Ok(()) => {
            info!("event=cli_command module=cli status=ok command={name}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(
                "event=cli_command module=cli status=error command={name} code={} message={}",
                err.code, err.message
            );
            eprintln!("error: {}", err.message);
            ExitCode::from(err.code)
        }
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Show { .. } => "show",
        Command::Set { .. } => "set",
        Command::Clear { .. } => "clear",
        Command::Reset => "reset",
        Command::Export { .. } => "export",
        Command::Import { .. } => "import",
        Command::Template => "template",
        Command::Fill { .. } => "fill",
        Command::Advice => "advice",
        Command::Settings { .. } => "settings",
        Command::Shell => "shell",
    }
}

fn resolve_config(cli: &Cli) -> CoreConfig {
    let mut config = CoreConfig::from_env();
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(dir.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(endpoint) = cli.endpoint.as_ref().filter(|value| !value.trim().is_empty()) {
        config.ai_endpoint = Some(endpoint.trim().to_string());
    }
    config
}

fn open_session(config: &CoreConfig) -> Result<Session, CliError> {
    let store = SqliteChartStore::open(&config.db_path).map_err(|err| CliError {
        code: EXIT_ERROR,
        message: format!("cannot open {}: {err}", config.db_path.display()),
    })?;
    Ok(ChartSession::open(store))
}

fn run(command: Command, config: &CoreConfig) -> Result<(), CliError> {
    if let Command::Template = command {
        print!("{}", import_template());
        return Ok(());
    }

    let mut session = open_session(config)?;
    match command {
        Command::Show { format } => println!("{}", render(&session, &format)?),
        Command::Set { index, value } => {
            session.set_cell(index, &value)?;
        }
        Command::Clear { index } => {
            let scope = session.clear_area(index)?;
            eprintln!("cleared: {scope:?}");
        }
        Command::Reset => session.reset()?,
        Command::Export { format, output } => {
            let flavor = parse_flavor(&format)?;
            let text = session.export(flavor);
            match output {
                Some(path) => std::fs::write(path, text)?,
                None => println!("{text}"),
            }
        }
        Command::Import { input } => {
            let text = read_input(&input)?;
            let stats = session.import_markdown(&text)?;
            eprintln!(
                "imported: {} sub-theme(s), {} action(s), {} heading(s) and {} bullet(s) dropped",
                stats.sub_themes, stats.actions, stats.dropped_headings, stats.dropped_bullets
            );
        }
        Command::Fill { mode, index, seed } => fill(&mut session, config, &mode, index, seed)?,
        Command::Advice => {
            let client = config.ai_client()?;
            println!("{}", session.run_advice(client.as_ref())?);
        }
        Command::Settings {
            title,
            subtitle,
            theme,
        } => settings(&mut session, title, subtitle, theme)?,
        Command::Shell => shell(&mut session, config)?,
        Command::Template => {}
    }
    Ok(())
}

fn fill(
    session: &mut Session,
    config: &CoreConfig,
    mode: &str,
    index: usize,
    seed: Option<String>,
) -> Result<(), CliError> {
    let mode = FillMode::parse(mode)
        .ok_or_else(|| CliError::usage(format!("unknown fill mode `{mode}`")))?;
    let target = match seed {
        Some(seed) => FillTarget::with_seed(index, seed),
        None => FillTarget::new(index),
    };
    let client = config.ai_client()?;
    let filled = match session.run_ai_fill(client.as_ref(), mode, target)? {
        AiOutcome::Applied(outcome) => outcome.filled,
        AiOutcome::Discarded | AiOutcome::Advice(_) => 0,
    };
    info!("event=cli_fill module=cli status=ok mode={mode:?} index={index} filled={filled}");
    eprintln!("filled: {filled} cell(s)");
    Ok(())
}

fn settings(
    session: &mut Session,
    title: Option<String>,
    subtitle: Option<String>,
    theme: Option<String>,
) -> Result<(), CliError> {
    if title.is_some() || subtitle.is_some() {
        let current = session.settings().clone();
        session.set_titles(
            title.as_deref().unwrap_or(&current.title),
            subtitle.as_deref().unwrap_or(&current.subtitle),
        )?;
    }
    if let Some(theme) = theme {
        let theme = ColorTheme::parse(&theme)
            .ok_or_else(|| CliError::usage(format!("unknown color theme `{theme}`")))?;
        session.set_color_theme(theme)?;
    }

    let settings = session.settings();
    println!("title: {}", settings.title);
    println!("subtitle: {}", settings.subtitle);
    println!(
        "theme: {} ({})",
        settings.color_theme.id(),
        settings.color_theme.display_name()
    );
    Ok(())
}

fn shell(session: &mut Session, config: &CoreConfig) -> Result<(), CliError> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    println!("commands: show [format] | set <i> <text> | clear <i> | undo | redo | fill <mode> [i] | quit");

    loop {
        print!("mandala> ");
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }
        let line = line.trim();
        let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));

        let result = match verb {
            "" => Ok(()),
            "quit" | "exit" => return Ok(()),
            "show" => render(session, if rest.is_empty() { "grid" } else { rest })
                .map(|text| println!("{text}")),
            "set" => shell_set(session, rest),
            "clear" => parse_index(rest)
                .and_then(|index| session.clear_area(index).map_err(CliError::from))
                .map(|scope| println!("cleared: {scope:?}")),
            "undo" => session
                .undo()
                .map(|done| println!("{}", if done { "undone" } else { "nothing to undo" }))
                .map_err(CliError::from),
            "redo" => session
                .redo()
                .map(|done| println!("{}", if done { "redone" } else { "nothing to redo" }))
                .map_err(CliError::from),
            "fill" => {
                let mut parts = rest.split_whitespace();
                let mode = parts.next().unwrap_or_default();
                parts
                    .next()
                    .map(parse_index)
                    .unwrap_or(Ok(40))
                    .and_then(|index| fill(session, config, mode, index, None))
            }
            other => Err(CliError::usage(format!("unknown command `{other}`"))),
        };
        if let Err(err) = result {
            eprintln!("error: {}", err.message);
        }
    }
}

fn shell_set(session: &mut Session, rest: &str) -> Result<(), CliError> {
    let (index, value) = rest.split_once(' ').unwrap_or((rest, ""));
    let index = parse_index(index)?;
    session.set_cell(index, value.trim())?;
    Ok(())
}

fn parse_index(value: &str) -> Result<usize, CliError> {
    value
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|index| *index < CELL_COUNT)
        .ok_or_else(|| CliError::usage(format!("cell index must be 0..={}", CELL_COUNT - 1)))
}

fn parse_flavor(value: &str) -> Result<ExportFlavor, CliError> {
    ExportFlavor::parse(value).ok_or_else(|| CliError::usage(format!("unknown format `{value}`")))
}

fn render(session: &Session, format: &str) -> Result<String, CliError> {
    if format.trim().eq_ignore_ascii_case("grid") {
        return Ok(render_grid(session));
    }
    Ok(session.export(parse_flavor(format)?))
}

fn render_grid(session: &Session) -> String {
    let settings = session.settings();
    let mut out = format!("{}\n{}\n", settings.title, settings.subtitle);
    for (row_index, row) in session.grid().rows().enumerate() {
        if row_index > 0 && row_index % 3 == 0 {
            out.push_str(&"-".repeat(9 * (GRID_CELL_CHARS + 1) + 4));
            out.push('\n');
        }
        for (col, cell) in row.iter().enumerate() {
            if col > 0 && col % 3 == 0 {
                out.push_str("| ");
            }
            let shown: String = if cell.is_empty() {
                ".".to_string()
            } else {
                cell.chars().take(GRID_CELL_CHARS).collect()
            };
            out.push_str(&format!("{shown:<width$} ", width = GRID_CELL_CHARS));
        }
        out.push('\n');
    }
    out
}

fn read_input(input: &Path) -> Result<String, CliError> {
    if input.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    std::fs::read_to_string(input).map_err(|err| CliError {
        code: EXIT_ERROR,
        message: format!("cannot read {}: {err}", input.display()),
    })
}
