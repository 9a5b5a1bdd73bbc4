mod app;
mod render;

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::EnvFilter;

use q_grid::config::{DEFAULT_DEPTH, DEFAULT_OUTPUT, DEFAULT_QUBITS, DEFAULT_ROTATION_STEP};
use q_grid::grid::Direction;
use q_grid::params::parse_angle;
use q_grid::{Editor, EditorConfig};

use app::{App, Focus};

/// Terminal editor for grid-based quantum circuits
#[derive(Parser)]
#[command(name = "q-grid")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of qubit wires
    #[arg(short, long, env = "Q_GRID_QUBITS", default_value_t = DEFAULT_QUBITS)]
    qubits: usize,

    /// Number of columns
    #[arg(short, long, env = "Q_GRID_DEPTH", default_value_t = DEFAULT_DEPTH)]
    depth: usize,

    /// Angle added per rotate keystroke (number or pi expression)
    #[arg(long, value_parser = parse_rotation_step, default_value_t = DEFAULT_ROTATION_STEP)]
    rotation_step: f64,

    /// File written on save
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Write logs to this file (the terminal is owned by the editor)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_rotation_step(s: &str) -> Result<f64, String> {
    parse_angle(s).ok_or_else(|| format!("'{s}' is not a number or pi expression"))
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let Some(path) = &cli.log_file else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config = EditorConfig {
        qubit_count: cli.qubits,
        depth: cli.depth,
        rotation_step: cli.rotation_step,
        output_path: cli.output,
    };
    let editor = Editor::new(&config).context("invalid editor configuration")?;
    info!(
        qubits = config.qubit_count,
        depth = config.depth,
        output = %config.output_path.display(),
        "editor started"
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(editor, config.output_path);
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result.context("terminal error")?;
    info!("editor closed");
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), io::Error> {
    loop {
        terminal.draw(|f| render::render(f, &*app))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let code = key.code;
        let mods = key.modifiers;

        // Global: Ctrl+C always quits
        if code == KeyCode::Char('c') && mods.contains(KeyModifiers::CONTROL) {
            return Ok(());
        }

        let quit = match app.focus {
            Focus::Circuit => handle_circuit_keys(app, code, mods),
            Focus::Qasm => handle_qasm_keys(app, code),
            Focus::InputAngle => {
                handle_angle_input_keys(app, code);
                false
            }
        };
        if quit {
            return Ok(());
        }
    }
}

// ── Focus::Circuit ─────────────────────────────────────────────────────────────

fn handle_circuit_keys(app: &mut App, code: KeyCode, mods: KeyModifiers) -> bool {
    if app.show_help {
        if matches!(code, KeyCode::Esc | KeyCode::Char('?')) {
            app.show_help = false;
        }
        return false;
    }

    if mods.contains(KeyModifiers::CONTROL) {
        match code {
            KeyCode::Char('s') => match app.save_circuit() {
                Ok(()) => {
                    let msg = format!("Saved {}", app.output_path.display());
                    app.set_status(msg);
                }
                Err(e) => app.set_status(format!("Save error: {e}")),
            },
            KeyCode::Char('r') => app.reset(),
            _ => {}
        }
        return false;
    }

    match code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Tab => app.toggle_qasm_focus(),
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Up if mods.contains(KeyModifiers::SHIFT) => app.move_control(Direction::Up),
        KeyCode::Down if mods.contains(KeyModifiers::SHIFT) => app.move_control(Direction::Down),
        KeyCode::Char('[') => app.move_control(Direction::Up),
        KeyCode::Char(']') => app.move_control(Direction::Down),
        KeyCode::Up => app.move_cursor(Direction::Up),
        KeyCode::Down => app.move_cursor(Direction::Down),
        KeyCode::Left => app.move_cursor(Direction::Left),
        KeyCode::Right => app.move_cursor(Direction::Right),
        KeyCode::Char('c') => app.toggle_control(),
        KeyCode::Char('C') => app.add_second_control(),
        KeyCode::Char('p') => app.toggle_swap(),
        KeyCode::Char('+') | KeyCode::Char('=') => app.rotate_selected(1.0),
        KeyCode::Char('-') => app.rotate_selected(-1.0),
        KeyCode::Char('r') => app.begin_angle_input(),
        KeyCode::Backspace | KeyCode::Delete => app.delete_selected(),
        KeyCode::Char(c) => {
            app.toggle_palette_gate(c);
        }
        _ => {}
    }
    false
}

// ── Focus::Qasm ────────────────────────────────────────────────────────────────

fn handle_qasm_keys(app: &mut App, code: KeyCode) -> bool {
    match code {
        KeyCode::Char('q') => return true,
        KeyCode::Tab | KeyCode::Esc => app.toggle_qasm_focus(),
        KeyCode::Up => app.scroll_qasm(false),
        KeyCode::Down => app.scroll_qasm(true),
        _ => {}
    }
    false
}

// ── Focus::InputAngle ──────────────────────────────────────────────────────────

fn handle_angle_input_keys(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => app.cancel_angle_input(),
        KeyCode::Backspace => {
            app.angle_input.pop();
        }
        KeyCode::Enter => app.submit_angle(),
        KeyCode::Char(c) => app.handle_char_input(c),
        _ => {}
    }
}
