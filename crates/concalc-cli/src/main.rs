use anyhow::Result;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STD;
use concalc_config::Config;
use concalc_engine::{
    Action, Clipboard, FileStore, IoError, LineEvaluator, MemoryStore, Motion, Outcome,
    PLACEHOLDER, SEPARATOR, Session, SessionOptions, Store, TickEvent, WorkerFactory,
    byte_to_point_in_text, io, write_clipboard,
};
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent,
        KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::{
    env,
    fs::OpenOptions,
    io::{Stdout, Write, stdout},
    ops::Range,
    path::PathBuf,
    process,
    time::{Duration, Instant},
};

const TICK: Duration = Duration::from_millis(50);
const STATUS_TTL: Duration = Duration::from_secs(3);

/// Writes to the terminal's clipboard with an OSC 52 escape sequence.
struct OscClipboard;

impl Clipboard for OscClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), IoError> {
        // ESC ] 52 ; c ; <base64> BEL
        let seq = format!("\x1b]52;c;{}\x07", BASE64_STD.encode(text.as_bytes()));
        let mut out = stdout();
        out.write_all(seq.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}

/// Keys the session does not see directly.
#[derive(Debug, Clone, PartialEq, Eq)]
enum KeyAction {
    Session(Action),
    SelectAll,
    PageUp,
    PageDown,
    Quit,
}

fn key_action(key: KeyEvent) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);

    let action = match key.code {
        KeyCode::Char(c) if ctrl => match c.to_ascii_lowercase() {
            'z' if shift => Action::Redo,
            'z' => Action::Undo,
            'y' => Action::Redo,
            's' => Action::Save,
            'h' => Action::Help,
            'c' => Action::CopyLineResult,
            'x' => Action::Clear,
            'd' => Action::DuplicateLine,
            'k' => Action::DeleteLine,
            'a' => return Some(KeyAction::SelectAll),
            'q' => return Some(KeyAction::Quit),
            _ => return None,
        },
        KeyCode::Char(_) if alt => return None,
        KeyCode::Char(c) => Action::Insert(c.to_string()),
        KeyCode::Enter if ctrl || alt => Action::InsertLineBefore,
        KeyCode::Enter => Action::SplitLine,
        KeyCode::F(1) => Action::Help,
        KeyCode::Backspace => Action::Backspace,
        KeyCode::Delete => Action::Delete,
        KeyCode::Left => Action::Move(Motion::Left),
        KeyCode::Right => Action::Move(Motion::Right),
        KeyCode::Up => Action::Move(Motion::Up),
        KeyCode::Down => Action::Move(Motion::Down),
        KeyCode::Home if ctrl => Action::Move(Motion::DocumentStart),
        KeyCode::End if ctrl => Action::Move(Motion::DocumentEnd),
        KeyCode::Home => Action::Move(Motion::LineStart),
        KeyCode::End => Action::Move(Motion::LineEnd),
        KeyCode::PageUp => return Some(KeyAction::PageUp),
        KeyCode::PageDown => return Some(KeyAction::PageDown),
        KeyCode::Esc => return Some(KeyAction::Quit),
        _ => return None,
    };
    Some(KeyAction::Session(action))
}

struct App {
    session: Session<WorkerFactory, Box<dyn Store>>,
    clipboard: OscClipboard,
    /// File name being typed for a save, if the prompt is open
    prompt: Option<String>,
    export_name: String,
    status: Option<(String, Instant)>,
    quit: bool,
}

impl App {
    fn new(config: &Config, file: Option<PathBuf>) -> Result<Self> {
        let factory = WorkerFactory::new(LineEvaluator::new(config.precision));
        let options = SessionOptions {
            calculation_timeout: config.calculation_timeout(),
            history_debounce: config.history_debounce(),
            history_limit: config.history_limit,
        };
        let now = Instant::now();

        let (session, export_name) = match file {
            Some(path) => {
                let text = if path.exists() {
                    io::read_file(&path)?
                } else {
                    String::new()
                };
                // A file-backed buffer is only written out by an explicit save
                let store: Box<dyn Store> = Box::new(MemoryStore::default());
                let session = Session::with_text(&text, store, factory, options, now)?;
                (session, path.display().to_string())
            }
            None => {
                let store: Box<dyn Store> = Box::new(FileStore::new(&config.state_dir));
                (
                    Session::open(store, factory, options, now)?,
                    config.export_name.clone(),
                )
            }
        };

        Ok(Self {
            session,
            clipboard: OscClipboard,
            prompt: None,
            export_name,
            status: None,
            quit: false,
        })
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some((message.into(), Instant::now()));
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.prompt.is_some() {
            self.handle_prompt_key(key);
            return;
        }

        let Some(action) = key_action(key) else {
            return;
        };
        match action {
            KeyAction::Quit => self.quit = true,
            KeyAction::SelectAll => {
                let len = self.session.document().len();
                self.dispatch(Action::SetSelection(0..len));
            }
            KeyAction::PageUp => {
                let page = self.session.viewport().height.saturating_sub(1);
                self.dispatch(Action::Move(Motion::PageUp(page)));
            }
            KeyAction::PageDown => {
                let page = self.session.viewport().height.saturating_sub(1);
                self.dispatch(Action::Move(Motion::PageDown(page)));
            }
            KeyAction::Session(action) => self.dispatch(action),
        }
    }

    fn dispatch(&mut self, action: Action) {
        let fallback = action.clone();
        match self.session.dispatch(action, Instant::now()) {
            Outcome::Handled => {}
            Outcome::CopyRequested(result) => {
                if write_clipboard(&mut self.clipboard, &result) {
                    self.set_status(format!("Copied {result}"));
                }
            }
            Outcome::SaveRequested => self.prompt = Some(self.export_name.clone()),
            Outcome::Passthrough => self.passthrough(fallback),
        }
    }

    /// Ctrl+C and Ctrl+X on a selection copy and cut it
    fn passthrough(&mut self, action: Action) {
        let document = self.session.document();
        let selected = document.slice(document.selection()).into_owned();
        match action {
            Action::CopyLineResult => {
                if write_clipboard(&mut self.clipboard, &selected) {
                    self.set_status("Copied selection");
                }
            }
            Action::Clear => {
                if write_clipboard(&mut self.clipboard, &selected) {
                    self.set_status("Cut selection");
                }
                self.dispatch(Action::Delete);
            }
            _ => {}
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        let Some(input) = self.prompt.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.prompt = None,
            KeyCode::Enter => {
                let name = input.trim().to_string();
                self.prompt = None;
                let name = if name.is_empty() {
                    self.export_name.clone()
                } else {
                    name
                };
                let path = PathBuf::from(&name);
                if self.session.export(&path) {
                    self.set_status(format!("Saved to {}", path.display()));
                    self.export_name = name;
                } else {
                    self.set_status(format!("Could not save {}", path.display()));
                }
            }
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => input.push(c),
            _ => {}
        }
    }

    fn tick(&mut self) {
        if self.session.tick(Instant::now()) == TickEvent::TimedOut {
            self.set_status("Calculation timeout");
        }
        if let Some((_, shown)) = &self.status
            && shown.elapsed() > STATUS_TTL
        {
            self.status = None;
        }
    }
}

fn init_logging(config: &Config) {
    let file = std::fs::create_dir_all(&config.state_dir).and_then(|()| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(config.log_path())
    });
    match file {
        Ok(file) => {
            env_logger::Builder::from_default_env()
                .filter_level(log::LevelFilter::Info)
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
        }
        Err(e) => eprintln!(
            "Warning: logging disabled, cannot open {}: {e}",
            config.log_path().display()
        ),
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let file = match args.len() {
        1 => None,
        2 => Some(PathBuf::from(&args[1])),
        _ => {
            eprintln!("Usage: {} [FILE]", args[0]);
            process::exit(1);
        }
    };

    let config = match Config::load_or_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Fix or remove {}", Config::config_path().display());
            process::exit(1);
        }
    };

    init_logging(&config);
    log::info!("concalc starting up, state in {}", config.state_dir.display());

    let mut app = App::new(&config, file)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::warn!("concalc exited with an error: {err:?}");
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(TICK)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
                Event::Paste(text) => app.dispatch(Action::Paste(text)),
                _ => {}
            }
        }
        if app.quit {
            return Ok(());
        }
        app.tick();
    }
}

/// Visible lines, with the selection reversed and results dimmed
fn render_lines(text: &str, selection: Range<usize>, visible: Range<usize>) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (index, line) in text.split('\n').enumerate() {
        let end = start + line.len();
        if visible.contains(&index) {
            let sel_start = selection.start.clamp(start, end) - start;
            let sel_end = selection.end.clamp(start, end) - start;
            let rendered = if sel_start < sel_end {
                Line::from(vec![
                    Span::raw(line[..sel_start].to_string()),
                    Span::styled(
                        line[sel_start..sel_end].to_string(),
                        Style::default().add_modifier(Modifier::REVERSED),
                    ),
                    Span::raw(line[sel_end..].to_string()),
                ])
            } else if let Some((expression, result)) = line.split_once(SEPARATOR) {
                Line::from(vec![
                    Span::raw(expression.to_string()),
                    Span::styled(
                        format!("{SEPARATOR}{result}"),
                        Style::default().fg(Color::Green),
                    ),
                ])
            } else {
                Line::from(line.to_string())
            };
            lines.push(rendered);
        }
        start = end + 1;
    }
    lines
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)].as_ref())
        .split(f.area());

    let editor_block = Block::default().borders(Borders::ALL).title("concalc");
    let inner = editor_block.inner(chunks[0]);
    app.session.set_viewport_height(inner.height as usize);

    let text = app.session.text();
    let document = app.session.document();
    let viewport = app.session.viewport();
    let (caret_row, caret_byte_col) = byte_to_point_in_text(&text, document.caret());
    let caret_line = text.split('\n').nth(caret_row).unwrap_or_default();
    let caret_col = caret_line[..caret_byte_col.min(caret_line.len())].chars().count();
    let hscroll = caret_col.saturating_sub((inner.width as usize).saturating_sub(1));

    let editor = if text.is_empty() {
        Paragraph::new(PLACEHOLDER).style(Style::default().fg(Color::DarkGray))
    } else {
        let visible = viewport.visible(document.line_count());
        Paragraph::new(render_lines(&text, document.selection(), visible))
            .scroll((0, hscroll as u16))
    };
    f.render_widget(editor.block(editor_block), chunks[0]);

    // Status line: prompt, message or key hints
    let position = format!("Ln {}, Col {}", caret_row + 1, caret_col + 1);
    let status = match (&app.prompt, &app.status) {
        (Some(input), _) => format!("Save as: {input}"),
        (None, Some((message, _))) => message.clone(),
        (None, None) => "Ctrl+H help | Ctrl+S save | Ctrl+Q quit".to_string(),
    };
    let status_line = Line::from(vec![
        Span::styled(status.clone(), Style::default().fg(Color::Yellow)),
        Span::raw(" | "),
        Span::raw(position),
    ]);
    f.render_widget(Paragraph::new(vec![status_line]), chunks[1]);

    if app.prompt.is_some() {
        let x = chunks[1].x + status.chars().count() as u16;
        f.set_cursor_position((x, chunks[1].y));
    } else {
        let row = caret_row.saturating_sub(viewport.top) as u16;
        let col = (caret_col - hscroll) as u16;
        f.set_cursor_position((inner.x + col, inner.y + row));
    }
}
