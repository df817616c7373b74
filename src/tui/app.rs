use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::cli::handlers::connect_gateway;
use crate::io::config_io;
use crate::io::gateway::TaskGateway;
use crate::io::logging;
use crate::io::worker::{GatewayWorker, Ticket};
use crate::model::board::{Board, Notice};
use crate::model::column::Column;
use crate::model::config::UiConfig;
use crate::model::task::{Task, TaskId};
use crate::ops::board_ops::{self, DragLocation};
use crate::ops::controller::WriteKind;
use crate::ops::optimistic::PendingMove;
use crate::ops::validate::{FormField, TaskForm, ValidationErrors};

use super::input;
use super::render;
use super::theme::Theme;

/// How long a notice stays in the status row unless configured
const DEFAULT_NOTICE_SECS: u64 = 4;

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    Search,
    /// A card is picked up and follows the drop target
    Move,
    Form,
    Confirm,
}

/// A picked-up card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveState {
    pub task_id: TaskId,
    /// Where the card was picked up
    pub source: DragLocation,
    /// Where it would land on drop
    pub target: DragLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormTarget {
    Create,
    Edit(TaskId),
}

/// Create/edit popup state
#[derive(Debug, Clone)]
pub struct FormState {
    pub target: FormTarget,
    pub form: TaskForm,
    pub focus: FormField,
    /// Errors from the last submit attempt
    pub errors: Option<ValidationErrors>,
    /// A submission is outstanding; further submits are ignored
    pub submitting: bool,
}

impl FormState {
    pub fn create() -> Self {
        FormState {
            target: FormTarget::Create,
            form: TaskForm::blank(),
            focus: FormField::Title,
            errors: None,
            submitting: false,
        }
    }

    pub fn edit(task: &Task) -> Self {
        FormState {
            target: FormTarget::Edit(task.id),
            form: TaskForm::from_task(task),
            focus: FormField::Title,
            errors: None,
            submitting: false,
        }
    }
}

/// Pending delete confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmState {
    pub task_id: TaskId,
    pub title: String,
}

/// What an outstanding gateway request is for
#[derive(Debug)]
pub enum PendingRequest {
    Load,
    Move(PendingMove),
    Write(WriteKind),
}

/// Main application state
pub struct App {
    pub board: Board,
    pub mode: Mode,
    pub should_quit: bool,
    pub theme: Theme,
    /// Card under the cursor: column plus index into its filtered view
    pub cursor: DragLocation,
    pub move_state: Option<MoveState>,
    pub form: Option<FormState>,
    pub confirm: Option<ConfirmState>,
    /// Help overlay visible
    pub show_help: bool,
    pub notice_ttl: Duration,
    pub(super) worker: GatewayWorker,
    pub(super) pending: HashMap<Ticket, PendingRequest>,
    /// A list reply was dropped because moves were in flight; reload once
    /// they settle
    pub(super) reload_deferred: bool,
    /// The outstanding list was sent before a change the server accepted;
    /// its reply is replaced by a fresh one
    pub(super) load_superseded: bool,
}

impl App {
    pub fn new(gateway: Arc<dyn TaskGateway>, ui: &UiConfig) -> Self {
        App {
            board: Board::new(),
            mode: Mode::Navigate,
            should_quit: false,
            theme: Theme::from_config(ui),
            cursor: DragLocation::new(Column::Pending, 0),
            move_state: None,
            form: None,
            confirm: None,
            show_help: false,
            notice_ttl: Duration::from_secs(ui.notice_secs.unwrap_or(DEFAULT_NOTICE_SECS)),
            worker: GatewayWorker::new(gateway),
            pending: HashMap::new(),
            reload_deferred: false,
            load_superseded: false,
        }
    }

    /// Tasks of one column under the current search
    pub fn column_tasks(&self, column: Column) -> Vec<&Task> {
        board_ops::column_tasks(&self.board.tasks, column, &self.board.search)
    }

    /// The card under the cursor, if the cursor's column has any
    pub fn cursor_task(&self) -> Option<&Task> {
        self.column_tasks(self.cursor.column)
            .get(self.cursor.index)
            .copied()
    }

    /// Keep the cursor inside its column after the board changed
    pub fn clamp_cursor(&mut self) {
        let len = self.column_tasks(self.cursor.column).len();
        self.cursor.index = self.cursor.index.min(len.saturating_sub(1));
    }

    /// Put the cursor on a task, wherever it now sits
    pub fn focus_task(&mut self, id: TaskId) {
        if let Some(location) = board_ops::locate(&self.board.tasks, &self.board.search, id) {
            self.cursor = location;
        } else {
            self.clamp_cursor();
        }
    }

    /// Number of outstanding requests
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// The newest notice, if it is still fresh
    pub fn visible_notice(&self) -> Option<&Notice> {
        self.board
            .latest_notice()
            .filter(|n| n.at.elapsed() < self.notice_ttl)
    }
}

/// Run the TUI application
pub fn run(
    config_flag: Option<&Path>,
    api_url_flag: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = config_io::load_settings(config_flag, api_url_flag)?;
    logging::init_file(settings.config.log.file.as_deref())?;
    tracing::info!(base_url = %settings.base_url, "starting board");

    let gateway = connect_gateway(&settings)?;
    let mut app = App::new(gateway, &settings.config.ui);
    app.request_load();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        app.drain_replies();
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(250))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            input::handle_key(app, key);
        }

        if app.should_quit {
            break;
        }
    }
    if !app.pending.is_empty() {
        tracing::info!(outstanding = app.pending.len(), "quitting with requests in flight");
    }
    Ok(())
}
