use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

use crate::io::gateway::{GatewayError, TaskGateway};
use crate::model::config::UiConfig;
use crate::model::task::{Task, TaskId, TaskPayload, TaskStatus};
use crate::tui::app::App;

pub const TERM_W: u16 = 100;
pub const TERM_H: u16 = 30;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// A task created at a fixed instant
pub fn task(id: TaskId, title: &str, status: TaskStatus) -> Task {
    Task {
        id,
        title: title.into(),
        details: format!("Details for {title}"),
        author: "Fernanda".into(),
        created_at: Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap(),
        status: Some(status),
    }
}

#[derive(Default)]
struct FakeState {
    tasks: Vec<Task>,
    updates: Vec<(TaskId, Option<TaskStatus>)>,
    creates: usize,
    fail_updates: Option<String>,
    fail_deletes: bool,
    hold_updates: bool,
    hold_lists: bool,
    lists: usize,
}

/// In-memory server. Writes change what the next `list` returns.
#[derive(Default)]
pub struct FakeGateway {
    state: Mutex<FakeState>,
    released: Condvar,
}

impl FakeGateway {
    pub fn new(tasks: Vec<Task>) -> Self {
        FakeGateway {
            state: Mutex::new(FakeState {
                tasks,
                ..Default::default()
            }),
            released: Condvar::new(),
        }
    }

    pub fn update_calls(&self) -> Vec<(TaskId, Option<TaskStatus>)> {
        self.state.lock().unwrap().updates.clone()
    }

    pub fn create_count(&self) -> usize {
        self.state.lock().unwrap().creates
    }

    pub fn fail_updates(&self, message: &str) {
        self.state.lock().unwrap().fail_updates = Some(message.to_string());
    }

    pub fn fail_deletes(&self) {
        self.state.lock().unwrap().fail_deletes = true;
    }

    /// Block updates until `release_updates`
    pub fn hold_updates(&self) {
        self.state.lock().unwrap().hold_updates = true;
    }

    pub fn release_updates(&self) {
        self.state.lock().unwrap().hold_updates = false;
        self.released.notify_all();
    }

    /// Answer lists with the tasks as they were when the request arrived,
    /// but only after `release_lists`
    pub fn hold_lists(&self) {
        self.state.lock().unwrap().hold_lists = true;
    }

    pub fn release_lists(&self) {
        self.state.lock().unwrap().hold_lists = false;
        self.released.notify_all();
    }

    pub fn list_count(&self) -> usize {
        self.state.lock().unwrap().lists
    }

    /// Block until `n` lists have reached the server
    pub fn wait_for_lists(&self, n: usize) {
        let mut state = self.state.lock().unwrap();
        while state.lists < n {
            state = self.released.wait(state).unwrap();
        }
    }
}

impl TaskGateway for FakeGateway {
    fn list(&self) -> Result<Vec<Task>, GatewayError> {
        let mut state = self.state.lock().unwrap();
        let tasks = state.tasks.clone();
        state.lists += 1;
        self.released.notify_all();
        while state.hold_lists {
            state = self.released.wait(state).unwrap();
        }
        Ok(tasks)
    }

    fn create(&self, payload: &TaskPayload) -> Result<Option<Task>, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.creates += 1;
        let id = state.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let mut created = task(id, payload.title.as_deref().unwrap_or_default(), TaskStatus::Pending);
        created.status = payload.status;
        state.tasks.push(created.clone());
        Ok(Some(created))
    }

    fn update(&self, id: TaskId, payload: &TaskPayload) -> Result<Option<Task>, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.updates.push((id, payload.status));
        while state.hold_updates {
            state = self.released.wait(state).unwrap();
        }
        if let Some(message) = state.fail_updates.clone() {
            return Err(GatewayError::Api {
                status: 500,
                message,
            });
        }
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| GatewayError::NotFound(String::new()))?;
        if let Some(status) = payload.status {
            task.status = Some(status);
        }
        Ok(Some(task.clone()))
    }

    fn delete(&self, id: TaskId) -> Result<(), GatewayError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_deletes {
            return Err(GatewayError::Api {
                status: 500,
                message: String::new(),
            });
        }
        state.tasks.retain(|t| t.id != id);
        Ok(())
    }
}

/// Apply replies until no request is outstanding
pub fn settle(app: &mut App) {
    while app.pending_count() > 0 {
        let reply = app
            .worker
            .wait(Duration::from_secs(5))
            .expect("gateway reply timed out");
        app.handle_reply(reply);
    }
}

/// An App whose first load has finished
pub fn loaded_app(tasks: Vec<Task>) -> (App, Arc<FakeGateway>) {
    let gateway = Arc::new(FakeGateway::new(tasks));
    let mut app = App::new(gateway.clone(), &UiConfig::default());
    app.request_load();
    settle(&mut app);
    (app, gateway)
}

/// An App that has not heard back from the server yet
pub fn loading_app() -> App {
    App::new(Arc::new(FakeGateway::default()), &UiConfig::default())
}
