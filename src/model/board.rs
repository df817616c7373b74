use std::time::Instant;

use indexmap::IndexSet;

use super::task::{Task, TaskId};

/// Severity of a user-visible notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A toast-style message for the user
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: Instant,
}

/// Local snapshot of the board: every task the server returned, plus the
/// purely local view state layered on top of it.
#[derive(Debug, Default)]
pub struct Board {
    /// All tasks, in board order
    pub tasks: Vec<Task>,
    /// Active title filter (case-insensitive substring)
    pub search: String,
    /// Highlighted task, if any
    pub selected: Option<TaskId>,
    /// True until the first load finishes (successfully or not)
    pub loading: bool,
    /// Last notice shown; a new one replaces it
    pub notice: Option<Notice>,
    /// Tasks with an outstanding status-changing request
    pub in_flight: IndexSet<TaskId>,
    /// Bumped on every replacement of `tasks`
    generation: u64,
}

impl Board {
    /// A board that has not loaded yet
    pub fn new() -> Self {
        Board {
            loading: true,
            ..Default::default()
        }
    }

    /// A board already holding `tasks` (no load pending)
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Board {
            tasks,
            ..Default::default()
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the whole collection in one assignment
    pub fn replace_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.generation += 1;
    }

    pub fn find_task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn push_notice(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notice = Some(Notice {
            level,
            message: message.into(),
            at: Instant::now(),
        });
    }

    /// The most recent notice
    pub fn latest_notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }
}
