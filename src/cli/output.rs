use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::model::column::Column;
use crate::model::task::{Task, TaskId, TaskStatus};
use crate::ops::board_ops::Columns;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: TaskId,
    pub title: String,
    pub details: String,
    pub author: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

#[derive(Serialize)]
pub struct ColumnJson {
    pub column: Column,
    pub label: &'static str,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct BoardJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    pub columns: Vec<ColumnJson>,
}

#[derive(Serialize)]
pub struct MoveJson {
    pub id: TaskId,
    pub status: TaskStatus,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json(task: &Task) -> TaskJson {
    TaskJson {
        id: task.id,
        title: task.title.clone(),
        details: task.details.clone(),
        author: task.author.clone(),
        created_at: task.created_at.to_rfc3339(),
        status: task.status,
    }
}

pub fn board_to_json(columns: &Columns<'_>, search: &str) -> BoardJson {
    BoardJson {
        search: (!search.is_empty()).then(|| search.to_string()),
        columns: columns
            .iter()
            .map(|(column, tasks)| ColumnJson {
                column: *column,
                label: column.label(),
                tasks: tasks.iter().map(|t| task_to_json(t)).collect(),
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// `dd/mm/yyyy HH:MM` in local time
pub fn format_created(created_at: &DateTime<Utc>) -> String {
    created_at
        .with_timezone(&Local)
        .format("%d/%m/%Y %H:%M")
        .to_string()
}

/// Format a single task as a one-line summary
pub fn format_task_line(task: &Task) -> String {
    format!(
        "#{} {}  ({}, {})",
        task.id,
        task.title,
        task.author,
        format_created(&task.created_at)
    )
}

/// Format detailed task view
pub fn format_task_detail(task: &Task) -> Vec<String> {
    let mut lines = vec![
        format!("#{} {}", task.id, task.title),
        format!(
            "status:  {}",
            task.status.map_or("(none)", TaskStatus::as_str)
        ),
        format!("author:  {}", task.author),
        format!("created: {}", format_created(&task.created_at)),
    ];
    if !task.details.is_empty() {
        lines.push(String::new());
        lines.extend(task.details.lines().map(str::to_string));
    }
    lines
}

/// Format the whole board, one block per column
pub fn format_board(columns: &Columns<'_>) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, (column, tasks)) in columns.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.push(format!("== {} ({}) ==", column.label(), tasks.len()));
        if tasks.is_empty() {
            lines.push("  (empty)".to_string());
        }
        for task in tasks {
            lines.push(format!("  {}", format_task_line(task)));
        }
    }
    lines
}
