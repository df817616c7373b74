use std::collections::HashSet;

use indexmap::IndexMap;

use crate::model::column::Column;
use crate::model::task::{Task, TaskId, TaskStatus};

/// Error type for board transitions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("no task at position {index} in {column} ({len} tasks)")]
    IndexOutOfRange {
        column: Column,
        index: usize,
        len: usize,
    },
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    #[error("task {0} is not in any board column")]
    NotOnBoard(TaskId),
    #[error("task {0} already has an update in flight")]
    InFlight(TaskId),
}

/// Tasks grouped by visible column, in board order
pub type Columns<'a> = IndexMap<Column, Vec<&'a Task>>;

/// A position inside a column's filtered view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragLocation {
    pub column: Column,
    pub index: usize,
}

impl DragLocation {
    pub fn new(column: Column, index: usize) -> Self {
        DragLocation { column, index }
    }
}

/// The end of a drag gesture. `destination` is `None` when the gesture was
/// cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragResult {
    pub source: DragLocation,
    pub destination: Option<DragLocation>,
}

/// Result of a cross-column move, before anything is sent to the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Moved {
    pub tasks: Vec<Task>,
    pub task_id: TaskId,
    pub status: TaskStatus,
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Whether a task is shown in `column` under the given search term
fn visible_in(task: &Task, column: Column, search: &str) -> bool {
    task.status == Some(column.status()) && task.title_matches(search)
}

/// Indices into `tasks` of the tasks shown in `column`, in board order
fn column_slots(tasks: &[Task], column: Column, search: &str) -> Vec<usize> {
    tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| visible_in(t, column, search))
        .map(|(i, _)| i)
        .collect()
}

/// Partition tasks into the three visible columns, filtered by `search`.
/// Every column is present in the result, even when empty.
pub fn partition<'a>(tasks: &'a [Task], search: &str) -> Columns<'a> {
    let mut columns: Columns<'a> = Column::ALL.iter().map(|c| (*c, Vec::new())).collect();
    for task in tasks.iter().filter(|t| t.title_matches(search)) {
        if let Some(column) = task.status.and_then(Column::for_status)
            && let Some(items) = columns.get_mut(&column)
        {
            items.push(task);
        }
    }
    columns
}

/// The tasks of a single column, filtered by `search`
pub fn column_tasks<'a>(tasks: &'a [Task], column: Column, search: &str) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| visible_in(t, column, search))
        .collect()
}

/// Where a task currently sits on the board, if it is visible
pub fn locate(tasks: &[Task], search: &str, id: TaskId) -> Option<DragLocation> {
    let task = tasks.iter().find(|t| t.id == id)?;
    let column = task.status.and_then(Column::for_status)?;
    let index = column_tasks(tasks, column, search)
        .iter()
        .position(|t| t.id == id)?;
    Some(DragLocation::new(column, index))
}

/// First id that occurs more than once, if any
pub fn find_duplicate_id(tasks: &[Task]) -> Option<TaskId> {
    let mut seen = HashSet::new();
    tasks.iter().map(|t| t.id).find(|id| !seen.insert(*id))
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Move the task at `source_index` of `column` to `dest_index` of the same
/// column. Only the relative order of that column's visible tasks changes:
/// they are permuted among the slots they already occupy, so every other
/// task (other columns, tasks hidden by the search) keeps its position.
/// A `dest_index` past the end appends.
pub fn reorder_within_column(
    tasks: &[Task],
    column: Column,
    search: &str,
    source_index: usize,
    dest_index: usize,
) -> Result<Vec<Task>, BoardError> {
    let slots = column_slots(tasks, column, search);
    if source_index >= slots.len() {
        return Err(BoardError::IndexOutOfRange {
            column,
            index: source_index,
            len: slots.len(),
        });
    }

    let mut order = slots.clone();
    let moved = order.remove(source_index);
    order.insert(dest_index.min(order.len()), moved);

    let mut result = tasks.to_vec();
    for (slot, from) in slots.iter().zip(&order) {
        result[*slot] = tasks[*from].clone();
    }
    Ok(result)
}

/// Take the task at `source_index` of `source`, give it the status of
/// `dest`, and place it at `dest_index` of the destination view. The task is
/// inserted just before the task currently at `dest_index`; past the end it
/// goes right after the last destination task, and into an empty column it
/// keeps its current position. No other task changes.
pub fn move_across_columns(
    tasks: &[Task],
    source: Column,
    dest: Column,
    search: &str,
    source_index: usize,
    dest_index: usize,
) -> Result<Moved, BoardError> {
    let src_slots = column_slots(tasks, source, search);
    let from = *src_slots
        .get(source_index)
        .ok_or(BoardError::IndexOutOfRange {
            column: source,
            index: source_index,
            len: src_slots.len(),
        })?;
    let dest_slots: Vec<usize> = column_slots(tasks, dest, search)
        .into_iter()
        .filter(|slot| *slot != from)
        .collect();

    let target = match dest_slots.get(dest_index) {
        Some(slot) => *slot,
        None => dest_slots.last().map_or(from, |last| last + 1),
    };

    let mut result = tasks.to_vec();
    let mut task = result.remove(from);
    let status = dest.status();
    task.status = Some(status);
    let task_id = task.id;
    let insert_at = if target > from { target - 1 } else { target };
    result.insert(insert_at.min(result.len()), task);

    Ok(Moved {
        tasks: result,
        task_id,
        status,
    })
}
