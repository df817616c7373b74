use crate::model::board::Board;
use crate::model::column::Column;
use crate::model::task::{Task, TaskId, TaskPayload, TaskStatus};
use crate::ops::board_ops::{self, BoardError};

/// A status change already applied locally, waiting on the server.
/// Holds the full collection as it was before the change.
#[derive(Debug, Clone)]
pub struct PendingMove {
    pub task_id: TaskId,
    pub status: TaskStatus,
    snapshot: Vec<Task>,
    /// Board generation right after the optimistic apply
    generation: u64,
}

impl PendingMove {
    /// The update body: only the new status
    pub fn payload(&self) -> TaskPayload {
        TaskPayload::status_only(self.status)
    }

    pub fn snapshot(&self) -> &[Task] {
        &self.snapshot
    }
}

/// Mark a task as having a status-changing request outstanding
pub fn claim(board: &mut Board, id: TaskId) -> Result<(), BoardError> {
    if !board.in_flight.insert(id) {
        return Err(BoardError::InFlight(id));
    }
    Ok(())
}

pub fn release(board: &mut Board, id: TaskId) {
    board.in_flight.shift_remove(&id);
}

/// Apply a cross-column move locally and claim the task. Nothing changes if
/// the source index is invalid or the task already has a request in flight.
pub fn begin_move(
    board: &mut Board,
    source: Column,
    dest: Column,
    source_index: usize,
    dest_index: usize,
) -> Result<PendingMove, BoardError> {
    let moved = board_ops::move_across_columns(
        &board.tasks,
        source,
        dest,
        &board.search,
        source_index,
        dest_index,
    )?;
    claim(board, moved.task_id)?;

    let snapshot = std::mem::take(&mut board.tasks);
    board.replace_tasks(moved.tasks);
    tracing::info!(task = moved.task_id, status = %moved.status, "optimistic move applied");

    Ok(PendingMove {
        task_id: moved.task_id,
        status: moved.status,
        snapshot,
        generation: board.generation(),
    })
}

/// The server accepted the move; local state already reflects it.
pub fn commit_move(board: &mut Board, pending: PendingMove) {
    release(board, pending.task_id);
    tracing::debug!(task = pending.task_id, "move committed");
}

/// The server rejected the move: restore the pre-move snapshot in one
/// assignment. Returns true when other changes were applied after the move
/// (they are discarded by the restore and the caller should reload).
pub fn rollback_move(board: &mut Board, pending: PendingMove) -> bool {
    release(board, pending.task_id);
    let stale = board.generation() != pending.generation;
    board.replace_tasks(pending.snapshot);
    tracing::warn!(task = pending.task_id, stale, "move rolled back");
    stale
}
