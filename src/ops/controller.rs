use crate::io::gateway::{GatewayError, TaskGateway};
use crate::model::board::{Board, NoticeLevel};
use crate::model::column::Column;
use crate::model::task::{Task, TaskId, TaskPayload};
use crate::ops::board_ops::{self, BoardError, DragResult};
use crate::ops::optimistic::{self, PendingMove};
use crate::ops::validate::{TaskForm, ValidationErrors};

/// Error type for create/edit/delete submissions
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// How a cross-column move ended
#[derive(Debug)]
pub enum MoveOutcome {
    Committed {
        task_id: TaskId,
    },
    RolledBack {
        task_id: TaskId,
        error: GatewayError,
        /// Other changes were discarded by the restore; a reload is due
        resync: bool,
    },
}

/// How a drag gesture ended
#[derive(Debug)]
pub enum DragOutcome {
    /// Dropped outside any column
    Cancelled,
    /// Dropped where it started
    Unchanged,
    Reordered,
    Moved(MoveOutcome),
}

/// The write a finished request belonged to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Create,
    /// `claimed` is true when the edit changed status and holds the task's
    /// in-flight slot
    Edit { id: TaskId, claimed: bool },
    Delete(TaskId),
}

impl WriteKind {
    fn success_message(self) -> &'static str {
        match self {
            WriteKind::Create => "Task created",
            WriteKind::Edit { .. } => "Task updated",
            WriteKind::Delete(_) => "Task deleted",
        }
    }

    fn failure_message(self) -> &'static str {
        match self {
            WriteKind::Create => "failed to create task",
            WriteKind::Edit { .. } => "failed to update task",
            WriteKind::Delete(_) => "failed to delete task",
        }
    }
}

// ---------------------------------------------------------------------------
// Completion steps, shared by the blocking controller and the TUI's
// background requests
// ---------------------------------------------------------------------------

/// Apply the result of a list request. On failure the current tasks stay.
pub fn apply_load(
    board: &mut Board,
    result: Result<Vec<Task>, GatewayError>,
) -> Result<(), GatewayError> {
    board.loading = false;
    match result {
        Ok(tasks) => {
            tracing::debug!(count = tasks.len(), "board loaded");
            board.replace_tasks(tasks);
            if let Some(id) = board.selected
                && board.find_task(id).is_none()
            {
                board.selected = None;
            }
            Ok(())
        }
        Err(e) => {
            tracing::warn!(error = %e, "load failed, keeping previous tasks");
            board.push_notice(NoticeLevel::Error, e.user_message("failed to load tasks"));
            Err(e)
        }
    }
}

/// Apply the server's answer to an optimistic move
pub fn finish_move(
    board: &mut Board,
    pending: PendingMove,
    result: Result<Option<Task>, GatewayError>,
) -> MoveOutcome {
    let task_id = pending.task_id;
    match result {
        Ok(_) => {
            optimistic::commit_move(board, pending);
            MoveOutcome::Committed { task_id }
        }
        Err(error) => {
            let resync = optimistic::rollback_move(board, pending);
            board.push_notice(NoticeLevel::Error, error.user_message("failed to update status"));
            MoveOutcome::RolledBack {
                task_id,
                error,
                resync,
            }
        }
    }
}

/// Record the end of a create/edit/delete. Local tasks are never touched
/// here; on success the caller reloads.
pub fn finish_write(
    board: &mut Board,
    kind: WriteKind,
    result: Result<(), GatewayError>,
) -> Result<(), GatewayError> {
    if let WriteKind::Edit { id, claimed: true } = kind {
        optimistic::release(board, id);
    }
    match result {
        Ok(()) => {
            tracing::info!(?kind, "write succeeded");
            board.push_notice(NoticeLevel::Success, kind.success_message());
            Ok(())
        }
        Err(e) => {
            tracing::warn!(?kind, error = %e, "write failed");
            board.push_notice(NoticeLevel::Error, e.user_message(kind.failure_message()));
            Err(e)
        }
    }
}

/// Validate an edit and claim the task when the edit changes its status.
/// Returns the payload and whether a claim was taken.
pub fn prepare_edit(
    board: &mut Board,
    id: TaskId,
    form: &TaskForm,
) -> Result<(TaskPayload, bool), SubmitError> {
    let payload = form.validate()?;
    let current = board.find_task(id).ok_or(BoardError::TaskNotFound(id))?;
    let claimed = payload.status.is_some() && payload.status != current.status;
    if claimed {
        optimistic::claim(board, id)?;
    } else if board.in_flight.contains(&id) {
        return Err(BoardError::InFlight(id).into());
    }
    Ok((payload, claimed))
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Drives a `Board` against a gateway, one blocking request at a time
pub struct BoardController<G> {
    board: Board,
    gateway: G,
}

impl<G: TaskGateway> BoardController<G> {
    pub fn new(gateway: G) -> Self {
        BoardController {
            board: Board::new(),
            gateway,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn set_search(&mut self, term: &str) {
        self.board.search = term.to_string();
    }

    /// Fetch every task and replace local state. On failure the previous
    /// tasks are kept.
    pub fn load(&mut self) -> Result<(), GatewayError> {
        let result = self.gateway.list();
        apply_load(&mut self.board, result)
    }

    /// Reorder inside one column. Local only.
    pub fn reorder_within_column(
        &mut self,
        column: Column,
        source_index: usize,
        dest_index: usize,
    ) -> Result<(), BoardError> {
        let tasks = board_ops::reorder_within_column(
            &self.board.tasks,
            column,
            &self.board.search,
            source_index,
            dest_index,
        )?;
        self.board.replace_tasks(tasks);
        self.board.selected = None;
        Ok(())
    }

    /// Move to another column: apply locally, send the status, roll back on
    /// failure.
    pub fn move_across_columns(
        &mut self,
        source: Column,
        dest: Column,
        source_index: usize,
        dest_index: usize,
    ) -> Result<MoveOutcome, BoardError> {
        let pending =
            optimistic::begin_move(&mut self.board, source, dest, source_index, dest_index)?;
        let result = self.gateway.update(pending.task_id, &pending.payload());
        let outcome = finish_move(&mut self.board, pending, result);
        self.board.selected = None;
        if let MoveOutcome::RolledBack { resync: true, .. } = &outcome {
            self.reload_quietly();
        }
        Ok(outcome)
    }

    /// Handle the end of a drag gesture
    pub fn drag_end(&mut self, drag: DragResult) -> Result<DragOutcome, BoardError> {
        let Some(dest) = drag.destination else {
            return Ok(DragOutcome::Cancelled);
        };
        let source = drag.source;
        if source == dest {
            self.board.selected = None;
            return Ok(DragOutcome::Unchanged);
        }
        if source.column == dest.column {
            self.reorder_within_column(source.column, source.index, dest.index)?;
            return Ok(DragOutcome::Reordered);
        }
        let outcome =
            self.move_across_columns(source.column, dest.column, source.index, dest.index)?;
        Ok(DragOutcome::Moved(outcome))
    }

    pub fn select_task(&mut self, id: TaskId) -> Result<(), BoardError> {
        if self.board.find_task(id).is_none() {
            return Err(BoardError::TaskNotFound(id));
        }
        self.board.selected = Some(id);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.board.selected = None;
    }

    /// Validate and create a task, then reload
    pub fn create_task(&mut self, form: &TaskForm) -> Result<Option<Task>, SubmitError> {
        let payload = form.validate()?;
        let (result, created) = match self.gateway.create(&payload) {
            Ok(task) => (Ok(()), task),
            Err(e) => (Err(e), None),
        };
        finish_write(&mut self.board, WriteKind::Create, result)?;
        self.reload_quietly();
        Ok(created)
    }

    /// Validate and update a task, then reload
    pub fn edit_task(&mut self, id: TaskId, form: &TaskForm) -> Result<(), SubmitError> {
        let (payload, claimed) = prepare_edit(&mut self.board, id, form)?;
        let result = self.gateway.update(id, &payload).map(|_| ());
        finish_write(&mut self.board, WriteKind::Edit { id, claimed }, result)?;
        self.reload_quietly();
        Ok(())
    }

    /// Delete a task, then reload
    pub fn delete_task(&mut self, id: TaskId) -> Result<(), SubmitError> {
        let result = self.gateway.delete(id);
        finish_write(&mut self.board, WriteKind::Delete(id), result)?;
        self.reload_quietly();
        Ok(())
    }

    /// Reload after a write. A failed reload is already reported as a notice.
    fn reload_quietly(&mut self) {
        if self.load().is_err() {
            tracing::debug!("reload after write failed");
        }
    }
}
