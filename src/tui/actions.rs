//! Board actions that talk to the server from the terminal board.
//!
//! Requests go through the background worker; replies are matched to what
//! started them by ticket and applied with the same completion steps the
//! blocking controller uses.

use crate::io::gateway::GatewayError;
use crate::io::worker::{GatewayReply, GatewayRequest, GatewayResponse};
use crate::model::board::NoticeLevel;
use crate::model::task::{Task, TaskId};
use crate::ops::board_ops::{self, BoardError};
use crate::ops::controller::{self, MoveOutcome, SubmitError, WriteKind};
use crate::ops::optimistic;

use super::app::{App, FormTarget, Mode, MoveState, PendingRequest};

impl App {
    /// Fetch the whole board. A load already on its way is enough.
    pub fn request_load(&mut self) {
        if self.load_outstanding() {
            return;
        }
        let ticket = self.worker.submit(GatewayRequest::List);
        self.pending.insert(ticket, PendingRequest::Load);
    }

    /// Fetch the board after the server accepted a change. A load already on
    /// its way may have been answered before the change, so it is replaced.
    fn request_fresh_load(&mut self) {
        if self.load_outstanding() {
            self.load_superseded = true;
            return;
        }
        self.request_load();
    }

    fn load_outstanding(&self) -> bool {
        self.pending
            .values()
            .any(|p| matches!(p, PendingRequest::Load))
    }

    /// Apply every reply that has arrived since the last tick
    pub fn drain_replies(&mut self) {
        for reply in self.worker.poll() {
            self.handle_reply(reply);
        }
    }

    pub(super) fn handle_reply(&mut self, reply: GatewayReply) {
        let Some(request) = self.pending.remove(&reply.ticket) else {
            tracing::warn!(ticket = reply.ticket, "reply for unknown request");
            return;
        };

        match request {
            PendingRequest::Load => self.finish_load(reply.response),
            PendingRequest::Move(pending) => {
                let task_id = pending.task_id;
                let outcome =
                    controller::finish_move(&mut self.board, pending, saved(reply.response));
                match outcome {
                    MoveOutcome::Committed { .. } => {
                        tracing::info!(task_id, "move committed");
                    }
                    MoveOutcome::RolledBack { resync, .. } => {
                        self.focus_task(task_id);
                        if resync {
                            self.request_fresh_load();
                        }
                    }
                }
            }
            PendingRequest::Write(kind) => self.finish_write(kind, reply.response),
        }

        if self.reload_deferred && self.board.in_flight.is_empty() {
            self.reload_deferred = false;
            self.request_load();
        }
        self.clamp_cursor();
    }

    fn finish_load(&mut self, response: GatewayResponse) {
        if std::mem::take(&mut self.load_superseded) {
            tracing::debug!("list reply superseded by a later change");
            self.request_load();
            return;
        }
        let result = match response {
            GatewayResponse::Listed(result) => result,
            other => Err(unexpected(&other)),
        };
        // The list may predate an outstanding status change; take a fresh
        // one once those settle
        if result.is_ok() && !self.board.in_flight.is_empty() {
            tracing::debug!("list reply dropped, status changes in flight");
            self.board.loading = false;
            self.reload_deferred = true;
            return;
        }
        let selected = self.cursor_task().map(|t| t.id);
        if controller::apply_load(&mut self.board, result).is_ok()
            && let Some(id) = selected
        {
            self.focus_task(id);
        }
    }

    fn finish_write(&mut self, kind: WriteKind, response: GatewayResponse) {
        let result = match (kind, response) {
            (WriteKind::Delete(_), GatewayResponse::Deleted(result)) => result,
            (WriteKind::Create | WriteKind::Edit { .. }, GatewayResponse::Saved(result)) => {
                result.map(|_| ())
            }
            (_, other) => Err(unexpected(&other)),
        };
        let ok = controller::finish_write(&mut self.board, kind, result).is_ok();

        if let Some(form) = &mut self.form
            && form.submitting
            && !matches!(kind, WriteKind::Delete(_))
        {
            if ok {
                self.form = None;
                if self.mode == Mode::Form {
                    self.mode = Mode::Navigate;
                }
            } else {
                form.submitting = false;
            }
        }
        if ok {
            self.request_fresh_load();
        }
    }

    // -----------------------------------------------------------------------
    // Drag and drop
    // -----------------------------------------------------------------------

    /// Pick up the card under the cursor
    pub fn begin_drag(&mut self) {
        let Some(task) = self.cursor_task() else {
            return;
        };
        let task_id = task.id;
        if self.board.in_flight.contains(&task_id) {
            self.board.push_notice(
                NoticeLevel::Error,
                BoardError::InFlight(task_id).to_string(),
            );
            return;
        }
        self.move_state = Some(MoveState {
            task_id,
            source: self.cursor,
            target: self.cursor,
        });
        self.mode = Mode::Move;
    }

    /// Drop without a destination: nothing changes
    pub fn cancel_drag(&mut self) {
        if let Some(ms) = self.move_state.take() {
            self.cursor = ms.source;
        }
        self.mode = Mode::Navigate;
    }

    /// Drop the picked-up card at its target
    pub fn drop_card(&mut self) {
        let Some(ms) = self.move_state.take() else {
            self.mode = Mode::Navigate;
            return;
        };
        self.mode = Mode::Navigate;
        self.board.selected = None;

        if ms.source == ms.target {
            self.cursor = ms.source;
            return;
        }

        if ms.source.column == ms.target.column {
            match board_ops::reorder_within_column(
                &self.board.tasks,
                ms.source.column,
                &self.board.search,
                ms.source.index,
                ms.target.index,
            ) {
                Ok(tasks) => self.board.replace_tasks(tasks),
                Err(e) => self.board.push_notice(NoticeLevel::Error, e.to_string()),
            }
            self.focus_task(ms.task_id);
            return;
        }

        match optimistic::begin_move(
            &mut self.board,
            ms.source.column,
            ms.target.column,
            ms.source.index,
            ms.target.index,
        ) {
            Ok(pending) => {
                let ticket = self
                    .worker
                    .submit(GatewayRequest::Update(pending.task_id, pending.payload()));
                self.pending.insert(ticket, PendingRequest::Move(pending));
            }
            Err(e) => self.board.push_notice(NoticeLevel::Error, e.to_string()),
        }
        self.focus_task(ms.task_id);
    }

    // -----------------------------------------------------------------------
    // Forms
    // -----------------------------------------------------------------------

    /// Validate the open form and send it. Ignored while a submission is
    /// outstanding.
    pub fn submit_form(&mut self) {
        let Some(state) = &mut self.form else {
            return;
        };
        if state.submitting {
            return;
        }

        let request = match state.target {
            FormTarget::Create => match state.form.validate() {
                Ok(payload) => (GatewayRequest::Create(payload), WriteKind::Create),
                Err(errors) => {
                    state.errors = Some(errors);
                    return;
                }
            },
            FormTarget::Edit(id) => match controller::prepare_edit(&mut self.board, id, &state.form)
            {
                Ok((payload, claimed)) => (
                    GatewayRequest::Update(id, payload),
                    WriteKind::Edit { id, claimed },
                ),
                Err(SubmitError::Invalid(errors)) => {
                    state.errors = Some(errors);
                    return;
                }
                Err(e) => {
                    self.board.push_notice(NoticeLevel::Error, e.to_string());
                    return;
                }
            },
        };

        state.errors = None;
        state.submitting = true;
        let (request, kind) = request;
        let ticket = self.worker.submit(request);
        self.pending.insert(ticket, PendingRequest::Write(kind));
    }

    /// Send the delete the user just confirmed
    pub fn delete_task(&mut self, id: TaskId) {
        let ticket = self.worker.submit(GatewayRequest::Delete(id));
        self.pending
            .insert(ticket, PendingRequest::Write(WriteKind::Delete(id)));
    }
}

fn saved(response: GatewayResponse) -> Result<Option<Task>, GatewayError> {
    match response {
        GatewayResponse::Saved(result) => result,
        other => Err(unexpected(&other)),
    }
}

fn unexpected(response: &GatewayResponse) -> GatewayError {
    tracing::warn!(?response, "reply does not match its request");
    GatewayError::Malformed("reply does not match its request".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::column::Column;
    use crate::model::task::TaskStatus;
    use crate::ops::board_ops::DragLocation;
    use crate::ops::validate::FormField;
    use crate::tui::app::FormState;
    use crate::tui::render::test_helpers::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_drop_across_columns_is_optimistic_then_committed() {
        let (mut app, gateway) = loaded_app(vec![
            task(1, "First", TaskStatus::Pending),
            task(2, "Second", TaskStatus::Pending),
        ]);

        app.begin_drag();
        app.move_state.as_mut().unwrap().target = DragLocation::new(Column::InProgress, 0);
        app.drop_card();

        // Applied before the server answered
        assert_eq!(app.board.tasks[0].status, Some(TaskStatus::InProgress));
        assert!(app.board.in_flight.contains(&1));
        assert_eq!(app.cursor, DragLocation::new(Column::InProgress, 0));

        settle(&mut app);
        assert!(app.board.in_flight.is_empty());
        assert_eq!(app.board.tasks[0].status, Some(TaskStatus::InProgress));
        assert_eq!(gateway.update_calls(), vec![(1, Some(TaskStatus::InProgress))]);
    }

    #[test]
    fn test_failed_drop_rolls_back() {
        let (mut app, gateway) = loaded_app(vec![
            task(1, "First", TaskStatus::Pending),
            task(2, "Second", TaskStatus::Pending),
        ]);
        let before = app.board.tasks.clone();
        gateway.fail_updates("server exploded");

        app.begin_drag();
        app.move_state.as_mut().unwrap().target = DragLocation::new(Column::Completed, 0);
        app.drop_card();
        settle(&mut app);

        assert_eq!(app.board.tasks, before);
        assert!(app.board.in_flight.is_empty());
        assert_eq!(
            app.board.latest_notice().map(|n| n.message.as_str()),
            Some("server exploded")
        );
    }

    #[test]
    fn test_second_drag_of_same_task_is_rejected_while_in_flight() {
        let (mut app, gateway) = loaded_app(vec![task(1, "First", TaskStatus::Pending)]);
        gateway.hold_updates();

        app.begin_drag();
        app.move_state.as_mut().unwrap().target = DragLocation::new(Column::InProgress, 0);
        app.drop_card();

        app.begin_drag();
        assert_eq!(app.mode, Mode::Navigate);
        assert_eq!(
            app.board.latest_notice().map(|n| n.message.as_str()),
            Some("task 1 already has an update in flight")
        );

        gateway.release_updates();
        settle(&mut app);
        assert_eq!(gateway.update_calls().len(), 1);
    }

    #[test]
    fn test_cancel_drag_changes_nothing() {
        let (mut app, gateway) = loaded_app(vec![task(1, "First", TaskStatus::Pending)]);
        let before = app.board.tasks.clone();

        app.begin_drag();
        app.move_state.as_mut().unwrap().target = DragLocation::new(Column::Completed, 0);
        app.cancel_drag();

        assert_eq!(app.board.tasks, before);
        assert_eq!(app.mode, Mode::Navigate);
        assert_eq!(app.pending_count(), 0);
        assert!(gateway.update_calls().is_empty());
    }

    #[test]
    fn test_reorder_is_local_only() {
        let (mut app, gateway) = loaded_app(vec![
            task(1, "First", TaskStatus::Pending),
            task(2, "Second", TaskStatus::Pending),
        ]);

        app.begin_drag();
        app.move_state.as_mut().unwrap().target = DragLocation::new(Column::Pending, 1);
        app.drop_card();

        let ids: Vec<_> = app.board.tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(app.cursor, DragLocation::new(Column::Pending, 1));
        assert_eq!(app.pending_count(), 0);
        assert!(gateway.update_calls().is_empty());
    }

    #[test]
    fn test_invalid_form_sends_nothing() {
        let (mut app, gateway) = loaded_app(vec![]);
        let mut state = FormState::create();
        state.form.title = "x".into();
        state.form.details = "Long enough".into();
        state.form.author = "Joe".into();
        app.form = Some(state);
        app.mode = Mode::Form;

        app.submit_form();

        let form = app.form.as_ref().unwrap();
        let errors = form.errors.as_ref().unwrap();
        assert!(errors.message_for(FormField::Title).is_some());
        assert!(errors.message_for(FormField::Author).is_some());
        assert!(!form.submitting);
        assert_eq!(app.pending_count(), 0);
        assert_eq!(gateway.create_count(), 0);
    }

    #[test]
    fn test_create_closes_form_and_reloads() {
        let (mut app, gateway) = loaded_app(vec![]);
        let mut state = FormState::create();
        state.form.title = "Write docs".into();
        state.form.details = "For the API".into();
        state.form.author = "Maria".into();
        app.form = Some(state);
        app.mode = Mode::Form;

        app.submit_form();
        assert!(app.form.as_ref().unwrap().submitting);
        // A second submit while the first is outstanding is ignored
        app.submit_form();

        settle(&mut app);
        assert!(app.form.is_none());
        assert_eq!(app.mode, Mode::Navigate);
        assert_eq!(gateway.create_count(), 1);
        assert_eq!(app.board.tasks.len(), 1);
        assert_eq!(
            app.board.latest_notice().map(|n| n.message.as_str()),
            Some("Task created")
        );
    }

    fn next_reply(app: &App) -> GatewayReply {
        app.worker
            .wait(std::time::Duration::from_secs(5))
            .expect("gateway reply timed out")
    }

    #[test]
    fn test_create_replaces_list_sent_before_it() {
        let (mut app, gateway) = loaded_app(vec![]);
        gateway.hold_lists();
        app.request_load();
        // The server has answered this list with an empty board
        gateway.wait_for_lists(2);

        let mut state = FormState::create();
        state.form.title = "Write docs".into();
        state.form.details = "For the API".into();
        state.form.author = "Maria".into();
        app.form = Some(state);
        app.mode = Mode::Form;
        app.submit_form();

        // Only the create can answer while lists are held
        let reply = next_reply(&app);
        app.handle_reply(reply);
        assert_eq!(gateway.create_count(), 1);

        gateway.release_lists();
        settle(&mut app);

        assert_eq!(gateway.list_count(), 3);
        assert_eq!(app.board.tasks.len(), 1);
        assert_eq!(app.board.tasks[0].title, "Write docs");
    }

    #[test]
    fn test_list_during_move_is_dropped_then_reissued() {
        let (mut app, gateway) = loaded_app(vec![
            task(1, "First", TaskStatus::Pending),
            task(2, "Second", TaskStatus::Pending),
        ]);
        gateway.hold_updates();

        app.begin_drag();
        app.move_state.as_mut().unwrap().target = DragLocation::new(Column::Completed, 0);
        app.drop_card();
        app.request_load();

        // The update is held, so this is the list
        let reply = next_reply(&app);
        app.handle_reply(reply);
        assert!(app.reload_deferred);
        assert_eq!(gateway.list_count(), 2);
        assert_eq!(app.pending_count(), 1);
        assert_eq!(app.board.tasks[0].status, Some(TaskStatus::Completed));

        gateway.release_updates();
        settle(&mut app);

        assert!(!app.reload_deferred);
        assert!(app.board.in_flight.is_empty());
        assert_eq!(gateway.list_count(), 3);
        assert_eq!(app.board.tasks[0].status, Some(TaskStatus::Completed));
    }

    #[test]
    fn test_rollback_after_later_reorder_reloads() {
        let (mut app, gateway) = loaded_app(vec![
            task(1, "First", TaskStatus::Pending),
            task(2, "Second", TaskStatus::Pending),
            task(3, "Third", TaskStatus::Pending),
        ]);
        gateway.hold_updates();

        app.begin_drag();
        app.move_state.as_mut().unwrap().target = DragLocation::new(Column::InProgress, 0);
        app.drop_card();

        // Reorder the rest of Pending while the move is outstanding
        app.cursor = DragLocation::new(Column::Pending, 0);
        app.begin_drag();
        app.move_state.as_mut().unwrap().target = DragLocation::new(Column::Pending, 1);
        app.drop_card();
        let ids: Vec<_> = app.board.tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);

        gateway.fail_updates("server exploded");
        gateway.release_updates();
        settle(&mut app);

        assert_eq!(gateway.list_count(), 2);
        let ids: Vec<_> = app.board.tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(
            app.board
                .tasks
                .iter()
                .all(|t| t.status == Some(TaskStatus::Pending))
        );
    }

    #[test]
    fn test_failed_delete_keeps_tasks() {
        let (mut app, gateway) = loaded_app(vec![task(1, "First", TaskStatus::Pending)]);
        gateway.fail_deletes();

        app.delete_task(1);
        settle(&mut app);

        assert_eq!(app.board.tasks.len(), 1);
        assert_eq!(
            app.board.latest_notice().map(|n| n.message.as_str()),
            Some("failed to delete task")
        );
    }
}
