use crossterm::event::{KeyCode, KeyEvent};

use crate::model::column::Column;
use crate::tui::app::{App, ConfirmState, FormState, Mode};

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.show_help = true,

        // Cursor
        KeyCode::Left | KeyCode::Char('h') => move_column(app, false),
        KeyCode::Right | KeyCode::Char('l') => move_column(app, true),
        KeyCode::Up | KeyCode::Char('k') => {
            app.cursor.index = app.cursor.index.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.cursor.index += 1;
            app.clamp_cursor();
        }

        // Selection
        KeyCode::Char(' ') => toggle_selection(app),
        KeyCode::Esc => app.board.selected = None,

        KeyCode::Char('m') => app.begin_drag(),
        KeyCode::Char('/') => app.mode = Mode::Search,
        KeyCode::Char('r') => app.request_load(),

        KeyCode::Char('n') => {
            app.form = Some(FormState::create());
            app.mode = Mode::Form;
        }
        KeyCode::Char('e') => {
            if let Some(task) = app.cursor_task() {
                app.form = Some(FormState::edit(task));
                app.mode = Mode::Form;
            }
        }
        KeyCode::Char('d') => {
            if let Some(task) = app.cursor_task() {
                app.confirm = Some(ConfirmState {
                    task_id: task.id,
                    title: task.title.clone(),
                });
                app.mode = Mode::Confirm;
            }
        }
        _ => {}
    }
}

/// Step the cursor to the neighbouring column, keeping the row when possible
fn move_column(app: &mut App, forward: bool) {
    let idx = app.cursor.column.index();
    let next = if forward {
        Column::from_index(idx + 1)
    } else {
        idx.checked_sub(1).and_then(Column::from_index)
    };
    if let Some(column) = next {
        app.cursor.column = column;
        app.clamp_cursor();
    }
}

fn toggle_selection(app: &mut App) {
    let Some(id) = app.cursor_task().map(|t| t.id) else {
        return;
    };
    app.board.selected = if app.board.selected == Some(id) {
        None
    } else {
        Some(id)
    };
}
