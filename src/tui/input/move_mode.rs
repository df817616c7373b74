use crossterm::event::{KeyCode, KeyEvent};

use crate::model::column::Column;
use crate::tui::app::{App, MoveState};

pub(super) fn handle_move(app: &mut App, key: KeyEvent) {
    let Some(mut ms) = app.move_state else {
        app.cancel_drag();
        return;
    };

    match key.code {
        KeyCode::Enter => {
            app.drop_card();
            return;
        }
        KeyCode::Esc => {
            app.cancel_drag();
            return;
        }
        KeyCode::Left | KeyCode::Char('h') => {
            if let Some(column) = ms.target.column.index().checked_sub(1).and_then(Column::from_index)
            {
                ms.target.column = column;
            }
        }
        KeyCode::Right | KeyCode::Char('l') => {
            if let Some(column) = Column::from_index(ms.target.column.index() + 1) {
                ms.target.column = column;
            }
        }
        KeyCode::Up | KeyCode::Char('k') => {
            ms.target.index = ms.target.index.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            ms.target.index += 1;
        }
        _ => return,
    }

    ms.target.index = ms.target.index.min(last_drop_index(app, &ms));
    app.move_state = Some(ms);
}

/// Highest drop index in the target column. Within its own column the card
/// can go to any existing position; elsewhere it may also go past the end.
fn last_drop_index(app: &App, ms: &MoveState) -> usize {
    let len = app.column_tasks(ms.target.column).len();
    if ms.target.column == ms.source.column {
        len.saturating_sub(1)
    } else {
        len
    }
}
