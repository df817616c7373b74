use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::{App, Mode};
use crate::util::unicode;

use super::typed_char;

/// The filter applies as the user types
pub(super) fn handle_search(app: &mut App, key: KeyEvent) {
    match key.code {
        // Clear the filter
        KeyCode::Esc => {
            app.board.search.clear();
            app.mode = Mode::Navigate;
        }
        // Keep the filter
        KeyCode::Enter => app.mode = Mode::Navigate,
        KeyCode::Backspace => unicode::pop_grapheme(&mut app.board.search),
        _ => match typed_char(&key) {
            Some(c) => app.board.search.push(c),
            None => return,
        },
    }
    app.clamp_cursor();
}
