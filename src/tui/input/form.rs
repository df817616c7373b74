use crossterm::event::{KeyCode, KeyEvent};

use crate::ops::validate::FormField;
use crate::tui::app::{App, Mode};
use crate::util::unicode;

use super::typed_char;

pub(super) fn handle_form(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        app.form = None;
        app.mode = Mode::Navigate;
        return;
    }
    if key.code == KeyCode::Enter {
        app.submit_form();
        return;
    }

    let Some(state) = &mut app.form else {
        app.mode = Mode::Navigate;
        return;
    };
    if state.submitting {
        return;
    }

    match key.code {
        KeyCode::Tab => state.focus = state.focus.next(),
        KeyCode::BackTab => state.focus = state.focus.prev(),
        KeyCode::Left if state.focus == FormField::Status => state.form.cycle_status(false),
        KeyCode::Right if state.focus == FormField::Status => state.form.cycle_status(true),
        KeyCode::Backspace => {
            if let Some(text) = state.form.text_mut(state.focus) {
                unicode::pop_grapheme(text);
            }
        }
        _ => {
            if let Some(c) = typed_char(&key)
                && let Some(text) = state.form.text_mut(state.focus)
            {
                text.push(c);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyCode;
    use pretty_assertions::assert_eq;

    use crate::model::task::TaskStatus;
    use crate::ops::validate::FormField;
    use crate::tui::app::Mode;
    use crate::tui::input::test_keys::*;
    use crate::tui::render::test_helpers::*;

    #[test]
    fn test_fill_and_submit_create_form() {
        let (mut app, gateway) = loaded_app(vec![]);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.mode, Mode::Form);

        type_str(&mut app, "Plan sprint");
        press(&mut app, KeyCode::Tab);
        type_str(&mut app, "Two weeks");
        press(&mut app, KeyCode::Tab);
        type_str(&mut app, "Lucia");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.form.as_ref().unwrap().form.status, "IN_PROGRESS");

        press(&mut app, KeyCode::Enter);
        settle(&mut app);

        assert_eq!(app.mode, Mode::Navigate);
        assert_eq!(gateway.create_count(), 1);
        assert_eq!(app.board.tasks[0].title, "Plan sprint");
        assert_eq!(app.board.tasks[0].status, Some(TaskStatus::InProgress));
    }

    #[test]
    fn test_errors_shown_inline_and_form_stays_open() {
        let (mut app, gateway) = loaded_app(vec![]);
        press(&mut app, KeyCode::Char('n'));
        type_str(&mut app, "A");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.mode, Mode::Form);
        let errors = app.form.as_ref().unwrap().errors.clone().unwrap();
        assert_eq!(
            errors.message_for(FormField::Title),
            Some("title must be at least 2 characters")
        );
        assert_eq!(gateway.create_count(), 0);
    }

    #[test]
    fn test_backspace_and_backtab() {
        let (mut app, _) = loaded_app(vec![]);
        press(&mut app, KeyCode::Char('n'));
        type_str(&mut app, "Tax");
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::BackTab);

        let state = app.form.as_ref().unwrap();
        assert_eq!(state.form.title, "Ta");
        assert_eq!(state.focus, FormField::Status);
    }

    #[test]
    fn test_esc_closes_form() {
        let (mut app, _) = loaded_app(vec![]);
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Esc);
        assert!(app.form.is_none());
        assert_eq!(app.mode, Mode::Navigate);
    }
}
