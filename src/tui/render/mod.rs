pub mod board_view;
pub mod confirm_popup;
pub mod form_popup;
pub mod help_overlay;
mod helpers;
pub mod status_row;

#[cfg(test)]
pub mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use regex::Regex;

use super::app::{App, Mode};

/// Main render function, dispatches to sub-renderers
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Background fill
    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // Layout: title bar (1 row) | board | status row (1 row)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // title bar
            Constraint::Min(1),    // columns
            Constraint::Length(1), // status row
        ])
        .split(area);

    render_title_bar(frame, app, chunks[0]);
    board_view::render_board_view(frame, app, chunks[1]);
    status_row::render_status_row(frame, app, chunks[2]);

    // Popups (rendered on top of the board)
    if app.mode == Mode::Form && app.form.is_some() {
        form_popup::render_form_popup(frame, app, area);
    }
    if app.mode == Mode::Confirm && app.confirm.is_some() {
        confirm_popup::render_confirm_popup(frame, app, area);
    }

    // Help overlay (rendered on top of everything)
    if app.show_help {
        help_overlay::render_help_overlay(frame, app, area);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let mut spans = vec![Span::styled(
        " Task Board",
        Style::default()
            .fg(app.theme.text_bright)
            .bg(bg)
            .add_modifier(Modifier::BOLD),
    )];

    let count = match app.board.tasks.len() {
        1 => "1 task".to_string(),
        n => format!("{n} tasks"),
    };
    let right = if app.board.search.is_empty() {
        format!("{count} ")
    } else {
        format!("filter: {}  {count} ", app.board.search)
    };
    let used = helpers::spans_width(&spans) + right.chars().count();
    if used < width {
        spans.push(Span::styled(" ".repeat(width - used), Style::default().bg(bg)));
        spans.push(Span::styled(right, Style::default().fg(app.theme.dim).bg(bg)));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(bg)),
        area,
    );
}

/// Case-insensitive literal matcher for the active search, if any
pub(super) fn search_regex(search: &str) -> Option<Regex> {
    if search.is_empty() {
        return None;
    }
    Regex::new(&format!("(?i){}", regex::escape(search))).ok()
}

/// Push spans for text with regex match highlighting. If no regex or no matches,
/// pushes a single span with `base_style`. Otherwise splits text at match boundaries.
pub(super) fn push_highlighted_spans<'a>(
    spans: &mut Vec<Span<'a>>,
    text: &str,
    base_style: Style,
    highlight_style: Style,
    search_re: Option<&Regex>,
) {
    let re = match search_re {
        Some(r) => r,
        None => {
            spans.push(Span::styled(text.to_string(), base_style));
            return;
        }
    };

    let mut last_end = 0;
    for m in re.find_iter(text) {
        if m.start() > last_end {
            spans.push(Span::styled(
                text[last_end..m.start()].to_string(),
                base_style,
            ));
        }
        spans.push(Span::styled(
            text[m.start()..m.end()].to_string(),
            highlight_style,
        ));
        last_end = m.end();
    }
    if last_end < text.len() || text.is_empty() {
        spans.push(Span::styled(text[last_end..].to_string(), base_style));
    }
}
