use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, Mode};

use super::helpers::spans_width;

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;
    let dim = Style::default().fg(app.theme.dim).bg(bg);
    let bright = Style::default().fg(app.theme.text_bright).bg(bg);

    let (mut spans, hint) = match app.mode {
        Mode::Search => (
            // Search prompt: /term▌
            vec![
                Span::styled(format!("/{}", app.board.search), bright),
                Span::styled("\u{258C}", Style::default().fg(app.theme.highlight).bg(bg)),
            ],
            "Enter keep  Esc clear",
        ),
        Mode::Move => {
            let text = match app.move_state {
                Some(ms) => format!(
                    " moving #{} \u{2192} {} (position {})",
                    ms.task_id,
                    ms.target.column.label(),
                    ms.target.index + 1
                ),
                None => String::new(),
            };
            (vec![Span::styled(text, bright)], "Enter drop  Esc cancel")
        }
        Mode::Form => (Vec::new(), "Tab next field  Enter save  Esc cancel"),
        Mode::Confirm => (Vec::new(), "y delete  n cancel"),
        Mode::Navigate => (Vec::new(), "n new  e edit  d delete  m move  / search  ? help"),
    };

    // A fresh notice takes the left side outside of search
    if app.mode != Mode::Search
        && let Some(notice) = app.visible_notice()
    {
        spans = vec![Span::styled(
            format!(" {}", notice.message),
            Style::default()
                .fg(app.theme.notice_color(notice.level))
                .bg(bg),
        )];
    }

    let pending = app.pending_count();
    let right = if pending > 0 {
        format!("{hint}  [{pending} pending] ")
    } else {
        format!("{hint} ")
    };
    let content_width = spans_width(&spans);
    let right_width = right.chars().count();
    if content_width + right_width < width {
        spans.push(Span::styled(
            " ".repeat(width - content_width - right_width),
            Style::default().bg(bg),
        ));
        spans.push(Span::styled(right, dim));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}
