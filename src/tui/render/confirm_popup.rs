use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::App;
use crate::util::unicode;

use super::helpers::centered_rect_fixed;

/// Ask before deleting a task
pub fn render_confirm_popup(frame: &mut Frame, app: &App, area: Rect) {
    let Some(confirm) = &app.confirm else {
        return;
    };

    let bg = app.theme.background;
    let popup_w: u16 = 44.min(area.width.saturating_sub(2));
    let inner_w = popup_w.saturating_sub(2) as usize;

    let lines = vec![
        Line::from(Span::styled(
            format!(" Delete task #{}?", confirm.task_id),
            Style::default()
                .fg(app.theme.red)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(" {}", unicode::truncate_to_width(&confirm.title, inner_w.saturating_sub(2))),
            Style::default().fg(app.theme.text_bright).bg(bg),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(" y", Style::default().fg(app.theme.highlight).bg(bg)),
            Span::styled(" delete   ", Style::default().fg(app.theme.text).bg(bg)),
            Span::styled("n", Style::default().fg(app.theme.highlight).bg(bg)),
            Span::styled(" cancel", Style::default().fg(app.theme.text).bg(bg)),
        ]),
    ];

    let popup_h = (lines.len() as u16 + 2).min(area.height.saturating_sub(2));
    let popup_area = centered_rect_fixed(popup_w, popup_h, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.red).bg(bg))
        .style(Style::default().bg(bg));
    frame.render_widget(Paragraph::new(lines).block(block), popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskStatus;
    use crate::tui::app::ConfirmState;
    use crate::tui::render::test_helpers::*;

    #[test]
    fn test_confirm_names_the_task() {
        let (mut app, _) = loaded_app(vec![task(7, "Archive logs", TaskStatus::Completed)]);
        app.confirm = Some(ConfirmState {
            task_id: 7,
            title: "Archive logs".into(),
        });

        let output = render_to_string(TERM_W, TERM_H, |frame, area| {
            render_confirm_popup(frame, &app, area)
        });
        assert!(output.contains("Delete task #7?"));
        assert!(output.contains("Archive logs"));
        assert!(output.contains("y delete"));
    }
}
