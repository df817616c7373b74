use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::model::task::TaskStatus;
use crate::ops::validate::FormField;
use crate::tui::app::{App, FormTarget};
use crate::util::unicode;

use super::helpers::centered_rect_fixed;

const POPUP_W: u16 = 60;

/// Render the create/edit form over the board
pub fn render_form_popup(frame: &mut Frame, app: &App, area: Rect) {
    let Some(state) = &app.form else {
        return;
    };

    let bg = app.theme.background;
    let header_style = Style::default()
        .fg(app.theme.highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let label_style = Style::default().fg(app.theme.dim).bg(bg);
    let focused_label = Style::default()
        .fg(app.theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let value_style = Style::default().fg(app.theme.text).bg(bg);
    let error_style = Style::default().fg(app.theme.red).bg(bg);
    let cursor_style = Style::default().fg(app.theme.highlight).bg(bg);

    let popup_w = POPUP_W.min(area.width.saturating_sub(2));
    let inner_w = popup_w.saturating_sub(2) as usize;
    let value_w = inner_w.saturating_sub(4);

    let heading = match state.target {
        FormTarget::Create => " New task".to_string(),
        FormTarget::Edit(id) => format!(" Edit task #{id}"),
    };
    let mut lines: Vec<Line> = vec![Line::from(Span::styled(heading, header_style)), Line::from("")];

    for field in FormField::ALL {
        let focused = field == state.focus && !state.submitting;
        let label = if focused { focused_label } else { label_style };
        lines.push(Line::from(Span::styled(format!(" {}", field.label()), label)));

        let mut value = vec![Span::styled(if focused { "  > " } else { "    " }, cursor_style)];
        if field == FormField::Status {
            let current = state
                .form
                .status
                .parse::<TaskStatus>()
                .map_or("(none)", TaskStatus::label);
            value.push(Span::styled(
                format!("\u{25C0} {current} \u{25B6}"),
                value_style,
            ));
        } else {
            // Keep the end of long input visible while typing
            let text = state.form.value(field);
            let shown = if unicode::display_width(text) + 1 > value_w {
                unicode::tail_to_width(text, value_w.saturating_sub(1))
            } else {
                text.to_string()
            };
            value.push(Span::styled(shown, value_style));
            if focused {
                value.push(Span::styled("\u{258C}", cursor_style));
            }
        }
        lines.push(Line::from(value));

        if let Some(message) = state
            .errors
            .as_ref()
            .and_then(|errors| errors.message_for(field))
        {
            lines.push(Line::from(Span::styled(format!("    {message}"), error_style)));
        }
    }

    lines.push(Line::from(""));
    lines.push(if state.submitting {
        Line::from(Span::styled(
            " Saving\u{2026}",
            Style::default().fg(app.theme.yellow).bg(bg),
        ))
    } else {
        Line::from(Span::styled(
            " Tab next  \u{2190}\u{2192} status  Enter save  Esc cancel",
            label_style,
        ))
    });

    // Dynamic height from content + 2 for borders
    let popup_h = (lines.len() as u16 + 2).min(area.height.saturating_sub(2));
    let popup_area = centered_rect_fixed(popup_w, popup_h, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.highlight).bg(bg))
        .style(Style::default().bg(bg));
    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(Style::default().bg(bg));
    frame.render_widget(paragraph, popup_area);
}
