use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::App;

/// Render the help overlay (toggled with ?)
pub fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    // Center the overlay, leaving some margin
    let overlay_area = centered_rect(60, 80, area);

    // Clear the area behind the overlay
    frame.render_widget(Clear, overlay_area);

    let bg = app.theme.background;
    let key_style = Style::default()
        .fg(app.theme.highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(app.theme.text).bg(bg);
    let header_style = Style::default()
        .fg(app.theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(" Key Bindings", header_style)));
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(" Board", header_style)));
    add_binding(&mut lines, " \u{2190}\u{2192}/hl", "Switch column", key_style, desc_style);
    add_binding(&mut lines, " \u{2191}\u{2193}/jk", "Move cursor", key_style, desc_style);
    add_binding(&mut lines, " Space", "Select / deselect card", key_style, desc_style);
    add_binding(&mut lines, " /", "Filter by title", key_style, desc_style);
    add_binding(&mut lines, " r", "Reload from server", key_style, desc_style);
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(" Tasks", header_style)));
    add_binding(&mut lines, " n", "New task", key_style, desc_style);
    add_binding(&mut lines, " e", "Edit task", key_style, desc_style);
    add_binding(&mut lines, " d", "Delete task", key_style, desc_style);
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(" Moving", header_style)));
    add_binding(&mut lines, " m", "Pick up card", key_style, desc_style);
    add_binding(&mut lines, " arrows/hjkl", "Choose drop position", key_style, desc_style);
    add_binding(&mut lines, " Enter", "Drop", key_style, desc_style);
    add_binding(&mut lines, " Esc", "Put back", key_style, desc_style);
    lines.push(Line::from(""));

    add_binding(&mut lines, " ?", "Toggle help", key_style, desc_style);
    add_binding(&mut lines, " q / Ctrl+C", "Quit", key_style, desc_style);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.dim).bg(bg))
        .title(Span::styled(" help ", key_style))
        .style(Style::default().bg(bg));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(Style::default().bg(bg));

    frame.render_widget(paragraph, overlay_area);
}

fn add_binding<'a>(
    lines: &mut Vec<Line<'a>>,
    key: &'a str,
    desc: &'a str,
    key_style: Style,
    desc_style: Style,
) {
    let key_width = 16;
    let padded_key = format!("{:<width$}", key, width = key_width);
    lines.push(Line::from(vec![
        Span::styled(padded_key, key_style),
        Span::styled(desc, desc_style),
    ]));
}

/// Create a centered rectangle of the given percentage of the parent
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::render::test_helpers::*;

    #[test]
    fn test_help_lists_move_keys() {
        let app = loading_app();
        let output = render_to_string(TERM_W, TERM_H, |frame, area| {
            render_help_overlay(frame, &app, area)
        });
        assert!(output.contains("Key Bindings"));
        assert!(output.contains("Pick up card"));
        assert!(output.contains("Reload from server"));
    }
}
