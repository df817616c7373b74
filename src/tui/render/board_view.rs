use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use regex::Regex;

use crate::cli::output::format_created;
use crate::model::column::Column;
use crate::model::task::Task;
use crate::tui::app::{App, Mode};
use crate::util::unicode;

use super::helpers::pad_spans;
use super::{push_highlighted_spans, search_regex};

/// Lines of details shown on a card
const DETAIL_LINES: usize = 2;

/// Render the three status columns side by side
pub fn render_board_view(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(area);

    let search_re = search_regex(&app.board.search);
    for (column, chunk) in Column::ALL.into_iter().zip(chunks.iter()) {
        render_column(frame, app, column, *chunk, search_re.as_ref());
    }
}

fn render_column(
    frame: &mut Frame,
    app: &App,
    column: Column,
    area: Rect,
    search_re: Option<&Regex>,
) {
    let bg = app.theme.background;
    let tasks = app.column_tasks(column);

    let border_color = if app.cursor.column == column {
        app.theme.selection_border
    } else {
        app.theme.dim
    };
    let title = Span::styled(
        format!(" {} ({}) ", column.label(), tasks.len()),
        Style::default()
            .fg(app.theme.column_color(column))
            .bg(bg)
            .add_modifier(Modifier::BOLD),
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color).bg(bg))
        .title(title)
        .style(Style::default().bg(bg));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width as usize;
    let dim_style = Style::default().fg(app.theme.dim).bg(bg);
    let mut lines: Vec<Line> = Vec::new();

    if tasks.is_empty() && app.board.loading {
        lines.push(Line::from(Span::styled(" Loading\u{2026}", dim_style)));
        frame.render_widget(Paragraph::new(lines), inner);
        return;
    }

    let moving = app.move_state.filter(|_| app.mode == Mode::Move);
    let drop_at = moving
        .filter(|ms| ms.target.column == column)
        .map(|ms| ms.target.index);

    // Lines that must stay on screen: the cursor card or the drop slot
    let mut focus: Option<(usize, usize)> = None;
    let mut slot = 0;
    let mut dropped = false;

    for (idx, task) in tasks.iter().enumerate() {
        let dragged = moving.is_some_and(|ms| ms.task_id == task.id);
        if !dragged {
            if drop_at == Some(slot) && !dropped {
                focus = Some((lines.len(), lines.len() + 1));
                lines.push(drop_indicator(app, width));
                dropped = true;
            }
            slot += 1;
        }

        let is_cursor = moving.is_none() && app.cursor.column == column && app.cursor.index == idx;
        let start = lines.len();
        lines.extend(card_lines(app, task, width, is_cursor, dragged, search_re));
        if is_cursor {
            focus = Some((start, lines.len()));
        }
        lines.push(Line::from(""));
    }

    if drop_at.is_some() && !dropped {
        focus = Some((lines.len(), lines.len() + 1));
        lines.push(drop_indicator(app, width));
    }
    if tasks.is_empty() && drop_at.is_none() {
        let empty = if app.board.search.is_empty() {
            " (no tasks)"
        } else {
            " (no matches)"
        };
        lines.push(Line::from(Span::styled(empty, dim_style)));
    }

    // Scroll so the focused lines are visible
    let height = inner.height as usize;
    let offset = match focus {
        Some((_, end)) if end > height => end - height,
        _ => 0,
    };

    let paragraph = Paragraph::new(lines)
        .style(Style::default().bg(bg))
        .scroll((offset as u16, 0));
    frame.render_widget(paragraph, inner);
}

fn card_lines<'a>(
    app: &App,
    task: &Task,
    width: usize,
    is_cursor: bool,
    dragged: bool,
    search_re: Option<&Regex>,
) -> Vec<Line<'a>> {
    let bg = app.theme.background;
    let row_bg = if is_cursor || dragged {
        app.theme.selection_bg
    } else {
        bg
    };
    let fill = Style::default().bg(row_bg);
    let selected = app.board.selected == Some(task.id);

    let marker = if is_cursor || dragged {
        Span::styled("\u{258C} ", Style::default().fg(app.theme.selection_border).bg(row_bg))
    } else if selected {
        Span::styled("* ", Style::default().fg(app.theme.highlight).bg(row_bg))
    } else {
        Span::styled("  ", fill)
    };
    let body_width = width.saturating_sub(2);

    // Title
    let title_fg = if dragged {
        app.theme.dim
    } else if selected {
        app.theme.highlight
    } else {
        app.theme.text_bright
    };
    let title_style = Style::default()
        .fg(title_fg)
        .bg(row_bg)
        .add_modifier(Modifier::BOLD);
    let match_style = Style::default()
        .fg(app.theme.search_match_fg)
        .bg(app.theme.search_match_bg);
    let title = unicode::truncate_to_width(&task.title, body_width);
    let mut title_spans = vec![marker.clone()];
    push_highlighted_spans(&mut title_spans, &title, title_style, match_style, search_re);
    pad_spans(&mut title_spans, width, fill);

    let mut lines = vec![Line::from(title_spans)];

    // Details
    let text_style = Style::default().fg(app.theme.text).bg(row_bg);
    for detail in unicode::wrap_to_width(&task.details, body_width, DETAIL_LINES) {
        let mut spans = vec![Span::styled("  ", fill), Span::styled(detail, text_style)];
        pad_spans(&mut spans, width, fill);
        lines.push(Line::from(spans));
    }

    // Footer: created date, author, and whether a change is being saved
    let saving = if app.board.in_flight.contains(&task.id) {
        " saving\u{2026}"
    } else {
        ""
    };
    let footer = format!("{} \u{00B7} {}", format_created(&task.created_at), task.author);
    let footer_width = body_width.saturating_sub(unicode::display_width(saving));
    let mut spans = vec![
        Span::styled("  ", fill),
        Span::styled(
            unicode::truncate_to_width(&footer, footer_width),
            Style::default().fg(app.theme.dim).bg(row_bg),
        ),
        Span::styled(saving, Style::default().fg(app.theme.yellow).bg(row_bg)),
    ];
    pad_spans(&mut spans, width, fill);
    lines.push(Line::from(spans));

    lines
}

fn drop_indicator<'a>(app: &App, width: usize) -> Line<'a> {
    let label = format!("{:\u{2500}^width$}", " drop here ", width = width);
    Line::from(Span::styled(
        label,
        Style::default()
            .fg(app.theme.highlight)
            .bg(app.theme.background),
    ))
}
