use crate::app::App;
use crate::query::{LoadState, SortField};
use crate::util::strip_control_chars;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use super::helpers::{format_count, format_pubdate, spinner};

/// Render the content-management view: filters, table, pagination bar.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 3 || area.height < 5 {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    render_filters(f, app, chunks[0]);
    render_table(f, app, chunks[1]);
    render_pagination(f, app, chunks[2]);
}

fn render_filters(f: &mut Frame, app: &App, area: Rect) {
    let query = &app.list.query;
    let channel = match query.channel {
        None => "All",
        Some(_) => app.channel_name(query.channel).unwrap_or("?"),
    };
    let line = Line::from(vec![
        Span::styled(" Status ", app.theme.label),
        Span::styled(query.status.label(), app.theme.info),
        Span::styled(" [s]   Channel ", app.theme.label),
        Span::styled(channel, app.theme.info),
        Span::styled(" [c]   Sort ", app.theme.label),
        Span::styled(
            format!("{} {}", query.sort.field.label(), query.sort.order.arrow()),
            app.theme.info,
        ),
        Span::styled(" [h/l o]", app.theme.label),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

/// Header cell for a sortable column: label plus sort indicator, highlighted
/// under the header cursor.
fn sort_header(app: &App, field: SortField) -> Cell<'static> {
    let text = format!("{} {}", field.label(), app.list.query.sort.indicator(field));
    let style = if app.list.header_field() == field {
        app.theme.header_cursor
    } else {
        app.theme.header
    };
    Cell::from(text).style(style)
}

fn render_table(f: &mut Frame, app: &App, area: Rect) {
    let list = &app.list;
    let loading = list.is_loading();
    let title = if loading {
        format!(" Articles {} ", spinner(app.spinner_frame))
    } else {
        " Articles ".to_string()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.panel_border_focused)
        .title(title);

    // Placeholder states replace the table body
    let placeholder = match &list.load {
        LoadState::Error(message) => Some(Paragraph::new(vec![
            Line::from(Span::styled(message.clone(), app.theme.error)),
            Line::from(""),
            Line::from(Span::styled("Press r to retry", app.theme.muted)),
        ])),
        LoadState::Loading | LoadState::Idle if list.items.is_empty() => Some(Paragraph::new(
            Line::from(Span::styled("Loading...", app.theme.muted)),
        )),
        LoadState::Ready if list.items.is_empty() => Some(Paragraph::new(Line::from(
            Span::styled("No articles", app.theme.muted),
        ))),
        _ => None,
    };
    if let Some(paragraph) = placeholder {
        f.render_widget(paragraph.alignment(Alignment::Center).block(block), area);
        return;
    }

    let header = Row::new(vec![
        Cell::from("Cover").style(app.theme.header),
        Cell::from("Title").style(app.theme.header),
        sort_header(app, SortField::Status),
        sort_header(app, SortField::Pubdate),
        sort_header(app, SortField::ReadCount),
        sort_header(app, SortField::CommentCount),
        sort_header(app, SortField::LikeCount),
    ]);

    let rows: Vec<Row> = list
        .items
        .iter()
        .map(|article| {
            let cover = if article.cover.first_image().is_some() {
                Span::styled("img", app.theme.info)
            } else {
                Span::styled("-", app.theme.muted)
            };
            let title = if article.title.trim().is_empty() {
                "(untitled)".to_string()
            } else {
                strip_control_chars(&article.title).into_owned()
            };
            Row::new(vec![
                Cell::from(cover),
                Cell::from(title),
                Cell::from(article.status.label()).style(app.theme.status_style(article.status)),
                Cell::from(format_pubdate(article.pubdate.as_deref())),
                Cell::from(format_count(article.read_count)),
                Cell::from(format_count(article.comment_count)),
                Cell::from(format_count(article.like_count)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(5),
        Constraint::Min(16),
        Constraint::Length(10),
        Constraint::Length(18),
        Constraint::Length(8),
        Constraint::Length(11),
        Constraint::Length(8),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("> ");

    let mut state = TableState::default().with_selected(Some(list.selected));
    f.render_stateful_widget(table, area, &mut state);
}

/// "N records, page X/Y" plus first/prev, the page window, and next/last.
fn render_pagination(f: &mut Frame, app: &App, area: Rect) {
    let list = &app.list;
    if let Some(input) = &list.page_prompt {
        let line = Line::from(vec![
            Span::styled(format!(" Go to page (1-{}): ", list.total_pages), app.theme.label),
            Span::styled(format!("{}_", input), app.theme.page_current),
        ]);
        f.render_widget(Paragraph::new(line), area);
        return;
    }
    let current = list.page();
    let at_start = current <= 1;
    let at_end = current >= list.total_pages;
    let edge = |disabled: bool| -> Style {
        if disabled {
            app.theme.muted
        } else {
            app.theme.body
        }
    };

    let mut spans = vec![
        Span::styled(
            format!(
                " {} records, page {}/{}   ",
                list.total_count, current, list.total_pages
            ),
            app.theme.label,
        ),
        Span::styled("« ", edge(at_start)),
        Span::styled("‹ ", edge(at_start)),
    ];
    for page in list.page_window() {
        if page == current {
            spans.push(Span::styled(format!(" {} ", page), app.theme.page_current));
        } else {
            spans.push(Span::styled(format!(" {} ", page), app.theme.body));
        }
    }
    spans.push(Span::styled(" ›", edge(at_end)));
    spans.push(Span::styled(" »", edge(at_end)));
    spans.push(Span::styled("   g/p/n/G  : jump", app.theme.muted));

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
