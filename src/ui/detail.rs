//! Read-only article page.

use crate::app::{App, DetailState};
use crate::util::strip_control_chars;
use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::helpers::{format_pubdate, spinner};

/// Render the article detail view.
///
/// Takes `&mut App` to clamp the scroll offset against the rendered content.
pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.panel_border_focused)
        .title(" Article ");

    let lines: Vec<Line> = match &app.detail {
        None => vec![Line::from(Span::styled("No article selected", app.theme.muted))],
        Some(DetailState::Loading(_)) => vec![Line::from(Span::styled(
            format!("{} Loading article...", spinner(app.spinner_frame)),
            app.theme.muted,
        ))],
        Some(DetailState::Failed { error, .. }) => vec![
            Line::from(Span::styled(error.clone(), app.theme.error)),
            Line::from(""),
            Line::from(Span::styled("Esc back, r retry", app.theme.muted)),
        ],
        Some(DetailState::Loaded { article, body }) => {
            let channel = app.channel_name(article.channel_id).unwrap_or("-");
            let mut lines = vec![
                Line::from(Span::styled(
                    strip_control_chars(&article.title).into_owned(),
                    app.theme.heading,
                )),
                Line::from(vec![
                    Span::styled(article.status.label(), app.theme.status_style(article.status)),
                    Span::styled(
                        format!(
                            "  {}  Channel: {}",
                            format_pubdate(article.pubdate.as_deref()),
                            channel
                        ),
                        app.theme.muted,
                    ),
                ]),
                Line::from(Span::styled(
                    format!(
                        "Reads {}  Comments {}  Likes {}",
                        article.read_count, article.comment_count, article.like_count
                    ),
                    app.theme.muted,
                )),
            ];
            match article.cover.first_image() {
                Some(url) => lines.push(Line::from(vec![
                    Span::styled("Cover: ", app.theme.label),
                    Span::styled(url.to_string(), app.theme.link),
                    Span::styled("  [o] open", app.theme.muted),
                ])),
                None => lines.push(Line::from(Span::styled("Cover: none", app.theme.muted))),
            }
            lines.push(Line::from(""));
            if body.trim().is_empty() {
                lines.push(Line::from(Span::styled("No content", app.theme.muted)));
            } else {
                lines.extend(
                    body.lines()
                        .map(|l| Line::from(Span::styled(l.to_string(), app.theme.body))),
                );
            }
            lines
        }
    };

    let centered = !matches!(app.detail, Some(DetailState::Loaded { .. }));
    let max_scroll = lines.len().saturating_sub(1);
    app.detail_scroll = app.detail_scroll.min(max_scroll);

    let mut paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll.min(u16::MAX as usize) as u16, 0));
    if centered {
        paragraph = paragraph.alignment(Alignment::Center);
    }
    f.render_widget(paragraph, area);
}
