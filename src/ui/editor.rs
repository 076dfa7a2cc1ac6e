//! Publish / edit form.

use crate::app::App;
use crate::editor::{CoverState, EditorField, EditorState};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::helpers::{centered_rect, spinner};

const CURSOR: &str = "█";

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 10 || area.height < 10 {
        return;
    }
    let Some(editor) = app.editor.as_ref() else {
        return;
    };

    let title = if editor.is_update() {
        " Edit article "
    } else {
        " Publish article "
    };
    let outer = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.panel_border_focused)
        .title(title);
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Length(1), // channel
            Constraint::Min(3),    // content
            Constraint::Length(2), // cover
            Constraint::Length(1), // message
            Constraint::Length(1), // hints
        ])
        .split(inner);

    let field_style = |field: EditorField| -> Style {
        if editor.focus == field && !editor.is_locked() {
            app.theme.input_focused
        } else {
            app.theme.input
        }
    };
    let with_cursor = |text: &str, field: EditorField| -> String {
        if editor.focus == field && !editor.is_locked() && editor.cover_prompt.is_none() {
            format!("{}{}", text, CURSOR)
        } else {
            text.to_string()
        }
    };

    // Title
    let title_block = Block::default()
        .borders(Borders::ALL)
        .border_style(field_style(EditorField::Title))
        .title(" Title ");
    f.render_widget(
        Paragraph::new(with_cursor(&editor.draft.title, EditorField::Title)).block(title_block),
        chunks[0],
    );

    // Channel
    let channel = match editor.draft.channel_id {
        Some(id) => app
            .channel_name(Some(id))
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", id)),
        None => "(select a channel)".to_string(),
    };
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(" Channel  ", field_style(EditorField::Channel)),
            Span::styled(format!("‹ {} ›", channel), app.theme.input),
            Span::styled("  ←/→ to choose", app.theme.muted),
        ])),
        chunks[1],
    );

    // Content
    let content_block = Block::default()
        .borders(Borders::ALL)
        .border_style(field_style(EditorField::Content))
        .title(" Content ");
    let content = with_cursor(&editor.draft.content, EditorField::Content);
    // Keep the end of long content (where typing happens) in view
    let visible = chunks[2].height.saturating_sub(2) as usize;
    let scroll = content.lines().count().saturating_sub(visible);
    f.render_widget(
        Paragraph::new(content)
            .block(content_block)
            .wrap(Wrap { trim: false })
            .scroll((scroll.min(u16::MAX as usize) as u16, 0)),
        chunks[2],
    );

    // Cover
    let cover = match &editor.draft.cover {
        CoverState::None => Span::styled("none", app.theme.muted),
        CoverState::Existing(url) => Span::styled(url.clone(), app.theme.link),
        CoverState::Selected(file) => Span::styled(file.summary(), app.theme.input),
    };
    f.render_widget(
        Paragraph::new(vec![
            Line::from(vec![
                Span::styled(" Cover    ", field_style(EditorField::Cover)),
                cover,
            ]),
            Line::from(Span::styled(
                "          a choose image file, x remove",
                app.theme.muted,
            )),
        ]),
        chunks[3],
    );

    f.render_widget(Paragraph::new(status_line(app, editor)), chunks[4]);

    let submit = if editor.is_update() { "update" } else { "publish" };
    f.render_widget(
        Paragraph::new(Span::styled(
            format!(" Tab next field  Ctrl+S {}  Esc cancel", submit),
            app.theme.muted,
        )),
        chunks[5],
    );

    if let Some(input) = &editor.cover_prompt {
        render_cover_prompt(f, app, input);
    }
}

/// Progress, success banner, or the current error.
fn status_line<'a>(app: &'a App, editor: &'a EditorState) -> Line<'a> {
    if let Some(error) = editor.error.as_ref().filter(|_| !editor.submitting) {
        Line::from(Span::styled(format!(" {}", error), app.theme.error))
    } else if editor.loading {
        Line::from(Span::styled(
            format!(" {} Loading article...", spinner(app.spinner_frame)),
            app.theme.muted,
        ))
    } else if editor.submitting {
        Line::from(Span::styled(
            format!(" {} Submitting...", spinner(app.spinner_frame)),
            app.theme.muted,
        ))
    } else if editor.submitted {
        Line::from(Span::styled(
            format!(" {}", editor.success_message(app.config.publish_redirect())),
            app.theme.success,
        ))
    } else {
        Line::from("")
    }
}

fn render_cover_prompt(f: &mut Frame, app: &App, input: &str) {
    let overlay = centered_rect(60, 7, f.area());
    if overlay.width < 20 || overlay.height < 5 {
        return;
    }
    f.render_widget(Clear, overlay);
    let text = format!(
        "Image file path (PNG, JPEG, GIF, WebP, BMP):\n\n> {}{}\n\n(Enter) Load  (Esc) Cancel",
        input, CURSOR
    );
    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.theme.panel_border_focused)
                .title(" Cover image "),
        )
        .style(app.theme.body);
    f.render_widget(paragraph, overlay);
}
