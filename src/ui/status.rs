use crate::app::{App, StatusKind, View};
use ratatui::{layout::Rect, widgets::Paragraph, Frame};
use std::borrow::Cow;

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    if let Some((msg, kind, _)) = &app.status_message {
        let style = match kind {
            StatusKind::Info => app.theme.status_bar.patch(app.theme.info),
            StatusKind::Success => app.theme.status_bar.patch(app.theme.success),
            StatusKind::Error => app.theme.status_bar.patch(app.theme.error),
        };
        f.render_widget(Paragraph::new(format!(" {}", msg)).style(style), area);
        return;
    }

    let prompt_open = app
        .editor
        .as_ref()
        .is_some_and(|e| e.cover_prompt.is_some());
    let hints: Cow<'_, str> = match app.view {
        View::Login => Cow::Borrowed(" [Tab]switch field [Enter]log in [Ctrl+c]quit"),
        View::Articles if app.list.page_prompt.is_some() => {
            Cow::Borrowed(" Type a page number [Enter]go [Esc]cancel")
        }
        View::Articles => Cow::Borrowed(
            " [Enter]view [e]dit [d]elete [s]tatus [c]hannel [h/l o]sort [n/p :]page [?]help [q]uit",
        ),
        View::Detail => Cow::Borrowed(" [Esc]back [j/k]scroll [e]dit [o]pen cover [r]efresh [?]help"),
        View::Editor if prompt_open => Cow::Borrowed(" Type a file path [Enter]load [Esc]cancel"),
        View::Editor => Cow::Borrowed(" [Tab]next field [Ctrl+s]submit [Esc]cancel"),
    };

    f.render_widget(Paragraph::new(hints).style(app.theme.status_bar), area);
}
