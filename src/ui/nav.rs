//! Top bar and side navigation.

use crate::app::{App, View};
use crate::util::{display_width, fit_to_width, truncate_to_width};
use chrono::Local;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

/// Side navigation entries: (key, label, active in views).
const NAV_ITEMS: [(&str, &str, &[View]); 2] = [
    ("1", "Content", &[View::Articles, View::Detail]),
    ("2", "Publish", &[View::Editor]),
];

/// App name, sidebar hint, user avatar and name, clock, logout hint.
pub(super) fn render_top_bar(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let toggle = if app.sidebar_collapsed { "[»]" } else { "[«]" };
    let left = format!(" {} PressDesk", toggle);

    let user = app.session.user().unwrap_or_default();
    let avatar = format!(" {} ", user.initial());
    let name = format!(" {}  ", truncate_to_width(user.display_name(), 20));
    let clock = Local::now().format("%Y-%m-%d %H:%M").to_string();
    let logout = "  [L] Logout ";

    let used: usize = [left.as_str(), avatar.as_str(), name.as_str(), clock.as_str(), logout]
        .iter()
        .map(|s| display_width(s))
        .sum();
    let pad = (area.width as usize).saturating_sub(used);

    let line = Line::from(vec![
        Span::styled(left, app.theme.top_bar),
        Span::styled(" ".repeat(pad), app.theme.top_bar),
        Span::styled(avatar, app.theme.avatar),
        Span::styled(name, app.theme.top_bar),
        Span::styled(clock, app.theme.top_bar),
        Span::styled(logout, app.theme.top_bar),
    ]);
    f.render_widget(Paragraph::new(line).style(app.theme.top_bar), area);
}

/// "Content" and "Publish" entries; collapsed to their keys only.
pub(super) fn render_side_nav(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let label_width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = NAV_ITEMS
        .iter()
        .map(|(key, label, views)| {
            let style = if views.contains(&app.view) {
                app.theme.nav_active
            } else {
                app.theme.nav_item
            };
            let text = if app.sidebar_collapsed {
                format!(" {}", key)
            } else {
                format!(" {} {}", key, fit_to_width(label, label_width))
            };
            ListItem::new(Line::from(Span::styled(text, style)))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::RIGHT)
        .border_style(app.theme.panel_border);
    f.render_widget(List::new(items).block(block), area);
}
