//! Semantic styles for the TUI.
//!
//! Widgets ask for a role (`app.theme.selected`, `app.theme.status_style(...)`)
//! instead of hardcoding colors.

use crate::api::ArticleStatus;
use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    // -- Chrome --
    pub top_bar: Style,
    pub avatar: Style,
    pub status_bar: Style,
    pub panel_border: Style,
    pub panel_border_focused: Style,
    pub nav_item: Style,
    pub nav_active: Style,

    // -- Tables and forms --
    pub header: Style,
    pub header_cursor: Style,
    pub selected: Style,
    pub muted: Style,
    pub label: Style,
    pub input: Style,
    pub input_focused: Style,
    pub page_current: Style,

    // -- Messages --
    pub info: Style,
    pub success: Style,
    pub error: Style,

    // -- Detail --
    pub heading: Style,
    pub body: Style,
    pub link: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            top_bar: Style::default().bg(Color::Blue).fg(Color::White),
            avatar: Style::default()
                .bg(Color::White)
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            panel_border: Style::default(),
            panel_border_focused: Style::default().fg(Color::Cyan),
            nav_item: Style::default(),
            nav_active: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),

            header: Style::default().add_modifier(Modifier::BOLD),
            header_cursor: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).fg(Color::White),
            muted: Style::default().fg(Color::DarkGray),
            label: Style::default().fg(Color::Gray),
            input: Style::default(),
            input_focused: Style::default().fg(Color::Yellow),
            page_current: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Cyan),
            success: Style::default().fg(Color::Green),
            error: Style::default().fg(Color::Red),

            heading: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            body: Style::default(),
            link: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
        }
    }
}

impl Theme {
    /// Badge color for an article status.
    pub fn status_style(&self, status: ArticleStatus) -> Style {
        match status {
            ArticleStatus::Approved => Style::default().fg(Color::Green),
            ArticleStatus::Pending => Style::default().fg(Color::Yellow),
            ArticleStatus::Rejected => Style::default().fg(Color::Red),
            ArticleStatus::Unknown => self.muted,
        }
    }
}
