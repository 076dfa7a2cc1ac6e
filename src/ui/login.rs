use crate::app::App;
use crate::login::{LoginField, DEFAULT_CODE_HINT};
use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::helpers::{centered_rect, spinner};

/// Centered login box: mobile and code fields plus submit hint.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let form = &app.login;
    let panel = centered_rect(52, 13, area);
    if panel.width < 30 || panel.height < 9 {
        return;
    }
    f.render_widget(Clear, panel);

    let field = |label: &'static str, value: &str, which: LoginField| -> Line<'static> {
        let focused = form.focus == which && !form.submitting;
        let style = if focused {
            app.theme.input_focused
        } else {
            app.theme.input
        };
        let cursor = if focused { "█" } else { "" };
        Line::from(vec![
            Span::styled(format!("{:>8}  ", label), app.theme.label),
            Span::styled(format!("[ {}{} ]", value, cursor), style),
        ])
    };

    let action = if form.submitting {
        Span::styled(format!("{} Logging in...", spinner(app.spinner_frame)), app.theme.muted)
    } else {
        Span::styled("Enter to log in, Tab to switch field", app.theme.muted)
    };

    let lines = vec![
        Line::from(Span::styled("PressDesk", app.theme.heading)),
        Line::from(Span::styled("Content management console", app.theme.muted)),
        Line::from(""),
        field("Mobile", &form.mobile, LoginField::Mobile),
        Line::from(""),
        field("Code", &form.code, LoginField::Code),
        Line::from(""),
        Line::from(Span::styled(
            format!("Default verification code: {}", DEFAULT_CODE_HINT),
            app.theme.muted,
        )),
        Line::from(""),
        Line::from(action),
    ];

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.theme.panel_border_focused)
                .title(" Log in "),
        );
    f.render_widget(paragraph, panel);
}
