//! Render functions for the TUI.
//!
//! Dispatches to the view renderers and draws overlays on top.

use crate::app::{App, ConfirmAction, View};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::helpers::centered_rect;
use super::{articles, detail, editor, help, login, nav, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 10;

/// Main render dispatch function.
pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    match app.view {
        View::Login => login::render(f, app, rows[0]),
        _ => render_shell(f, app, rows[0]),
    }
    status::render(f, app, rows[1]);

    if app.show_help {
        help::render(f, app);
    }

    if let Some(ref confirm) = app.pending_confirm {
        render_confirm_overlay(f, app, confirm);
    }
}

/// Top bar, side navigation and the current view's body.
fn render_shell(f: &mut Frame, app: &mut App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);
    nav::render_top_bar(f, app, rows[0]);

    let nav_width = if app.sidebar_collapsed { 5 } else { 18 };
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(nav_width), Constraint::Min(0)])
        .split(rows[1]);
    nav::render_side_nav(f, app, cols[0]);

    let body = cols[1];
    match app.view {
        View::Articles => articles::render(f, app, body),
        View::Detail => detail::render(f, app, body),
        View::Editor => editor::render(f, app, body),
        View::Login => {}
    }
}

/// Render a confirmation dialog overlay centered on screen.
fn render_confirm_overlay(f: &mut Frame, app: &App, confirm: &ConfirmAction) {
    let text = match confirm {
        ConfirmAction::DeleteArticle { title, .. } => {
            let title = if title.trim().is_empty() {
                "this article"
            } else {
                title.as_str()
            };
            format!(
                "Delete \"{}\"?\n\nThis cannot be undone.\n\n(y) Confirm  (n/Esc) Cancel",
                title
            )
        }
    };

    let area = f.area();
    let overlay = centered_rect(
        50u16.min(area.width.saturating_sub(4)),
        8u16.min(area.height.saturating_sub(4)),
        area,
    );
    if overlay.width < 10 || overlay.height < 5 {
        return;
    }

    f.render_widget(Clear, overlay);

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.theme.panel_border_focused)
                .title(" Confirm "),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .style(app.theme.body);

    f.render_widget(paragraph, overlay);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiClient, ArticleId, ArticlePage, UserProfile};
    use crate::app::{AppEvent, Route};
    use crate::config::Config;
    use crate::session::SessionStore;
    use ratatui::{backend::TestBackend, Terminal};
    use tokio::sync::mpsc;

    fn test_app(logged_in: bool) -> (App, mpsc::Sender<AppEvent>, mpsc::Receiver<AppEvent>) {
        let session = SessionStore::in_memory();
        if logged_in {
            let user: UserProfile =
                serde_json::from_value(serde_json::json!({"name": "editor"})).unwrap();
            session.set_session("tok".to_string(), user).unwrap();
        }
        let api = ApiClient::new("http://127.0.0.1:9", session).unwrap();
        let (tx, rx) = mpsc::channel(32);
        (App::new(Config::default(), api), tx, rx)
    }

    fn draw(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[tokio::test]
    async fn test_too_small_terminal() {
        let (mut app, _tx, _rx) = test_app(false);
        let screen = draw(&mut app, 40, 8);
        assert!(screen.contains("Terminal too small"));
    }

    #[tokio::test]
    async fn test_login_screen() {
        let (mut app, _tx, _rx) = test_app(false);
        let screen = draw(&mut app, 100, 30);
        assert!(screen.contains("Mobile"));
        assert!(screen.contains("246810"));
    }

    #[tokio::test]
    async fn test_list_screen_shows_rows_and_pagination() {
        let (mut app, tx, _rx) = test_app(true);
        app.navigate(Route::Articles, &tx);
        let generation = app.list.generation();
        let items = vec![
            serde_json::from_value(serde_json::json!({
                "id": "1", "title": "First post", "status": 2,
                "pubdate": "2024-03-01 12:30:45", "read_count": 12
            }))
            .unwrap(),
            serde_json::from_value(serde_json::json!({
                "id": "2", "title": "Second post", "status": 1
            }))
            .unwrap(),
        ];
        app.list.finish_load(
            generation,
            Ok(ArticlePage {
                items,
                page: 2,
                total_pages: 7,
                total_count: 64,
            }),
        );

        let screen = draw(&mut app, 120, 30);
        assert!(screen.contains("First post"));
        assert!(screen.contains("Second post"));
        assert!(screen.contains("Approved"));
        assert!(screen.contains("Pending"));
        assert!(screen.contains("2024-03-01 12:30"));
        assert!(screen.contains("64 records, page 2/7"));
        assert!(screen.contains("editor"));

        app.list.open_page_prompt();
        app.list.page_prompt_push('5');
        let screen = draw(&mut app, 120, 30);
        assert!(screen.contains("Go to page (1-7): 5_"));
        assert!(screen.contains("Type a page number"));
    }

    #[tokio::test]
    async fn test_empty_and_error_list() {
        let (mut app, tx, _rx) = test_app(true);
        app.navigate(Route::Articles, &tx);
        let generation = app.list.generation();
        app.list.finish_load(
            generation,
            Ok(ArticlePage {
                items: vec![],
                page: 1,
                total_pages: 1,
                total_count: 0,
            }),
        );
        assert!(draw(&mut app, 100, 24).contains("No articles"));

        let generation = app.list.begin_load();
        app.list
            .finish_load(generation, Err("Failed to load articles".to_string()));
        let screen = draw(&mut app, 100, 24);
        assert!(screen.contains("Failed to load articles"));
        assert!(screen.contains("retry"));
    }

    #[tokio::test]
    async fn test_confirm_overlay() {
        let (mut app, _tx, _rx) = test_app(true);
        app.view = View::Articles;
        app.pending_confirm = Some(ConfirmAction::DeleteArticle {
            id: ArticleId::from("1"),
            title: "Old news".to_string(),
        });
        let screen = draw(&mut app, 100, 24);
        assert!(screen.contains("Delete \"Old news\"?"));
    }

    #[tokio::test]
    async fn test_editor_screen() {
        let (mut app, tx, _rx) = test_app(true);
        app.navigate(Route::Publish, &tx);
        let screen = draw(&mut app, 100, 30);
        assert!(screen.contains("Publish article"));
        assert!(screen.contains("Title"));
        assert!(screen.contains("Channel"));
        assert!(screen.contains("Cover"));
    }
}
