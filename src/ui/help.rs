//! Help overlay: scrollable keybinding table grouped by context, with the
//! bindings for the screen underneath listed first.

use crate::app::App;
use crate::keybindings::Context;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table},
    Frame,
};

use super::helpers::centered_rect;
use super::input::current_context;

/// Current screen's section first, then the rest in registry order.
fn section_order(current: Context) -> Vec<Context> {
    std::iter::once(current)
        .chain(Context::ALL.into_iter().filter(|c| *c != current))
        .collect()
}

/// Render the help overlay on top of the current view.
pub fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    let overlay = centered_rect(area.width / 5 * 4, area.height / 5 * 4, area);
    if overlay.width < 20 || overlay.height < 6 {
        return;
    }

    f.render_widget(Clear, overlay);

    let bindings = app.keybindings.all_bindings();
    let mut rows: Vec<Row> = Vec::new();

    let current = current_context(app);

    for ctx in section_order(current) {
        let ctx_bindings: Vec<_> = bindings.iter().filter(|(c, _, _)| *c == ctx).collect();
        if ctx_bindings.is_empty() {
            continue;
        }

        let marker = if ctx == current { " (this screen)" } else { "" };
        rows.push(
            Row::new(vec![
                Line::from(Span::styled(
                    format!("-- {}{} --", ctx.title(), marker),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
            ])
            .style(app.theme.heading),
        );

        for (_, keys, description) in ctx_bindings {
            rows.push(Row::new(vec![format!("  {}", keys), description.to_string()]));
        }

        rows.push(Row::new(vec![String::new(), String::new()]));
    }

    // Text fields take any printable key
    rows.push(Row::new(vec![
        "  (other keys)".to_string(),
        "Type into the focused field".to_string(),
    ]));

    let total_rows = rows.len();
    let visible_height = overlay.height.saturating_sub(3) as usize; // -2 border -1 header
    let max_scroll = total_rows.saturating_sub(visible_height);
    let scroll = app.help_scroll_offset.min(max_scroll);
    let visible_rows: Vec<Row> = rows.into_iter().skip(scroll).take(visible_height).collect();

    let title = if max_scroll > 0 {
        format!(
            " Help ({}/{}) ",
            scroll.saturating_add(1),
            max_scroll.saturating_add(1)
        )
    } else {
        " Help (? to close) ".to_string()
    };

    let widths = [Constraint::Length(24), Constraint::Min(20)];

    let table = Table::new(visible_rows, widths)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.theme.panel_border_focused)
                .title(title),
        )
        .header(
            Row::new(vec!["Key", "Action"])
                .style(
                    Style::default()
                        .add_modifier(Modifier::BOLD)
                        .add_modifier(Modifier::UNDERLINED),
                ),
        )
        .style(app.theme.body);

    f.render_widget(table, overlay);

    if max_scroll > 0 && scroll < max_scroll {
        let hint = Line::from(vec![Span::styled(
            " j/k to scroll, ? or Esc to close ",
            app.theme.muted,
        )]);
        let hint_area = Rect {
            x: overlay.x + 1,
            y: overlay.y + overlay.height.saturating_sub(1),
            width: overlay.width.saturating_sub(2),
            height: 1,
        };
        f.render_widget(Paragraph::new(hint), hint_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_section_comes_first() {
        let order = section_order(Context::Detail);
        assert_eq!(order[0], Context::Detail);
        assert_eq!(order.len(), Context::ALL.len());
        assert_eq!(order.iter().filter(|c| **c == Context::Detail).count(), 1);
    }
}
