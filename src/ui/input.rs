//! Input handling for the TUI.
//!
//! Overlays (help, confirmation, cover path and page prompts) capture all keys while
//! open; otherwise the key is resolved through the keybinding registry for
//! the current view and anything unbound is typed into the focused field.

use crate::app::{App, AppEvent, DetailState, Route, View};
use crate::editor::EditorField;
use crate::keybindings::{Action as KbAction, Context as KbContext};
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::Action;

/// Lines moved by a page scroll in the detail view.
const DETAIL_PAGE: usize = 10;

/// Main input dispatch function.
pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    if app.show_help {
        return handle_help_input(app, code);
    }

    if app.pending_confirm.is_some() {
        handle_confirm_input(app, code, event_tx);
        return Action::Continue;
    }

    if app
        .editor
        .as_ref()
        .is_some_and(|e| e.cover_prompt.is_some())
    {
        handle_cover_prompt_input(app, code, modifiers);
        return Action::Continue;
    }

    if app.view == View::Articles && app.list.page_prompt.is_some() {
        handle_page_prompt_input(app, code, event_tx);
        return Action::Continue;
    }

    let context = current_context(app);
    let action = app.keybindings.action_for_key(code, modifiers, context);

    if let Some(action) = action {
        if let Some(result) = handle_global(app, action, event_tx) {
            return result;
        }
    }

    match app.view {
        View::Login => handle_login_input(app, action, code, modifiers, event_tx),
        View::Articles => handle_articles_input(app, action, event_tx),
        View::Detail => handle_detail_input(app, action, event_tx),
        View::Editor => handle_editor_input(app, action, code, modifiers, event_tx),
    }
    Action::Continue
}

/// Keybinding context for the current view and focus.
pub(super) fn current_context(app: &App) -> KbContext {
    match app.view {
        View::Login => KbContext::Login,
        View::Articles => KbContext::Articles,
        View::Detail => KbContext::Detail,
        View::Editor => match app.editor.as_ref().map(|e| e.focus) {
            Some(EditorField::Channel) | Some(EditorField::Cover) => KbContext::EditorChoice,
            _ => KbContext::Editor,
        },
    }
}

/// Character to type into a text field, if the key is one.
fn typed_char(code: KeyCode, modifiers: KeyModifiers) -> Option<char> {
    match code {
        KeyCode::Char(c) if !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            Some(c)
        }
        _ => None,
    }
}

/// Actions that work the same in every view. Returns `None` for anything
/// view-specific.
fn handle_global(
    app: &mut App,
    action: KbAction,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Option<Action> {
    match action {
        KbAction::Quit => return Some(Action::Quit),
        KbAction::ShowHelp => {
            app.show_help = true;
            app.help_scroll_offset = 0;
        }
        KbAction::ToggleSidebar => app.sidebar_collapsed = !app.sidebar_collapsed,
        KbAction::GoContent => app.navigate(Route::Articles, event_tx),
        KbAction::GoPublish => app.navigate(Route::Publish, event_tx),
        KbAction::Logout => {
            if app.session.is_authenticated() {
                app.logout(event_tx);
            }
        }
        _ => return None,
    }
    Some(Action::Continue)
}

/// Handle input while the help overlay is visible.
///
/// Captures all keys: j/k/Up/Down scroll, Esc/q/?/F1 dismiss.
fn handle_help_input(app: &mut App, code: KeyCode) -> Action {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') | KeyCode::F(1) => {
            app.show_help = false;
            app.help_scroll_offset = 0;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_sub(1);
        }
        _ => {}
    }
    Action::Continue
}

/// Handle input while a confirmation dialog is visible.
///
/// y confirms; n or Esc cancels. Other keys are ignored.
fn handle_confirm_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    match code {
        KeyCode::Char('y') | KeyCode::Char('Y') => app.resolve_confirm(true, event_tx),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.resolve_confirm(false, event_tx)
        }
        _ => {}
    }
}

fn handle_cover_prompt_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    let max_bytes = app.config.cover_max_bytes;
    let Some(editor) = app.editor.as_mut() else {
        return;
    };
    match code {
        KeyCode::Esc => editor.cancel_cover_prompt(),
        KeyCode::Enter => editor.confirm_cover_prompt(max_bytes),
        KeyCode::Backspace => editor.backspace(),
        _ => {
            if let Some(c) = typed_char(code, modifiers) {
                editor.insert_char(c);
            }
        }
    }
}

fn handle_page_prompt_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    match code {
        KeyCode::Esc => app.list.cancel_page_prompt(),
        KeyCode::Enter => {
            if app.list.confirm_page_prompt() {
                app.load_articles(event_tx);
            }
        }
        KeyCode::Backspace => app.list.page_prompt_backspace(),
        KeyCode::Char(c) => app.list.page_prompt_push(c),
        _ => {}
    }
}

fn handle_login_input(
    app: &mut App,
    action: Option<KbAction>,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    match action {
        Some(KbAction::Submit) => app.submit_login(event_tx),
        Some(KbAction::NextField) => app.login.toggle_focus(),
        Some(_) => {}
        None => match code {
            KeyCode::Backspace => app.login.backspace(),
            _ => {
                if let Some(c) = typed_char(code, modifiers) {
                    app.login.insert_char(c);
                }
            }
        },
    }
}

fn handle_articles_input(
    app: &mut App,
    action: Option<KbAction>,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let Some(action) = action else {
        return;
    };
    let reload = match action {
        KbAction::NavDown => {
            app.list.nav_down();
            false
        }
        KbAction::NavUp => {
            app.list.nav_up();
            false
        }
        KbAction::OpenDetail => {
            if let Some(id) = app.list.selected_item().map(|item| item.id.clone()) {
                app.navigate(Route::Detail(id), event_tx);
            }
            false
        }
        KbAction::EditArticle => {
            if let Some(id) = app.list.selected_item().map(|item| item.id.clone()) {
                app.navigate(Route::Edit(id), event_tx);
            }
            false
        }
        KbAction::DeleteArticle => {
            app.request_delete(event_tx);
            false
        }
        KbAction::CycleStatusFilter => {
            let next = app.list.query.status.next();
            let changed = app.list.set_status_filter(next);
            if changed {
                tracing::debug!(status = next.label(), "Status filter changed");
            }
            changed
        }
        KbAction::CycleChannelFilter => {
            let next = app.next_channel_filter();
            app.list.set_channel_filter(next)
        }
        KbAction::HeaderLeft => {
            app.list.move_header_cursor(false);
            false
        }
        KbAction::HeaderRight => {
            app.list.move_header_cursor(true);
            false
        }
        KbAction::ToggleSort => {
            let field = app.list.header_field();
            app.list.toggle_sort(field);
            true
        }
        KbAction::NextPage => app.list.next_page(),
        KbAction::PrevPage => app.list.prev_page(),
        KbAction::FirstPage => app.list.first_page(),
        KbAction::LastPage => app.list.last_page(),
        KbAction::GoToPage => {
            app.list.open_page_prompt();
            false
        }
        KbAction::Refresh => true,
        _ => false,
    };
    if reload {
        app.load_articles(event_tx);
    }
}

fn handle_detail_input(
    app: &mut App,
    action: Option<KbAction>,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let Some(action) = action else {
        return;
    };
    match action {
        KbAction::Back => app.navigate(Route::Articles, event_tx),
        KbAction::ScrollDown => app.detail_scroll = app.detail_scroll.saturating_add(1),
        KbAction::ScrollUp => app.detail_scroll = app.detail_scroll.saturating_sub(1),
        KbAction::PageDown => app.detail_scroll = app.detail_scroll.saturating_add(DETAIL_PAGE),
        KbAction::PageUp => app.detail_scroll = app.detail_scroll.saturating_sub(DETAIL_PAGE),
        KbAction::EditArticle => {
            if let Some(id) = app.detail.as_ref().map(|d| d.id().clone()) {
                app.navigate(Route::Edit(id), event_tx);
            }
        }
        KbAction::OpenCover => app.open_cover(),
        KbAction::Refresh => {
            if let Some(id) = app.detail.as_ref().map(DetailState::id).cloned() {
                app.navigate(Route::Detail(id), event_tx);
            }
        }
        _ => {}
    }
}

fn handle_editor_input(
    app: &mut App,
    action: Option<KbAction>,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    match action {
        Some(KbAction::Back) => {
            app.navigate(Route::Articles, event_tx);
            return;
        }
        Some(KbAction::Submit) => {
            app.submit_draft(event_tx);
            return;
        }
        _ => {}
    }

    let Some(editor) = app.editor.as_mut() else {
        return;
    };
    match action {
        Some(KbAction::NextField) => editor.next_field(),
        Some(KbAction::PrevField) => editor.prev_field(),
        Some(KbAction::NextChoice) | Some(KbAction::PrevChoice) => {
            let forward = action == Some(KbAction::NextChoice);
            if editor.focus == EditorField::Channel {
                editor.cycle_channel(&app.channels, forward);
            }
        }
        Some(KbAction::ChooseCover) => {
            if editor.focus == EditorField::Cover {
                editor.open_cover_prompt();
            }
        }
        Some(KbAction::RemoveCover) => {
            if editor.focus == EditorField::Cover {
                editor.remove_cover();
            }
        }
        Some(_) => {}
        None => match (code, editor.focus) {
            (KeyCode::Backspace, _) => editor.backspace(),
            (KeyCode::Enter, EditorField::Content) => editor.insert_char('\n'),
            (KeyCode::Enter, EditorField::Title) => editor.next_field(),
            _ => {
                if let Some(c) = typed_char(code, modifiers) {
                    editor.insert_char(c);
                }
            }
        },
    }
}
