//! Application event handling.
//!
//! Background tasks report back through the `AppEvent` channel; this module
//! folds each result into the application state.

use crate::api::{ApiError, ArticleDetail, ArticleId, ArticleRef, LoginResponse};
use crate::app::{
    App, AppEvent, ArticlePurpose, DetailState, Route, View, MSG_DELETED, MSG_DELETE_FAILED,
    MSG_LIST_FAILED, MSG_LOGIN_FAILED, MSG_LOGIN_SUCCESS,
};
use crate::editor::{EditorMode, MSG_ARTICLE_LOAD_FAILED, MSG_CHANNELS_LOAD_FAILED};
use tokio::sync::mpsc;

/// Handle application events from background tasks.
pub fn handle_app_event(app: &mut App, event: AppEvent, event_tx: &mpsc::Sender<AppEvent>) {
    app.needs_redraw = true;
    match event {
        AppEvent::LoginCompleted(result) => handle_login_completed(app, result, event_tx),
        AppEvent::ArticlesLoaded { generation, result } => {
            if generation != app.list.generation() {
                tracing::debug!(generation, "Ignoring superseded article list result");
                return;
            }
            app.list_load_finished();
            match result {
                Err(e) if e.is_unauthorized() => app.handle_auth_failure(event_tx),
                Ok(page) => {
                    tracing::debug!(
                        page = page.page,
                        total_pages = page.total_pages,
                        items = page.items.len(),
                        "Article list loaded"
                    );
                    app.list.finish_load(generation, Ok(page));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to load article list");
                    app.list
                        .finish_load(generation, Err(e.user_message(MSG_LIST_FAILED)));
                }
            }
        }
        AppEvent::ChannelsLoaded(result) => match result {
            Ok(channels) => {
                tracing::debug!(count = channels.len(), "Channels loaded");
                app.channels = channels;
            }
            Err(e) if e.is_unauthorized() => app.handle_auth_failure(event_tx),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load channels");
                let message = e.user_message(MSG_CHANNELS_LOAD_FAILED);
                let in_editor = app.view == View::Editor;
                match app.editor.as_mut() {
                    Some(editor) if in_editor => editor.error = Some(message),
                    _ => app.set_error(message),
                }
            }
        },
        AppEvent::ArticleLoaded {
            id,
            purpose,
            result,
        } => handle_article_loaded(app, id, purpose, result, event_tx),
        AppEvent::ArticleDeleted { id, result } => {
            app.deleting = false;
            match result {
                Ok(()) => {
                    tracing::info!(article_id = %id, "Article deleted");
                    app.set_success(MSG_DELETED);
                    if app.view == View::Articles {
                        // Same page again, even if it is now empty
                        app.load_articles(event_tx);
                    }
                }
                Err(e) if e.is_unauthorized() => app.handle_auth_failure(event_tx),
                Err(e) => {
                    tracing::warn!(article_id = %id, error = %e, "Failed to delete article");
                    app.set_error(e.user_message(MSG_DELETE_FAILED));
                }
            }
        }
        AppEvent::DraftSubmitted { mode, result } => {
            handle_draft_submitted(app, mode, result, event_tx)
        }
        AppEvent::RedirectDue(route) => {
            if app.pending_redirect.as_ref() == Some(&route) {
                app.navigate(route, event_tx);
            } else {
                tracing::debug!(route = ?route, "Redirect cancelled by navigation");
            }
        }
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error, "Background task panicked");
            reset_after_panic(app, task);
            app.set_error(format!("Internal error in {} task", task));
        }
    }
}

fn handle_login_completed(
    app: &mut App,
    result: Result<LoginResponse, ApiError>,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    app.login.submitting = false;
    match result {
        Ok(response) => {
            tracing::info!(user = %response.user.display_name(), "Login succeeded");
            if let Err(e) = app.session.set_session(response.token, response.user) {
                tracing::warn!(error = %e, "Failed to persist session");
            }
            app.login.reset();
            app.set_success(MSG_LOGIN_SUCCESS);
            let delay = app.config.login_redirect();
            app.schedule_redirect(Route::Articles, delay, event_tx);
        }
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            // A 401 here is rejected credentials, not an expired session
            let message = match &e {
                ApiError::Unauthorized { message } => message
                    .as_deref()
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| MSG_LOGIN_FAILED.to_string()),
                other => other.user_message(MSG_LOGIN_FAILED),
            };
            app.set_error(message);
        }
    }
}

fn handle_article_loaded(
    app: &mut App,
    id: ArticleId,
    purpose: ArticlePurpose,
    result: Result<ArticleDetail, ApiError>,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    match purpose {
        ArticlePurpose::Detail => {
            let current = matches!(
                (&app.detail, app.view),
                (Some(DetailState::Loading(current)), View::Detail) if *current == id
            );
            if !current {
                tracing::debug!(article_id = %id, "Dropping detail for a view already left");
                return;
            }
            match result {
                Ok(article) => app.apply_detail(article),
                Err(e) if e.is_unauthorized() => app.handle_auth_failure(event_tx),
                Err(e) => {
                    tracing::warn!(article_id = %id, error = %e, "Failed to load article");
                    app.detail = Some(DetailState::Failed {
                        id,
                        error: e.user_message(MSG_ARTICLE_LOAD_FAILED),
                    });
                }
            }
        }
        ArticlePurpose::Edit => {
            let Some(editor) = app.editor.as_mut().filter(|e| e.editing(&id)) else {
                tracing::debug!(article_id = %id, "Dropping article for an editor already closed");
                return;
            };
            match result {
                Ok(article) => editor.apply_detail(&article),
                Err(e) if e.is_unauthorized() => app.handle_auth_failure(event_tx),
                Err(e) => {
                    tracing::warn!(article_id = %id, error = %e, "Failed to load article for editing");
                    // Stays locked: submitting a blank form would wipe the article
                    editor.error = Some(e.user_message(MSG_ARTICLE_LOAD_FAILED));
                }
            }
        }
    }
}

fn handle_draft_submitted(
    app: &mut App,
    mode: EditorMode,
    result: Result<ArticleRef, ApiError>,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let Some(editor) = app.editor.as_mut().filter(|e| e.mode == mode) else {
        tracing::debug!(mode = ?mode, "Dropping submit result for an editor already closed");
        return;
    };
    editor.submitting = false;
    match result {
        Ok(article) => {
            tracing::info!(article_id = %article.id, mode = ?mode, "Draft submitted");
            editor.submitted = true;
            editor.error = None;
            let delay = app.config.publish_redirect();
            let message = editor.success_message(delay);
            app.set_success(message);
            app.schedule_redirect(Route::Articles, delay, event_tx);
        }
        Err(e) if e.is_unauthorized() => app.handle_auth_failure(event_tx),
        Err(e) => {
            tracing::warn!(mode = ?mode, error = %e, "Failed to submit draft");
            editor.error = Some(e.user_message(editor.failure_fallback()));
        }
    }
}

/// Clear the busy flag a panicked task would have cleared on completion.
fn reset_after_panic(app: &mut App, task: &str) {
    match task {
        "login" => app.login.submitting = false,
        "list_articles" => {
            app.list_load_finished();
            let generation = app.list.generation();
            app.list
                .finish_load(generation, Err(MSG_LIST_FAILED.to_string()));
        }
        "delete_article" => app.deleting = false,
        "submit_draft" => {
            if let Some(editor) = &mut app.editor {
                editor.submitting = false;
            }
        }
        "get_article" => {
            if let Some(DetailState::Loading(id)) = &app.detail {
                app.detail = Some(DetailState::Failed {
                    id: id.clone(),
                    error: MSG_ARTICLE_LOAD_FAILED.to_string(),
                });
            }
            if let Some(editor) = &mut app.editor {
                if editor.loading {
                    editor.error = Some(MSG_ARTICLE_LOAD_FAILED.to_string());
                }
            }
        }
        _ => {}
    }
}
