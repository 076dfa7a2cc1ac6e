use crate::api::{
    ApiClient, ApiError, ArticleDetail, ArticleId, ArticlePage, ArticleRef, Channel,
    LoginResponse, MSG_SESSION_EXPIRED,
};
use crate::config::Config;
use crate::editor::{EditorMode, EditorState};
use crate::keybindings::KeybindingRegistry;
use crate::login::LoginForm;
use crate::query::ListState;
use crate::session::SessionStore;
use crate::theme::Theme;
use crate::ui::helpers::spawn_task;
use crate::util::{html_to_text, validate_url_for_open};
use std::borrow::Cow;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const MSG_LOGIN_SUCCESS: &str = "Login successful! Redirecting...";
pub const MSG_LOGIN_FAILED: &str = "Login failed, please try again";
pub const MSG_LIST_FAILED: &str = "Failed to load articles";
pub const MSG_DELETE_FAILED: &str = "Failed to delete article";
pub const MSG_DELETED: &str = "Article deleted";
pub const MSG_LOGGED_OUT: &str = "Logged out";

/// How long a status message stays up.
const STATUS_TTL: Duration = Duration::from_secs(3);

// ============================================================================
// Routing
// ============================================================================

/// Navigation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Articles,
    Detail(ArticleId),
    Publish,
    Edit(ArticleId),
}

impl Route {
    /// Everything but the login screen needs a session.
    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login)
    }
}

/// Screen currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Articles,
    Detail,
    Editor,
}

/// Article detail view state.
#[derive(Debug, Clone)]
pub enum DetailState {
    Loading(ArticleId),
    Loaded {
        article: ArticleDetail,
        /// Body converted from HTML once, on arrival.
        body: String,
    },
    Failed {
        id: ArticleId,
        error: String,
    },
}

impl DetailState {
    pub fn id(&self) -> &ArticleId {
        match self {
            DetailState::Loading(id) | DetailState::Failed { id, .. } => id,
            DetailState::Loaded { article, .. } => &article.id,
        }
    }
}

/// Why an article was fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticlePurpose {
    Detail,
    Edit,
}

/// Pending confirmation for destructive operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteArticle { id: ArticleId, title: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// Events from background tasks
#[derive(Debug)]
pub enum AppEvent {
    LoginCompleted(Result<LoginResponse, ApiError>),
    /// A list fetch finished. `generation` is the value `ListState::begin_load`
    /// returned when the fetch was spawned.
    ArticlesLoaded {
        generation: u64,
        result: Result<ArticlePage, ApiError>,
    },
    ChannelsLoaded(Result<Vec<Channel>, ApiError>),
    ArticleLoaded {
        id: ArticleId,
        purpose: ArticlePurpose,
        result: Result<ArticleDetail, ApiError>,
    },
    ArticleDeleted {
        id: ArticleId,
        result: Result<(), ApiError>,
    },
    DraftSubmitted {
        mode: EditorMode,
        result: Result<ArticleRef, ApiError>,
    },
    /// Delay after a successful login or publish has elapsed.
    RedirectDue(Route),
    /// A background task panicked.
    ///
    /// Fields:
    /// - `task`: Name of the task that panicked (e.g., "login", "list_articles")
    /// - `error`: The panic message extracted from the panic payload
    TaskPanicked {
        task: &'static str,
        error: String,
    },
}

// ============================================================================
// Application State
// ============================================================================

/// Central application state
pub struct App {
    pub config: Config,
    pub api: ApiClient,
    pub session: SessionStore,
    pub theme: Theme,
    pub keybindings: KeybindingRegistry,

    pub view: View,
    pub login: LoginForm,
    pub list: ListState,
    /// Reference data for filters and the editor's channel picker.
    pub channels: Vec<Channel>,
    pub detail: Option<DetailState>,
    pub detail_scroll: usize,
    pub editor: Option<EditorState>,

    /// When set, input is routed to the confirmation overlay.
    pub pending_confirm: Option<ConfirmAction>,
    /// A delete request is in flight; further deletes are refused.
    pub deleting: bool,

    /// Status message with its kind and creation time (expires after 3s).
    pub status_message: Option<(Cow<'static, str>, StatusKind, Instant)>,

    /// Route a delayed redirect will switch to, unless navigation happens first.
    pub pending_redirect: Option<Route>,

    pub sidebar_collapsed: bool,
    pub show_help: bool,
    pub help_scroll_offset: usize,

    /// Dirty flag to skip unnecessary frame renders
    pub needs_redraw: bool,
    /// Current frame of the loading spinner animation.
    pub spinner_frame: usize,

    /// Handle to the in-flight list fetch, aborted when a newer one starts.
    list_handle: Option<JoinHandle<()>>,
}

impl App {
    pub fn new(config: Config, api: ApiClient) -> Self {
        let session = api.session().clone();
        let list = ListState::new(config.per_page);
        Self {
            config,
            api,
            session,
            theme: Theme::default(),
            keybindings: KeybindingRegistry::new(),
            view: View::Login,
            login: LoginForm::default(),
            list,
            channels: Vec::new(),
            detail: None,
            detail_scroll: 0,
            editor: None,
            pending_confirm: None,
            deleting: false,
            status_message: None,
            pending_redirect: None,
            sidebar_collapsed: false,
            show_help: false,
            help_scroll_offset: 0,
            needs_redraw: true,
            spinner_frame: 0,
            list_handle: None,
        }
    }

    // ------------------------------------------------------------------------
    // Status messages
    // ------------------------------------------------------------------------

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.set_status_kind(msg, StatusKind::Info);
    }

    pub fn set_error(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.set_status_kind(msg, StatusKind::Error);
    }

    pub fn set_success(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.set_status_kind(msg, StatusKind::Success);
    }

    fn set_status_kind(&mut self, msg: impl Into<Cow<'static, str>>, kind: StatusKind) {
        self.status_message = Some((msg.into(), kind, Instant::now()));
        self.needs_redraw = true;
    }

    /// Clear status message if expired.
    /// Returns true if a message was actually cleared
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, _, time)) = &self.status_message {
            if time.elapsed() >= STATUS_TTL {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    /// Any request the user is waiting on.
    pub fn is_busy(&self) -> bool {
        self.list.is_loading()
            || self.login.submitting
            || self.deleting
            || matches!(self.detail, Some(DetailState::Loading(_)))
            || self
                .editor
                .as_ref()
                .is_some_and(|e| e.loading || e.submitting)
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Switch views. Protected routes fall back to login without a session.
    /// Every view re-fetches its data on entry.
    pub fn navigate(&mut self, route: Route, tx: &mpsc::Sender<AppEvent>) {
        self.pending_redirect = None;
        self.pending_confirm = None;
        self.show_help = false;

        let route = if route.is_protected() && !self.session.is_authenticated() {
            tracing::info!(route = ?route, "No session, routing to login");
            Route::Login
        } else {
            route
        };

        if route != Route::Articles {
            self.abort_list_load();
        }
        tracing::debug!(route = ?route, "Navigating");

        match route {
            Route::Login => {
                self.view = View::Login;
                self.login.submitting = false;
                self.detail = None;
                self.editor = None;
            }
            Route::Articles => {
                self.view = View::Articles;
                self.detail = None;
                self.editor = None;
                self.load_channels(tx);
                self.load_articles(tx);
            }
            Route::Detail(id) => {
                self.view = View::Detail;
                self.detail_scroll = 0;
                self.detail = Some(DetailState::Loading(id.clone()));
                self.fetch_article(id, ArticlePurpose::Detail, tx);
            }
            Route::Publish => {
                self.view = View::Editor;
                self.editor = Some(EditorState::create());
                self.load_channels(tx);
            }
            Route::Edit(id) => {
                self.view = View::Editor;
                self.editor = Some(EditorState::update(id.clone()));
                self.load_channels(tx);
                self.fetch_article(id, ArticlePurpose::Edit, tx);
            }
        }
        self.needs_redraw = true;
    }

    /// Switch to `route` after `delay`, unless the user navigates first.
    pub fn schedule_redirect(&mut self, route: Route, delay: Duration, tx: &mpsc::Sender<AppEvent>) {
        self.pending_redirect = Some(route.clone());
        spawn_task(tx, "redirect", async move {
            tokio::time::sleep(delay).await;
            AppEvent::RedirectDue(route)
        });
    }

    /// 401 from any call: the client already cleared the session.
    pub fn handle_auth_failure(&mut self, tx: &mpsc::Sender<AppEvent>) {
        tracing::warn!("Authentication failed, returning to login");
        if let Err(e) = self.session.clear() {
            tracing::warn!(error = %e, "Failed to remove session file");
        }
        self.deleting = false;
        self.navigate(Route::Login, tx);
        self.set_error(MSG_SESSION_EXPIRED);
    }

    pub fn logout(&mut self, tx: &mpsc::Sender<AppEvent>) {
        if let Err(e) = self.session.clear() {
            tracing::warn!(error = %e, "Failed to remove session file");
        }
        tracing::info!("Logged out");
        self.login.reset();
        self.list = ListState::new(self.config.per_page);
        self.deleting = false;
        self.navigate(Route::Login, tx);
        self.set_status(MSG_LOGGED_OUT);
    }

    // ------------------------------------------------------------------------
    // Login
    // ------------------------------------------------------------------------

    /// Validate the form and send the credentials.
    pub fn submit_login(&mut self, tx: &mpsc::Sender<AppEvent>) {
        if self.login.submitting {
            return;
        }
        let (mobile, code) = match self.login.validate() {
            Ok((m, c)) => (m.to_string(), c.to_string()),
            Err(e) => {
                self.set_error(e.to_string());
                return;
            }
        };

        self.login.submitting = true;
        self.status_message = None;
        let api = self.api.clone();
        tracing::info!("Submitting login");
        spawn_task(tx, "login", async move {
            AppEvent::LoginCompleted(api.login(&mobile, &code).await)
        });
    }

    // ------------------------------------------------------------------------
    // Article list
    // ------------------------------------------------------------------------

    /// Fetch the current query. A fetch already in flight is aborted and its
    /// result, should it still arrive, is discarded by generation.
    pub fn load_articles(&mut self, tx: &mpsc::Sender<AppEvent>) {
        self.abort_list_load();
        let generation = self.list.begin_load();
        let query = self.list.query.clone();
        let api = self.api.clone();

        tracing::debug!(page = query.page, generation, "Spawning article list fetch");
        self.list_handle = Some(spawn_task(tx, "list_articles", async move {
            let result = api.list_articles(&query).await;
            AppEvent::ArticlesLoaded { generation, result }
        }));
    }

    fn abort_list_load(&mut self) {
        if let Some(handle) = self.list_handle.take() {
            handle.abort();
            tracing::debug!("Aborted article list fetch");
        }
    }

    pub(crate) fn list_load_finished(&mut self) {
        self.list_handle = None;
    }

    pub fn load_channels(&mut self, tx: &mpsc::Sender<AppEvent>) {
        let api = self.api.clone();
        spawn_task(tx, "list_channels", async move {
            AppEvent::ChannelsLoaded(api.list_channels().await)
        });
    }

    pub fn channel_name(&self, id: Option<i64>) -> Option<&str> {
        let id = id?;
        self.channels
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.as_str())
    }

    /// Next channel filter: none → each channel in order → none.
    pub fn next_channel_filter(&self) -> Option<i64> {
        match self.list.query.channel {
            None => self.channels.first().map(|c| c.id),
            Some(current) => {
                let idx = self.channels.iter().position(|c| c.id == current)?;
                self.channels.get(idx + 1).map(|c| c.id)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Detail
    // ------------------------------------------------------------------------

    fn fetch_article(&mut self, id: ArticleId, purpose: ArticlePurpose, tx: &mpsc::Sender<AppEvent>) {
        let api = self.api.clone();
        tracing::debug!(article_id = %id, ?purpose, "Fetching article");
        spawn_task(tx, "get_article", async move {
            let result = api.get_article(&id).await;
            AppEvent::ArticleLoaded {
                id,
                purpose,
                result,
            }
        });
    }

    pub(crate) fn apply_detail(&mut self, article: ArticleDetail) {
        let body = html_to_text(&article.content);
        self.detail = Some(DetailState::Loaded { article, body });
    }

    /// Hand the detail view's cover URL to the system opener.
    pub fn open_cover(&mut self) {
        let Some(DetailState::Loaded { article, .. }) = &self.detail else {
            return;
        };
        let Some(url) = article.cover.first_image().map(str::to_string) else {
            self.set_status("Article has no cover image");
            return;
        };
        // Validate before open::that() so only http(s) reaches the OS
        if let Err(e) = validate_url_for_open(&url) {
            self.set_error(e.to_string());
        } else if let Err(e) = open::that(&url) {
            self.set_error(format!("Failed to open browser: {}", e));
        } else {
            self.set_status("Opening cover image...");
        }
    }

    // ------------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------------

    /// Ask to delete the highlighted article (or delete it straight away when
    /// confirmation is turned off).
    pub fn request_delete(&mut self, tx: &mpsc::Sender<AppEvent>) {
        if self.deleting {
            return;
        }
        let Some(item) = self.list.selected_item() else {
            return;
        };
        let action = ConfirmAction::DeleteArticle {
            id: item.id.clone(),
            title: item.title.clone(),
        };
        if self.config.confirm_delete {
            self.pending_confirm = Some(action);
        } else {
            self.run_confirmed(action, tx);
        }
    }

    /// Answer the confirmation overlay.
    pub fn resolve_confirm(&mut self, confirmed: bool, tx: &mpsc::Sender<AppEvent>) {
        let Some(action) = self.pending_confirm.take() else {
            return;
        };
        if confirmed {
            self.run_confirmed(action, tx);
        }
    }

    fn run_confirmed(&mut self, action: ConfirmAction, tx: &mpsc::Sender<AppEvent>) {
        match action {
            ConfirmAction::DeleteArticle { id, title } => {
                self.deleting = true;
                self.set_status(format!("Deleting \"{}\"...", title));
                let api = self.api.clone();
                tracing::info!(article_id = %id, "Deleting article");
                spawn_task(tx, "delete_article", async move {
                    let result = api.delete_article(&id).await;
                    AppEvent::ArticleDeleted { id, result }
                });
            }
        }
    }

    // ------------------------------------------------------------------------
    // Editor
    // ------------------------------------------------------------------------

    /// Validate the draft and publish or update it.
    pub fn submit_draft(&mut self, tx: &mpsc::Sender<AppEvent>) {
        let authenticated = self.session.is_authenticated();
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        if editor.is_locked() {
            return;
        }

        let api = self.api.clone();
        let mode = editor.mode.clone();
        match &mode {
            EditorMode::Create => {
                let body = match editor.draft.to_new_article(authenticated) {
                    Ok(body) => body,
                    Err(e) => {
                        editor.error = Some(e.to_string());
                        return;
                    }
                };
                editor.error = None;
                editor.submitting = true;
                tracing::info!("Publishing article");
                spawn_task(tx, "submit_draft", async move {
                    let result = api.create_article(&body).await;
                    AppEvent::DraftSubmitted { mode, result }
                });
            }
            EditorMode::Update(id) => {
                let update = match editor.draft.to_update(authenticated) {
                    Ok(update) => update,
                    Err(e) => {
                        editor.error = Some(e.to_string());
                        return;
                    }
                };
                editor.error = None;
                editor.submitting = true;
                let id = id.clone();
                tracing::info!(article_id = %id, "Updating article");
                spawn_task(tx, "submit_draft", async move {
                    let result = api.update_article(&id, update).await;
                    AppEvent::DraftSubmitted { mode, result }
                });
            }
        }
    }
}

// ============================================================================
// Resource Cleanup
// ============================================================================

/// Abort the in-flight list fetch on App drop.
impl Drop for App {
    fn drop(&mut self) {
        self.abort_list_load();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::UserProfile;

    /// App whose API points at a closed local port; nothing here awaits a
    /// response.
    fn test_app(logged_in: bool) -> (App, mpsc::Sender<AppEvent>, mpsc::Receiver<AppEvent>) {
        let session = SessionStore::in_memory();
        if logged_in {
            session
                .set_session("tok".to_string(), UserProfile::default())
                .unwrap();
        }
        let api = ApiClient::new("http://127.0.0.1:9", session).unwrap();
        let (tx, rx) = mpsc::channel(16);
        (App::new(Config::default(), api), tx, rx)
    }

    fn summary(id: &str, title: &str) -> crate::api::ArticleSummary {
        serde_json::from_value(serde_json::json!({"id": id, "title": title})).unwrap()
    }

    #[tokio::test]
    async fn test_protected_routes_need_session() {
        let (mut app, tx, _rx) = test_app(false);
        for route in [
            Route::Articles,
            Route::Publish,
            Route::Detail(ArticleId::from("1")),
            Route::Edit(ArticleId::from("1")),
        ] {
            app.navigate(route, &tx);
            assert_eq!(app.view, View::Login);
        }
    }

    #[tokio::test]
    async fn test_navigate_with_session() {
        let (mut app, tx, _rx) = test_app(true);
        app.navigate(Route::Articles, &tx);
        assert_eq!(app.view, View::Articles);
        assert!(app.list.is_loading());

        app.navigate(Route::Edit(ArticleId::from("3")), &tx);
        assert_eq!(app.view, View::Editor);
        let editor = app.editor.as_ref().unwrap();
        assert!(editor.editing(&ArticleId::from("3")));
        assert!(editor.loading);

        app.navigate(Route::Publish, &tx);
        assert!(!app.editor.as_ref().unwrap().is_update());
    }

    #[tokio::test]
    async fn test_login_validation_blocks_request() {
        let (mut app, tx, mut rx) = test_app(false);
        app.login.mobile = "12345".to_string();
        app.login.code = "246810".to_string();
        app.submit_login(&tx);

        assert!(!app.login.submitting);
        let (msg, kind, _) = app.status_message.clone().unwrap();
        assert_eq!(msg, "Invalid mobile number format");
        assert_eq!(kind, StatusKind::Error);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_delete_needs_confirmation() {
        let (mut app, tx, _rx) = test_app(true);
        app.list.items = vec![summary("8", "Doomed")];
        app.request_delete(&tx);
        assert_eq!(
            app.pending_confirm,
            Some(ConfirmAction::DeleteArticle {
                id: ArticleId::from("8"),
                title: "Doomed".to_string()
            })
        );
        assert!(!app.deleting);

        app.resolve_confirm(false, &tx);
        assert!(app.pending_confirm.is_none());
        assert!(!app.deleting);

        app.request_delete(&tx);
        app.resolve_confirm(true, &tx);
        assert!(app.deleting);
        // In flight: a second request is refused
        app.request_delete(&tx);
        assert!(app.pending_confirm.is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let (mut app, tx, _rx) = test_app(true);
        app.navigate(Route::Articles, &tx);
        app.logout(&tx);
        assert!(!app.session.is_authenticated());
        assert_eq!(app.view, View::Login);
        assert_eq!(app.list.page(), 1);
    }

    #[tokio::test]
    async fn test_navigation_cancels_redirect() {
        let (mut app, tx, _rx) = test_app(true);
        app.schedule_redirect(Route::Articles, Duration::from_secs(60), &tx);
        assert_eq!(app.pending_redirect, Some(Route::Articles));
        app.navigate(Route::Publish, &tx);
        assert!(app.pending_redirect.is_none());
    }

    #[tokio::test]
    async fn test_draft_validation_shown_in_editor() {
        let (mut app, tx, mut rx) = test_app(true);
        app.navigate(Route::Publish, &tx);
        app.submit_draft(&tx);
        let editor = app.editor.as_ref().unwrap();
        assert_eq!(editor.error.as_deref(), Some("Please enter a title"));
        assert!(!editor.submitting);
        // Only the channel fetch went out
        drop(tx);
        let mut events = 0;
        while rx.recv().await.is_some() {
            events += 1;
        }
        assert_eq!(events, 1);
    }

    #[tokio::test]
    async fn test_next_channel_filter_cycles() {
        let (mut app, _tx, _rx) = test_app(true);
        app.channels = vec![
            Channel { id: 1, name: "a".to_string() },
            Channel { id: 2, name: "b".to_string() },
        ];
        assert_eq!(app.next_channel_filter(), Some(1));
        app.list.query.channel = Some(1);
        assert_eq!(app.next_channel_filter(), Some(2));
        app.list.query.channel = Some(2);
        assert_eq!(app.next_channel_filter(), None);
        assert_eq!(app.channel_name(Some(2)), Some("b"));
    }

    #[test]
    fn test_status_expiry() {
        let session = SessionStore::in_memory();
        let api = ApiClient::new("http://127.0.0.1:9", session).unwrap();
        let mut app = App::new(Config::default(), api);
        app.set_status("hello");
        assert!(!app.clear_expired_status());
        app.status_message = Some((
            Cow::Borrowed("old"),
            StatusKind::Info,
            Instant::now() - Duration::from_secs(4),
        ));
        assert!(app.clear_expired_status());
        assert!(app.status_message.is_none());
    }
}
