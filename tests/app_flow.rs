//! Application flows driven through the event channel against a mock API:
//! login and redirect, authentication loss, pagination, delete and publish.
//!
//! Background tasks post `AppEvent`s exactly as in the TUI; `pump` feeds
//! them to `handle_app_event` until the state under test settles.

use pressdesk::api::{ApiClient, ArticleId, UserProfile};
use pressdesk::app::{App, AppEvent, Route, StatusKind, View, MSG_DELETED};
use pressdesk::config::Config;
use pressdesk::query::LoadState;
use pressdesk::session::SessionStore;
use pressdesk::ui::handle_app_event;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"message": "OK", "data": data}))
}

fn page_of(ids: &[&str], page: u32, total_count: u64) -> serde_json::Value {
    let results: Vec<_> = ids
        .iter()
        .map(|id| json!({"id": id, "title": format!("Article {id}"), "status": 1}))
        .collect();
    json!({"results": results, "page": page, "per_page": 10, "total_count": total_count})
}

async fn mount_channels(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/channels"))
        .respond_with(ok(json!({"channels": [
            {"id": 1, "name": "news"},
            {"id": 2, "name": "rust"}
        ]})))
        .mount(server)
        .await;
}

struct Harness {
    app: App,
    tx: mpsc::Sender<AppEvent>,
    rx: mpsc::Receiver<AppEvent>,
}

impl Harness {
    fn new(server: &MockServer, logged_in: bool) -> Self {
        let session = SessionStore::in_memory();
        if logged_in {
            session
                .set_session("flow-token".to_string(), UserProfile::default())
                .unwrap();
        }
        let api = ApiClient::new(&server.uri(), session).unwrap();
        let config = Config {
            login_redirect_ms: 0,
            publish_redirect_ms: 0,
            ..Config::default()
        };
        let (tx, rx) = mpsc::channel(32);
        Self {
            app: App::new(config, api),
            tx,
            rx,
        }
    }

    /// Handle events until `done` holds. Panics after five seconds.
    async fn pump(&mut self, done: impl Fn(&App) -> bool) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !done(&self.app) {
            let event = tokio::time::timeout_at(deadline, self.rx.recv())
                .await
                .expect("timed out waiting for app state")
                .expect("event channel closed");
            handle_app_event(&mut self.app, event, &self.tx);
        }
    }

    fn status(&self) -> Option<(String, StatusKind)> {
        self.app
            .status_message
            .as_ref()
            .map(|(msg, kind, _)| (msg.to_string(), *kind))
    }

    fn list_ids(&self) -> Vec<String> {
        self.app.list.items.iter().map(|a| a.id.0.clone()).collect()
    }
}

fn list_ready(app: &App) -> bool {
    app.list.load == LoadState::Ready
}

#[tokio::test]
async fn login_stores_session_and_redirects_to_list() {
    let server = MockServer::start().await;
    mount_channels(&server).await;
    Mock::given(method("POST"))
        .and(path("/authorizations"))
        .and(body_partial_json(json!({"mobile": "13800000000", "code": "246810"})))
        .respond_with(ok(json!({"token": "t-1", "user": {"name": "Ada"}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mp/articles"))
        .respond_with(ok(page_of(&["1"], 1, 1)))
        .mount(&server)
        .await;

    let mut h = Harness::new(&server, false);
    h.app.navigate(Route::Articles, &h.tx);
    assert_eq!(h.app.view, View::Login);

    h.app.login.mobile = "13800000000".to_string();
    h.app.login.code = "246810".to_string();
    h.app.submit_login(&h.tx);
    assert!(h.app.login.submitting);

    h.pump(|app| app.view == View::Articles && list_ready(app)).await;

    assert!(h.app.session.is_authenticated());
    assert_eq!(h.app.session.user().unwrap().display_name(), "Ada");
    assert_eq!(h.list_ids(), vec!["1"]);
}

#[tokio::test]
async fn malformed_mobile_never_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ok(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let mut h = Harness::new(&server, false);
    h.app.login.mobile = "23800000000".to_string();
    h.app.login.code = "246810".to_string();
    h.app.submit_login(&h.tx);

    assert!(!h.app.login.submitting);
    assert_eq!(
        h.status(),
        Some(("Invalid mobile number format".to_string(), StatusKind::Error))
    );
}

#[tokio::test]
async fn expired_token_routes_back_to_login() {
    let server = MockServer::start().await;
    mount_channels(&server).await;
    Mock::given(method("GET"))
        .and(path("/mp/articles"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut h = Harness::new(&server, true);
    h.app.navigate(Route::Articles, &h.tx);
    h.pump(|app| app.view == View::Login).await;

    assert!(!h.app.session.is_authenticated());
    assert_eq!(
        h.status(),
        Some((
            "Session expired, please log in again".to_string(),
            StatusKind::Error
        ))
    );

    // Protected routes stay closed afterwards
    h.app.navigate(Route::Publish, &h.tx);
    assert_eq!(h.app.view, View::Login);
}

#[tokio::test]
async fn paging_fetches_requested_page_and_ignores_out_of_range() {
    let server = MockServer::start().await;
    mount_channels(&server).await;
    Mock::given(method("GET"))
        .and(path("/mp/articles"))
        .and(query_param("page", "1"))
        .respond_with(ok(page_of(&["1", "2"], 1, 25)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mp/articles"))
        .and(query_param("page", "3"))
        .respond_with(ok(page_of(&["21"], 3, 25)))
        .expect(1)
        .mount(&server)
        .await;

    let mut h = Harness::new(&server, true);
    h.app.navigate(Route::Articles, &h.tx);
    h.pump(list_ready).await;
    assert_eq!(h.app.list.total_pages, 3);

    assert!(!h.app.list.request_page(0));
    assert!(!h.app.list.request_page(4));
    assert_eq!(h.app.list.page(), 1);

    assert!(h.app.list.last_page());
    h.app.load_articles(&h.tx);
    h.pump(list_ready).await;

    assert_eq!(h.app.list.page(), 3);
    assert_eq!(h.list_ids(), vec!["21"]);
}

#[tokio::test]
async fn superseded_fetch_does_not_overwrite_newer_page() {
    let server = MockServer::start().await;
    mount_channels(&server).await;
    Mock::given(method("GET"))
        .and(path("/mp/articles"))
        .and(query_param("page", "1"))
        .respond_with(ok(page_of(&["1"], 1, 25)).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mp/articles"))
        .and(query_param("page", "2"))
        .respond_with(ok(page_of(&["11"], 2, 25)))
        .mount(&server)
        .await;

    let mut h = Harness::new(&server, true);
    h.app.navigate(Route::Articles, &h.tx);
    h.pump(list_ready).await;

    // Reload page 1 (slow), then immediately switch to page 2
    h.app.load_articles(&h.tx);
    assert!(h.app.list.next_page());
    h.app.load_articles(&h.tx);
    h.pump(list_ready).await;

    tokio::time::sleep(Duration::from_millis(400)).await;
    while let Ok(event) = h.rx.try_recv() {
        handle_app_event(&mut h.app, event, &h.tx);
    }

    assert_eq!(h.app.list.page(), 2);
    assert_eq!(h.list_ids(), vec!["11"]);
}

#[tokio::test]
async fn confirmed_delete_refetches_same_page_without_the_article() {
    let server = MockServer::start().await;
    mount_channels(&server).await;
    Mock::given(method("GET"))
        .and(path("/mp/articles"))
        .respond_with(ok(page_of(&["1", "2", "3"], 1, 3)))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mp/articles"))
        .and(query_param("page", "1"))
        .respond_with(ok(page_of(&["1", "3"], 1, 2)))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/mp/articles/2"))
        .respond_with(ok(json!(null)))
        .expect(1)
        .mount(&server)
        .await;

    let mut h = Harness::new(&server, true);
    h.app.navigate(Route::Articles, &h.tx);
    h.pump(list_ready).await;

    h.app.list.nav_down();
    h.app.request_delete(&h.tx);
    assert!(h.app.pending_confirm.is_some());
    h.app.resolve_confirm(true, &h.tx);
    assert!(h.app.deleting);

    h.pump(|app| !app.deleting && list_ready(app)).await;

    assert_eq!(h.status(), Some((MSG_DELETED.to_string(), StatusKind::Success)));
    assert_eq!(h.app.list.page(), 1);
    assert_eq!(h.list_ids(), vec!["1", "3"]);
}

#[tokio::test]
async fn cancelled_delete_sends_nothing() {
    let server = MockServer::start().await;
    mount_channels(&server).await;
    Mock::given(method("GET"))
        .and(path("/mp/articles"))
        .respond_with(ok(page_of(&["1"], 1, 1)))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ok(json!(null)))
        .expect(0)
        .mount(&server)
        .await;

    let mut h = Harness::new(&server, true);
    h.app.navigate(Route::Articles, &h.tx);
    h.pump(list_ready).await;

    h.app.request_delete(&h.tx);
    h.app.resolve_confirm(false, &h.tx);
    assert!(h.app.pending_confirm.is_none());
    assert!(!h.app.deleting);
}

#[tokio::test]
async fn publish_then_return_to_list() {
    let server = MockServer::start().await;
    mount_channels(&server).await;
    Mock::given(method("POST"))
        .and(path("/mp/articles"))
        .and(body_partial_json(json!({"title": "T", "channel_id": 2, "content": "C"})))
        .respond_with(ok(json!({"id": "55"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mp/articles"))
        .respond_with(ok(page_of(&["55"], 1, 1)))
        .mount(&server)
        .await;

    let mut h = Harness::new(&server, true);
    h.app.navigate(Route::Publish, &h.tx);
    h.pump(|app| !app.channels.is_empty()).await;

    let editor = h.app.editor.as_mut().unwrap();
    editor.draft.title = "T".to_string();
    editor.draft.channel_id = Some(2);
    editor.draft.content = "C".to_string();
    h.app.submit_draft(&h.tx);
    assert!(h.app.editor.as_ref().unwrap().submitting);

    h.pump(|app| app.view == View::Articles && list_ready(app)).await;
    assert_eq!(h.list_ids(), vec!["55"]);
}

#[tokio::test]
async fn edit_prefills_form_from_server() {
    let server = MockServer::start().await;
    mount_channels(&server).await;
    Mock::given(method("GET"))
        .and(path("/mp/articles/8"))
        .respond_with(ok(json!({
            "id": 8,
            "title": "Existing",
            "channel_id": 1,
            "content": "<p>Body</p>",
            "cover": {"type": 1, "images": ["https://img.example.com/c.png"]}
        })))
        .mount(&server)
        .await;

    let mut h = Harness::new(&server, true);
    h.app.navigate(Route::Edit(ArticleId::from("8")), &h.tx);
    assert!(h.app.editor.as_ref().unwrap().loading);

    h.pump(|app| app.editor.as_ref().is_some_and(|e| !e.loading)).await;

    let draft = &h.app.editor.as_ref().unwrap().draft;
    assert_eq!(draft.title, "Existing");
    assert_eq!(draft.channel_id, Some(1));
    assert_eq!(draft.content, "<p>Body</p>");
}
