use super::error::ApiError;
use super::types::{
    ArticleDetail, ArticleId, ArticlePage, ArticleRef, Channel, ChannelList, CoverUpdate,
    Envelope, ErrorBody, LoginRequest, LoginResponse, NewArticle, RawArticlePage,
    ArticleUpdate,
};
use crate::query::ListQuery;
use crate::session::SessionStore;
use crate::util::{validate_api_base, UrlValidationError};
use futures::StreamExt;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::redirect::Policy;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

const MAX_RESPONSE_SIZE: usize = 5 * 1024 * 1024; // 5MB

/// Error bodies are only mined for their `message`.
const MAX_ERROR_BODY_SIZE: usize = 64 * 1024;

/// `cover` field of an update that removes the cover.
const REMOVED_COVER_JSON: &str = r#"{"type":0,"images":[]}"#;

/// Redirect policy: at most 3 hops, loops rejected.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        for prev in attempt.previous() {
            if prev.as_str() == url.as_str() {
                return attempt.error("Redirect loop detected");
            }
        }

        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );

        attempt.follow()
    })
}

/// Client for the publishing API.
///
/// Cloning shares the connection pool and the session store, so spawned
/// tasks each take their own handle.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(base_url: &str, session: SessionStore) -> Result<Self, ApiError> {
        let base = validate_api_base(base_url)?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(UrlValidationError::NotABase));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("pressdesk/", env!("CARGO_PKG_VERSION")))
            .redirect(create_redirect_policy())
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(std::time::Duration::from_secs(30))
            .build()?;

        tracing::info!(base_url = %base, "API client ready");
        Ok(Self {
            http,
            base,
            session,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    /// `POST /authorizations`. The caller stores the returned session.
    pub async fn login(&self, mobile: &str, code: &str) -> Result<LoginResponse, ApiError> {
        let request = self.json_request(
            Method::POST,
            &["authorizations"],
            &LoginRequest { mobile, code },
        )?;
        self.send(request, "login").await
    }

    /// `GET /mp/articles` with the query's page, filters and sort.
    pub async fn list_articles(&self, query: &ListQuery) -> Result<ArticlePage, ApiError> {
        let mut url = self.endpoint(&["mp", "articles"]);
        url.query_pairs_mut().extend_pairs(query.params().iter());

        let raw: RawArticlePage = self
            .send(self.http.get(url), "list_articles")
            .await?;
        let page = raw.into_page(query.page, query.page_size);
        tracing::debug!(
            page = page.page,
            total_pages = page.total_pages,
            items = page.items.len(),
            "Fetched article page"
        );
        Ok(page)
    }

    pub async fn get_article(&self, id: &ArticleId) -> Result<ArticleDetail, ApiError> {
        let url = self.endpoint(&["mp", "articles", &id.0]);
        self.send(self.http.get(url), "get_article").await
    }

    /// `POST /mp/articles` with a JSON body.
    pub async fn create_article(&self, article: &NewArticle) -> Result<ArticleRef, ApiError> {
        let request = self.json_request(Method::POST, &["mp", "articles"], article)?;
        let created: ArticleRef = self.send(request, "create_article").await?;
        tracing::info!(article_id = %created.id, "Article created");
        Ok(created)
    }

    /// `PUT /mp/articles/{id}` as multipart form data.
    ///
    /// A kept cover sends no `cover` field; a removed cover sends the empty
    /// cover object as text; a new cover is attached as a file.
    pub async fn update_article(
        &self,
        id: &ArticleId,
        update: ArticleUpdate,
    ) -> Result<ArticleRef, ApiError> {
        let form = Form::new()
            .text("title", update.title)
            .text("content", update.content)
            .text("channel_id", update.channel_id.to_string());
        let form = match update.cover {
            CoverUpdate::Keep => form,
            CoverUpdate::Remove => form.text("cover", REMOVED_COVER_JSON),
            CoverUpdate::Upload(upload) => {
                let part = Part::bytes(upload.bytes)
                    .file_name(upload.file_name)
                    .mime_str(upload.mime)?;
                form.part("cover", part)
            }
        };

        let url = self.endpoint(&["mp", "articles", &id.0]);
        let updated: Option<ArticleRef> = self
            .send(self.http.put(url).multipart(form), "update_article")
            .await?;
        tracing::info!(article_id = %id, "Article updated");
        Ok(updated.unwrap_or_else(|| ArticleRef { id: id.clone() }))
    }

    /// `DELETE /mp/articles/{id}`. Any 2xx counts, with or without a body.
    pub async fn delete_article(&self, id: &ArticleId) -> Result<(), ApiError> {
        let url = self.endpoint(&["mp", "articles", &id.0]);
        self.execute(self.http.delete(url), "delete_article").await?;
        tracing::info!(article_id = %id, "Article deleted");
        Ok(())
    }

    pub async fn list_channels(&self) -> Result<Vec<Channel>, ApiError> {
        let url = self.endpoint(&["channels"]);
        let list: ChannelList = self.send(self.http.get(url), "list_channels").await?;
        Ok(list.channels)
    }

    // ------------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------------

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // Checked in `new`: the base always has a path
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn json_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<RequestBuilder, ApiError> {
        let body = serde_json::to_vec(body)?;
        Ok(self
            .http
            .request(method, self.endpoint(segments))
            .header(CONTENT_TYPE, "application/json")
            .body(body))
    }

    /// Execute and unwrap the `data` field of the envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        op: &'static str,
    ) -> Result<T, ApiError> {
        let body = self.execute(request, op).await?;
        serde_json::from_slice::<Envelope<T>>(&body)
            .map(|envelope| envelope.data)
            .map_err(|e| {
                tracing::warn!(op, error = %e, "Malformed response body");
                ApiError::Decode(e.to_string())
            })
    }

    /// Execute with the bearer token attached and map non-2xx statuses.
    async fn execute(&self, request: RequestBuilder, op: &'static str) -> Result<Vec<u8>, ApiError> {
        let request = match self.session.bearer() {
            Some(bearer) => request.header(AUTHORIZATION, bearer),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            tracing::warn!(op, error = %e, "Request failed");
            ApiError::Network(e)
        })?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            let message = read_error_message(response).await;
            if let Err(e) = self.session.clear() {
                tracing::warn!(error = %e, "Failed to remove session file");
            }
            tracing::warn!(op, "Authentication rejected, session cleared");
            return Err(ApiError::Unauthorized { message });
        }

        if !status.is_success() {
            let message = read_error_message(response).await;
            tracing::warn!(op, status = status.as_u16(), "Request returned error status");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        tracing::debug!(op, status = status.as_u16(), "Request succeeded");
        read_limited(response, MAX_RESPONSE_SIZE).await
    }
}

/// Best-effort `message` from an error body.
async fn read_error_message(response: reqwest::Response) -> Option<String> {
    let body = read_limited(response, MAX_ERROR_BODY_SIZE).await.ok()?;
    serde_json::from_slice::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
}

async fn read_limited(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, ApiError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
