//! Wire types for the publishing API.
//!
//! Every response is wrapped as `{ "message": ..., "data": ... }`. Ids show
//! up as JSON strings on some endpoints and numbers on others, so the id
//! fields accept both.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ============================================================================
// Lenient scalar helpers
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Str(String),
    Int(i64),
    Float(f64),
}

impl StringOrNumber {
    fn into_string(self) -> String {
        match self {
            StringOrNumber::Str(s) => s,
            StringOrNumber::Int(n) => n.to_string(),
            StringOrNumber::Float(f) => f.to_string(),
        }
    }

    fn into_i64(self) -> Option<i64> {
        match self {
            StringOrNumber::Str(s) => s.trim().parse().ok(),
            StringOrNumber::Int(n) => Some(n),
            StringOrNumber::Float(f) => Some(f as i64),
        }
    }
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(StringOrNumber::into_string))
}

fn opt_i64_lenient<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.and_then(StringOrNumber::into_i64))
}

fn u64_or_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?
        .and_then(StringOrNumber::into_i64)
        .map(|n| n.max(0) as u64)
        .unwrap_or(0))
}

// ============================================================================
// Envelope
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[allow(dead_code)]
    #[serde(default)]
    pub message: Option<String>,
    pub data: T,
}

/// Error body; only the message is used.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

// ============================================================================
// Users and login
// ============================================================================

/// Cached profile of the logged-in operator.
///
/// Only `name` is rendered; everything else the server sends is kept in
/// `extra` so the session file round-trips it untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, deserialize_with = "opt_string_or_number", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserProfile {
    /// Name to show in the UI, "User" when the server sent none.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("User")
    }

    /// Single upper-case letter used as the avatar.
    pub fn initial(&self) -> String {
        self.name
            .as_deref()
            .and_then(|n| n.trim().chars().next())
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_else(|| "U".to_string())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub mobile: &'a str,
    pub code: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: UserProfile,
}

// ============================================================================
// Articles
// ============================================================================

/// Server-assigned article id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ArticleId(pub String);

impl<'de> Deserialize<'de> for ArticleId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(ArticleId(StringOrNumber::deserialize(deserializer)?.into_string()))
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArticleId {
    fn from(s: &str) -> Self {
        ArticleId(s.to_string())
    }
}

/// Moderation state of an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArticleStatus {
    Rejected,
    Pending,
    Approved,
    #[default]
    Unknown,
}

impl ArticleStatus {
    pub const ALL: [ArticleStatus; 3] = [
        ArticleStatus::Rejected,
        ArticleStatus::Pending,
        ArticleStatus::Approved,
    ];

    pub fn code(self) -> Option<i64> {
        match self {
            ArticleStatus::Rejected => Some(0),
            ArticleStatus::Pending => Some(1),
            ArticleStatus::Approved => Some(2),
            ArticleStatus::Unknown => None,
        }
    }

    pub fn from_code(code: i64) -> Self {
        match code {
            0 => ArticleStatus::Rejected,
            1 => ArticleStatus::Pending,
            2 => ArticleStatus::Approved,
            _ => ArticleStatus::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ArticleStatus::Rejected => "Rejected",
            ArticleStatus::Pending => "Pending",
            ArticleStatus::Approved => "Approved",
            ArticleStatus::Unknown => "Unknown",
        }
    }
}

impl<'de> Deserialize<'de> for ArticleStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(opt_i64_lenient(deserializer)?
            .map(ArticleStatus::from_code)
            .unwrap_or_default())
    }
}

/// Cover image list with its type flag (0 = none, 1 = single image).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cover {
    #[serde(rename = "type", default)]
    pub kind: i64,
    #[serde(default)]
    pub images: Vec<String>,
}

impl Cover {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn single(url: String) -> Self {
        Self {
            kind: 1,
            images: vec![url],
        }
    }

    /// First non-empty image URL.
    pub fn first_image(&self) -> Option<&str> {
        self.images
            .iter()
            .map(|s| s.as_str())
            .find(|s| !s.trim().is_empty())
    }
}

/// Covers arrive as the full object, a bare URL string, or null.
fn lenient_cover<'de, D>(deserializer: D) -> Result<Cover, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum CoverRepr {
        Full(Cover),
        Url(String),
    }

    Ok(match Option::<CoverRepr>::deserialize(deserializer)? {
        Some(CoverRepr::Full(cover)) => cover,
        Some(CoverRepr::Url(url)) if !url.trim().is_empty() => Cover::single(url),
        _ => Cover::none(),
    })
}

/// One row of the article list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArticleSummary {
    pub id: ArticleId,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_cover")]
    pub cover: Cover,
    #[serde(default)]
    pub status: ArticleStatus,
    #[serde(default)]
    pub pubdate: Option<String>,
    #[serde(default, deserialize_with = "u64_or_zero")]
    pub read_count: u64,
    #[serde(default, deserialize_with = "u64_or_zero")]
    pub comment_count: u64,
    #[serde(default, deserialize_with = "u64_or_zero")]
    pub like_count: u64,
    #[serde(default, deserialize_with = "opt_i64_lenient")]
    pub channel_id: Option<i64>,
}

/// Full article, as returned by `GET /mp/articles/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArticleDetail {
    pub id: ArticleId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "opt_i64_lenient")]
    pub channel_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_cover")]
    pub cover: Cover,
    #[serde(default)]
    pub status: ArticleStatus,
    #[serde(default)]
    pub pubdate: Option<String>,
    #[serde(default, deserialize_with = "u64_or_zero")]
    pub read_count: u64,
    #[serde(default, deserialize_with = "u64_or_zero")]
    pub comment_count: u64,
    #[serde(default, deserialize_with = "u64_or_zero")]
    pub like_count: u64,
}

/// Id of a created or updated article.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArticleRef {
    pub id: ArticleId,
}

/// Body of `POST /mp/articles`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub channel_id: i64,
    pub cover: Cover,
}

/// Image file attached to an update.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverUpload {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// What an update does with the cover.
#[derive(Debug, Clone, PartialEq)]
pub enum CoverUpdate {
    /// Existing cover untouched; no `cover` field is sent.
    Keep,
    /// Cover removed; sends `{"type":0,"images":[]}`.
    Remove,
    /// New image file.
    Upload(CoverUpload),
}

/// Fields of `PUT /mp/articles/{id}` (sent as multipart).
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleUpdate {
    pub title: String,
    pub content: String,
    pub channel_id: i64,
    pub cover: CoverUpdate,
}

// ============================================================================
// Pages
// ============================================================================

/// List response as the server sends it.
#[derive(Debug, Deserialize)]
pub(crate) struct RawArticlePage {
    #[serde(default)]
    pub results: Vec<ArticleSummary>,
    #[serde(default, alias = "page")]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl RawArticlePage {
    /// Fill in missing pagination fields.
    ///
    /// `current_page` falls back to the requested page and is kept even when
    /// it lies past `total_pages`, which is derived from
    /// `total_count / per_page` when absent and is never below 1.
    pub fn into_page(self, requested_page: u32, requested_per_page: u32) -> ArticlePage {
        let total_count = self.total_count.unwrap_or(self.results.len() as u64);
        let per_page = self
            .per_page
            .filter(|&p| p > 0)
            .unwrap_or(requested_per_page)
            .max(1) as u64;
        let total_pages = match self.total_pages {
            Some(n) if n > 0 => n,
            _ => total_count.div_ceil(per_page).min(u32::MAX as u64) as u32,
        }
        .max(1);
        let page = self
            .current_page
            .filter(|&p| p > 0)
            .unwrap_or(requested_page)
            .max(1);

        ArticlePage {
            items: self.results,
            page,
            total_pages,
            total_count,
        }
    }
}

/// One page of the article list.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticlePage {
    pub items: Vec<ArticleSummary>,
    pub page: u32,
    pub total_pages: u32,
    pub total_count: u64,
}

// ============================================================================
// Channels
// ============================================================================

/// Topical category of an article.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Channel {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChannelList {
    #[serde(default)]
    pub channels: Vec<Channel>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_summary_accepts_string_and_numeric_ids() {
        let a: ArticleSummary = serde_json::from_value(json!({"id": "8012", "title": "A"})).unwrap();
        let b: ArticleSummary = serde_json::from_value(json!({"id": 8012, "title": "B"})).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.id.to_string(), "8012");
    }

    #[test]
    fn test_summary_full_row() {
        let row: ArticleSummary = serde_json::from_value(json!({
            "id": "1",
            "title": "Hello",
            "status": 2,
            "pubdate": "2024-03-01 09:30:00",
            "cover": {"type": 1, "images": ["https://img.example.com/1.png"]},
            "read_count": 10,
            "comment_count": "3",
            "like_count": null
        }))
        .unwrap();
        assert_eq!(row.status, ArticleStatus::Approved);
        assert_eq!(row.read_count, 10);
        assert_eq!(row.comment_count, 3);
        assert_eq!(row.like_count, 0);
        assert_eq!(row.cover.first_image(), Some("https://img.example.com/1.png"));
    }

    #[test]
    fn test_status_codes() {
        for status in ArticleStatus::ALL {
            let code = status.code().unwrap();
            assert_eq!(ArticleStatus::from_code(code), status);
        }
        assert_eq!(ArticleStatus::from_code(9), ArticleStatus::Unknown);
        let row: ArticleSummary = serde_json::from_value(json!({"id": 1, "status": "1"})).unwrap();
        assert_eq!(row.status, ArticleStatus::Pending);
    }

    #[test]
    fn test_cover_variants() {
        let as_string: ArticleDetail =
            serde_json::from_value(json!({"id": 1, "cover": "https://x/y.png"})).unwrap();
        assert_eq!(as_string.cover, Cover::single("https://x/y.png".to_string()));

        let as_null: ArticleDetail = serde_json::from_value(json!({"id": 1, "cover": null})).unwrap();
        assert_eq!(as_null.cover, Cover::none());

        let empty_images: ArticleDetail =
            serde_json::from_value(json!({"id": 1, "cover": {"type": 1, "images": [""]}})).unwrap();
        assert_eq!(empty_images.cover.first_image(), None);
    }

    #[test]
    fn test_detail_channel_id_as_string() {
        let d: ArticleDetail =
            serde_json::from_value(json!({"id": "9", "channel_id": "2", "content": "<p>C</p>"}))
                .unwrap();
        assert_eq!(d.channel_id, Some(2));
        assert_eq!(d.content, "<p>C</p>");
    }

    #[test]
    fn test_new_article_serializes_cover_type() {
        let body = NewArticle {
            title: "T".to_string(),
            content: "C".to_string(),
            channel_id: 2,
            cover: Cover::none(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"title": "T", "content": "C", "channel_id": 2, "cover": {"type": 0, "images": []}})
        );
    }

    #[test]
    fn test_page_uses_server_fields() {
        let raw: RawArticlePage = serde_json::from_value(json!({
            "results": [],
            "current_page": 3,
            "total_pages": 7,
            "total_count": 65
        }))
        .unwrap();
        let page = raw.into_page(1, 10);
        assert_eq!((page.page, page.total_pages, page.total_count), (3, 7, 65));
    }

    #[test]
    fn test_page_derives_missing_fields() {
        let raw: RawArticlePage = serde_json::from_value(json!({
            "results": [],
            "page": 2,
            "per_page": 10,
            "total_count": 21
        }))
        .unwrap();
        let page = raw.into_page(2, 10);
        assert_eq!((page.page, page.total_pages), (2, 3));

        let empty: RawArticlePage = serde_json::from_value(json!({})).unwrap();
        let page = empty.into_page(1, 10);
        assert_eq!((page.page, page.total_pages, page.total_count), (1, 1, 0));
    }

    #[test]
    fn test_page_past_end_is_kept() {
        let raw: RawArticlePage = serde_json::from_value(json!({
            "results": [],
            "current_page": 3,
            "per_page": 10,
            "total_count": 20
        }))
        .unwrap();
        let page = raw.into_page(3, 10);
        assert_eq!((page.page, page.total_pages, page.total_count), (3, 2, 20));
    }

    #[test]
    fn test_login_response_ignores_extra_tokens() {
        let login: LoginResponse = serde_json::from_value(json!({
            "token": "abc",
            "refresh_token": "def",
            "user": {"name": "editor"}
        }))
        .unwrap();
        assert_eq!(login.token, "abc");
        assert_eq!(login.user.initial(), "E");
    }

    #[test]
    fn test_user_profile_keeps_unknown_fields() {
        let user: UserProfile = serde_json::from_value(json!({
            "id": 1111,
            "name": "editor",
            "photo": "https://x/p.png",
            "intro": "hi"
        }))
        .unwrap();
        assert_eq!(user.id.as_deref(), Some("1111"));
        assert_eq!(user.initial(), "E");
        assert_eq!(user.extra.get("intro"), Some(&json!("hi")));

        let back = serde_json::to_value(&user).unwrap();
        assert_eq!(back["intro"], json!("hi"));
    }

    #[test]
    fn test_user_profile_fallbacks() {
        let user = UserProfile::default();
        assert_eq!(user.display_name(), "User");
        assert_eq!(user.initial(), "U");
    }
}
