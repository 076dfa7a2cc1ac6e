//! HTTP client for the publishing API.

mod client;
mod error;
mod types;

pub use client::ApiClient;
pub use error::{ApiError, MSG_SESSION_EXPIRED};
pub use types::{
    ArticleDetail, ArticleId, ArticlePage, ArticleRef, ArticleStatus, ArticleSummary,
    ArticleUpdate, Channel, Cover, CoverUpdate, CoverUpload, LoginResponse, NewArticle,
    UserProfile,
};

#[cfg(test)]
pub(crate) use types::RawArticlePage;
