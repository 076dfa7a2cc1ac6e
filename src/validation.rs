use thiserror::Error;

/// Client-side form errors. They block submission; the message is shown
/// inline as-is.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter your mobile number")]
    MissingMobile,
    #[error("Invalid mobile number format")]
    InvalidMobile,
    #[error("Please enter the verification code")]
    MissingCode,
    #[error("Please log in first")]
    NotLoggedIn,
    #[error("Please enter a title")]
    MissingTitle,
    #[error("Please select a channel")]
    MissingChannel,
    #[error("Please enter the article content")]
    MissingContent,
}
