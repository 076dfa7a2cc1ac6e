//! Utility functions for common operations.
//!
//! - **URL validation**: API base URL policy and safe opening of cover links
//! - **Text processing**: Unicode-aware truncation, control-character
//!   stripping and HTML-to-text conversion for article bodies

mod text;
mod url_validator;

pub use text::{display_width, fit_to_width, html_to_text, strip_control_chars, truncate_to_width};
pub use url_validator::{validate_api_base, validate_url_for_open, UrlValidationError};
