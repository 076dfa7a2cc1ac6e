//! Login form state and validation.

use crate::validation::ValidationError;
use regex::Regex;
use std::sync::LazyLock;

/// Verification code accepted by the demo backend, shown as a hint.
pub const DEFAULT_CODE_HINT: &str = "246810";

static MOBILE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^1[3-9]\d{9}$").ok());

/// Mainland mobile number: 11 digits, starting 13x-19x.
pub fn is_valid_mobile(mobile: &str) -> bool {
    MOBILE_RE.as_ref().is_some_and(|re| re.is_match(mobile))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Mobile,
    Code,
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub mobile: String,
    pub code: String,
    pub focus: LoginField,
    /// A login request is in flight; input and submit are disabled.
    pub submitting: bool,
}

impl LoginForm {
    /// Check the fields in display order. Returns the credentials to send.
    pub fn validate(&self) -> Result<(&str, &str), ValidationError> {
        if self.mobile.is_empty() {
            return Err(ValidationError::MissingMobile);
        }
        if !is_valid_mobile(&self.mobile) {
            return Err(ValidationError::InvalidMobile);
        }
        if self.code.is_empty() {
            return Err(ValidationError::MissingCode);
        }
        Ok((&self.mobile, &self.code))
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            LoginField::Mobile => LoginField::Code,
            LoginField::Code => LoginField::Mobile,
        };
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            LoginField::Mobile => &mut self.mobile,
            LoginField::Code => &mut self.code,
        }
    }

    pub fn insert_char(&mut self, c: char) {
        if self.submitting || c.is_control() {
            return;
        }
        self.focused_mut().push(c);
    }

    pub fn backspace(&mut self) {
        if self.submitting {
            return;
        }
        self.focused_mut().pop();
    }

    /// Forget the typed credentials (after logout or a successful login).
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
