//! Article editor: draft state, cover selection and submission payloads.
//!
//! The same editor serves both "publish" (create) and "edit" (update). The
//! difference shows up only at submission: create sends JSON with the cover
//! inlined as a data URL, update sends multipart with the cover as a file.

use crate::api::{
    ArticleDetail, ArticleId, ArticleUpdate, Channel, Cover, CoverUpdate, CoverUpload,
    NewArticle,
};
use crate::validation::ValidationError;
use base64::Engine;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const MSG_PUBLISHED: &str = "Published!";
pub const MSG_UPDATED: &str = "Updated!";
pub const MSG_PUBLISH_FAILED: &str = "Publish failed";
pub const MSG_UPDATE_FAILED: &str = "Update failed";
pub const MSG_ARTICLE_LOAD_FAILED: &str = "Failed to load article";
pub const MSG_CHANNELS_LOAD_FAILED: &str = "Failed to load channels";

/// Bytes needed to recognise every supported image format.
const SNIFF_LEN: u64 = 16;

// ============================================================================
// Cover files
// ============================================================================

#[derive(Debug, Error)]
pub enum CoverError {
    #[error("Please choose an image file")]
    NotAnImage,

    #[error("Image must not exceed {}", human_size(.limit))]
    TooLarge { limit: u64 },

    #[error("Failed to read image file: {0}")]
    Io(#[from] std::io::Error),
}

fn human_size(bytes: &u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    match *bytes {
        b if b >= MB && b % MB == 0 => format!("{}MB", b / MB),
        b if b >= MB => format!("{:.1}MB", b as f64 / MB as f64),
        b if b >= KB => format!("{}KB", b / KB),
        b => format!("{}B", b),
    }
}

/// MIME type of an image, recognised from its leading bytes.
pub fn sniff_image_mime(head: &[u8]) -> Option<&'static str> {
    if head.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if head.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if head.starts_with(b"GIF87a") || head.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if head.len() >= 12 && &head[..4] == b"RIFF" && &head[8..12] == b"WEBP" {
        Some("image/webp")
    } else if head.starts_with(b"BM") {
        Some("image/bmp")
    } else {
        None
    }
}

/// `~/` at the start of a typed path means the home directory.
pub fn expand_home(input: &str) -> PathBuf {
    let input = input.trim();
    match (input.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(input),
    }
}

/// Image file picked as the new cover, with its local preview.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverFile {
    pub name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
    /// `data:<mime>;base64,...`
    pub data_url: String,
}

impl CoverFile {
    /// Read and check an image file: type first, then size.
    pub fn load(path: &Path, max_bytes: u64) -> Result<Self, CoverError> {
        let meta = std::fs::metadata(path)?;
        if !meta.is_file() {
            return Err(CoverError::NotAnImage);
        }

        let mut file = std::fs::File::open(path)?;
        let mut bytes = Vec::new();
        (&mut file).take(SNIFF_LEN).read_to_end(&mut bytes)?;
        let mime = sniff_image_mime(&bytes).ok_or(CoverError::NotAnImage)?;

        if meta.len() > max_bytes {
            return Err(CoverError::TooLarge { limit: max_bytes });
        }
        // The file may have grown since the metadata call
        file.take(max_bytes.saturating_add(1)).read_to_end(&mut bytes)?;
        if bytes.len() as u64 > max_bytes {
            return Err(CoverError::TooLarge { limit: max_bytes });
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "cover".to_string());
        tracing::debug!(file = %name, mime, size = bytes.len(), "Loaded cover image");
        Ok(Self::from_bytes(name, mime, bytes))
    }

    fn from_bytes(name: String, mime: &'static str, bytes: Vec<u8>) -> Self {
        let data_url = format!(
            "data:{};base64,{}",
            mime,
            base64::engine::general_purpose::STANDARD.encode(&bytes)
        );
        Self {
            name,
            mime,
            bytes,
            data_url,
        }
    }

    /// "name (type, size)" line for the preview box.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}, {})",
            self.name,
            self.mime,
            human_size(&(self.bytes.len() as u64))
        )
    }
}

/// Cover of the draft.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CoverState {
    #[default]
    None,
    /// Cover already on the server (update mode), shown by URL.
    Existing(String),
    Selected(CoverFile),
}

// ============================================================================
// Draft
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Draft {
    pub title: String,
    pub channel_id: Option<i64>,
    pub content: String,
    pub cover: CoverState,
}

impl Draft {
    pub fn from_detail(detail: &ArticleDetail) -> Self {
        Self {
            title: detail.title.clone(),
            channel_id: detail.channel_id,
            content: detail.content.clone(),
            cover: detail
                .cover
                .first_image()
                .map(|url| CoverState::Existing(url.to_string()))
                .unwrap_or_default(),
        }
    }

    /// First failing check, in the order the form shows them.
    pub fn validate(&self, authenticated: bool) -> Result<i64, ValidationError> {
        if !authenticated {
            return Err(ValidationError::NotLoggedIn);
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        let channel_id = self.channel_id.ok_or(ValidationError::MissingChannel)?;
        if self.content.trim().is_empty() {
            return Err(ValidationError::MissingContent);
        }
        Ok(channel_id)
    }

    /// JSON body for publishing.
    pub fn to_new_article(&self, authenticated: bool) -> Result<NewArticle, ValidationError> {
        let channel_id = self.validate(authenticated)?;
        let cover = match &self.cover {
            CoverState::None => Cover::none(),
            CoverState::Existing(url) => Cover::single(url.clone()),
            CoverState::Selected(file) => Cover::single(file.data_url.clone()),
        };
        Ok(NewArticle {
            title: self.title.clone(),
            content: self.content.clone(),
            channel_id,
            cover,
        })
    }

    /// Multipart fields for an update.
    pub fn to_update(&self, authenticated: bool) -> Result<ArticleUpdate, ValidationError> {
        let channel_id = self.validate(authenticated)?;
        let cover = match &self.cover {
            CoverState::None => CoverUpdate::Remove,
            CoverState::Existing(_) => CoverUpdate::Keep,
            CoverState::Selected(file) => CoverUpdate::Upload(CoverUpload {
                file_name: file.name.clone(),
                mime: file.mime,
                bytes: file.bytes.clone(),
            }),
        };
        Ok(ArticleUpdate {
            title: self.title.clone(),
            content: self.content.clone(),
            channel_id,
            cover,
        })
    }
}

// ============================================================================
// Editor state
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Update(ArticleId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorField {
    #[default]
    Title,
    Channel,
    Content,
    Cover,
}

impl EditorField {
    const ORDER: [EditorField; 4] = [
        EditorField::Title,
        EditorField::Channel,
        EditorField::Content,
        EditorField::Cover,
    ];

    fn step(self, forward: bool) -> Self {
        let len = Self::ORDER.len();
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        let next = if forward {
            (idx + 1) % len
        } else {
            (idx + len - 1) % len
        };
        Self::ORDER[next]
    }
}

#[derive(Debug, Clone)]
pub struct EditorState {
    pub mode: EditorMode,
    pub draft: Draft,
    pub focus: EditorField,
    /// Update mode: waiting for the article to pre-fill the form.
    pub loading: bool,
    pub submitting: bool,
    /// Submission succeeded; the banner is up until the view switches.
    pub submitted: bool,
    pub error: Option<String>,
    /// Path being typed for a new cover, when the prompt is open.
    pub cover_prompt: Option<String>,
}

impl EditorState {
    pub fn create() -> Self {
        Self::with_mode(EditorMode::Create, false)
    }

    pub fn update(id: ArticleId) -> Self {
        Self::with_mode(EditorMode::Update(id), true)
    }

    fn with_mode(mode: EditorMode, loading: bool) -> Self {
        Self {
            mode,
            draft: Draft::default(),
            focus: EditorField::default(),
            loading,
            submitting: false,
            submitted: false,
            error: None,
            cover_prompt: None,
        }
    }

    pub fn is_update(&self) -> bool {
        matches!(self.mode, EditorMode::Update(_))
    }

    /// Article this editor was opened for, if the id matches.
    pub fn editing(&self, id: &ArticleId) -> bool {
        matches!(&self.mode, EditorMode::Update(current) if current == id)
    }

    /// Input is ignored while loading, submitting, or after success.
    pub fn is_locked(&self) -> bool {
        self.loading || self.submitting || self.submitted
    }

    pub fn apply_detail(&mut self, detail: &ArticleDetail) {
        self.draft = Draft::from_detail(detail);
        self.loading = false;
    }

    pub fn next_field(&mut self) {
        self.focus = self.focus.step(true);
    }

    pub fn prev_field(&mut self) {
        self.focus = self.focus.step(false);
    }

    pub fn insert_char(&mut self, c: char) {
        if self.is_locked() {
            return;
        }
        if let Some(prompt) = &mut self.cover_prompt {
            if !c.is_control() {
                prompt.push(c);
            }
            return;
        }
        match self.focus {
            EditorField::Title if !c.is_control() => self.draft.title.push(c),
            EditorField::Content if c == '\n' || !c.is_control() => self.draft.content.push(c),
            _ => {}
        }
    }

    pub fn backspace(&mut self) {
        if self.is_locked() {
            return;
        }
        if let Some(prompt) = &mut self.cover_prompt {
            prompt.pop();
            return;
        }
        match self.focus {
            EditorField::Title => {
                self.draft.title.pop();
            }
            EditorField::Content => {
                self.draft.content.pop();
            }
            _ => {}
        }
    }

    /// Step the channel selection through `channels`.
    pub fn cycle_channel(&mut self, channels: &[Channel], forward: bool) {
        if self.is_locked() || channels.is_empty() {
            return;
        }
        let current = self
            .draft
            .channel_id
            .and_then(|id| channels.iter().position(|c| c.id == id));
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => channels.len() - 1,
            (Some(i), true) => (i + 1) % channels.len(),
            (Some(i), false) => (i + channels.len() - 1) % channels.len(),
        };
        self.draft.channel_id = Some(channels[next].id);
    }

    pub fn open_cover_prompt(&mut self) {
        if !self.is_locked() {
            self.cover_prompt = Some(String::new());
        }
    }

    pub fn cancel_cover_prompt(&mut self) {
        self.cover_prompt = None;
    }

    /// Load the file named in the prompt as the new cover.
    ///
    /// On failure the message is shown and the previous cover stays.
    pub fn confirm_cover_prompt(&mut self, max_bytes: u64) {
        let Some(input) = self.cover_prompt.take() else {
            return;
        };
        if input.trim().is_empty() {
            return;
        }
        match CoverFile::load(&expand_home(&input), max_bytes) {
            Ok(file) => {
                self.draft.cover = CoverState::Selected(file);
                self.error = None;
            }
            Err(e) => {
                tracing::debug!(error = %e, "Rejected cover file");
                self.error = Some(e.to_string());
            }
        }
    }

    pub fn remove_cover(&mut self) {
        if !self.is_locked() {
            self.draft.cover = CoverState::None;
        }
    }

    /// Success banner announcing the redirect that follows after `delay`.
    pub fn success_message(&self, delay: Duration) -> String {
        let done = if self.is_update() {
            MSG_UPDATED
        } else {
            MSG_PUBLISHED
        };
        match delay.as_millis() {
            0 => format!("{} Returning to the list...", done),
            1000 => format!("{} Returning to the list in 1 second...", done),
            m if m % 1000 == 0 => {
                format!("{} Returning to the list in {} seconds...", done, m / 1000)
            }
            _ => format!(
                "{} Returning to the list in {:.1} seconds...",
                done,
                delay.as_secs_f64()
            ),
        }
    }

    pub fn failure_fallback(&self) -> &'static str {
        if self.is_update() {
            MSG_UPDATE_FAILED
        } else {
            MSG_PUBLISH_FAILED
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PNG_HEAD: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn temp_file(name: &str, content: &[u8]) -> PathBuf {
        let dir = std::env::temp_dir().join("pressdesk_editor_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn valid_draft() -> Draft {
        Draft {
            title: "T".to_string(),
            channel_id: Some(2),
            content: "C".to_string(),
            cover: CoverState::None,
        }
    }

    #[test]
    fn test_validation_order() {
        let empty = Draft::default();
        assert_eq!(empty.validate(false), Err(ValidationError::NotLoggedIn));
        assert_eq!(empty.validate(true), Err(ValidationError::MissingTitle));

        let mut d = Draft {
            title: "  ".to_string(),
            ..valid_draft()
        };
        assert_eq!(d.validate(true), Err(ValidationError::MissingTitle));
        d.title = "T".to_string();
        d.channel_id = None;
        assert_eq!(d.validate(true), Err(ValidationError::MissingChannel));
        d.channel_id = Some(2);
        d.content = "\n".to_string();
        assert_eq!(d.validate(true), Err(ValidationError::MissingContent));
        assert_eq!(valid_draft().validate(true), Ok(2));
    }

    #[test]
    fn test_new_article_without_cover() {
        let body = valid_draft().to_new_article(true).unwrap();
        assert_eq!(
            body,
            NewArticle {
                title: "T".to_string(),
                content: "C".to_string(),
                channel_id: 2,
                cover: Cover::none(),
            }
        );
    }

    #[test]
    fn test_new_article_inlines_selected_cover() {
        let mut draft = valid_draft();
        draft.cover = CoverState::Selected(CoverFile::from_bytes(
            "a.png".to_string(),
            "image/png",
            PNG_HEAD.to_vec(),
        ));
        let body = draft.to_new_article(true).unwrap();
        assert_eq!(body.cover.kind, 1);
        assert!(body.cover.images[0].starts_with("data:image/png;base64,iVBORw0KGgo"));
    }

    #[test]
    fn test_update_cover_modes() {
        let mut draft = valid_draft();
        assert_eq!(draft.to_update(true).unwrap().cover, CoverUpdate::Remove);

        draft.cover = CoverState::Existing("https://img/x.png".to_string());
        assert_eq!(draft.to_update(true).unwrap().cover, CoverUpdate::Keep);

        draft.cover = CoverState::Selected(CoverFile::from_bytes(
            "b.png".to_string(),
            "image/png",
            PNG_HEAD.to_vec(),
        ));
        match draft.to_update(true).unwrap().cover {
            CoverUpdate::Upload(upload) => {
                assert_eq!(upload.file_name, "b.png");
                assert_eq!(upload.bytes, PNG_HEAD);
            }
            other => panic!("expected upload, got {:?}", other),
        }
    }

    #[test]
    fn test_sniff_formats() {
        assert_eq!(sniff_image_mime(PNG_HEAD), Some("image/png"));
        assert_eq!(sniff_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_image_mime(b"GIF89a...."), Some("image/gif"));
        assert_eq!(sniff_image_mime(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_image_mime(b"BM\0\0"), Some("image/bmp"));
        assert_eq!(sniff_image_mime(b"%PDF-1.7"), None);
        assert_eq!(sniff_image_mime(b""), None);
    }

    #[test]
    fn test_load_cover_rejects_non_image() {
        let path = temp_file("notes.txt", b"just some text");
        let err = CoverFile::load(&path, 1024).unwrap_err();
        assert_eq!(err.to_string(), "Please choose an image file");
    }

    #[test]
    fn test_load_cover_rejects_large_image() {
        let mut content = PNG_HEAD.to_vec();
        content.resize(2048, 0);
        let path = temp_file("big.png", &content);
        let err = CoverFile::load(&path, 1024).unwrap_err();
        assert!(matches!(err, CoverError::TooLarge { limit: 1024 }));

        let five_mb = CoverError::TooLarge {
            limit: 5 * 1024 * 1024,
        };
        assert_eq!(five_mb.to_string(), "Image must not exceed 5MB");
    }

    #[test]
    fn test_load_cover_ok() {
        let path = temp_file("ok.png", PNG_HEAD);
        let file = CoverFile::load(&path, 1024).unwrap();
        assert_eq!(file.name, "ok.png");
        assert_eq!(file.mime, "image/png");
        assert_eq!(file.bytes, PNG_HEAD);
        assert_eq!(file.summary(), "ok.png (image/png, 16B)");
    }

    #[test]
    fn test_prompt_failure_keeps_cover() {
        let path = temp_file("bad.txt", b"nope");
        let mut editor = EditorState::create();
        editor.draft.cover = CoverState::Existing("https://img/keep.png".to_string());
        editor.open_cover_prompt();
        for c in path.to_string_lossy().chars() {
            editor.insert_char(c);
        }
        editor.confirm_cover_prompt(1024);
        assert_eq!(
            editor.draft.cover,
            CoverState::Existing("https://img/keep.png".to_string())
        );
        assert_eq!(editor.error.as_deref(), Some("Please choose an image file"));
        assert!(editor.cover_prompt.is_none());
    }

    #[test]
    fn test_from_detail_prefills() {
        let detail: ArticleDetail = serde_json::from_value(serde_json::json!({
            "id": "5",
            "title": "Old",
            "content": "<p>Body</p>",
            "channel_id": 3,
            "cover": {"type": 1, "images": ["https://img/c.png"]}
        }))
        .unwrap();
        let mut editor = EditorState::update(ArticleId::from("5"));
        assert!(editor.is_locked());
        editor.apply_detail(&detail);
        assert!(!editor.is_locked());
        assert!(editor.editing(&ArticleId::from("5")));
        assert_eq!(editor.draft.channel_id, Some(3));
        assert_eq!(
            editor.draft.cover,
            CoverState::Existing("https://img/c.png".to_string())
        );
    }

    #[test]
    fn test_field_cycle_and_typing() {
        let mut editor = EditorState::create();
        editor.insert_char('H');
        editor.next_field();
        assert_eq!(editor.focus, EditorField::Channel);
        editor.insert_char('x');
        editor.next_field();
        editor.insert_char('a');
        editor.insert_char('\n');
        editor.insert_char('b');
        editor.prev_field();
        editor.prev_field();
        editor.prev_field();
        assert_eq!(editor.focus, EditorField::Cover);
        assert_eq!(editor.draft.title, "H");
        assert_eq!(editor.draft.content, "a\nb");
    }

    #[test]
    fn test_cycle_channel() {
        let channels = vec![
            Channel { id: 10, name: "a".to_string() },
            Channel { id: 20, name: "b".to_string() },
        ];
        let mut editor = EditorState::create();
        editor.cycle_channel(&channels, true);
        assert_eq!(editor.draft.channel_id, Some(10));
        editor.cycle_channel(&channels, true);
        assert_eq!(editor.draft.channel_id, Some(20));
        editor.cycle_channel(&channels, true);
        assert_eq!(editor.draft.channel_id, Some(10));
        editor.cycle_channel(&channels, false);
        assert_eq!(editor.draft.channel_id, Some(20));
    }

    #[test]
    fn test_success_banner_uses_redirect_delay() {
        let update = EditorState::update(ArticleId::from("1"));
        assert_eq!(
            update.success_message(Duration::from_millis(500)),
            "Updated! Returning to the list in 0.5 seconds..."
        );
        assert_eq!(
            update.success_message(Duration::from_secs(1)),
            "Updated! Returning to the list in 1 second..."
        );
        assert_eq!(
            EditorState::create().success_message(Duration::ZERO),
            "Published! Returning to the list..."
        );
    }

    #[test]
    fn test_messages_follow_mode() {
        assert_eq!(
            EditorState::create().success_message(Duration::from_secs(2)),
            "Published! Returning to the list in 2 seconds..."
        );
        assert_eq!(
            EditorState::update(ArticleId::from("1")).failure_fallback(),
            MSG_UPDATE_FAILED
        );
    }
}
