//! Session store: bearer token plus cached user profile.
//!
//! Written at login, read by every authenticated request, cleared at logout or
//! on the first authentication failure. Persisted as JSON next to the config
//! file so a restart keeps the operator logged in.

use crate::api::UserProfile;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to write session file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// An authenticated session.
#[derive(Clone)]
pub struct Session {
    pub token: SecretString,
    pub user: UserProfile,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// On-disk shape of the session file.
#[derive(Serialize, Deserialize)]
struct PersistedSession {
    token: String,
    #[serde(default)]
    user: UserProfile,
}

/// Shared handle to the current session.
///
/// Cloning is cheap and every clone sees the same state, so the API client
/// (running inside spawned tasks) can clear the session on a 401 while the UI
/// reads it.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<Session>>>,
    path: Option<PathBuf>,
}

impl SessionStore {
    /// Open the store backed by `path`, loading any saved session.
    ///
    /// A missing, empty or unreadable file means "not logged in"; it never
    /// fails startup.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let session = load_session(&path);
        tracing::debug!(
            path = %path.display(),
            authenticated = session.is_some(),
            "Opened session store"
        );
        Self {
            inner: Arc::new(RwLock::new(session)),
            path: Some(path),
        }
    }

    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store a new session. The in-memory session is replaced even when
    /// persisting it fails; the error is returned so the caller can warn.
    pub fn set_session(&self, token: String, user: UserProfile) -> Result<(), SessionError> {
        let persisted = PersistedSession {
            token: token.clone(),
            user: user.clone(),
        };
        *self.write() = Some(Session {
            token: SecretString::from(token),
            user,
        });
        tracing::info!("Session established");

        match &self.path {
            Some(path) => write_atomic(path, &serde_json::to_vec_pretty(&persisted)?),
            None => Ok(()),
        }
    }

    pub fn token(&self) -> Option<SecretString> {
        self.read().as_ref().map(|s| s.token.clone())
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.read().as_ref().map(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    /// `Authorization` header value for the current token, if any.
    pub(crate) fn bearer(&self) -> Option<String> {
        self.read()
            .as_ref()
            .map(|s| format!("Bearer {}", s.token.expose_secret()))
    }

    /// Drop the session from memory and disk.
    pub fn clear(&self) -> Result<(), SessionError> {
        let had_session = self.write().take().is_some();
        if had_session {
            tracing::info!("Session cleared");
        }
        if let Some(path) = &self.path {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(SessionError::Io(e)),
            }
        }
        Ok(())
    }
}

fn load_session(path: &Path) -> Option<Session> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read session file");
            return None;
        }
    };

    let trimmed = content.trim();
    if trimmed.is_empty() || trimmed == "null" || trimmed == "undefined" {
        return None;
    }

    match serde_json::from_str::<PersistedSession>(trimmed) {
        Ok(p) if !p.token.is_empty() => Some(Session {
            token: SecretString::from(p.token),
            user: p.user,
        }),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable session file");
            None
        }
    }
}

/// Write-to-temp-then-rename so the session file is never half written.
fn write_atomic(dst: &Path, content: &[u8]) -> Result<(), SessionError> {
    use std::time::{SystemTime, UNIX_EPOCH};

    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = dst.with_extension(format!("tmp.{:016x}", suffix));

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        // Token file: owner read/write only
        options.mode(0o600);
    }

    let result = (|| {
        let mut file = options.open(&temp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
        drop(file);
        #[cfg(windows)]
        if dst.exists() {
            std::fs::remove_file(dst)?;
        }
        std::fs::rename(&temp_path, dst)
    })();

    if let Err(e) = result {
        let _ = std::fs::remove_file(&temp_path);
        return Err(SessionError::Io(e));
    }
    Ok(())
}
