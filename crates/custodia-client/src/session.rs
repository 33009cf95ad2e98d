//! Session storage and restoration.
//!
//! Holds the operator identity and credential pair in `${CUSTODIA_HOME}/session.json`
//! with restricted permissions (0600). Tokens are never logged or displayed in full.
//!
//! The file stores plaintext credentials with no local expiry check; expiry is
//! discovered reactively through a 401 from the backend.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::RwLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::paths;

/// Persisted key for the serialized operator identity.
pub const USER_KEY: &str = "user";
/// Persisted key for the access token.
pub const TOKEN_KEY: &str = "token";
/// Persisted key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Operator identity as returned by `/auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub wallet_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// In-memory session state. Exactly one lives process-wide, behind an
/// `Arc<SessionStore>`.
///
/// Invariant: `access_token` and `refresh_token` are both present or both
/// absent; `login` and `logout` are the only writers and maintain it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub user: Option<User>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub is_loading: bool,
}

/// Persisted session file: a flat string-keyed map holding the three fixed
/// entries (`user`, `token`, `refreshToken`).
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedSession {
    #[serde(flatten)]
    entries: HashMap<String, String>,
}

/// Single source of truth for "who is logged in", with durable persistence
/// across process restarts.
pub struct SessionStore {
    path: PathBuf,
    state: RwLock<Session>,
}

impl SessionStore {
    /// Creates a store backed by the given file. The session starts in the
    /// loading state until `initialize` runs.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            state: RwLock::new(Session {
                is_loading: true,
                ..Session::default()
            }),
        }
    }

    /// Creates a store at the default `${CUSTODIA_HOME}/session.json` path.
    pub fn at_default_path() -> Self {
        Self::new(paths::session_path())
    }

    /// Attempts to restore a persisted session. A partial or unparseable
    /// file discards the persisted state via `logout`. Always ends with
    /// `is_loading = false`. Safe to call once at startup; idempotent.
    pub fn initialize(&self) {
        match self.load_persisted() {
            Ok(Some((user, access, refresh))) => {
                let mut state = self.state.write().expect("session lock poisoned");
                state.user = Some(user);
                state.access_token = Some(access);
                state.refresh_token = Some(refresh);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("failed to restore persisted session: {e:#}");
                self.logout();
            }
        }
        self.state.write().expect("session lock poisoned").is_loading = false;
    }

    /// Replaces the session with a fresh identity and credential pair, and
    /// persists all three entries. Persistence is best-effort: a write
    /// failure leaves the in-memory session logged in.
    pub fn login(&self, user: User, access_token: &str, refresh_token: &str) {
        {
            let mut state = self.state.write().expect("session lock poisoned");
            state.user = Some(user.clone());
            state.access_token = Some(access_token.to_string());
            state.refresh_token = Some(refresh_token.to_string());
            state.is_loading = false;
        }

        if let Err(e) = self.persist(&user, access_token, refresh_token) {
            tracing::warn!("failed to persist session: {e:#}");
        }
    }

    /// Clears the session and removes the persisted entries. Safe to call
    /// when no session exists.
    pub fn logout(&self) {
        {
            let mut state = self.state.write().expect("session lock poisoned");
            state.user = None;
            state.access_token = None;
            state.refresh_token = None;
        }

        if let Err(e) = fs::remove_file(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!("failed to remove persisted session: {e}");
        }
    }

    pub fn user(&self) -> Option<User> {
        self.state.read().expect("session lock poisoned").user.clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.state
            .read()
            .expect("session lock poisoned")
            .access_token
            .clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.state
            .read()
            .expect("session lock poisoned")
            .refresh_token
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state
            .read()
            .expect("session lock poisoned")
            .access_token
            .is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().expect("session lock poisoned").is_loading
    }

    pub fn snapshot(&self) -> Session {
        self.state.read().expect("session lock poisoned").clone()
    }

    /// Loads the persisted entries. Returns `None` when the file is absent
    /// or any of the three keys is missing (a partial write is treated as no
    /// session, matching restore-all-or-nothing).
    fn load_persisted(&self) -> Result<Option<(User, String, String)>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session from {}", self.path.display()))?;
        let persisted: PersistedSession = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session from {}", self.path.display()))?;

        let (Some(user_json), Some(access), Some(refresh)) = (
            persisted.entries.get(USER_KEY),
            persisted.entries.get(TOKEN_KEY),
            persisted.entries.get(REFRESH_TOKEN_KEY),
        ) else {
            return Ok(None);
        };

        let user: User =
            serde_json::from_str(user_json).context("Failed to parse persisted user")?;
        Ok(Some((user, access.clone(), refresh.clone())))
    }

    /// Writes the three entries with restricted permissions (0600).
    fn persist(&self, user: &User, access_token: &str, refresh_token: &str) -> Result<()> {
        let mut persisted = PersistedSession::default();
        persisted.entries.insert(
            USER_KEY.to_string(),
            serde_json::to_string(user).context("Failed to serialize user")?,
        );
        persisted
            .entries
            .insert(TOKEN_KEY.to_string(), access_token.to_string());
        persisted
            .entries
            .insert(REFRESH_TOKEN_KEY.to_string(), refresh_token.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(&persisted).context("Failed to serialize session")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, contents)
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        Ok(())
    }
}

/// Masks a token for display, keeping a short recognizable prefix and suffix.
pub fn mask_token(token: &str) -> String {
    if token.len() <= 12 {
        return "***".to_string();
    }
    format!("{}...{}", &token[..8], &token[token.len() - 4..])
}
