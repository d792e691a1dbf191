//! Persisted login so separate invocations share one session.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use reelsync_core::{AuthenticatedUser, SessionStore};
use reelsync_model::UserId;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSession {
    pub server_url: String,
    pub access_token: String,
    pub user_id: UserId,
    pub user_name: String,
    pub saved_at: DateTime<Utc>,
}

impl From<&AuthenticatedUser> for SavedSession {
    fn from(user: &AuthenticatedUser) -> Self {
        Self {
            server_url: user.server_url.clone(),
            access_token: user.access_token.clone(),
            user_id: user.user_id.clone(),
            user_name: user.user_name.clone(),
            saved_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the saved session; a missing or corrupt file counts as none.
    pub fn load(&self) -> Option<SavedSession> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(saved) => Some(saved),
            Err(err) => {
                warn!(
                    "Ignoring unreadable session file {}: {err}",
                    self.path.display()
                );
                None
            }
        }
    }

    pub fn save(&self, session: &SavedSession) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| {
                    format!("failed to create {}", parent.display())
                })?;
        }
        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, json)
            .with_context(|| {
                format!("failed to write {}", self.path.display())
            })?;
        debug!("Saved session to {}", self.path.display());
        Ok(())
    }

    pub fn remove(&self) -> anyhow::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err)
                .with_context(|| {
                    format!("failed to remove {}", self.path.display())
                }),

        }
    }

    /// Logs `store` in with the saved session, if there is one.
    pub fn restore_into(&self, store: &SessionStore) -> Option<SavedSession> {
        let saved = self.load()?;
        store.login(
            saved.server_url.clone(),
            saved.access_token.clone(),
            saved.user_id.clone(),
        );
        Some(saved)
    }
}
