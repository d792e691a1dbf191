//! Process-wide session state.
//!
//! The current value is an immutable snapshot swapped atomically on every
//! transition, so readers never observe a half-updated session.

use std::sync::Arc;

use reelsync_model::{SessionState, UserId};
use tokio::sync::watch;
use tracing::info;

/// Handle to the single current [`SessionState`]
#[derive(Clone, Debug)]
pub struct SessionStore {
    sender: Arc<watch::Sender<Arc<SessionState>>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create a store in the logged-out state
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Arc::new(SessionState::LoggedOut));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Snapshot of the current session
    pub fn current(&self) -> Arc<SessionState> {
        self.sender.borrow().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.sender.borrow().is_logged_in()
    }

    /// Subscribe to session transitions
    pub fn subscribe(&self) -> watch::Receiver<Arc<SessionState>> {
        self.sender.subscribe()
    }

    /// Replace the current session with a logged-in one
    pub fn login(
        &self,
        server_url: impl Into<String>,
        auth_token: impl Into<String>,
        user_id: UserId,
    ) {
        let state = SessionState::LoggedIn {
            server_url: server_url.into(),
            auth_token: auth_token.into(),
            user_id,
        };
        info!(
            server_url = state.server_url().unwrap_or_default(),
            "Session logged in"
        );
        // send_replace stores the value even when nobody is subscribed
        self.sender.send_replace(Arc::new(state));
    }

    /// Drop back to the logged-out state
    pub fn logout(&self) {
        let previous =
            self.sender.send_replace(Arc::new(SessionState::LoggedOut));

        if previous.is_logged_in() {
            info!("Session logged out");
        }
    }
}
