use crate::ids::UserId;

/// The single authentication context shared by every outgoing request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SessionState {
    #[default]
    LoggedOut,
    LoggedIn {
        server_url: String,
        auth_token: String,
        user_id: UserId,
    },
}

impl SessionState {
    pub fn is_logged_in(&self) -> bool {
        matches!(self, SessionState::LoggedIn { .. })
    }

    pub fn server_url(&self) -> Option<&str> {
        match self {
            SessionState::LoggedIn { server_url, .. } => Some(server_url),
            SessionState::LoggedOut => None,
        }
    }

    pub fn auth_token(&self) -> Option<&str> {
        match self {
            SessionState::LoggedIn { auth_token, .. } => Some(auth_token),
            SessionState::LoggedOut => None,
        }
    }

    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            SessionState::LoggedIn { user_id, .. } => Some(user_id),
            SessionState::LoggedOut => None,
        }
    }
}
