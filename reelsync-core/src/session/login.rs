//! Username/password login against `/Users/AuthenticateByName`.

use reelsync_model::{SessionState, UserId};
use reqwest::Method;
use tracing::{info, warn};

use super::store::SessionStore;
use crate::error::Result;
use crate::remote::dto::{AuthenticateByName, AuthenticationResult};
use crate::remote::http::{HttpClient, parse_base_url};
use crate::remote::routes::Route;

/// Who the server says we are after a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub user_name: String,
    pub server_id: Option<String>,
    /// Normalized URL the session now points at
    pub server_url: String,
    pub access_token: String,
}

/// Drives the logged-out to logged-in transition
#[derive(Clone, Debug)]
pub struct AuthenticationService {
    http: HttpClient,
    session: SessionStore,
}

impl AuthenticationService {
    pub fn new(http: HttpClient, session: SessionStore) -> Self {
        Self { http, session }
    }

    /// Authenticates with the server and, on success, logs the session in.
    ///
    /// Any failure leaves the current session exactly as it was.
    pub async fn login(
        &self,
        server_url: &str,
        username: &str,
        password: &str,
    ) -> Result<AuthenticatedUser> {
        let base = parse_base_url(server_url)?;
        let server_url = base.as_str().trim_end_matches('/').to_string();

        let body = AuthenticateByName {
            username: username.to_string(),
            pw: password.to_string(),
        };
        let request = self.http.request(
            Method::POST,
            &base,
            &Route::authenticate_by_name(),
            Some(&body),
        )?;

        // Login must reach the server the caller named, not the one the
        // current session points at.
        let result: AuthenticationResult = self
            .http
            .send_json(&SessionState::LoggedOut, request)
            .await
            .inspect_err(|err| {
                warn!(server_url = %server_url, "Login failed: {err}")
            })?;


        let user = AuthenticatedUser {
            user_id: UserId::from(result.user.id.as_str()),
            user_name: result.user.name,
            server_id: result.server_id,
            server_url,
            access_token: result.access_token,
        };
        self.session.login(
            user.server_url.clone(),
            user.access_token.clone(),
            user.user_id.clone(),
        );
        info!(user = %user.user_name, "Logged in");
        Ok(user)
    }

    pub fn logout(&self) {
        self.session.logout();
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }
}

/// Trims whitespace and trailing slashes and defaults the scheme to `http`.
pub fn normalize_server_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}
