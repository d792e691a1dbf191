use reelsync_model::SessionState;
use reqwest::Request;
use reqwest::header::HeaderValue;
use tracing::warn;
use url::Url;

use super::header::AuthHeaderBuilder;
use super::store::SessionStore;

/// Identification header carried by every request
pub const AUTHORIZATION_HEADER: &str = "X-Emby-Authorization";
/// Bearer token header, only present while logged in
pub const TOKEN_HEADER: &str = "X-MediaBrowser-Token";

/// What happened to a request's target while authenticating it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestRewrite {
    /// Logged out; the request keeps its original target
    Unchanged,
    /// Scheme, host and port now point at the session's server
    Rewritten,
    /// The session's server URL could not be used; target left untouched
    InvalidServerUrl(String),
}

/// Attaches session headers to outgoing requests and points them at the
/// logged-in server.
///
/// Runs synchronously on the request path and never performs I/O. Failures
/// are reported through logs and the returned [`RequestRewrite`], never as
/// errors.
#[derive(Clone, Debug)]
pub struct RequestAuthenticator {
    session: SessionStore,
    headers: AuthHeaderBuilder,
}

impl RequestAuthenticator {
    pub fn new(session: SessionStore, headers: AuthHeaderBuilder) -> Self {
        Self { session, headers }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Authenticate against the current session snapshot.
    pub fn authenticate(&self, request: &mut Request) -> RequestRewrite {
        let session = self.session.current();
        self.apply(&session, request)
    }

    /// Authenticate against an explicit snapshot.
    ///
    /// Callers issuing several requests for one operation pass the same
    /// snapshot to all of them.
    pub fn apply(
        &self,
        session: &SessionState,
        request: &mut Request,
    ) -> RequestRewrite {
        let rewrite = match session {
            SessionState::LoggedIn { server_url, .. } => {
                match rewrite_origin(request.url_mut(), server_url) {
                    Ok(()) => RequestRewrite::Rewritten,
                    Err(reason) => {
                        warn!(
                            server_url = %server_url,
                            "Leaving request target untouched: {reason}"
                        );
                        RequestRewrite::InvalidServerUrl(reason)
                    }
                }
            }
            SessionState::LoggedOut => RequestRewrite::Unchanged,
        };

        let headers = request.headers_mut();
        match HeaderValue::from_str(&self.headers.build_auth_header(session)) {
            Ok(value) => {
                headers.insert(AUTHORIZATION_HEADER, value);
            }
            Err(err) => {
                warn!(
                    "Identification header is not a valid header value: {err}"
                )
            }
        }

        match session.auth_token() {
            Some(token) => match HeaderValue::from_str(token) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(TOKEN_HEADER, value);
                }
                Err(err) => {
                    warn!("Auth token is not a valid header value: {err}");
                    headers.remove(TOKEN_HEADER);
                }
            },
            None => {
                headers.remove(TOKEN_HEADER);
            }
        }

        rewrite
    }
}

/// Swap scheme, host and port for the server's, keeping path and query.
fn rewrite_origin(url: &mut Url, server_url: &str) -> Result<(), String> {
    let server = Url::parse(server_url)
        .map_err(|err| format!("cannot parse server url: {err}"))?;
    let host = server
        .host_str()
        .ok_or_else(|| "server url has no host".to_string())?;

    let mut rewritten = url.clone();
    rewritten
        .set_scheme(server.scheme())
        .map_err(|_| format!("unsupported scheme {}", server.scheme()))?;
    rewritten
        .set_host(Some(host))
        .map_err(|err| format!("invalid host {host}: {err}"))?;
    rewritten
        .set_port(server.port())
        .map_err(|_| "cannot set port".to_string())?;

    *url = rewritten;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::StaticDeviceIdentity;
    use reelsync_model::UserId;
    use reqwest::Method;
    use std::sync::Arc;

    fn authenticator() -> RequestAuthenticator {
        let headers = AuthHeaderBuilder::new(
            "reelsync",
            "Linux",
            "0.1.0",
            Arc::new(StaticDeviceIdentity("dev1".into())),
        );
        RequestAuthenticator::new(SessionStore::new(), headers)
    }

    fn request(url: &str) -> Request {
        Request::new(Method::GET, Url::parse(url).expect("valid url"))
    }

    #[test]
    fn logged_out_requests_only_carry_identification() {
        let auth = authenticator();
        let mut req = request("http://localhost:8096/Users/u1/Views?x=1");

        assert_eq!(auth.authenticate(&mut req), RequestRewrite::Unchanged);
        assert_eq!(
            req.url().as_str(),
            "http://localhost:8096/Users/u1/Views?x=1"
        );
        assert!(req.headers().contains_key(AUTHORIZATION_HEADER));
        assert!(!req.headers().contains_key(TOKEN_HEADER));
    }

    #[test]
    fn logged_in_requests_are_rewritten_and_carry_the_token() {
        let auth = authenticator();
        auth.session()
            .login("https://media.example.com:8920", "tok", UserId::from("u1"));

        let mut req =
            request("http://localhost:8096/Users/u1/Views?Fields=Overview");

        assert_eq!(auth.authenticate(&mut req), RequestRewrite::Rewritten);
        assert_eq!(
            req.url().as_str(),
            "https://media.example.com:8920/Users/u1/Views?Fields=Overview"
        );
        assert_eq!(req.headers()[TOKEN_HEADER], "tok");
        let identification = req.headers()[AUTHORIZATION_HEADER]
            .to_str()
            .expect("ascii header");
        assert!(identification.ends_with(r#"UserId="u1""#));
    }

    #[test]
    fn default_port_of_the_server_replaces_the_base_port() {
        let auth = authenticator();
        auth.session()
            .login("http://example.com", "tok", UserId::from("u1"));

        let mut req = request("http://localhost:8096/System/Info");
        auth.authenticate(&mut req);
        assert_eq!(req.url().as_str(), "http://example.com/System/Info");
    }

    #[test]
    fn unparseable_server_url_leaves_target_untouched() {
        let auth = authenticator();
        auth.session().login("not a url", "tok", UserId::from("u1"));

        let mut req = request("http://localhost:8096/Items");
        let outcome = auth.authenticate(&mut req);

        assert!(matches!(outcome, RequestRewrite::InvalidServerUrl(_)));
        assert_eq!(req.url().as_str(), "http://localhost:8096/Items");
        // Headers still follow the session
        assert!(req.headers().contains_key(AUTHORIZATION_HEADER));
        assert_eq!(req.headers()[TOKEN_HEADER], "tok");
    }

    #[test]
    fn logout_removes_the_token_from_the_next_request() {
        let auth = authenticator();
        auth.session()
            .login("http://example.com", "tok", UserId::from("u1"));
        let mut first = request("http://localhost:8096/Items");
        auth.authenticate(&mut first);
        assert!(first.headers().contains_key(TOKEN_HEADER));

        auth.session().logout();
        let mut next = request("http://localhost:8096/Items");
        auth.authenticate(&mut next);

        assert!(next.headers().contains_key(AUTHORIZATION_HEADER));
        assert!(!next.headers().contains_key(TOKEN_HEADER));
        let identification = next.headers()[AUTHORIZATION_HEADER]
            .to_str()
            .expect("ascii header");
        assert!(!identification.contains("UserId"));
    }
}
