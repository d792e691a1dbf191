//! Session state, request authentication and the login flow.

pub mod authenticator;
pub mod header;
pub mod login;
pub mod store;

pub use authenticator::{
    AUTHORIZATION_HEADER, RequestAuthenticator, RequestRewrite, TOKEN_HEADER,
};
pub use header::AuthHeaderBuilder;
pub use login::{AuthenticatedUser, AuthenticationService, normalize_server_url};
pub use store::SessionStore;
