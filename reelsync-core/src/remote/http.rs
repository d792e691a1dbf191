use reelsync_model::SessionState;
use reqwest::{Client, Method, Request, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::routes::Route;
use crate::config::ClientConfig;
use crate::error::{CatalogError, Result};
use crate::session::{RequestAuthenticator, normalize_server_url};

/// Shared HTTP plumbing: one `reqwest::Client`, the configured base URL and
/// the authenticator every request passes through.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
    base_url: Url,
    authenticator: RequestAuthenticator,
}

impl HttpClient {
    pub fn new(
        config: &ClientConfig,
        authenticator: RequestAuthenticator,
    ) -> Result<Self> {
        let base_url = parse_base_url(&config.server_url)?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url,
            authenticator,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn authenticator(&self) -> &RequestAuthenticator {
        &self.authenticator
    }

    /// Builds a request for `route` rooted at `base`.
    pub fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        base: &Url,
        route: &Route,
        body: Option<&B>,
    ) -> Result<Request> {
        let url = route_url(base, route)?;
        let mut builder = self.client.request(method, url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        Ok(builder.build()?)
    }

    /// GET `route` against the configured base URL.
    pub fn get(&self, route: &Route) -> Result<Request> {
        self.request::<()>(Method::GET, &self.base_url, route, None)
    }

    /// Authenticates `request` with `session`, sends it and decodes the JSON
    /// body of a successful response.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        session: &SessionState,
        mut request: Request,
    ) -> Result<T> {
        self.authenticator.apply(session, &mut request);
        let response = self.execute(request).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn execute(&self, request: Request) -> Result<Response> {
        let method = request.method().clone();
        let path = request.url().path().to_string();
        let response = self.client.execute(request).await?;
        let status = response.status();
        debug!(
            %method,
            path = %path,
            status = status.as_u16(),
            "Server responded"
        );

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match body.trim() {
            "" => status
                .canonical_reason()
                .unwrap_or("Unknown status")
                .to_string(),
            text => text.to_string(),
        };
        Err(CatalogError::Http {
            code: status.as_u16(),
            message,
        })
    }
}

/// Normalizes and parses a server URL.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let normalized = normalize_server_url(raw);
    Url::parse(&normalized).map_err(|err| {
        CatalogError::unknown(format!("Invalid server url {normalized}: {err}"))
    })
}

/// Appends the route's segments and query parameters to `base`.
pub fn route_url(base: &Url, route: &Route) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| {
            CatalogError::unknown(format!("Server url {base} cannot be a base"))
        })?
        .pop_if_empty()
        .extend(route.segments.iter().map(String::as_str));
    url.set_query(None);
    if !route.params.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(route.params.iter().map(|(k, v)| (*k, v.as_str())));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelsync_model::{MediaItemQuery, UserId};

    #[test]
    fn route_url_escapes_segments_and_params() {
        let base = parse_base_url("media.local:8096/").expect("valid url");
        let route = Route::for_query(
            &MediaItemQuery::Search {
                term: "a&b c".into(),
            },
            &UserId::from("u 1"),
        );

        let url = route_url(&base, &route).expect("url");
        assert_eq!(url.path(), "/Users/u%201/Items");
        let term = url
            .query_pairs()
            .find(|(k, _)| k == "SearchTerm")
            .map(|(_, v)| v.into_owned());
        assert_eq!(term.as_deref(), Some("a&b c"));
    }

    #[test]
    fn route_url_keeps_base_path_prefix() {
        let base =
            parse_base_url("https://example.com/jellyfin/").expect("valid url");
        let url =
            route_url(&base, &Route::authenticate_by_name()).expect("url");

        assert_eq!(
            url.as_str(),
            "https://example.com/jellyfin/Users/AuthenticateByName"
        );
    }
}
