use std::collections::HashMap;

use async_trait::async_trait;
use futures::future::try_join_all;
use reelsync_model::{
    ItemId, MediaItem, MediaItemQuery, SessionState, UserId,
};
use tracing::{debug, instrument};

use super::dto::{BaseItemDto, QueryResult};
use super::http::HttpClient;
use super::routes::{ResponseShape, Route};
use super::{ItemDetails, RemoteCatalogSource};
use crate::error::{CatalogError, Result};

/// [`RemoteCatalogSource`] speaking the Jellyfin/Emby REST API
#[derive(Clone, Debug)]
pub struct JellyfinClient {
    http: HttpClient,
}

impl JellyfinClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// One snapshot per operation so every request in a batch goes to the
    /// same server as the same user.
    fn snapshot(&self) -> Result<(std::sync::Arc<SessionState>, UserId)> {
        let session = self.http.authenticator().session().current();
        let user = session
            .user_id()
            .cloned()
            .ok_or_else(|| CatalogError::unknown("no active session"))?;
        Ok((session, user))
    }

    async fn fetch_list(
        &self,
        session: &SessionState,
        user: &UserId,
        query: &MediaItemQuery,
    ) -> Result<Vec<MediaItem>> {
        let route = Route::for_query(query, user);
        let request = self.http.get(&route)?;

        let items = match route.shape {
            ResponseShape::QueryResult => {
                self.http
                    .send_json::<QueryResult>(session, request)
                    .await?
                    .items
            }
            ResponseShape::Array => {
                self.http
                    .send_json::<Vec<BaseItemDto>>(session, request)
                    .await?
            }
        };
        debug!(query = %query, count = items.len(), "Fetched list");

        Ok(items
            .into_iter()
            .map(BaseItemDto::into_media_item)
            .collect())
    }
}

#[async_trait]
impl RemoteCatalogSource for JellyfinClient {
    #[instrument(skip_all, fields(queries = queries.len()))]
    async fn fetch_batch(
        &self,
        queries: &[MediaItemQuery],
    ) -> Result<HashMap<MediaItemQuery, Vec<MediaItem>>> {
        let (session, user) = self.snapshot()?;

        let lists = try_join_all(queries.iter().map(|query| {
            let session = &session;
            let user = &user;
            async move {
                let items = self.fetch_list(session, user, query).await?;
                Ok::<_, CatalogError>((query.clone(), items))
            }
        }))
        .await?;

        Ok(lists.into_iter().collect())
    }

    #[instrument(skip(self), fields(item = %id))]
    async fn fetch_item_details(&self, id: &ItemId) -> Result<ItemDetails> {
        let (session, user) = self.snapshot()?;
        let request = self.http.get(&Route::item_details(id, &user))?;
        let mut dto: BaseItemDto =
            self.http.send_json(&session, request).await?;


        let sources = std::mem::take(&mut dto.media_sources);
        let item = dto.into_media_item();
        let sources = sources
            .into_iter()
            .map(|source| source.into_source(&item.id))
            .collect();

        Ok(ItemDetails { item, sources })
    }
}
