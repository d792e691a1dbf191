//! Public entry point for catalog reads and refreshes.
//!
//! Reads come from the local store only and never wait on the network.
//! Refreshes are the only path that talks to the server; their result lands
//! in the store and reaches readers through their subscriptions.

use std::sync::Arc;

use async_stream::stream;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use reelsync_model::{
    ItemId, MediaItem, MediaItemQuery, MediaItemSource, MediaItemStreamOptions,
    SourceId,
};
use tracing::{info, instrument, warn};

use crate::convert::{item_from_row, source_from_rows, stream_options_from_rows};
use crate::error::{CatalogError, Result};
use crate::feeds::FeedRegistry;
use crate::remote::RemoteCatalogSource;
use crate::store::LocalCatalogStore;
use crate::store::rows::SourceWithStreams;

#[derive(Clone)]
pub struct CatalogRepository {
    remote: Arc<dyn RemoteCatalogSource>,
    store: LocalCatalogStore,
    lists: FeedRegistry<String, Vec<MediaItem>>,
    items: FeedRegistry<ItemId, Option<MediaItem>>,
    stream_options: FeedRegistry<ItemId, Option<MediaItemStreamOptions>>,
}

impl std::fmt::Debug for CatalogRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogRepository")
            .field("store", &self.store)
            .field("lists", &self.lists)
            .field("items", &self.items)
            .field("stream_options", &self.stream_options)
            .finish()
    }
}

impl CatalogRepository {
    pub fn new(
        remote: Arc<dyn RemoteCatalogSource>,
        store: LocalCatalogStore,
    ) -> Self {
        Self {
            remote,
            store,
            lists: FeedRegistry::new(),
            items: FeedRegistry::new(),
            stream_options: FeedRegistry::new(),
        }
    }

    pub fn store(&self) -> &LocalCatalogStore {
        &self.store
    }

    /// Cached items for `query`, re-emitted whenever the list or one of its
    /// items changes.
    pub fn observe_list(
        &self,
        query: &MediaItemQuery,
    ) -> BoxStream<'static, Vec<MediaItem>> {
        let cache_key = query.cache_key();
        let store = self.store.clone();
        self.lists.subscribe(cache_key.clone(), move || {
            store
                .observe_list(&cache_key)
                .map(|rows| rows.into_iter().map(item_from_row).collect())
        })
    }

    /// The cached item, `None` until it is first stored.
    pub fn observe_item(
        &self,
        id: &ItemId,
    ) -> BoxStream<'static, Option<MediaItem>> {
        let store = self.store.clone();
        let item_id = id.clone();
        self.items.subscribe(id.clone(), move || {
            store
                .observe_item(&item_id)
                .map(|row| row.map(item_from_row))
        })
    }

    /// Stream choices of the item's primary source.
    ///
    /// Emits `None` while the item has no primary source. When the primary
    /// source changes the subscription to the old source's streams is
    /// dropped before the new one starts.
    pub fn observe_stream_options(
        &self,
        item_id: &ItemId,
    ) -> BoxStream<'static, Option<MediaItemStreamOptions>> {
        let store = self.store.clone();
        let id = item_id.clone();
        self.stream_options
            .subscribe(item_id.clone(), move || stream_options_feed(store, id))
    }

    pub async fn refresh_list(&self, query: &MediaItemQuery) -> Result<()> {
        self.refresh_lists(std::slice::from_ref(query)).await
    }

    /// Fetches all `queries` in one batch and replaces their lists in one
    /// transaction. Nothing is written unless every query succeeded.
    #[instrument(skip_all, fields(queries = queries.len()))]
    pub async fn refresh_lists(
        &self,
        queries: &[MediaItemQuery],
    ) -> Result<()> {
        let mut unique: Vec<MediaItemQuery> =
            Vec::with_capacity(queries.len());
        for query in queries {
            if !unique.contains(query) {
                unique.push(query.clone());
            }
        }
        if unique.is_empty() {
            return Ok(());
        }

        let mut fetched = self.remote.fetch_batch(&unique).await?;

        let mut lists = Vec::with_capacity(unique.len());
        for query in &unique {
            let items = fetched.remove(query).ok_or_else(|| {
                CatalogError::unknown(format!("No result for {query} in batch"))
            })?;
            lists.push((query.cache_key(), items));
        }

        self.store.replace_media_lists(&lists).await?;
        info!(
            lists = lists.len(),
            items = lists.iter().map(|(_, items)| items.len()).sum::<usize>(),
            "Refreshed lists"
        );
        Ok(())
    }

    /// Fetches full details and overwrites the item's row, sources and
    /// streams.
    #[instrument(skip(self), fields(item = %id))]
    pub async fn refresh_item(&self, id: &ItemId) -> Result<()> {
        let details = self.remote.fetch_item_details(id).await?;
        self.store
            .update_item_details(&details.item, &details.sources)
            .await?;
        info!(sources = details.sources.len(), "Refreshed item");
        Ok(())
    }

    /// Local lookup; never touches the network.
    pub async fn get_source(
        &self,
        source_id: &SourceId,
    ) -> Option<MediaItemSource> {
        self.store
            .get_source_by_id(source_id)
            .await
            .map(source_from_rows)
    }

    /// Makes `source_id` the item's primary source. `false` when the source
    /// is not one of the item's or the write failed.
    pub async fn select_primary_source(
        &self,
        item_id: &ItemId,
        source_id: &SourceId,
    ) -> bool {
        match self.store.set_primary_source(item_id, source_id).await {
            Ok(switched) => switched,
            Err(err) => {
                warn!(
                    item = %item_id,
                    source = %source_id,
                    "Failed to switch source: {err}"
                );
                false
            }
        }
    }

    /// Drops every cached row.
    pub async fn clear(&self) -> Result<()> {
        Ok(self.store.clear().await?)
    }
}

enum StreamOptionsEvent {
    Primary(Option<Option<SourceId>>),
    Streams(Option<Option<SourceWithStreams>>),
}

fn stream_options_feed(
    store: LocalCatalogStore,
    item_id: ItemId,
) -> impl Stream<Item = Option<MediaItemStreamOptions>> + Send + 'static {
    stream! {
        let mut primary = store.observe_primary_source(&item_id);
        let mut current: Option<Option<SourceId>> = None;
        let mut streams: Option<BoxStream<'static, Option<SourceWithStreams>>> =
            None;

        loop {
            // Primary changes win ties so a stale source never gets through
            let event = tokio::select! {
                biased;
                next = primary.next() => StreamOptionsEvent::Primary(next),
                next = next_streams(&mut streams) => {
                    StreamOptionsEvent::Streams(next)
                }
            };

            match event {
                StreamOptionsEvent::Primary(None) => break,
                StreamOptionsEvent::Primary(Some(source_id)) => {
                    if current.as_ref() == Some(&source_id) {
                        continue;
                    }
                    streams =
                        source_id.as_ref().map(|id| store.observe_streams(id));
                    let none_selected = source_id.is_none();
                    current = Some(source_id);
                    if none_selected {
                        yield None;
                    }
                }
                StreamOptionsEvent::Streams(Some(rows)) => {
                    yield rows.map(stream_options_from_rows);
                }
                StreamOptionsEvent::Streams(None) => streams = None,
            }
        }
    }
}

async fn next_streams(
    streams: &mut Option<BoxStream<'static, Option<SourceWithStreams>>>,
) -> Option<Option<SourceWithStreams>> {
    match streams {
        Some(streams) => streams.next().await,
        None => std::future::pending().await,
    }
}
