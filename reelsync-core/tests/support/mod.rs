//! Shared fixtures for reelsync-core integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use reelsync_core::{
    CatalogError, CatalogRepository, ItemDetails, LocalCatalogStore,
    RemoteCatalogSource, Result,
};
use reelsync_model::{
    ContainerInfo, ItemId, ItemImages, ItemKind, ItemMetadata, MediaItem,
    MediaItemQuery, MediaItemSource, MediaStream, PlaybackState, SourceId,
    StreamKind,
};

/// In-memory stand-in for the media server
#[derive(Default)]
pub struct StubRemote {
    lists: Mutex<HashMap<MediaItemQuery, Vec<MediaItem>>>,
    details: Mutex<HashMap<ItemId, ItemDetails>>,
    failure: Mutex<Option<CatalogError>>,
    batch_calls: AtomicUsize,
}

impl StubRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_list(&self, query: MediaItemQuery, items: Vec<MediaItem>) {
        self.lists.lock().insert(query, items);
    }

    pub fn set_details(&self, item: MediaItem, sources: Vec<MediaItemSource>) {
        self.details
            .lock()
            .insert(item.id.clone(), ItemDetails { item, sources });
    }

    /// Every call fails with `error` until cleared with `None`.
    pub fn fail_with(&self, error: Option<CatalogError>) {
        *self.failure.lock() = error;
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteCatalogSource for StubRemote {
    async fn fetch_batch(
        &self,
        queries: &[MediaItemQuery],
    ) -> Result<HashMap<MediaItemQuery, Vec<MediaItem>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failure.lock().clone() {
            return Err(err);
        }
        let lists = self.lists.lock();
        Ok(queries
            .iter()
            .filter_map(|q| {
                lists.get(q).map(|items| (q.clone(), items.clone()))
            })
            .collect())
    }

    async fn fetch_item_details(&self, id: &ItemId) -> Result<ItemDetails> {
        if let Some(err) = self.failure.lock().clone() {
            return Err(err);
        }
        self.details
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::Http {
                code: 404,
                message: "Not Found".into(),
            })
    }
}

pub async fn repository(remote: Arc<StubRemote>) -> CatalogRepository {
    let store = LocalCatalogStore::open_in_memory()
        .await
        .expect("in-memory store");
    CatalogRepository::new(remote, store)
}

pub fn item(id: &str, name: &str, kind: ItemKind) -> MediaItem {
    let id = ItemId::from(id);
    MediaItem {
        images: ItemImages::untagged(&id),
        id,
        name: name.to_string(),
        kind,
        parent_id: None,
        metadata: ItemMetadata::default(),
        playback: PlaybackState::default(),
    }
}

pub fn library(id: &str, name: &str) -> MediaItem {
    item(id, name, ItemKind::Library)
}

pub fn movie(id: &str, name: &str) -> MediaItem {
    item(id, name, ItemKind::Movie)
}

pub fn stream(index: i64, kind: StreamKind, language: &str) -> MediaStream {
    MediaStream {
        index,
        kind,
        codec: None,
        language: Some(language.to_string()),
        title: None,
        is_default: false,
        is_forced: false,
        is_external: false,
        width: None,
        height: None,
        channels: None,
    }
}

pub fn source(
    id: &str,
    item_id: &str,
    streams: Vec<MediaStream>,
) -> MediaItemSource {

    MediaItemSource {
        id: SourceId::from(id),
        item_id: ItemId::from(item_id),
        container: ContainerInfo {
            container: Some("mkv".into()),
            ..ContainerInfo::default()
        },
        streams,
    }
}

pub fn names(items: &[MediaItem]) -> Vec<&str> {
    items.iter().map(|i| i.name.as_str()).collect()
}

/// Next value, failing the test if nothing arrives within a second.
pub async fn next<S, T>(stream: &mut S) -> T
where
    S: Stream<Item = T> + Unpin,
{
    tokio::time::timeout(Duration::from_secs(1), stream.next())
        .await
        .expect("stream produced a value in time")
        .expect("stream still open")
}

/// Asserts the stream stays quiet for a short while.
pub async fn assert_quiet<S, T>(stream: &mut S)
where
    S: Stream<Item = T> + Unpin,
    T: std::fmt::Debug,
{
    if let Ok(value) =
        tokio::time::timeout(Duration::from_millis(150), stream.next()).await
    {
        panic!("unexpected emission: {value:?}");
    }
}
