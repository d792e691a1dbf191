//! Network side of the catalog: batched list fetches and item details.
//!
//! Nothing here touches the local store; callers decide what to persist.

use std::collections::HashMap;

use async_trait::async_trait;
use reelsync_model::{ItemId, MediaItem, MediaItemQuery, MediaItemSource};

use crate::error::Result;

pub mod client;
pub mod dto;
pub mod http;
pub mod routes;

pub use client::JellyfinClient;
pub use http::HttpClient;

/// A fully detailed item together with its playable sources
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDetails {
    pub item: MediaItem,
    /// Sources in server order; the first one is the server's preferred pick
    pub sources: Vec<MediaItemSource>,
}

/// Port to the media server
#[async_trait]
pub trait RemoteCatalogSource: Send + Sync {
    /// Fetches every query in one round trip.
    ///
    /// On success the map holds an entry for each input query, with items in
    /// the order the server returned them.
    async fn fetch_batch(
        &self,
        queries: &[MediaItemQuery],
    ) -> Result<HashMap<MediaItemQuery, Vec<MediaItem>>>;

    async fn fetch_item_details(&self, id: &ItemId) -> Result<ItemDetails>;
}
