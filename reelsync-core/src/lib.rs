//! # reelsync core
//!
//! Client-side catalog cache for Jellyfin/Emby servers.
//!
//! ## Overview
//!
//! - **Local store**: SQLite copy of lists, items, media sources and streams;
//!   every read is served from here and never waits on the network
//! - **Refresh**: batched fetches from the server replace cached lists
//!   atomically, and live subscriptions re-emit afterwards
//! - **Session**: one process-wide login state; every request carries the
//!   client identification header and, once logged in, the access token
//!
//! ## Architecture
//!
//! - [`session`]: session state, header rendering, request authentication,
//!   login
//! - [`remote`]: the [`RemoteCatalogSource`] port and its Jellyfin client
//! - [`store`]: the [`LocalCatalogStore`] and its change notifications
//! - [`convert`]: row to model mapping
//! - [`feeds`]: shared replay-latest subscriptions
//! - [`repository`]: [`CatalogRepository`], the entry point for callers
//! - [`context`]: composition root
//!
//! ## Example
//!
//! ```no_run
//! use futures::StreamExt;
//! use reelsync_core::{CatalogContext, ClientConfig};
//! use reelsync_model::MediaItemQuery;
//!
//! async fn show_libraries() -> reelsync_core::Result<()> {
//!     let ctx = CatalogContext::open(ClientConfig::load()).await?;
//!     ctx.auth.login("media.local:8096", "alice", "secret").await?;
//!
//!     let views_query = MediaItemQuery::AllUserViews;
//!     let mut views = ctx.repository.observe_list(&views_query);
//!     ctx.repository.refresh_list(&views_query).await?;

//!     while let Some(items) = views.next().await {
//!         println!("{} libraries", items.len());
//!     }
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

pub mod config;
pub mod context;
pub mod convert;
pub mod device;
pub mod error;
pub mod feeds;
pub mod remote;
pub mod repository;
pub mod session;
pub mod store;

pub use config::{ClientConfig, ConfigError};
pub use context::CatalogContext;
pub use device::{DeviceIdentity, FileDeviceIdentity, StaticDeviceIdentity};
pub use error::{CatalogError, Result, StoreError};
pub use feeds::FeedRegistry;
pub use remote::{HttpClient, ItemDetails, JellyfinClient, RemoteCatalogSource};
pub use repository::CatalogRepository;
pub use session::{
    AuthHeaderBuilder, AuthenticatedUser, AuthenticationService,
    RequestAuthenticator, RequestRewrite, SessionStore, normalize_server_url,
};
pub use store::LocalCatalogStore;
