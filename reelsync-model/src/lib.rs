//! Catalog data model shared across reelsync crates.
#![allow(missing_docs)]

pub mod error;
pub mod ids;
pub mod media;
pub mod query;
pub mod session;
pub mod source;

pub use error::{ModelError, Result as ModelResult};
pub use ids::{ItemId, SourceId, UserId};
pub use media::{
    ImageKind, ImageRef, ItemImages, ItemKind, ItemMetadata, MediaItem,
    PlayAction, PlaybackState, clamp_progress,
};
pub use query::MediaItemQuery;
pub use session::SessionState;
pub use source::{
    ContainerInfo, MediaItemSource, MediaItemStreamOptions, MediaStream,
    StreamKind,
};
