//! Row shapes as persisted in SQLite.

use sqlx::FromRow;

/// Columns selected into [`ItemRow`], prefixed for joins
pub(crate) const ITEM_COLUMNS: &str = "i.id, i.name, i.item_type, i.parent_id, \
    i.primary_image_item_id, i.primary_image_tag, \
    i.backdrop_image_item_id, i.backdrop_image_tag, \
    i.logo_image_item_id, i.logo_image_tag, \
    i.thumb_image_item_id, i.thumb_image_tag, \
    i.overview, i.tagline, i.community_rating, i.official_rating, \
    i.production_year, i.run_time_ticks, \
    i.played, i.favorite, i.progress";

pub(crate) const SOURCE_COLUMNS: &str = "id, item_id, position, name, \
    container, size_bytes, bitrate, run_time_ticks";

pub(crate) const STREAM_COLUMNS: &str = "source_id, stream_index, kind, \
    codec, language, title, is_default, is_forced, is_external, width, \
    height, channels";


/// One `media_item` row.
///
/// `primary_source_id` is not part of the row; it is read through
/// `LocalCatalogStore::observe_primary_source`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ItemRow {
    pub id: String,
    pub name: String,
    pub item_type: String,
    pub parent_id: Option<String>,

    pub primary_image_item_id: String,
    pub primary_image_tag: Option<String>,
    pub backdrop_image_item_id: String,
    pub backdrop_image_tag: Option<String>,
    pub logo_image_item_id: Option<String>,
    pub logo_image_tag: Option<String>,
    pub thumb_image_item_id: Option<String>,
    pub thumb_image_tag: Option<String>,

    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub community_rating: Option<f64>,
    pub official_rating: Option<String>,
    pub production_year: Option<i32>,
    pub run_time_ticks: Option<i64>,

    pub played: bool,
    pub favorite: bool,
    pub progress: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SourceRow {
    pub id: String,
    pub item_id: String,
    pub position: i64,
    pub name: Option<String>,
    pub container: Option<String>,
    pub size_bytes: Option<i64>,
    pub bitrate: Option<i64>,
    pub run_time_ticks: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct StreamRow {
    pub source_id: String,
    pub stream_index: i64,
    pub kind: String,
    pub codec: Option<String>,
    pub language: Option<String>,
    pub title: Option<String>,
    pub is_default: bool,
    pub is_forced: bool,
    pub is_external: bool,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub channels: Option<i64>,
}

/// A source row with its streams, read in one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceWithStreams {
    pub source: SourceRow,
    /// Ordered by stream index
    pub streams: Vec<StreamRow>,
}
