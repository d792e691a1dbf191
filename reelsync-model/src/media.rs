use std::fmt::{self, Display, Formatter};

use crate::ids::ItemId;

/// Kind of catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemKind {
    Movie,
    Series,
    Season,
    Episode,
    /// A user view or collection folder at the top of the catalog
    Library,
    Unknown,
}

impl ItemKind {
    /// Stable name used in the persisted `media_item.item_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Movie => "Movie",
            ItemKind::Series => "Series",
            ItemKind::Season => "Season",
            ItemKind::Episode => "Episode",
            ItemKind::Library => "Library",
            ItemKind::Unknown => "Unknown",
        }
    }

    /// Maps both persisted names and the server's `Type` strings.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Movie" => ItemKind::Movie,
            "Series" => ItemKind::Series,
            "Season" => ItemKind::Season,
            "Episode" => ItemKind::Episode,
            "Library" | "CollectionFolder" | "UserView" => ItemKind::Library,
            _ => ItemKind::Unknown,
        }
    }
}

impl Display for ItemKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Artwork slot an [`ImageRef`] points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImageKind {
    Primary,
    Backdrop,
    Logo,
    Thumb,
}

impl ImageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageKind::Primary => "Primary",
            ImageKind::Backdrop => "Backdrop",
            ImageKind::Logo => "Logo",
            ImageKind::Thumb => "Thumb",
        }
    }
}

/// Reference to server-side artwork.
///
/// The image may live on a different item than the one that references it
/// (episodes borrow their series' backdrop), so the owning item id travels
/// with the change tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageRef {
    pub item_id: ItemId,
    pub tag: Option<String>,
}

impl ImageRef {
    pub fn new(item_id: ItemId, tag: Option<String>) -> Self {
        Self { item_id, tag }
    }

    /// Server-relative path the caller loads for this image.
    ///
    /// The change tag doubles as a cache buster, so it is appended when known.
    pub fn path(&self, kind: ImageKind) -> String {
        let base = format!(
            "/Items/{}/Images/{}",
            urlencoding::encode(self.item_id.as_str()),
            kind.as_str()
        );
        match &self.tag {
            Some(tag) => format!("{base}?tag={}", urlencoding::encode(tag)),
            None => base,
        }
    }

    /// Absolute URL against a normalized server base (no trailing slash).
    pub fn url(&self, server_url: &str, kind: ImageKind) -> String {
        format!("{}{}", server_url.trim_end_matches('/'), self.path(kind))
    }
}

/// Artwork attached to a catalog item
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemImages {
    pub primary: ImageRef,
    pub backdrop: ImageRef,
    pub logo: Option<ImageRef>,
    pub thumb: Option<ImageRef>,
}

impl ItemImages {
    /// Images that all point back at `item_id` without change tags.
    pub fn untagged(item_id: &ItemId) -> Self {
        Self {
            primary: ImageRef::new(item_id.clone(), None),
            backdrop: ImageRef::new(item_id.clone(), None),
            logo: None,
            thumb: None,
        }
    }
}

/// Descriptive metadata shown alongside an item
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemMetadata {
    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub community_rating: Option<f64>,
    pub official_rating: Option<String>,
    pub production_year: Option<i32>,
    pub run_time_ticks: Option<i64>,
}

/// Per-user playback state
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaybackState {
    pub played: bool,
    pub favorite: bool,
    /// Fraction watched, always within `[0, 1]`
    pub progress: f64,
}

impl PlaybackState {
    pub fn new(played: bool, favorite: bool, progress: f64) -> Self {
        Self {
            played,
            favorite,
            progress: clamp_progress(progress),
        }
    }
}

/// Clamps a progress fraction into `[0, 1]`, mapping NaN to zero.
pub fn clamp_progress(progress: f64) -> f64 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    }
}

/// A catalog entry as the client presents it
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaItem {
    pub id: ItemId,
    pub name: String,
    pub kind: ItemKind,
    pub parent_id: Option<ItemId>,
    pub images: ItemImages,
    pub metadata: ItemMetadata,
    pub playback: PlaybackState,
}

impl MediaItem {
    /// What pressing "play" on this item should do.
    pub fn play_action(&self) -> PlayAction {
        if !self.playback.played && self.playback.progress > 0.0 {
            PlayAction::Resume {
                progress: self.playback.progress,
            }
        } else {
            PlayAction::Play
        }
    }
}

/// Playback entry point derived from an item's state
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlayAction {
    Play,
    Resume { progress: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(played: bool, progress: f64) -> MediaItem {
        let id = ItemId::from("m1");
        MediaItem {
            images: ItemImages::untagged(&id),
            id,
            name: "Movie".into(),
            kind: ItemKind::Movie,
            parent_id: None,
            metadata: ItemMetadata::default(),
            playback: PlaybackState::new(played, false, progress),
        }
    }

    #[test]
    fn image_path_includes_tag_when_known() {
        let image = ImageRef::new(ItemId::from("abc"), Some("t1".into()));
        assert_eq!(
            image.path(ImageKind::Primary),
            "/Items/abc/Images/Primary?tag=t1"
        );
        assert_eq!(
            image.url("http://example.com/", ImageKind::Backdrop),
            "http://example.com/Items/abc/Images/Backdrop?tag=t1"
        );

        let untagged = ImageRef::new(ItemId::from("abc"), None);
        assert_eq!(untagged.path(ImageKind::Logo), "/Items/abc/Images/Logo");
    }

    #[test]
    fn server_type_strings_map_to_kinds() {
        assert_eq!(ItemKind::parse("CollectionFolder"), ItemKind::Library);
        assert_eq!(ItemKind::parse("Episode"), ItemKind::Episode);
        assert_eq!(ItemKind::parse("MusicAlbum"), ItemKind::Unknown);
        assert_eq!(
            ItemKind::parse(ItemKind::Library.as_str()),
            ItemKind::Library
        );

    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(PlaybackState::new(false, false, 1.7).progress, 1.0);
        assert_eq!(PlaybackState::new(false, false, -0.2).progress, 0.0);
        assert_eq!(PlaybackState::new(false, false, f64::NAN).progress, 0.0);
    }

    #[test]
    fn partially_watched_items_resume() {
        assert_eq!(
            item(false, 0.4).play_action(),
            PlayAction::Resume { progress: 0.4 }
        );
        assert_eq!(item(true, 0.4).play_action(), PlayAction::Play);
        assert_eq!(item(false, 0.0).play_action(), PlayAction::Play);
    }
}
