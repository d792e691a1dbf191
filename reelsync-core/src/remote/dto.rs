//! Wire shapes of the Jellyfin/Emby REST API and their mapping into the
//! client model.

use std::collections::HashMap;

use reelsync_model::{
    ContainerInfo, ImageRef, ItemId, ItemImages, ItemKind, ItemMetadata,
    MediaItem, MediaItemSource, MediaStream, PlaybackState, SourceId,
    StreamKind,
};
use serde::{Deserialize, Serialize};

/// Body of `POST /Users/AuthenticateByName`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthenticateByName {
    pub username: String,
    pub pw: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthenticationResult {
    pub access_token: String,
    pub user: UserDto,
    #[serde(default)]
    pub server_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserDto {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Paged envelope returned by most item listings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryResult {
    #[serde(default)]
    pub items: Vec<BaseItemDto>,
    #[serde(default)]
    pub total_record_count: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BaseItemDto {
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "Type")]
    pub item_type: Option<String>,
    pub parent_id: Option<String>,
    pub series_id: Option<String>,
    pub season_id: Option<String>,

    pub overview: Option<String>,
    pub taglines: Vec<String>,
    pub community_rating: Option<f64>,
    pub official_rating: Option<String>,
    pub production_year: Option<i32>,
    pub run_time_ticks: Option<i64>,

    pub image_tags: HashMap<String, String>,
    pub backdrop_image_tags: Vec<String>,
    pub parent_backdrop_item_id: Option<String>,
    pub parent_backdrop_image_tags: Vec<String>,
    pub parent_logo_item_id: Option<String>,
    pub parent_logo_image_tag: Option<String>,
    pub parent_thumb_item_id: Option<String>,
    pub parent_thumb_image_tag: Option<String>,
    pub series_primary_image_tag: Option<String>,

    pub user_data: Option<UserItemDataDto>,
    pub media_sources: Vec<MediaSourceInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UserItemDataDto {
    pub played: bool,
    pub is_favorite: bool,
    /// Percentage in `[0, 100]`
    pub played_percentage: Option<f64>,
    pub playback_position_ticks: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MediaSourceInfo {
    pub id: String,
    pub name: Option<String>,
    pub container: Option<String>,
    pub size: Option<i64>,
    pub bitrate: Option<i64>,
    pub run_time_ticks: Option<i64>,
    pub media_streams: Vec<MediaStreamDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MediaStreamDto {
    pub index: i64,
    #[serde(rename = "Type")]
    pub stream_type: Option<String>,
    pub codec: Option<String>,
    pub language: Option<String>,
    pub title: Option<String>,
    pub display_title: Option<String>,
    pub is_default: bool,
    pub is_forced: bool,
    pub is_external: bool,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub channels: Option<i64>,
}

impl BaseItemDto {
    pub fn into_media_item(self) -> MediaItem {
        let id = ItemId::from(self.id.as_str());
        let kind = self
            .item_type
            .as_deref()
            .map(ItemKind::parse)
            .unwrap_or(ItemKind::Unknown);
        let images = self.images(&id, kind);

        // Episodes hang off their season in the UI; fall back to the series
        // and finally to the raw parent.
        let parent_id = match kind {
            ItemKind::Episode => self
                .season_id
                .clone()
                .or_else(|| self.series_id.clone())
                .or_else(|| self.parent_id.clone()),
            ItemKind::Season => {
                self.series_id.clone().or_else(|| self.parent_id.clone())
            }
            _ => self.parent_id.clone(),
        }
        .map(ItemId::from);

        let playback = self
            .user_data
            .as_ref()
            .map(|data| {
                PlaybackState::new(
                    data.played,
                    data.is_favorite,
                    data.played_percentage.unwrap_or(0.0) / 100.0,
                )
            })
            .unwrap_or_default();

        MediaItem {
            name: self.name.unwrap_or_default(),
            kind,
            parent_id,
            images,
            metadata: ItemMetadata {
                overview: self.overview,
                tagline: self.taglines.into_iter().next(),
                community_rating: self.community_rating,
                official_rating: self.official_rating,
                production_year: self.production_year,
                run_time_ticks: self.run_time_ticks,
            },
            playback,
            id,
        }
    }

    /// Resolves each artwork slot to the item that actually owns the image.
    fn images(&self, id: &ItemId, kind: ItemKind) -> ItemImages {
        let own =
            |tag: Option<&String>| ImageRef::new(id.clone(), tag.cloned());
        let borrowed = |owner: &Option<String>, tag: Option<&String>| {
            owner
                .as_deref()
                .map(|owner| ImageRef::new(ItemId::from(owner), tag.cloned()))
        };

        let primary = match self.image_tags.get("Primary") {
            Some(tag) => own(Some(tag)),
            None if kind == ItemKind::Episode || kind == ItemKind::Season => {
                borrowed(
                    &self.series_id,
                    self.series_primary_image_tag.as_ref(),
                )
                .unwrap_or_else(|| own(None))
            }
            None => own(None),
        };

        let backdrop = match self.backdrop_image_tags.first() {
            Some(tag) => own(Some(tag)),
            None => borrowed(
                &self.parent_backdrop_item_id,
                self.parent_backdrop_image_tags.first(),
            )
            .unwrap_or_else(|| own(None)),
        };

        let logo = match self.image_tags.get("Logo") {
            Some(tag) => Some(own(Some(tag))),
            None => borrowed(
                &self.parent_logo_item_id,
                self.parent_logo_image_tag.as_ref(),
            ),
        };

        let thumb = match self.image_tags.get("Thumb") {
            Some(tag) => Some(own(Some(tag))),
            None => borrowed(
                &self.parent_thumb_item_id,
                self.parent_thumb_image_tag.as_ref(),
            ),
        };

        ItemImages {
            primary,
            backdrop,
            logo,
            thumb,
        }
    }
}

impl MediaSourceInfo {
    pub fn into_source(self, item_id: &ItemId) -> MediaItemSource {
        MediaItemSource {
            id: SourceId::from(self.id.as_str()),
            item_id: item_id.clone(),
            container: ContainerInfo {
                name: self.name,
                container: self.container,
                size_bytes: self.size,
                bitrate: self.bitrate,
                run_time_ticks: self.run_time_ticks,
            },
            streams: self
                .media_streams
                .into_iter()
                .map(MediaStreamDto::into_stream)
                .collect(),
        }
    }
}

impl MediaStreamDto {
    pub fn into_stream(self) -> MediaStream {
        MediaStream {
            index: self.index,
            kind: self
                .stream_type
                .as_deref()
                .map(StreamKind::parse)
                .unwrap_or(StreamKind::Other),
            codec: self.codec,
            language: self.language,
            title: self.title.or(self.display_title),
            is_default: self.is_default,
            is_forced: self.is_forced,
            is_external: self.is_external,
            width: self.width,
            height: self.height,
            channels: self.channels,
        }
    }
}
