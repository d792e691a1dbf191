//! Row <-> model mapping.
//!
//! Pure functions only; nothing here touches the database.

use reelsync_model::{
    ContainerInfo, ImageRef, ItemId, ItemImages, ItemKind, ItemMetadata,
    MediaItem, MediaItemSource, MediaItemStreamOptions, MediaStream,
    PlaybackState, SourceId, StreamKind,
};

use crate::store::rows::{ItemRow, SourceRow, SourceWithStreams, StreamRow};

pub fn item_from_row(row: ItemRow) -> MediaItem {
    let optional_image = |item_id: Option<String>, tag: Option<String>| {
        item_id.map(|id| ImageRef::new(ItemId::from(id), tag))
    };

    MediaItem {
        id: ItemId::from(row.id),
        name: row.name,
        kind: ItemKind::parse(&row.item_type),
        parent_id: row.parent_id.map(ItemId::from),
        images: ItemImages {
            primary: ImageRef::new(
                ItemId::from(row.primary_image_item_id),
                row.primary_image_tag,
            ),
            backdrop: ImageRef::new(
                ItemId::from(row.backdrop_image_item_id),
                row.backdrop_image_tag,
            ),
            logo: optional_image(row.logo_image_item_id, row.logo_image_tag),
            thumb: optional_image(row.thumb_image_item_id, row.thumb_image_tag),
        },
        metadata: ItemMetadata {
            overview: row.overview,
            tagline: row.tagline,
            community_rating: row.community_rating,
            official_rating: row.official_rating,
            production_year: row.production_year,
            run_time_ticks: row.run_time_ticks,
        },
        playback: PlaybackState::new(row.played, row.favorite, row.progress),
    }
}

pub fn row_from_item(item: &MediaItem) -> ItemRow {
    let images = &item.images;
    let split = |image: Option<&ImageRef>| match image {
        Some(image) => (Some(image.item_id.to_string()), image.tag.clone()),
        None => (None, None),
    };
    let (logo_image_item_id, logo_image_tag) = split(images.logo.as_ref());
    let (thumb_image_item_id, thumb_image_tag) = split(images.thumb.as_ref());

    ItemRow {
        id: item.id.to_string(),
        name: item.name.clone(),
        item_type: item.kind.as_str().to_string(),
        parent_id: item.parent_id.as_ref().map(ItemId::to_string),
        primary_image_item_id: images.primary.item_id.to_string(),
        primary_image_tag: images.primary.tag.clone(),
        backdrop_image_item_id: images.backdrop.item_id.to_string(),
        backdrop_image_tag: images.backdrop.tag.clone(),
        logo_image_item_id,
        logo_image_tag,
        thumb_image_item_id,
        thumb_image_tag,
        overview: item.metadata.overview.clone(),
        tagline: item.metadata.tagline.clone(),
        community_rating: item.metadata.community_rating,
        official_rating: item.metadata.official_rating.clone(),
        production_year: item.metadata.production_year,
        run_time_ticks: item.metadata.run_time_ticks,
        played: item.playback.played,
        favorite: item.playback.favorite,
        progress: item.playback.progress,
    }
}

pub fn stream_from_row(row: StreamRow) -> MediaStream {
    MediaStream {
        index: row.stream_index,
        kind: StreamKind::parse(&row.kind),
        codec: row.codec,
        language: row.language,
        title: row.title,
        is_default: row.is_default,
        is_forced: row.is_forced,
        is_external: row.is_external,
        width: row.width,
        height: row.height,
        channels: row.channels,
    }
}

pub fn source_from_rows(rows: SourceWithStreams) -> MediaItemSource {
    let SourceWithStreams { source, streams } = rows;
    MediaItemSource {
        id: SourceId::from(source.id),
        item_id: ItemId::from(source.item_id),
        container: ContainerInfo {
            name: source.name,
            container: source.container,
            size_bytes: source.size_bytes,
            bitrate: source.bitrate,
            run_time_ticks: source.run_time_ticks,
        },
        streams: streams.into_iter().map(stream_from_row).collect(),
    }
}

pub fn stream_options_from_rows(
    rows: SourceWithStreams,
) -> MediaItemStreamOptions {
    MediaItemStreamOptions::from_source(source_from_rows(rows))
}

/// Rows for `source`, stored at `position` among its item's sources.
pub fn rows_from_source(
    source: &MediaItemSource,
    position: i64,
) -> SourceWithStreams {

    let source_id = source.id.to_string();
    let streams = source
        .streams
        .iter()
        .map(|stream| StreamRow {
            source_id: source_id.clone(),
            stream_index: stream.index,
            kind: stream.kind.as_str().to_string(),
            codec: stream.codec.clone(),
            language: stream.language.clone(),
            title: stream.title.clone(),
            is_default: stream.is_default,
            is_forced: stream.is_forced,
            is_external: stream.is_external,
            width: stream.width,
            height: stream.height,
            channels: stream.channels,
        })
        .collect();

    SourceWithStreams {
        source: SourceRow {
            id: source_id,
            item_id: source.item_id.to_string(),
            position,
            name: source.container.name.clone(),
            container: source.container.container.clone(),
            size_bytes: source.container.size_bytes,
            bitrate: source.container.bitrate,
            run_time_ticks: source.container.run_time_ticks,
        },
        streams,
    }
}
