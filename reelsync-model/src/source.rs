use crate::ids::{ItemId, SourceId};

/// Track type inside a media container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
    /// Embedded images, data tracks and anything else the client cannot pick
    Other,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Video => "Video",
            StreamKind::Audio => "Audio",
            StreamKind::Subtitle => "Subtitle",
            StreamKind::Other => "Other",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "Video" => StreamKind::Video,
            "Audio" => StreamKind::Audio,
            "Subtitle" => StreamKind::Subtitle,
            _ => StreamKind::Other,
        }
    }
}

/// Single track descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaStream {
    /// Index of the track within its container; unique per source
    pub index: i64,
    pub kind: StreamKind,
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

/// Container-level metadata of a media source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContainerInfo {
    pub name: Option<String>,
    pub container: Option<String>,
    pub size_bytes: Option<i64>,
    pub bitrate: Option<i64>,
    pub run_time_ticks: Option<i64>,
}

/// One playable variant (file/version) of an item
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaItemSource {
    pub id: SourceId,
    pub item_id: ItemId,
    pub container: ContainerInfo,
    /// Streams in container order
    pub streams: Vec<MediaStream>,
}

/// The choices a player offers for a source, grouped by track type
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaItemStreamOptions {
    pub source_id: SourceId,
    pub item_id: ItemId,
    pub container: ContainerInfo,
    pub video: Vec<MediaStream>,
    pub audio: Vec<MediaStream>,
    pub subtitles: Vec<MediaStream>,
    pub default_audio_index: Option<i64>,
    pub default_subtitle_index: Option<i64>,
}

impl MediaItemStreamOptions {
    /// Partitions a source's streams by kind, keeping container order.
    ///
    /// The default audio track falls back to the first audio stream when the
    /// container flags none; subtitles only have a default when one is
    /// flagged.
    pub fn from_source(source: MediaItemSource) -> Self {
        let mut video = Vec::new();
        let mut audio = Vec::new();
        let mut subtitles = Vec::new();

        for stream in source.streams {
            match stream.kind {
                StreamKind::Video => video.push(stream),
                StreamKind::Audio => audio.push(stream),
                StreamKind::Subtitle => subtitles.push(stream),
                StreamKind::Other => {}
            }
        }

        let default_audio_index = audio
            .iter()
            .find(|s| s.is_default)
            .or_else(|| audio.first())
            .map(|s| s.index);
        let default_subtitle_index = subtitles
            .iter()
            .find(|s| s.is_default || s.is_forced)
            .map(|s| s.index);

        Self {
            source_id: source.id,
            item_id: source.item_id,
            container: source.container,
            video,
            audio,
            subtitles,
            default_audio_index,
            default_subtitle_index,
        }
    }
}
