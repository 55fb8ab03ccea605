//! Data structures for the objects returned by the SoundCloud API

use serde::{Deserialize, Deserializer, Serialize};

/// Flexible deserializer for ids that arrive as strings or integers
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    let value = Value::deserialize(deserializer)?;
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(Error::custom("ID must be a string or number")),
    }
}

fn default_true() -> bool {
    true
}

/// A SoundCloud user, as embedded in tracks, playlists and the social graph
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Unique user id
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub id: Option<String>,
    /// Display name
    #[serde(default)]
    pub username: String,
    /// Avatar image URL
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Number of public tracks
    #[serde(default)]
    pub track_count: Option<u32>,
    /// Number of public playlists
    #[serde(default)]
    pub playlist_count: Option<u32>,
    /// Number of public favorites
    #[serde(default)]
    pub public_favorites_count: Option<u32>,
}

/// Optional variant of [`deserialize_id`]
pub(crate) fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Raw track descriptor
///
/// Fields the source consumes: id, title, duration (milliseconds), the
/// uploader's username, artwork URL, stream URL, download URL and the
/// downloadable flag. Everything else the API sends is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Track {
    /// Unique track id
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Track title
    #[serde(default)]
    pub title: String,
    /// Duration in milliseconds
    #[serde(default)]
    pub duration: u64,
    /// Uploading user
    #[serde(default)]
    pub user: Option<User>,
    /// Artwork image URL
    #[serde(default)]
    pub artwork_url: Option<String>,
    /// API streaming URL (signed redirect, not a direct file URL)
    #[serde(default)]
    pub stream_url: Option<String>,
    /// Direct download URL, when the uploader allows downloads
    #[serde(default)]
    pub download_url: Option<String>,
    /// Whether the uploader allows downloads
    #[serde(default)]
    pub downloadable: bool,
    /// Whether the track is streamable
    #[serde(default = "default_true")]
    pub streamable: bool,
}

impl Track {
    /// Duration converted to whole seconds
    pub fn duration_seconds(&self) -> u32 {
        (self.duration / 1000) as u32
    }

    /// Username of the uploader, when known
    pub fn artist_name(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.username.as_str())
    }
}

/// Raw playlist descriptor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Playlist {
    /// Unique playlist id
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Playlist title
    #[serde(default)]
    pub title: String,
    /// Number of tracks, when reported
    #[serde(default)]
    pub track_count: Option<u32>,
    /// Total duration in milliseconds, when reported
    #[serde(default)]
    pub duration: Option<u64>,
    /// Artwork image URL
    #[serde(default)]
    pub artwork_url: Option<String>,
    /// Owning user
    #[serde(default)]
    pub user: Option<User>,
    /// Embedded tracks (present on single-playlist fetches)
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// One entry of the user's activity stream
///
/// `origin` is kept as raw JSON: depending on the activity subtype it is
/// either the shared object itself or a wrapper holding the acting user
/// plus a nested `track`/`playlist` object. The activity parser
/// de-references it.
#[derive(Debug, Clone, Deserialize)]
pub struct Activity {
    /// Activity subtype tag (e.g. "favoriting", "comment", "track-sharing")
    #[serde(rename = "type", default)]
    pub activity_type: String,
    /// Raw origin object
    #[serde(default)]
    pub origin: serde_json::Value,
}

/// Result of the catalog `resolve` endpoint, discriminated by the API's
/// own `kind` tag
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResolvedResource {
    /// A single track
    Track(Track),
    /// A playlist, with its tracks embedded
    Playlist(Playlist),
    /// A user page
    User(User),
}

/// Bitrate label reported for SoundCloud streams
pub const STREAM_BITRATE_LABEL: &str = "128k";

/// Format label reported for SoundCloud streams
pub const STREAM_FORMAT_LABEL: &str = "MP3";

/// Derived playback metadata, cached per track id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackMetadata {
    /// Track id this metadata belongs to
    pub track_id: String,
    /// Duration in whole seconds
    pub duration_seconds: u32,
    /// Track title
    pub title: String,
    /// Artist display name
    pub artist: String,
    /// Artwork URL (high resolution variant when available)
    pub artwork_url: String,
    /// Bitrate label for display
    pub bitrate_label: String,
    /// Format label for display
    pub format_label: String,
}

impl PlaybackMetadata {
    /// Build metadata from a track descriptor
    pub fn from_track(track: &Track) -> Self {
        let artwork = track
            .artwork_url
            .as_deref()
            .map(upgrade_artwork)
            .or_else(|| {
                track
                    .user
                    .as_ref()
                    .and_then(|u| u.avatar_url.clone())
            })
            .unwrap_or_default();

        Self {
            track_id: track.id.clone(),
            duration_seconds: track.duration_seconds(),
            title: track.title.clone(),
            artist: track.artist_name().unwrap_or_default().to_string(),
            artwork_url: artwork,
            bitrate_label: STREAM_BITRATE_LABEL.to_string(),
            format_label: STREAM_FORMAT_LABEL.to_string(),
        }
    }

    /// Placeholder returned to pollers while no metadata is cached yet
    pub fn placeholder(track_id: impl Into<String>) -> Self {
        Self {
            track_id: track_id.into(),
            duration_seconds: 0,
            title: String::new(),
            artist: String::new(),
            artwork_url: String::new(),
            bitrate_label: STREAM_BITRATE_LABEL.to_string(),
            format_label: STREAM_FORMAT_LABEL.to_string(),
        }
    }
}

/// Upgrade a "-large" artwork URL to the higher-resolution variant
pub fn upgrade_artwork(url: &str) -> String {
    if url.contains("-large") {
        url.replace("-large", "-t500x500")
    } else {
        url.to_string()
    }
}
