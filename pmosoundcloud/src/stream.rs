//! Stream resolution
//!
//! Converts an opaque playable identifier into an actual network stream
//! URL at playback time. The catalog API hands out signed, time-limited
//! redirects rather than direct file URLs, so resolution is a two-hop
//! fetch: track descriptor first, then a redirect probe on the selected
//! source URL. The resolved CDN URL is never re-resolved for seeking;
//! seeking is unsupported because the signed URL does not replay ranges
//! safely.

use crate::client::SoundCloudClient;
use crate::config::PlaybackMode;
use crate::error::{Result, SoundCloudError};
use crate::metadata_cache::MetadataCache;
use crate::models::{PlaybackMetadata, Track};
use crate::parsers::TRACK_URI_PREFIX;
use std::sync::Arc;
use tracing::{debug, warn};

/// Phases of one playback resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPhase {
    /// Nothing happened yet
    Idle,
    /// Descriptor fetch in flight
    FetchingDescriptor,
    /// Redirect probe in flight
    ResolvingRedirect,
    /// Stream URL and metadata delivered
    Ready,
    /// Terminal failure at either fetch step
    Failed,
}

/// Outcome of a successful resolution
#[derive(Debug, Clone)]
pub struct ResolvedStream {
    /// Final CDN URL, playable immediately
    pub stream_url: String,
    /// Derived metadata, also written to the cache
    pub metadata: PlaybackMetadata,
}

/// State of one playback resolution request
#[derive(Debug)]
pub struct PlaybackResolution {
    track_id: String,
    phase: ResolutionPhase,
}

impl PlaybackResolution {
    /// Start a resolution for a playable identifier
    pub fn new(track_uri: &str) -> Result<Self> {
        Ok(Self {
            track_id: track_id_from_uri(track_uri)?,
            phase: ResolutionPhase::Idle,
        })
    }

    /// Track id extracted from the identifier
    pub fn track_id(&self) -> &str {
        &self.track_id
    }

    /// Current phase
    pub fn phase(&self) -> ResolutionPhase {
        self.phase
    }
}

/// Resolver turning playable identifiers into CDN stream URLs
#[derive(Debug, Clone)]
pub struct StreamResolver {
    client: SoundCloudClient,
    cache: Arc<MetadataCache>,
}

impl StreamResolver {
    /// Create a resolver writing into the shared metadata cache
    pub fn new(client: SoundCloudClient, cache: Arc<MetadataCache>) -> Self {
        Self { client, cache }
    }

    /// Resolve a playable identifier into a streamable URL
    pub async fn resolve(&self, track_uri: &str, mode: PlaybackMode) -> Result<ResolvedStream> {
        let mut resolution = PlaybackResolution::new(track_uri)?;
        self.drive(&mut resolution, mode).await
    }

    /// Drive a resolution through its phases
    pub async fn drive(
        &self,
        resolution: &mut PlaybackResolution,
        mode: PlaybackMode,
    ) -> Result<ResolvedStream> {
        resolution.phase = ResolutionPhase::FetchingDescriptor;
        debug!("Fetching descriptor for track {}", resolution.track_id);

        let track = match self.client.get_track(&resolution.track_id).await {
            Ok(track) => track,
            Err(e) => {
                warn!("Descriptor fetch for {} failed: {}", resolution.track_id, e);
                resolution.phase = ResolutionPhase::Failed;
                return Err(e);
            }
        };

        let source_url = match select_source_url(&track, mode) {
            Some(url) => url.to_string(),
            None => {
                resolution.phase = ResolutionPhase::Failed;
                return Err(SoundCloudError::NotFound(format!(
                    "track {} has no stream URL",
                    resolution.track_id
                )));
            }
        };

        resolution.phase = ResolutionPhase::ResolvingRedirect;
        debug!("Probing {} for the CDN target", source_url);

        let stream_url = match self.client.api().probe_redirect(&source_url).await {
            Ok(url) => url,
            Err(e) => {
                warn!("Redirect probe for {} failed: {}", resolution.track_id, e);
                resolution.phase = ResolutionPhase::Failed;
                return Err(e);
            }
        };

        let metadata = PlaybackMetadata::from_track(&track);
        self.cache.insert(metadata.clone());

        resolution.phase = ResolutionPhase::Ready;
        Ok(ResolvedStream {
            stream_url,
            metadata,
        })
    }

    /// Background prefetch: descriptor only, no redirect probe
    ///
    /// Populates title/artist/artwork ahead of playback. The signed
    /// stream URL is left unresolved until a playback request needs it.
    pub async fn prefetch_metadata(&self, track_id: &str) -> Result<PlaybackMetadata> {
        let track = self.client.get_track(track_id).await?;
        let metadata = PlaybackMetadata::from_track(&track);
        self.cache.insert(metadata.clone());
        Ok(metadata)
    }
}

/// Select the source URL for a descriptor, deterministically
///
/// The download URL is used only when the playback method preference is
/// download AND the descriptor marks the track downloadable AND a
/// non-empty download URL is present; the streaming URL otherwise.
pub fn select_source_url(track: &Track, mode: PlaybackMode) -> Option<&str> {
    if mode == PlaybackMode::Download && track.downloadable {
        if let Some(url) = track.download_url.as_deref().filter(|u| !u.is_empty()) {
            return Some(url);
        }
    }
    track.stream_url.as_deref().filter(|u| !u.is_empty())
}

/// Extract the track id from a playable identifier
///
/// Accepts the canonical `soundcloud://track/{id}` form, the bare
/// `track://{id}` form and raw numeric ids.
pub fn track_id_from_uri(uri: &str) -> Result<String> {
    let tail = uri
        .strip_prefix(TRACK_URI_PREFIX)
        .or_else(|| uri.strip_prefix("track://"))
        .unwrap_or(uri);
    let id = tail.rsplit('/').next().unwrap_or(tail);

    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        Ok(id.to_string())
    } else {
        Err(SoundCloudError::InvalidUri(uri.to_string()))
    }
}
