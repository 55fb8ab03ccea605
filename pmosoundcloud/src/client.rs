//! High-level SoundCloud client with descriptor caching

use crate::api::resolver::{resolve, ApiResource, BrowseKind, BrowseRequest};
use crate::api::SoundCloudApi;
use crate::error::Result;
use crate::models::{ResolvedResource, Track};
use moka::future::Cache as MokaCache;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// TTL of cached track descriptors (1 hour)
const TRACK_CACHE_TTL_SECS: u64 = 3600;

/// Maximum number of cached track descriptors
const TRACK_CACHE_CAPACITY: u64 = 1000;

/// High-level client wrapping the transport with a descriptor cache
///
/// Cloning is cheap; clones share the cache and connection pools.
/// Resolved stream URLs are deliberately NOT cached here: they are
/// signed and time-limited, every playback resolves afresh.
#[derive(Clone)]
pub struct SoundCloudClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    api: SoundCloudApi,
    tracks: MokaCache<String, Track>,
}

impl SoundCloudClient {
    /// Create a client over a configured transport
    pub fn new(api: SoundCloudApi) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                api,
                tracks: MokaCache::builder()
                    .max_capacity(TRACK_CACHE_CAPACITY)
                    .time_to_live(Duration::from_secs(TRACK_CACHE_TTL_SECS))
                    .build(),
            }),
        }
    }

    /// The underlying transport
    pub fn api(&self) -> &SoundCloudApi {
        &self.inner.api
    }

    /// Fetch a track descriptor by id, using the cache first
    pub async fn get_track(&self, track_id: &str) -> Result<Track> {
        if let Some(track) = self.inner.tracks.get(track_id).await {
            debug!("Track {} found in cache", track_id);
            return Ok(track);
        }

        let resource = ApiResource {
            path: format!("tracks/{track_id}"),
            query: Vec::new(),
            requires_auth: true,
        };
        let track: Track = self.inner.api.get(&resource).await?;

        self.inner
            .tracks
            .insert(track_id.to_string(), track.clone())
            .await;

        Ok(track)
    }

    /// Drop a cached descriptor
    pub async fn invalidate_track(&self, track_id: &str) {
        self.inner.tracks.invalidate(track_id).await;
    }

    /// Resolve a catalog web link into the resource it names
    pub async fn resolve_url(&self, url: &str) -> Result<ResolvedResource> {
        debug!("Resolving catalog URL {}", url);
        let request = BrowseRequest::new(BrowseKind::ResolveUrl).with_search(url);
        self.inner.api.get(&resolve(&request)).await
    }

    /// Number of descriptors currently cached
    pub async fn cached_track_count(&self) -> u64 {
        self.inner.tracks.run_pending_tasks().await;
        self.inner.tracks.entry_count()
    }
}

impl std::fmt::Debug for SoundCloudClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundCloudClient")
            .field("base_url", &self.inner.api.base_url())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(server: &mockito::Server) -> SoundCloudClient {
        let api = SoundCloudApi::builder()
            .base_url(server.url())
            .build()
            .unwrap();
        SoundCloudClient::new(api)
    }

    #[tokio::test]
    async fn test_get_track_hits_cache_on_second_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/tracks/42")
            .with_body(json!({"id": 42, "title": "Song", "duration": 1000}).to_string())
            .expect(1)
            .create_async()
            .await;

        let client = client(&server);
        let first = client.get_track("42").await.unwrap();
        let second = client.get_track("42").await.unwrap();

        assert_eq!(first.title, second.title);
        assert_eq!(client.cached_track_count().await, 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalidate_track_forces_refetch() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/tracks/42")
            .with_body(json!({"id": 42, "title": "Song"}).to_string())
            .expect(2)
            .create_async()
            .await;

        let client = client(&server);
        client.get_track("42").await.unwrap();
        client.invalidate_track("42").await;
        client.get_track("42").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_resolve_url_dispatches_on_kind() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/resolve")
            .match_query(mockito::Matcher::UrlEncoded(
                "url".into(),
                "https://soundcloud.com/alice/song".into(),
            ))
            .with_body(json!({"kind": "track", "id": 7, "title": "Song"}).to_string())
            .create_async()
            .await;

        let client = client(&server);
        let resolved = client
            .resolve_url("https://soundcloud.com/alice/song")
            .await
            .unwrap();

        match resolved {
            ResolvedResource::Track(track) => assert_eq!(track.id, "7"),
            other => panic!("unexpected resource: {other:?}"),
        }
    }
}
