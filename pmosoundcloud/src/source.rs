//! Host-facing source facade
//!
//! [`SoundCloudSource`] bundles the paginator, the stream resolver and
//! the shared metadata cache behind the entry points the playback host
//! calls: browse one page, resolve a playable identifier, poll cached
//! metadata, resolve a pasted catalog link, and build the top-level menu.
//!
//! Browse-path errors never tear down a browse session: the lenient
//! wrapper renders them as a single text leaf. Playback-path errors are
//! terminal for that attempt and carry a distinct kind for the host to
//! localize before advancing to the next queued item.

use crate::api::resolver::{BrowseKind, BrowseRequest};
use crate::api::SoundCloudApi;
use crate::client::SoundCloudClient;
use crate::config::Settings;
use crate::error::{Result, SoundCloudError};
use crate::metadata_cache::MetadataCache;
use crate::models::PlaybackMetadata;
use crate::paginator::CatalogPaginator;
use crate::stream::{track_id_from_uri, ResolvedStream, StreamResolver};
use pmomenu::{MenuEntry, Page};
use std::sync::Arc;
use tracing::{debug, warn};

/// Human-readable source name
pub const SOURCE_NAME: &str = "SoundCloud";

/// Unique source identifier
pub const SOURCE_ID: &str = "soundcloud";

/// Entry shown in place of the authenticated branches in anonymous mode
const CREDENTIAL_PLACEHOLDER: &str =
    "Enter your SoundCloud API token in the settings to browse favorites, \
     playlists, friends and activities.";

/// SoundCloud catalog source
///
/// Constructed once per process; clones share the caches, the settings
/// handle and the HTTP connection pools.
#[derive(Clone)]
pub struct SoundCloudSource {
    client: SoundCloudClient,
    paginator: CatalogPaginator,
    resolver: StreamResolver,
    metadata_cache: Arc<MetadataCache>,
    settings: Arc<Settings>,
}

impl SoundCloudSource {
    /// Create a source from settings, against the public API
    pub fn new(settings: Arc<Settings>) -> Result<Self> {
        let api = SoundCloudApi::builder()
            .auth_token(settings.api_token())
            .build()?;
        Ok(Self::with_api(api, settings))
    }

    /// Create a source over an explicit transport (tests, custom base URL)
    pub fn with_api(api: SoundCloudApi, settings: Arc<Settings>) -> Self {
        let client = SoundCloudClient::new(api.clone());
        let metadata_cache = Arc::new(MetadataCache::new());
        let resolver = StreamResolver::new(client.clone(), metadata_cache.clone());

        Self {
            client,
            paginator: CatalogPaginator::new(api),
            resolver,
            metadata_cache,
            settings,
        }
    }

    /// Source display name
    pub fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    /// Source identifier
    pub fn id(&self) -> &'static str {
        SOURCE_ID
    }

    /// Shared metadata cache handle
    pub fn metadata_cache(&self) -> Arc<MetadataCache> {
        self.metadata_cache.clone()
    }

    /// The underlying client
    pub fn client(&self) -> &SoundCloudClient {
        &self.client
    }

    // ============ Browse ============

    /// Top-level menu entries
    ///
    /// Anonymous mode (no credential configured) hides every
    /// authenticated-only branch and substitutes a single placeholder
    /// entry pointing the user at the settings.
    pub fn root_menu(&self) -> Vec<MenuEntry> {
        let mut entries = vec![
            MenuEntry::search("Search", BrowseRequest::new(BrowseKind::Tracks).encode()),
            MenuEntry::search("Search by tag", BrowseRequest::new(BrowseKind::Tags).encode()),
            MenuEntry::link(
                "Hot tracks",
                BrowseRequest::new(BrowseKind::Tracks)
                    .with_order("order=hotness")
                    .encode(),
            ),
            MenuEntry::link(
                "Latest tracks",
                BrowseRequest::new(BrowseKind::Tracks).encode(),
            ),
        ];

        if self.settings.is_authenticated() {
            entries.push(MenuEntry::link(
                "My favorites",
                BrowseRequest::new(BrowseKind::Favorites).encode(),
            ));
            entries.push(MenuEntry::link(
                "My playlists",
                BrowseRequest::new(BrowseKind::Playlists).encode(),
            ));
            entries.push(MenuEntry::link(
                "Friends",
                BrowseRequest::new(BrowseKind::Friends).encode(),
            ));
            entries.push(MenuEntry::link(
                "Activity stream",
                BrowseRequest::new(BrowseKind::Activities).encode(),
            ));
        } else {
            entries.push(MenuEntry::text(CREDENTIAL_PLACEHOLDER));
        }

        entries
    }

    /// Fetch one page of menu entries
    pub async fn browse(&self, request: &BrowseRequest) -> Result<Page> {
        self.paginator.fetch_page(request).await
    }

    /// Fetch one page, rendering failures as a synthetic text leaf
    ///
    /// The browse session keeps going on errors: the host receives a
    /// valid one-entry page whose text carries the error message.
    pub async fn browse_page(&self, request: &BrowseRequest) -> Page {
        match self.browse(request).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Browse {:?} failed: {}", request.kind, e);
                error_page(request, &e)
            }
        }
    }

    /// Resolve a pasted catalog web link into a browsable page
    ///
    /// Minor copy-paste artifacts (stray spaces around domain
    /// separators) are normalized before resolution. The resolved
    /// resource shape picks the path: playlists expand into their
    /// tracks, single tracks yield one playable entry.
    pub async fn resolve_catalog_url(&self, user_input: &str) -> Result<Page> {
        let normalized = normalize_catalog_url(user_input);
        debug!("Resolving pasted link {:?} as {}", user_input, normalized);

        let request = BrowseRequest::new(BrowseKind::ResolveUrl).with_search(normalized);
        self.paginator.fetch_page(&request).await
    }

    // ============ Playback ============

    /// Resolve a playable identifier into a streamable CDN URL
    pub async fn resolve_playback(&self, track_uri: &str) -> Result<ResolvedStream> {
        self.resolver
            .resolve(track_uri, self.settings.playback_mode())
            .await
    }

    /// Metadata for the currently playing track, without blocking
    ///
    /// Returns the cached metadata when present, a placeholder
    /// otherwise. On a miss, every queued track lacking a cache entry is
    /// claimed through the fetch guard and prefetched in the background,
    /// so a later poll finds the cache warm. Must be called from within
    /// the host's async runtime.
    pub fn cached_metadata(
        &self,
        client_id: &str,
        track_uri: &str,
        queue: &[String],
    ) -> PlaybackMetadata {
        let track_id = match track_id_from_uri(track_uri) {
            Ok(id) => id,
            Err(_) => return PlaybackMetadata::placeholder(""),
        };

        if let Some(metadata) = self.metadata_cache.get(&track_id) {
            return metadata;
        }

        for queued in queue {
            let Ok(id) = track_id_from_uri(queued) else {
                continue;
            };
            if self.metadata_cache.get(&id).is_some() {
                continue;
            }
            if !self.metadata_cache.try_begin_fetch(client_id, &id) {
                continue;
            }
            self.spawn_prefetch(client_id.to_string(), id);
        }

        PlaybackMetadata::placeholder(track_id)
    }

    /// Independent background descriptor fetch for one claimed track
    fn spawn_prefetch(&self, client_id: String, track_id: String) {
        let resolver = self.resolver.clone();
        let cache = self.metadata_cache.clone();

        tokio::spawn(async move {
            match resolver.prefetch_metadata(&track_id).await {
                Ok(_) => debug!("Prefetched metadata for track {}", track_id),
                Err(e) => warn!("Background metadata fetch for {} failed: {}", track_id, e),
            }
            // The flag clears on both continuations; retries happen on
            // the next poll cycle, never in a loop here.
            cache.end_fetch(&client_id, &track_id);
        });
    }
}

impl std::fmt::Debug for SoundCloudSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundCloudSource")
            .field("authenticated", &self.settings.is_authenticated())
            .field("metadata_cache", &self.metadata_cache)
            .finish()
    }
}

/// Render a browse failure as a one-entry page
///
/// The host shows the message as a tree leaf instead of aborting the
/// session.
pub fn error_page(request: &BrowseRequest, error: &SoundCloudError) -> Page {
    let entry = MenuEntry::text(error.to_string());
    Page::new(vec![entry], request.offset, request.offset + 1)
}

/// Normalize copy-paste artifacts out of a pasted catalog link
///
/// Strips whitespace around "." and "/" separators and supplies the
/// scheme when missing.
pub(crate) fn normalize_catalog_url(input: &str) -> String {
    let chars: Vec<char> = input.trim().chars().collect();
    let mut result = String::with_capacity(chars.len());

    for (i, &c) in chars.iter().enumerate() {
        if c.is_whitespace() {
            let prev = chars[..i].iter().rev().find(|ch| !ch.is_whitespace());
            let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
            let around_separator = matches!(prev, Some('.') | Some('/'))
                || matches!(next, Some('.') | Some('/'));
            if around_separator {
                continue;
            }
        }
        result.push(c);
    }

    if url::Url::parse(&result).is_err() {
        let with_scheme = format!("https://{result}");
        if url::Url::parse(&with_scheme).is_ok() {
            return with_scheme;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmomenu::MenuKind;
    use serde_json::json;
    use std::time::Duration;

    fn source(server: &mockito::Server, settings: Settings) -> SoundCloudSource {
        let api = SoundCloudApi::builder()
            .base_url(server.url())
            .auth_token(settings.api_token())
            .build()
            .unwrap();
        SoundCloudSource::with_api(api, Arc::new(settings))
    }

    #[tokio::test]
    async fn test_root_menu_hides_authenticated_branches_when_anonymous() {
        let server = mockito::Server::new_async().await;
        let anonymous = source(&server, Settings::in_memory());

        let entries = anonymous.root_menu();
        assert!(entries.iter().all(|e| e.name != "My favorites"));
        let placeholder = entries.last().unwrap();
        assert_eq!(placeholder.kind, MenuKind::Text);
        assert!(placeholder.name.contains("API token"));
    }

    #[tokio::test]
    async fn test_root_menu_offers_authenticated_branches_with_credential() {
        let server = mockito::Server::new_async().await;
        let settings = Settings::in_memory();
        settings.set_api_token("tok").unwrap();
        let authed = source(&server, settings);

        let names: Vec<String> = authed.root_menu().iter().map(|e| e.name.clone()).collect();
        assert!(names.contains(&"My favorites".to_string()));
        assert!(names.contains(&"Friends".to_string()));
        assert!(names.contains(&"Activity stream".to_string()));
        assert!(!names.iter().any(|n| n.contains("API token")));
    }

    #[tokio::test]
    async fn test_browse_page_renders_errors_as_text_leaf() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/tracks")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .with_body(r#"{"errors":[{"error_message":"backend down"}]}"#)
            .create_async()
            .await;

        let source = source(&server, Settings::in_memory());
        let request = BrowseRequest::new(BrowseKind::Tracks).with_offset(4);
        let page = source.browse_page(&request).await;

        assert_eq!(page.len(), 1);
        assert_eq!(page.items[0].kind, MenuKind::Text);
        assert!(page.items[0].name.contains("backend down"));
        assert_eq!(page.offset, 4);
    }

    #[tokio::test]
    async fn test_resolve_playback_end_to_end() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/tracks/42")
            .with_body(
                json!({
                    "id": 42,
                    "duration": 180000,
                    "title": "Song",
                    "stream_url": format!("{}/stream/42", server.url()),
                    "downloadable": false
                })
                .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("GET", "/stream/42")
            .with_status(302)
            .with_header("Location", "https://edge.example/42.mp3")
            .create_async()
            .await;

        let source = source(&server, Settings::in_memory());
        let resolved = source.resolve_playback("track://42").await.unwrap();

        assert_eq!(resolved.stream_url, "https://edge.example/42.mp3");
        assert_eq!(resolved.metadata.duration_seconds, 180);
        assert_eq!(source.metadata_cache().get("42").unwrap().track_id, "42");
    }

    #[tokio::test]
    async fn test_cached_metadata_poll_prefetches_queue_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/tracks/7")
            .with_body(
                json!({
                    "id": 7,
                    "title": "Queued",
                    "duration": 60000,
                    "user": {"username": "bob"}
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let source = source(&server, Settings::in_memory());
        let queue = vec!["soundcloud://track/7".to_string()];

        // Two back-to-back polls: the second must not claim a second fetch
        let first = source.cached_metadata("player-1", "soundcloud://track/7", &queue);
        assert!(first.title.is_empty());
        let second = source.cached_metadata("player-1", "soundcloud://track/7", &queue);
        assert!(second.title.is_empty());

        // Let the background fetch land
        for _ in 0..100 {
            if source.metadata_cache().get("7").is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let warmed = source.cached_metadata("player-1", "soundcloud://track/7", &queue);
        assert_eq!(warmed.title, "Queued");
        assert_eq!(warmed.artist, "bob");
        assert_eq!(source.metadata_cache().in_flight_count(), 0);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_prefetch_clears_the_guard() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/tracks/9")
            .with_status(404)
            .with_body(r#"{"errors":[{"error_message":"not found"}]}"#)
            .create_async()
            .await;

        let source = source(&server, Settings::in_memory());
        let queue = vec!["soundcloud://track/9".to_string()];
        source.cached_metadata("player-1", "soundcloud://track/9", &queue);

        for _ in 0..100 {
            if source.metadata_cache().in_flight_count() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        // Error continuation released the flag; the next poll may retry
        assert_eq!(source.metadata_cache().in_flight_count(), 0);
        assert!(source.metadata_cache().get("9").is_none());
    }

    #[tokio::test]
    async fn test_resolve_catalog_url_expands_playlist() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/resolve")
            .match_query(mockito::Matcher::UrlEncoded(
                "url".into(),
                "https://soundcloud.com/alice/sets/mix".into(),
            ))
            .with_body(
                json!({
                    "kind": "playlist",
                    "id": 5,
                    "title": "Mix",
                    "tracks": [
                        {"id": 1, "title": "A"},
                        {"id": 2, "title": "B"}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let source = source(&server, Settings::in_memory());
        let page = source
            .resolve_catalog_url("https://soundcloud .com/alice/sets/mix")
            .await
            .unwrap();

        assert_eq!(page.len(), 2);
        assert!(page.items.iter().all(|e| e.is_playable()));
    }

    #[test]
    fn test_normalize_catalog_url() {
        assert_eq!(
            normalize_catalog_url("https://soundcloud .com/alice"),
            "https://soundcloud.com/alice"
        );
        assert_eq!(
            normalize_catalog_url("  https://soundcloud. com/alice/song  "),
            "https://soundcloud.com/alice/song"
        );
        assert_eq!(
            normalize_catalog_url("soundcloud.com/alice"),
            "https://soundcloud.com/alice"
        );
        assert_eq!(
            normalize_catalog_url("https://soundcloud.com/two words"),
            "https://soundcloud.com/two words"
        );
    }
}
