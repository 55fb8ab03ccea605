//! Mapping of browse requests onto concrete API resources
//!
//! A [`BrowseRequest`] describes what the host wants to list; [`resolve`]
//! turns it into the API path, query parameters and authentication mode to
//! use. The mapping is a pure function so every rule of the fallback
//! chains is unit-testable without a network.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SoundCloudError};

/// Kind of catalog listing being requested
///
/// Adding a resource type is a compile-time-checked change: the resolver,
/// paginator and parser all match exhaustively on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowseKind {
    /// Public tracks (default listing, search, orderings)
    Tracks,
    /// Playlists (own, of a user, searched, or one playlist's tracks)
    Playlists,
    /// Liked tracks (own or of a user)
    Favorites,
    /// Tracks filtered by tag
    Tags,
    /// Followed users
    Friends,
    /// A single followed user
    Friend,
    /// The logged-in user's activity stream
    Activities,
    /// Resolution of a pasted catalog web link
    ResolveUrl,
}

/// One logical browse request; immutable per paging cycle
///
/// The `offset` advances monotonically across paging cycles of one logical
/// listing. Encoded requests double as the opaque continuation cursors
/// carried by menu entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowseRequest {
    /// Listing kind
    pub kind: BrowseKind,
    /// Start offset
    #[serde(default)]
    pub offset: u32,
    /// Requested number of entries
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Search text (or tag text for [`BrowseKind::Tags`], or the pasted
    /// URL for [`BrowseKind::ResolveUrl`])
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Scoping user id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Scoping playlist id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlist_id: Option<String>,
    /// Extra ordering/filter parameters, `key=value` pairs joined by `&`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
}

fn default_limit() -> u32 {
    50
}

impl BrowseRequest {
    /// Create a request with default paging
    pub fn new(kind: BrowseKind) -> Self {
        Self {
            kind,
            offset: 0,
            limit: default_limit(),
            search: None,
            user_id: None,
            playlist_id: None,
            order: None,
        }
    }

    /// Set the start offset
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Set the requested entry count
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Set the search text
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Scope to a user
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Scope to a playlist
    pub fn with_playlist(mut self, playlist_id: impl Into<String>) -> Self {
        self.playlist_id = Some(playlist_id.into());
        self
    }

    /// Attach ordering parameters
    pub fn with_order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    /// Encode as an opaque continuation cursor
    pub fn encode(&self) -> String {
        // BrowseRequest only holds serializable scalars, this cannot fail
        serde_json::to_string(self).expect("cursor encoding")
    }

    /// Decode a continuation cursor produced by [`Self::encode`]
    pub fn decode(cursor: &str) -> Result<Self> {
        serde_json::from_str(cursor)
            .map_err(|_| SoundCloudError::InvalidUri(format!("bad continuation cursor: {cursor}")))
    }
}

/// Concrete API resource a request maps to
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResource {
    /// Path relative to the API base URL
    pub path: String,
    /// Query parameters, in emission order
    pub query: Vec<(String, String)>,
    /// Whether the credential should be attached when configured
    pub requires_auth: bool,
}

impl ApiResource {
    fn new(path: impl Into<String>, requires_auth: bool) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
            requires_auth,
        }
    }

    fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    /// Append `key=value` pairs parsed from an ordering string
    fn order_params(mut self, order: &str) -> Self {
        for pair in order.split('&') {
            if let Some((key, value)) = pair.split_once('=') {
                self.query.push((key.to_string(), value.to_string()));
            }
        }
        self
    }

    /// Append offset and limit paging parameters
    fn paging(self, request: &BrowseRequest) -> Self {
        self.param("offset", request.offset.to_string())
            .param("limit", request.limit.to_string())
    }
}

/// Map a browse request to the API resource serving it
pub fn resolve(request: &BrowseRequest) -> ApiResource {
    match request.kind {
        BrowseKind::Tracks => match request.user_id {
            Some(ref uid) => {
                ApiResource::new(format!("users/{uid}/tracks"), true).paging(request)
            }
            None => {
                let mut resource = ApiResource::new("tracks", false);
                if let Some(ref q) = request.search {
                    resource = resource.param("q", q.clone());
                }
                if let Some(ref order) = request.order {
                    resource = resource.order_params(order);
                }
                // filter=streamable unless the ordering already pins a filter
                let has_filter = resource.query.iter().any(|(k, _)| k == "filter");
                if !has_filter {
                    resource = resource.param("filter", "streamable");
                }
                resource.paging(request)
            }
        },

        BrowseKind::Tags => {
            ApiResource::new("tracks", false)
                .param("tags", request.search.clone().unwrap_or_default())
                .param("filter", "streamable")
                .paging(request)
        }

        BrowseKind::Playlists => {
            if let Some(ref pid) = request.playlist_id {
                // Single playlist: the API returns the whole object, no paging
                ApiResource::new(format!("playlists/{pid}"), true)
            } else if let Some(ref uid) = request.user_id {
                ApiResource::new(format!("users/{uid}/playlists"), true).paging(request)
            } else if request.search.as_deref().is_some_and(|s| !s.is_empty()) {
                ApiResource::new("playlists", true)
                    .param("q", request.search.clone().unwrap_or_default())
                    .paging(request)
            } else {
                ApiResource::new("me/playlists", true).paging(request)
            }
        }

        BrowseKind::Favorites => {
            let path = match request.user_id {
                Some(ref uid) => format!("users/{uid}/likes/tracks"),
                None => "me/likes/tracks".to_string(),
            };
            ApiResource::new(path, true).paging(request)
        }

        // The followings listing ignores limit server-side, only offset
        // is honored; the limit is enforced locally by the paginator.
        BrowseKind::Friends => ApiResource::new("me/followings", true)
            .param("offset", request.offset.to_string()),

        BrowseKind::Friend => {
            let uid = request.user_id.as_deref().unwrap_or("me");
            ApiResource::new(format!("users/{uid}"), true)
        }

        // The activity stream ignores offset; limit is honored, but a
        // limit of 1 is reserved for the refetch-and-filter path and
        // must fetch the unfiltered collection.
        BrowseKind::Activities => {
            let resource = ApiResource::new("me/activities", true);
            if request.limit > 1 {
                resource.param("limit", request.limit.to_string())
            } else {
                resource
            }
        }

        BrowseKind::ResolveUrl => ApiResource::new("resolve", false)
            .param("url", request.search.clone().unwrap_or_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_keys(resource: &ApiResource) -> Vec<&str> {
        resource.query.iter().map(|(k, _)| k.as_str()).collect()
    }

    fn query_value<'a>(resource: &'a ApiResource, key: &str) -> Option<&'a str> {
        resource
            .query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_default_tracks_are_streamable_and_anonymous() {
        let resource = resolve(&BrowseRequest::new(BrowseKind::Tracks));
        assert_eq!(resource.path, "tracks");
        assert!(!resource.requires_auth);
        assert_eq!(query_value(&resource, "filter"), Some("streamable"));
        assert!(query_keys(&resource).contains(&"offset"));
        assert!(query_keys(&resource).contains(&"limit"));
    }

    #[test]
    fn test_order_params_override_default_filter() {
        let request = BrowseRequest::new(BrowseKind::Tracks)
            .with_order("order=hotness&filter=downloadable");
        let resource = resolve(&request);
        assert_eq!(query_value(&resource, "order"), Some("hotness"));
        assert_eq!(query_value(&resource, "filter"), Some("downloadable"));
        assert_eq!(
            query_keys(&resource).iter().filter(|k| **k == "filter").count(),
            1
        );
    }

    #[test]
    fn test_user_scoped_tracks_require_auth() {
        let request = BrowseRequest::new(BrowseKind::Tracks).with_user("77");
        let resource = resolve(&request);
        assert_eq!(resource.path, "users/77/tracks");
        assert!(resource.requires_auth);
    }

    #[test]
    fn test_playlist_fallback_chain() {
        let by_id = resolve(&BrowseRequest::new(BrowseKind::Playlists).with_playlist("12"));
        assert_eq!(by_id.path, "playlists/12");
        assert!(by_id.query.is_empty());
        assert!(by_id.requires_auth);

        let by_user = resolve(&BrowseRequest::new(BrowseKind::Playlists).with_user("77"));
        assert_eq!(by_user.path, "users/77/playlists");

        let by_search = resolve(&BrowseRequest::new(BrowseKind::Playlists).with_search("jazz"));
        assert_eq!(by_search.path, "playlists");
        assert_eq!(query_value(&by_search, "q"), Some("jazz"));

        let own = resolve(&BrowseRequest::new(BrowseKind::Playlists));
        assert_eq!(own.path, "me/playlists");
    }

    #[test]
    fn test_favorites_paths() {
        let own = resolve(&BrowseRequest::new(BrowseKind::Favorites));
        assert_eq!(own.path, "me/likes/tracks");
        assert!(own.requires_auth);

        let of_user = resolve(&BrowseRequest::new(BrowseKind::Favorites).with_user("9"));
        assert_eq!(of_user.path, "users/9/likes/tracks");
    }

    #[test]
    fn test_friends_emit_offset_only() {
        let request = BrowseRequest::new(BrowseKind::Friends)
            .with_offset(30)
            .with_limit(10);
        let resource = resolve(&request);
        assert_eq!(resource.path, "me/followings");
        assert_eq!(query_value(&resource, "offset"), Some("30"));
        assert!(query_value(&resource, "limit").is_none());
    }

    #[test]
    fn test_activities_emit_limit_only_above_one() {
        let multi = resolve(&BrowseRequest::new(BrowseKind::Activities).with_limit(25));
        assert_eq!(multi.path, "me/activities");
        assert_eq!(query_value(&multi, "limit"), Some("25"));
        assert!(query_value(&multi, "offset").is_none());

        let single = resolve(
            &BrowseRequest::new(BrowseKind::Activities)
                .with_offset(3)
                .with_limit(1),
        );
        assert!(single.query.is_empty());
    }

    #[test]
    fn test_single_friend_and_resolve() {
        let friend = resolve(&BrowseRequest::new(BrowseKind::Friend).with_user("8"));
        assert_eq!(friend.path, "users/8");
        assert!(friend.requires_auth);
        assert!(friend.query.is_empty());

        let link = resolve(
            &BrowseRequest::new(BrowseKind::ResolveUrl)
                .with_search("https://soundcloud.com/alice/song"),
        );
        assert_eq!(link.path, "resolve");
        assert!(!link.requires_auth);
        assert_eq!(
            query_value(&link, "url"),
            Some("https://soundcloud.com/alice/song")
        );
    }

    #[test]
    fn test_cursor_roundtrip() {
        let request = BrowseRequest::new(BrowseKind::Favorites)
            .with_user("9")
            .with_offset(100);
        let cursor = request.encode();
        let decoded = BrowseRequest::decode(&cursor).unwrap();
        assert_eq!(decoded, request);

        assert!(BrowseRequest::decode("not json").is_err());
    }
}
