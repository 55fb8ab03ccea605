//! Response parsers turning raw API payloads into menu entries
//!
//! One pure function per browse kind. All of them accept the raw decoded
//! JSON value and return an ordered entry sequence; malformed or
//! unexpected payloads degrade to an empty sequence, never an error.
//! Listing payloads arrive either as a bare array or wrapped in a
//! `collection` field, both shapes are accepted.

use crate::api::resolver::{BrowseKind, BrowseRequest};
use crate::models::{upgrade_artwork, Activity, Playlist, ResolvedResource, Track, User};
use pmomenu::MenuEntry;
use serde_json::Value;
use tracing::debug;

/// Scheme of the synthetic playable identifiers embedded in track entries
pub const TRACK_URI_PREFIX: &str = "soundcloud://track/";

/// Fallback title for tracks the API reports without one
const UNTITLED: &str = "Untitled";

fn collection_items(value: &Value) -> Option<&Vec<Value>> {
    value
        .as_array()
        .or_else(|| value.get("collection").and_then(Value::as_array))
}

// ============ Tracks ============

/// Parse a track listing
pub fn parse_tracks(value: &Value) -> Vec<MenuEntry> {
    let Some(items) = collection_items(value) else {
        debug!("Track payload is not a listing, returning no entries");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| serde_json::from_value::<Track>(item.clone()).ok())
        .map(|track| track_entry(&track))
        .collect()
}

/// Build the menu entry for one track
pub fn track_entry(track: &Track) -> MenuEntry {
    let name = if track.title.is_empty() {
        UNTITLED.to_string()
    } else {
        track.title.clone()
    };

    let icon = track
        .artwork_url
        .as_deref()
        .map(upgrade_artwork)
        .or_else(|| track.user.as_ref().and_then(|u| u.avatar_url.clone()));

    let mut entry = MenuEntry::track(name, format!("{TRACK_URI_PREFIX}{}", track.id));
    if let Some(icon) = icon {
        entry = entry.with_icon(icon);
    }
    entry
}

// ============ Playlists ============

/// Parse a playlist listing
pub fn parse_playlists(value: &Value) -> Vec<MenuEntry> {
    let Some(items) = collection_items(value) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| serde_json::from_value::<Playlist>(item.clone()).ok())
        .map(|playlist| playlist_entry(&playlist))
        .collect()
}

/// Parse a single playlist object into its track entries
pub fn parse_playlist_tracks(value: &Value) -> Vec<MenuEntry> {
    match serde_json::from_value::<Playlist>(value.clone()) {
        Ok(playlist) => playlist.tracks.iter().map(track_entry).collect(),
        Err(e) => {
            debug!("Playlist payload not decodable: {}", e);
            Vec::new()
        }
    }
}

/// Build the menu entry for one playlist
///
/// The title carries a parenthesized track-count/duration summary when
/// both are known. Artwork resolution order: playlist artwork, first
/// track's artwork, owner's avatar.
pub fn playlist_entry(playlist: &Playlist) -> MenuEntry {
    let name = match (playlist.track_count, playlist.duration) {
        (Some(count), Some(duration_ms)) => {
            let seconds = duration_ms / 1000;
            format!(
                "{} ({} tracks, {}m{}s)",
                playlist.title,
                count,
                seconds / 60,
                seconds % 60
            )
        }
        _ => playlist.title.clone(),
    };
    let name = if name.is_empty() {
        UNTITLED.to_string()
    } else {
        name
    };

    let icon = playlist
        .artwork_url
        .as_deref()
        .or_else(|| {
            playlist
                .tracks
                .first()
                .and_then(|t| t.artwork_url.as_deref())
        })
        .or_else(|| playlist.user.as_ref().and_then(|u| u.avatar_url.as_deref()))
        .map(upgrade_artwork);

    let cursor = BrowseRequest::new(BrowseKind::Playlists)
        .with_playlist(playlist.id.clone())
        .encode();

    let mut entry = MenuEntry::playlist(name, cursor);
    if let Some(icon) = icon {
        entry = entry.with_icon(icon);
    }
    entry
}

// ============ Friends ============

/// Parse the followings listing (or a single user object)
pub fn parse_friends(value: &Value) -> Vec<MenuEntry> {
    if let Some(items) = collection_items(value) {
        return items
            .iter()
            .filter_map(|item| serde_json::from_value::<User>(item.clone()).ok())
            .filter(|user| !user.username.is_empty())
            .map(|user| friend_entry(&user))
            .collect();
    }

    // Single-friend fetch returns one bare user object
    match serde_json::from_value::<User>(value.clone()) {
        Ok(user) if !user.username.is_empty() => vec![friend_entry(&user)],
        _ => Vec::new(),
    }
}

/// Build the menu entry for one followed user
///
/// Expanding a friend yields up to three sub-entries, each present only
/// when its count is non-zero.
pub fn friend_entry(user: &User) -> MenuEntry {
    let mut children = Vec::new();

    if let Some(ref uid) = user.id {
        if let Some(count) = user.public_favorites_count.filter(|c| *c > 0) {
            children.push(MenuEntry::link(
                format!("Favorites ({count})"),
                BrowseRequest::new(BrowseKind::Favorites)
                    .with_user(uid.clone())
                    .encode(),
            ));
        }
        if let Some(count) = user.track_count.filter(|c| *c > 0) {
            children.push(MenuEntry::link(
                format!("Tracks ({count})"),
                BrowseRequest::new(BrowseKind::Tracks)
                    .with_user(uid.clone())
                    .encode(),
            ));
        }
        if user.playlist_count.filter(|c| *c > 0).is_some() {
            children.push(MenuEntry::link(
                "Playlists",
                BrowseRequest::new(BrowseKind::Playlists)
                    .with_user(uid.clone())
                    .encode(),
            ));
        }
    }

    MenuEntry {
        name: user.username.clone(),
        kind: pmomenu::MenuKind::Link,
        icon_url: user.avatar_url.as_deref().map(upgrade_artwork),
        play_uri: None,
        children,
        continuation: None,
    }
}

// ============ Activities ============

/// Parse the activity stream
///
/// Each entry is either a shared playlist (delegated to the playlist
/// parser, then suffixed) or a track event whose name carries the
/// subtitle matching the activity subtype.
pub fn parse_activities(value: &Value) -> Vec<MenuEntry> {
    let Some(items) = collection_items(value) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| serde_json::from_value::<Activity>(item.clone()).ok())
        .filter_map(|activity| activity_entry(&activity))
        .collect()
}

fn activity_entry(activity: &Activity) -> Option<MenuEntry> {
    if activity.activity_type.starts_with("playlist") {
        let playlist_value = activity.origin.get("playlist").unwrap_or(&activity.origin);
        let playlist = serde_json::from_value::<Playlist>(playlist_value.clone()).ok()?;
        let actor = actor_name(&activity.origin, playlist.user.as_ref());

        let mut entry = playlist_entry(&playlist);
        entry.name = format!("{} - shared by {}", entry.name, actor);
        Some(entry)
    } else {
        let track_value = activity.origin.get("track").unwrap_or(&activity.origin);
        let track = serde_json::from_value::<Track>(track_value.clone()).ok()?;
        let actor = actor_name(&activity.origin, track.user.as_ref());

        let mut entry = track_entry(&track);
        entry.name = format!(
            "{} - {}",
            entry.name,
            activity_subtitle(&activity.activity_type, &actor)
        );
        Some(entry)
    }
}

/// Name of the acting user of an activity
///
/// The wrapper's own `user` object names the actor; the nested object's
/// uploader/owner is the fallback.
fn actor_name(origin: &Value, fallback: Option<&User>) -> String {
    origin
        .get("user")
        .and_then(|u| u.get("username"))
        .and_then(Value::as_str)
        .map(|s| s.to_string())
        .or_else(|| fallback.map(|u| u.username.clone()))
        .unwrap_or_default()
}

/// Subtitle for a track activity subtype
///
/// Unrecognized subtypes fall back to the generic sharing subtitle.
fn activity_subtitle(activity_type: &str, user: &str) -> String {
    match activity_type {
        t if t.starts_with("favoriting") => format!("favorited by {user}"),
        t if t.starts_with("comment") => format!("commented by {user}"),
        "track" => format!("new track by {user}"),
        _ => format!("shared by {user}"),
    }
}

// ============ Resolved catalog links ============

/// Parse the result of the resolve endpoint
///
/// Dispatches on the resource shape: a track yields a single playable
/// entry, a playlist yields its tracks (or the playlist entry when the
/// tracks are not embedded), a user yields a friend entry.
pub fn parse_resolved(value: &Value) -> Vec<MenuEntry> {
    match serde_json::from_value::<ResolvedResource>(value.clone()) {
        Ok(ResolvedResource::Track(track)) => vec![track_entry(&track)],
        Ok(ResolvedResource::Playlist(playlist)) => {
            if playlist.tracks.is_empty() {
                vec![playlist_entry(&playlist)]
            } else {
                playlist.tracks.iter().map(track_entry).collect()
            }
        }
        Ok(ResolvedResource::User(user)) => vec![friend_entry(&user)],
        Err(e) => {
            debug!("Resolved payload not decodable: {}", e);
            Vec::new()
        }
    }
}

/// Parser dispatch for a browse kind
pub fn parse_for_kind(kind: BrowseKind, value: &Value, single_playlist: bool) -> Vec<MenuEntry> {
    match kind {
        BrowseKind::Tracks | BrowseKind::Tags | BrowseKind::Favorites => parse_tracks(value),
        BrowseKind::Playlists if single_playlist => parse_playlist_tracks(value),
        BrowseKind::Playlists => parse_playlists(value),
        BrowseKind::Friends | BrowseKind::Friend => parse_friends(value),
        BrowseKind::Activities => parse_activities(value),
        BrowseKind::ResolveUrl => parse_resolved(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmomenu::MenuKind;
    use serde_json::json;

    #[test]
    fn test_parse_tracks_accepts_bare_array_and_collection() {
        let bare = json!([{"id": 1, "title": "A"}, {"id": 2, "title": "B"}]);
        let wrapped = json!({"collection": [{"id": 1, "title": "A"}, {"id": 2, "title": "B"}]});

        assert_eq!(parse_tracks(&bare).len(), 2);
        assert_eq!(parse_tracks(&wrapped).len(), 2);
    }

    #[test]
    fn test_track_entry_uri_and_artwork_upgrade() {
        let entries = parse_tracks(&json!([{
            "id": 42,
            "title": "Song",
            "artwork_url": "https://i1.sndcdn.com/artworks-x-large.jpg"
        }]));

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, MenuKind::Track);
        assert_eq!(entries[0].play_uri.as_deref(), Some("soundcloud://track/42"));
        assert_eq!(
            entries[0].icon_url.as_deref(),
            Some("https://i1.sndcdn.com/artworks-x-t500x500.jpg")
        );
    }

    #[test]
    fn test_untitled_track_still_has_a_name() {
        let entries = parse_tracks(&json!([{"id": 5}]));
        assert_eq!(entries[0].name, "Untitled");
    }

    #[test]
    fn test_malformed_payload_degrades_to_empty() {
        assert!(parse_tracks(&json!({"unexpected": true})).is_empty());
        assert!(parse_playlists(&json!("nope")).is_empty());
        assert!(parse_activities(&json!(12)).is_empty());
        assert!(parse_resolved(&json!({"kind": "comment"})).is_empty());
    }

    #[test]
    fn test_playlist_title_decoration() {
        let entries = parse_playlists(&json!([{
            "id": 9,
            "title": "Chill",
            "track_count": 12,
            "duration": 2590000
        }]));

        assert_eq!(entries[0].name, "Chill (12 tracks, 43m10s)");
        assert_eq!(entries[0].kind, MenuKind::Playlist);
        let cursor = BrowseRequest::decode(entries[0].continuation.as_ref().unwrap()).unwrap();
        assert_eq!(cursor.kind, BrowseKind::Playlists);
        assert_eq!(cursor.playlist_id.as_deref(), Some("9"));
    }

    #[test]
    fn test_playlist_artwork_fallback_chain() {
        let own = parse_playlists(&json!([{
            "id": 1, "title": "P",
            "artwork_url": "https://a/p-large.jpg",
            "tracks": [{"id": 2, "artwork_url": "https://a/t.jpg"}],
            "user": {"username": "o", "avatar_url": "https://a/u.jpg"}
        }]));
        assert_eq!(own[0].icon_url.as_deref(), Some("https://a/p-t500x500.jpg"));

        let from_track = parse_playlists(&json!([{
            "id": 1, "title": "P",
            "tracks": [{"id": 2, "artwork_url": "https://a/t.jpg"}],
            "user": {"username": "o", "avatar_url": "https://a/u.jpg"}
        }]));
        assert_eq!(from_track[0].icon_url.as_deref(), Some("https://a/t.jpg"));

        let from_owner = parse_playlists(&json!([{
            "id": 1, "title": "P",
            "user": {"username": "o", "avatar_url": "https://a/u.jpg"}
        }]));
        assert_eq!(from_owner[0].icon_url.as_deref(), Some("https://a/u.jpg"));
    }

    #[test]
    fn test_friend_children_are_count_gated() {
        let entries = parse_friends(&json!([{
            "id": 7,
            "username": "alice",
            "track_count": 3,
            "playlist_count": 0,
            "public_favorites_count": 5
        }]));

        assert_eq!(entries.len(), 1);
        let names: Vec<&str> = entries[0].children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Favorites (5)", "Tracks (3)"]);
    }

    #[test]
    fn test_single_friend_object_parses() {
        let entries = parse_friends(&json!({
            "id": 7, "username": "alice", "track_count": 1
        }));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "alice");
    }

    #[test]
    fn test_activity_favoriting_subtitle() {
        let entries = parse_activities(&json!({"collection": [{
            "type": "favoriting",
            "origin": {
                "user": {"username": "alice"},
                "track": {"id": 42, "title": "Song"}
            }
        }]}));

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Song - favorited by alice");
        assert_eq!(entries[0].play_uri.as_deref(), Some("soundcloud://track/42"));
    }

    #[test]
    fn test_activity_new_track_uses_uploader() {
        let entries = parse_activities(&json!({"collection": [{
            "type": "track",
            "origin": {"id": 8, "title": "Fresh", "user": {"username": "bob"}}
        }]}));

        assert_eq!(entries[0].name, "Fresh - new track by bob");
    }

    #[test]
    fn test_activity_unknown_subtype_falls_back_to_shared() {
        let entries = parse_activities(&json!({"collection": [{
            "type": "track-sharing:exotic",
            "origin": {
                "user": {"username": "eve"},
                "track": {"id": 3, "title": "T"}
            }
        }]}));

        assert_eq!(entries[0].name, "T - shared by eve");
    }

    #[test]
    fn test_activity_shared_playlist_delegates_to_playlist_parser() {
        let entries = parse_activities(&json!({"collection": [{
            "type": "playlist-sharing",
            "origin": {
                "user": {"username": "carol"},
                "playlist": {"id": 4, "title": "Mix", "track_count": 2, "duration": 120000}
            }
        }]}));

        assert_eq!(entries[0].name, "Mix (2 tracks, 2m0s) - shared by carol");
        assert_eq!(entries[0].kind, MenuKind::Playlist);
    }

    #[test]
    fn test_parse_resolved_dispatch() {
        let track = parse_resolved(&json!({"kind": "track", "id": 1, "title": "A"}));
        assert_eq!(track.len(), 1);
        assert!(track[0].is_playable());

        let playlist = parse_resolved(&json!({
            "kind": "playlist", "id": 2, "title": "P",
            "tracks": [{"id": 3, "title": "B"}, {"id": 4, "title": "C"}]
        }));
        assert_eq!(playlist.len(), 2);
        assert!(playlist.iter().all(|e| e.is_playable()));
    }
}
