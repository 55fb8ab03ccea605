//! # pmosoundcloud - SoundCloud catalog source
//!
//! This crate exposes the SoundCloud catalog (tracks, playlists, user
//! timelines, social graph) as a navigable hierarchical menu for a
//! media-playback host, and resolves menu selections into playable audio
//! streams.
//!
//! ## Overview
//!
//! `pmosoundcloud` provides:
//! - Paginated catalog browsing with a uniform page contract, hiding the
//!   per-resource pagination quirks of the remote API
//! - Full-text and tag search over the public catalog
//! - Authenticated branches: favorites, playlists, followings, activity
//!   stream (anonymous mode degrades gracefully)
//! - Stream resolution: playable identifier → signed redirect → CDN URL
//! - A playback metadata cache with TTL plus a background-fetch guard
//! - Resolution of pasted catalog web links into browsable pages
//!
//! ## Architecture
//!
//! The crate follows the layered source pattern:
//! - [`SoundCloudSource`] : host-facing facade (browse, playback, polls)
//! - [`client::SoundCloudClient`] : high-level client with descriptor cache
//! - [`api`] : transport layer and request resolution
//! - [`paginator`] : one-call-per-page catalog paginator
//! - [`parsers`] : per-resource response parsers producing menu entries
//! - [`stream`] : two-hop stream resolution state machine
//! - [`metadata_cache`] : TTL cache and fetch guard, one per process
//!
//! ## Structure of the modules
//!
//! ```text
//! pmosoundcloud/
//! ├── src/
//! │   ├── lib.rs              # Crate root (this file)
//! │   ├── source.rs           # Host-facing facade
//! │   ├── client.rs           # High-level client
//! │   ├── models.rs           # API data structures
//! │   ├── api/
//! │   │   ├── mod.rs          # HTTP transport
//! │   │   └── resolver.rs     # Browse request → API resource mapping
//! │   ├── paginator.rs        # Catalog paginator
//! │   ├── parsers.rs          # Response parsers
//! │   ├── stream.rs           # Stream resolution
//! │   ├── metadata_cache.rs   # Metadata cache & fetch guard
//! │   ├── config.rs           # Settings store
//! │   └── error.rs            # Error taxonomy
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pmosoundcloud::{BrowseKind, BrowseRequest, Settings, SoundCloudSource};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Arc::new(Settings::load("soundcloud.yaml")?);
//!     let source = SoundCloudSource::new(settings)?;
//!
//!     // Top-level menu
//!     for entry in source.root_menu() {
//!         println!("{}", entry.name);
//!     }
//!
//!     // One page of hot tracks
//!     let request = BrowseRequest::new(BrowseKind::Tracks)
//!         .with_order("order=hotness")
//!         .with_limit(20);
//!     let page = source.browse(&request).await?;
//!     println!("{}", page.to_markdown());
//!
//!     // Resolve a selection for playback
//!     if let Some(track) = page.items.iter().find(|e| e.is_playable()) {
//!         let uri = track.play_uri.as_ref().unwrap();
//!         let resolved = source.resolve_playback(uri).await?;
//!         println!("Play {} for {}s", resolved.stream_url, resolved.metadata.duration_seconds);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Caching
//!
//! Two caches with different jobs:
//! - Track descriptors: 1 hour TTL, inside [`client::SoundCloudClient`]
//! - Playback metadata: 24 hour TTL, in the process-wide
//!   [`metadata_cache::MetadataCache`] service, written on every
//!   successful resolution and read by the host's polling path
//!
//! Resolved CDN URLs are never cached: they are signed and time-limited,
//! each playback resolves afresh. Seeking is unsupported by design for
//! the same reason.
//!
//! ## Error handling
//!
//! Errors are typed with `thiserror` ([`SoundCloudError`]). Browse-path
//! failures degrade to text menu leaves and never tear down a session;
//! playback-path failures carry a stable [`SoundCloudError::kind`] key so
//! the host can display a localized message and advance the queue.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod metadata_cache;
pub mod models;
pub mod paginator;
pub mod parsers;
pub mod source;
pub mod stream;

pub use api::resolver::{BrowseKind, BrowseRequest};
pub use api::SoundCloudApi;
pub use client::SoundCloudClient;
pub use config::{PlaybackMode, Settings};
pub use error::{Result, SoundCloudError};
pub use metadata_cache::MetadataCache;
pub use models::{PlaybackMetadata, Track};
pub use paginator::{CatalogPaginator, PaginationPolicy};
pub use source::SoundCloudSource;
pub use stream::{ResolvedStream, StreamResolver};

/// Re-export of the menu model types
pub use pmomenu::{MenuEntry, MenuKind, Page};
