//! Browse the public catalog and resolve one track for playback
//!
//! Run with an API token to see the authenticated branches:
//!
//! ```sh
//! SOUNDCLOUD_TOKEN=... cargo run --example browse_catalog
//! ```

use pmosoundcloud::{BrowseKind, BrowseRequest, Settings, SoundCloudSource};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pmosoundcloud=debug".into()),
        )
        .init();

    let settings = Arc::new(Settings::in_memory());
    if let Ok(token) = std::env::var("SOUNDCLOUD_TOKEN") {
        settings.set_api_token(token)?;
    }

    let source = SoundCloudSource::new(settings)?;

    println!("=== {} top-level menu ===", source.name());
    for entry in source.root_menu() {
        println!("  [{:?}] {}", entry.kind, entry.name);
    }

    let request = BrowseRequest::new(BrowseKind::Tracks)
        .with_order("order=hotness")
        .with_limit(10);
    let page = source.browse_page(&request).await;
    println!("\n=== Hot tracks ===\n{}", page.to_markdown());

    if let Some(track) = page.items.iter().find(|e| e.is_playable()) {
        let uri = track.play_uri.as_ref().unwrap();
        match source.resolve_playback(uri).await {
            Ok(resolved) => println!(
                "Resolved {} -> {} ({}s, {} {})",
                uri,
                resolved.stream_url,
                resolved.metadata.duration_seconds,
                resolved.metadata.format_label,
                resolved.metadata.bitrate_label,
            ),
            Err(e) => println!("Resolution failed ({}): {}", e.kind(), e),
        }
    }

    // Resolving a pasted link, with copy-paste artifacts
    match source
        .resolve_catalog_url("https://soundcloud .com/forss/flickermood")
        .await
    {
        Ok(page) => println!("\n=== Resolved link ===\n{}", page.to_markdown()),
        Err(e) => println!("Link resolution failed: {e}"),
    }

    Ok(())
}
