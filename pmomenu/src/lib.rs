//! # pmomenu - Hierarchical menu model
//!
//! Data structures for navigable menus produced by catalog sources and
//! consumed by a media-playback host.
//!
//! A source turns remote catalog listings into a tree of [`MenuEntry`]
//! values. Entries are produced fresh for every response, never mutated
//! after construction, and owned by the caller once returned. A [`Page`]
//! wraps one window of entries together with the paging bookkeeping the
//! host needs to offer "more" navigation.
//!
//! Rendering (OPML/XML, voice, screen) is the host's concern; this crate
//! only carries the model, traversal helpers and a Markdown rendering for
//! debugging.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Kind of a menu entry, driving how the host renders and reacts to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuKind {
    /// Playable audio track
    Track,
    /// Browsable playlist container
    Playlist,
    /// Navigation link expanding into a sub-listing
    Link,
    /// Search input entry
    Search,
    /// Plain informational text (also used for error leaves)
    Text,
}

/// One entry of a navigable menu
///
/// Entries of kind [`MenuKind::Track`] carry a `play_uri`; entries that
/// expand lazily carry a `continuation` cursor the host hands back to the
/// source on the next browse call. The cursor is opaque to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuEntry {
    /// Display name; never empty for track and playlist entries
    pub name: String,

    /// Entry kind
    pub kind: MenuKind,

    /// Icon/artwork URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,

    /// Playable identifier, present for track entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub play_uri: Option<String>,

    /// Eagerly materialized children
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuEntry>,

    /// Opaque cursor for lazy expansion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation: Option<String>,
}

impl MenuEntry {
    /// Create a playable track entry
    pub fn track(name: impl Into<String>, play_uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MenuKind::Track,
            icon_url: None,
            play_uri: Some(play_uri.into()),
            children: Vec::new(),
            continuation: None,
        }
    }

    /// Create a playlist entry expanding through a continuation cursor
    pub fn playlist(name: impl Into<String>, continuation: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MenuKind::Playlist,
            icon_url: None,
            play_uri: None,
            children: Vec::new(),
            continuation: Some(continuation.into()),
        }
    }

    /// Create a navigation link entry
    pub fn link(name: impl Into<String>, continuation: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MenuKind::Link,
            icon_url: None,
            play_uri: None,
            children: Vec::new(),
            continuation: Some(continuation.into()),
        }
    }

    /// Create a search input entry
    pub fn search(name: impl Into<String>, continuation: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MenuKind::Search,
            icon_url: None,
            play_uri: None,
            children: Vec::new(),
            continuation: Some(continuation.into()),
        }
    }

    /// Create a plain text leaf
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MenuKind::Text,
            icon_url: None,
            play_uri: None,
            children: Vec::new(),
            continuation: None,
        }
    }

    /// Attach an icon URL
    pub fn with_icon(mut self, icon_url: impl Into<String>) -> Self {
        self.icon_url = Some(icon_url.into());
        self
    }

    /// Attach eagerly materialized children
    pub fn with_children(mut self, children: Vec<MenuEntry>) -> Self {
        self.children = children;
        self
    }

    /// Whether this entry can be handed to the playback path
    pub fn is_playable(&self) -> bool {
        self.kind == MenuKind::Track && self.play_uri.is_some()
    }

    /// Iterate over this entry and all descendants, depth-first
    pub fn all_entries(&self) -> impl Iterator<Item = &MenuEntry> {
        AllEntriesIter::new(std::slice::from_ref(self))
    }

    fn write_markdown(&self, buf: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);

        writeln!(buf, "{}- **{:?}**: {}", indent, self.kind, self.name).unwrap();
        if let Some(ref uri) = self.play_uri {
            writeln!(buf, "{}  - Play: `{}`", indent, uri).unwrap();
        }
        if let Some(ref icon) = self.icon_url {
            writeln!(buf, "{}  - Icon: ![icon]({})", indent, icon).unwrap();
        }
        if let Some(ref cursor) = self.continuation {
            writeln!(buf, "{}  - Continuation: `{}`", indent, cursor).unwrap();
        }
        for child in &self.children {
            child.write_markdown(buf, depth + 1);
        }
    }
}

/// One window of menu entries with paging bookkeeping
///
/// `total` is an estimate, not a guaranteed count: sources without a real
/// count report a generous upper bound until a short page proves the end
/// of the collection. `offset` echoes the request offset, except for the
/// documented single-friend quirk where it is forced to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Entries of this window, in listing order
    pub items: Vec<MenuEntry>,
    /// Offset this window starts at
    pub offset: u32,
    /// Estimated collection size
    pub total: u32,
}

impl Page {
    /// Create a page
    pub fn new(items: Vec<MenuEntry>, offset: u32, total: u32) -> Self {
        Self {
            items,
            offset,
            total,
        }
    }

    /// Create an empty page at an offset
    pub fn empty(offset: u32) -> Self {
        Self {
            items: Vec::new(),
            offset,
            total: offset,
        }
    }

    /// Number of entries in this window
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether this window is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over all entries of the page and their descendants
    pub fn all_entries(&self) -> impl Iterator<Item = &MenuEntry> {
        AllEntriesIter::new(&self.items)
    }

    /// Render the page as Markdown, for logs and debugging
    pub fn to_markdown(&self) -> String {
        let mut buf = String::new();
        writeln!(
            buf,
            "### Page (offset {}, total {}, {} entries)\n",
            self.offset,
            self.total,
            self.items.len()
        )
        .unwrap();
        for entry in &self.items {
            entry.write_markdown(&mut buf, 0);
        }
        buf
    }
}

struct AllEntriesIter<'a> {
    stack: Vec<&'a MenuEntry>,
}

impl<'a> AllEntriesIter<'a> {
    fn new(entries: &'a [MenuEntry]) -> Self {
        Self {
            stack: entries.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for AllEntriesIter<'a> {
    type Item = &'a MenuEntry;

    fn next(&mut self) -> Option<Self::Item> {
        self.stack.pop().map(|entry| {
            self.stack.extend(entry.children.iter().rev());
            entry
        })
    }
}
