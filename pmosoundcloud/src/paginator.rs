//! Catalog paginator
//!
//! Satisfies one "give me N items starting at offset I" request per
//! invocation with a single network call, and hides the per-resource
//! pagination anomalies of the remote API behind the uniform [`Page`]
//! contract. The host advances the offset and calls again for subsequent
//! pages; a short page proves the end of the collection.

use crate::api::resolver::{resolve, BrowseKind, BrowseRequest};
use crate::api::SoundCloudApi;
use crate::error::{Result, SoundCloudError};
use crate::parsers;
use pmomenu::Page;
use serde_json::Value;
use tracing::{debug, warn};

/// Hard per-call item cap of the remote API
pub const API_MAX_ITEMS_PER_CALL: u32 = 200;

/// Paging heuristics preserved from the legacy host contract
///
/// Both values are undocumented behaviors the host relies on rather than
/// derived semantics; they are kept as policy knobs instead of being
/// hardened into the paginator (see DESIGN.md).
#[derive(Debug, Clone)]
pub struct PaginationPolicy {
    /// Bound used for the generous default total estimate
    /// (`total = bound + limit`), so paging UIs keep offering "more"
    /// until a short page proves otherwise
    pub total_estimate_bound: u32,
    /// Echo `offset = 0` on single-friend pages, for host-side replay
    /// compatibility
    pub force_zero_offset_for_friend: bool,
}

impl Default for PaginationPolicy {
    fn default() -> Self {
        Self {
            total_estimate_bound: 500,
            force_zero_offset_for_friend: true,
        }
    }
}

/// Paginator over the catalog API
#[derive(Debug, Clone)]
pub struct CatalogPaginator {
    api: SoundCloudApi,
    policy: PaginationPolicy,
}

impl CatalogPaginator {
    /// Create a paginator with the default policy
    pub fn new(api: SoundCloudApi) -> Self {
        Self {
            api,
            policy: PaginationPolicy::default(),
        }
    }

    /// Create a paginator with an explicit policy
    pub fn with_policy(api: SoundCloudApi, policy: PaginationPolicy) -> Self {
        Self { api, policy }
    }

    /// Fetch one page of menu entries
    ///
    /// Issues exactly one network call, scoped to
    /// `min(limit, API_MAX_ITEMS_PER_CALL)` items. Undecodable listing
    /// bodies degrade to an empty page; transport and API errors
    /// propagate to the caller.
    pub async fn fetch_page(&self, request: &BrowseRequest) -> Result<Page> {
        match request.kind {
            // The followings and activities resources ignore paging for
            // single-item requests: fetch the whole collection and select
            // the entry at the requested position locally.
            BrowseKind::Friends | BrowseKind::Activities if request.limit == 1 => {
                self.single_from_full(request).await
            }
            _ => self.fetch_window(request).await,
        }
    }

    async fn fetch_window(&self, request: &BrowseRequest) -> Result<Page> {
        let effective_limit = request.limit.min(API_MAX_ITEMS_PER_CALL);
        let mut scoped = request.clone();
        scoped.limit = effective_limit;

        let value = self.fetch_value(&scoped).await?;

        let single_playlist =
            request.kind == BrowseKind::Playlists && request.playlist_id.is_some();
        let mut entries = parsers::parse_for_kind(request.kind, &value, single_playlist);

        // A single-playlist fetch returns the whole collection at once:
        // page it locally and report the real track count.
        let known_total = single_playlist.then_some(entries.len() as u32);
        if single_playlist {
            entries = entries
                .into_iter()
                .skip(request.offset as usize)
                .take(effective_limit as usize)
                .collect();
        } else if entries.len() > effective_limit as usize {
            // The followings listing ignores the limit parameter
            entries.truncate(effective_limit as usize);
        }

        let offset = self.echoed_offset(request);
        let returned = entries.len() as u32;

        let total = if returned < effective_limit {
            // Short page: the collection ends here
            offset + returned
        } else if let Some(total) = known_total {
            total
        } else if request.kind == BrowseKind::Activities {
            // The activity stream has no real count
            request.limit
        } else {
            self.policy.total_estimate_bound + request.limit
        };

        debug!(
            "Page for {:?}: {} entries at offset {} (total {})",
            request.kind, returned, offset, total
        );

        Ok(Page::new(entries, offset, total))
    }

    /// Full-collection fetch with local index selection (`limit == 1`)
    async fn single_from_full(&self, request: &BrowseRequest) -> Result<Page> {
        let mut full = request.clone();
        full.offset = 0;

        let value = self.fetch_value(&full).await?;
        let entries = match request.kind {
            BrowseKind::Activities => parsers::parse_activities(&value),
            _ => parsers::parse_friends(&value),
        };

        let available = entries.len();
        let selected: Vec<_> = entries
            .into_iter()
            .nth(request.offset as usize)
            .into_iter()
            .collect();

        debug!(
            "Single {:?} fetch: index {} of {} available",
            request.kind, request.offset, available
        );

        // The echoed offset is forced to 0 for these pages, the host
        // replays them positionally.
        let total = if selected.is_empty() {
            0
        } else if request.kind == BrowseKind::Activities {
            request.limit
        } else {
            self.policy.total_estimate_bound + request.limit
        };

        Ok(Page::new(selected, 0, total))
    }

    /// Issue the network call; undecodable bodies degrade to an empty listing
    async fn fetch_value(&self, request: &BrowseRequest) -> Result<Value> {
        let resource = resolve(request);
        match self.api.get_value(&resource).await {
            Ok(value) => Ok(value),
            Err(SoundCloudError::Decode(e)) => {
                warn!("Undecodable {:?} listing, treating as empty: {}", request.kind, e);
                Ok(Value::Null)
            }
            Err(e) => Err(e),
        }
    }

    fn echoed_offset(&self, request: &BrowseRequest) -> u32 {
        if request.kind == BrowseKind::Friend && self.policy.force_zero_offset_for_friend {
            0
        } else {
            request.offset
        }
    }
}
