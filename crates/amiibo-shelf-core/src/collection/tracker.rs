//! The live collection and its lifecycle: init from the store, mutate
//! through toggles and imports, flush back to the store.

use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{CacheManager, KeyValueStore, Namespace, StoreError};
use crate::models::{CatalogItem, CollectionItem, ItemDetail, ItemStatus, StatusMap};
use crate::share;
use crate::sync::{RequestGuard, RequestTicket};
use crate::transfer::{self, TransferError};

use super::filter::Stats;
use super::merge::merge_status;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Shared collections are read-only")]
    ReadOnly,

    #[error("No owned items to share")]
    NothingToShare,

    #[error("Failed to build share link: {0}")]
    Share(String),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Whose collection is being shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// The user's own statuses, editable and persisted
    Personal,
    /// A decoded share token; everything in it is owned, nothing is editable
    Shared,
}

/// Owns the catalog, the status map and the merged view.
///
/// Every status change is written to the store before the in-memory state
/// moves. When a write fails the change is kept in memory and retried on
/// the next write or `flush`.
pub struct Tracker<S> {
    cache: CacheManager<S>,
    mode: ViewMode,
    catalog: Vec<CatalogItem>,
    statuses: StatusMap,
    view: Vec<CollectionItem>,
    unsaved: bool,
    detail_guard: RequestGuard,
    detail: Option<ItemDetail>,
}

impl<S: KeyValueStore> Tracker<S> {
    /// Load the user's statuses from the store. Fails when the stored map
    /// exists but cannot be read, so it is never replaced by an empty one.
    pub fn init(cache: CacheManager<S>) -> Result<Self, TrackerError> {
        let statuses = cache.load_statuses()?;
        debug!(count = statuses.len(), "Statuses loaded");
        Ok(Self::with_statuses(cache, ViewMode::Personal, statuses))
    }

    /// Read-only view of someone else's owned set.
    pub fn shared(cache: CacheManager<S>, owned: HashSet<String>) -> Self {
        let statuses = owned
            .into_iter()
            .map(|id| (id, ItemStatus::owned()))
            .collect();
        Self::with_statuses(cache, ViewMode::Shared, statuses)
    }

    /// Shared view from a token, or the personal view when the token does
    /// not decode.
    pub fn from_share_token(cache: CacheManager<S>, token: &str) -> Result<Self, TrackerError> {
        match share::decode(token) {
            Ok(owned) => {
                info!(count = owned.len(), "Viewing shared collection");
                Ok(Self::shared(cache, owned))
            }
            Err(e) => {
                warn!(error = %e, "Ignoring invalid share token");
                Self::init(cache)
            }
        }
    }

    fn with_statuses(cache: CacheManager<S>, mode: ViewMode, statuses: StatusMap) -> Self {
        Self {
            cache,
            mode,
            catalog: Vec::new(),
            statuses,
            view: Vec::new(),
            unsaved: false,
            detail_guard: RequestGuard::default(),
            detail: None,
        }
    }

    pub fn cache(&self) -> &CacheManager<S> {
        &self.cache
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn is_shared(&self) -> bool {
        self.mode == ViewMode::Shared
    }

    /// Replace the catalog and rebuild the view.
    pub fn set_catalog(&mut self, catalog: Vec<CatalogItem>) {
        self.catalog = catalog;
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.view = merge_status(&self.catalog, &self.statuses);
    }

    /// The merged collection, in catalog order.
    pub fn items(&self) -> &[CollectionItem] {
        &self.view
    }

    /// All stored statuses, including ones for identifiers the current
    /// catalog no longer lists.
    pub fn statuses(&self) -> &StatusMap {
        &self.statuses
    }

    pub fn status(&self, identifier: &str) -> ItemStatus {
        self.statuses.get(identifier).copied().unwrap_or_default()
    }

    /// The last catalog entry with this identifier.
    pub fn find(&self, identifier: &str) -> Option<&CollectionItem> {
        self.view.iter().rev().find(|e| e.identifier() == identifier)
    }

    pub fn stats(&self) -> Stats {
        Stats::of(&self.view)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    pub fn toggle_owned(&mut self, identifier: &str) -> Result<ItemStatus, TrackerError> {
        self.update(identifier, |status| status.owned = !status.owned)
    }

    pub fn toggle_favorite(&mut self, identifier: &str) -> Result<ItemStatus, TrackerError> {
        self.update(identifier, |status| status.favorite = !status.favorite)
    }

    fn update(
        &mut self,
        identifier: &str,
        change: impl FnOnce(&mut ItemStatus),
    ) -> Result<ItemStatus, TrackerError> {
        if self.is_shared() {
            return Err(TrackerError::ReadOnly);
        }

        let mut status = self.status(identifier);
        change(&mut status);

        let mut staged = self.statuses.clone();
        staged.insert(identifier.to_string(), status);
        self.persist(&staged);

        self.statuses = staged;
        for entry in self.view.iter_mut().filter(|e| e.item.identifier == identifier) {
            entry.status = status;
        }
        debug!(identifier = identifier, owned = status.owned, favorite = status.favorite, "Status updated");
        Ok(status)
    }

    /// Write a status map, remembering failures for the next flush.
    fn persist(&mut self, statuses: &StatusMap) {
        match self.cache.save_statuses(statuses) {
            Ok(()) => self.unsaved = false,
            Err(e) => {
                warn!(error = %e, "Failed to save statuses, keeping changes in memory");
                self.unsaved = true;
            }
        }
    }

    /// Write the status map if an earlier write failed. Shared views have
    /// nothing to write.
    pub fn flush(&mut self) -> Result<(), TrackerError> {
        if self.is_shared() || !self.unsaved {
            return Ok(());
        }
        self.cache.save_statuses(&self.statuses)?;
        self.unsaved = false;
        Ok(())
    }

    // ===== Import / Export =====

    pub fn export_json(&self) -> Result<String, TrackerError> {
        Ok(transfer::export_statuses(&self.statuses)?)
    }

    /// Replace all statuses with an imported file's contents. The file is
    /// validated completely first; on error nothing changes.
    pub fn import_json(&mut self, text: &str) -> Result<usize, TrackerError> {
        if self.is_shared() {
            return Err(TrackerError::ReadOnly);
        }
        let imported = transfer::import_statuses(text)?;
        Ok(self.replace_statuses(imported))
    }

    /// Write the export file. Returns the number of entries written.
    pub fn export_to(&self, path: &Path) -> Result<usize, TrackerError> {
        Ok(transfer::write_export(path, &self.statuses)?)
    }

    pub fn import_from(&mut self, path: &Path) -> Result<usize, TrackerError> {
        if self.is_shared() {
            return Err(TrackerError::ReadOnly);
        }
        let imported = transfer::read_import(path)?;
        Ok(self.replace_statuses(imported))
    }

    fn replace_statuses(&mut self, statuses: StatusMap) -> usize {
        self.persist(&statuses);
        self.statuses = statuses;
        self.rebuild();
        info!(count = self.statuses.len(), "Statuses imported");
        self.statuses.len()
    }

    // ===== Sharing =====

    /// Owned identifiers in catalog order.
    pub fn owned_identifiers(&self) -> Vec<&str> {
        self.view
            .iter()
            .filter(|e| e.status.owned)
            .map(|e| e.identifier())
            .collect()
    }

    pub fn share_token(&self) -> Result<String, TrackerError> {
        let owned = self.owned_identifiers();
        if owned.is_empty() {
            return Err(TrackerError::NothingToShare);
        }
        share::encode(owned).map_err(|e| TrackerError::Share(e.to_string()))
    }

    pub fn share_url(&self, base: &str) -> Result<Url, TrackerError> {
        let token = self.share_token()?;
        share::share_url(base, &token).map_err(|e| TrackerError::Share(e.to_string()))
    }

    // ===== Detail view =====

    /// Start showing detail for an item. Any earlier detail request becomes
    /// stale.
    pub fn open_detail(&mut self, name: &str) -> RequestTicket {
        self.detail = None;
        self.detail_guard.begin(Namespace::Detail(name.to_string()))
    }

    /// Deliver a detail result. Returns false and drops it if the request
    /// was superseded or the detail view was closed.
    pub fn accept_detail(&mut self, ticket: &RequestTicket, detail: ItemDetail) -> bool {
        if !self.detail_guard.complete(ticket) {
            return false;
        }
        self.detail = Some(detail);
        true
    }

    pub fn close_detail(&mut self) {
        self.detail_guard.cancel();
        self.detail = None;
    }

    pub fn detail(&self) -> Option<&ItemDetail> {
        self.detail.as_ref()
    }
}
