use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, info};

use super::types::{RankingEntry, RankingScope, RankingWindow};
use crate::domain::StoreId;

type CacheKey = (RankingScope, RankingWindow);

#[derive(Default)]
struct Tables {
    entries: HashMap<CacheKey, Arc<Vec<RankingEntry>>>,
    /// Bumped by every invalidation; a rebuild started under an older
    /// generation is returned to its caller but never stored.
    generation: u64,
}

/// In-memory ranking tables keyed by `(scope, window)`.
///
/// Entries are only ever replaced or dropped, never patched.
#[derive(Default)]
pub struct RankingCache {
    tables: RwLock<Tables>,
}

impl RankingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, scope: RankingScope, window: RankingWindow) -> Option<Arc<Vec<RankingEntry>>> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        tables.entries.get(&(scope, window)).cloned()
    }

    /// Cached table, or `rebuild` stored under the key.
    pub fn get_or_rebuild<F>(
        &self,
        scope: RankingScope,
        window: RankingWindow,
        rebuild: F,
    ) -> Result<Arc<Vec<RankingEntry>>>
    where
        F: FnOnce() -> Result<Vec<RankingEntry>>,
    {
        let generation = {
            let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
            if let Some(table) = tables.entries.get(&(scope, window)) {
                return Ok(Arc::clone(table));
            }
            tables.generation
        };

        let table = Arc::new(rebuild()?);
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        if tables.generation == generation {
            tables.entries.insert((scope, window), Arc::clone(&table));
        } else {
            debug!(
                "Discarding {} ranking for {}: invalidated during rebuild",
                window, scope
            );
        }
        Ok(table)
    }

    /// Drops every table a tournament at `store_id` starting at `starts_at` feeds into.
    pub fn invalidate(&self, store_id: StoreId, starts_at: DateTime<Utc>) -> usize {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        tables.generation += 1;
        let before = tables.entries.len();
        tables
            .entries
            .retain(|(scope, window), _| !(scope.covers(store_id) && window.contains(starts_at)));

        let dropped = before - tables.entries.len();
        if dropped > 0 {
            info!(
                "Invalidated {} cached rankings for store {} at {}",
                dropped, store_id, starts_at
            );
        }
        dropped
    }

    pub fn clear(&self) {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        tables.generation += 1;
        tables.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.tables.read().unwrap_or_else(|e| e.into_inner()).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
