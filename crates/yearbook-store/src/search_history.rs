//! Recent searches and the popular-search aggregate.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::database::Database;
use crate::error::Result;
use crate::keys;
use crate::query::UploadFilter;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryEntry {
    #[serde(flatten)]
    pub filters: UploadFilter,
    pub searched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularSearch {
    /// Canonical form of `filters`, see [`UploadFilter::canonical_key`].
    pub key: String,
    pub filters: UploadFilter,
    pub count: u64,
    pub last_searched: DateTime<Utc>,
}

impl Database {
    /// Remember a search. Empty filters are ignored; repeating a search moves
    /// it to the front instead of adding a second entry.
    pub fn record_search(&self, filters: &UploadFilter) -> Result<()> {
        self.record_search_at(filters, Utc::now())
    }

    pub fn record_search_at(&self, filters: &UploadFilter, now: DateTime<Utc>) -> Result<()> {
        if filters.is_empty() {
            return Ok(());
        }
        let key = filters.canonical_key();

        let mut history: Vec<SearchHistoryEntry> = self.load(keys::SEARCH_HISTORY);
        history.retain(|e| e.filters.canonical_key() != key);
        history.insert(
            0,
            SearchHistoryEntry {
                filters: filters.clone(),
                searched_at: now,
            },
        );
        history.truncate(self.config().max_search_history);
        self.save(keys::SEARCH_HISTORY, &history)?;

        let mut popular: BTreeMap<String, PopularSearch> =
            self.get(keys::POPULAR_SEARCHES, BTreeMap::new());
        popular
            .entry(key.clone())
            .and_modify(|p| {
                p.count += 1;
                p.last_searched = now;
            })
            .or_insert_with(|| PopularSearch {
                key: key.clone(),
                filters: filters.clone(),
                count: 1,
                last_searched: now,
            });
        self.set(keys::POPULAR_SEARCHES, &popular)?;

        debug!(key = %key, "search recorded");
        Ok(())
    }

    /// Most recent first.
    pub fn search_history(&self) -> Vec<SearchHistoryEntry> {
        self.load(keys::SEARCH_HISTORY)
    }

    /// Returns false when `index` is out of range.
    pub fn remove_search_history_item(&self, index: usize) -> Result<bool> {
        let mut history: Vec<SearchHistoryEntry> = self.load(keys::SEARCH_HISTORY);
        if index >= history.len() {
            return Ok(false);
        }
        history.remove(index);
        self.save(keys::SEARCH_HISTORY, &history)?;
        Ok(true)
    }

    /// Clears the recent list. Popular counts are kept.
    pub fn clear_search_history(&self) -> Result<()> {
        self.save::<SearchHistoryEntry>(keys::SEARCH_HISTORY, &[])
    }

    /// Most counted first, ties broken by the most recent.
    pub fn popular_searches(&self, limit: usize) -> Vec<PopularSearch> {
        let popular: BTreeMap<String, PopularSearch> =
            self.get(keys::POPULAR_SEARCHES, BTreeMap::new());
        let mut list: Vec<PopularSearch> = popular.into_values().collect();
        list.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| b.last_searched.cmp(&a.last_searched))
        });
        list.truncate(limit);
        list
    }
}
