//! In-memory repository for catalog records.

use super::matching;
use crate::registry::{
    domain::{
        PageRequest, SearchPage, ServerId, ServerPatch, ServerQuery, ServerRecord, TextMatch,
    },
    ports::{ServerRepository, ServerRepositoryError, ServerRepositoryResult, UpsertOutcome},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::RegexBuilder;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory catalog repository.
///
/// Records keep the position of their first insertion, so pages are stable
/// across replacements. Native text search is off unless the repository is
/// built with [`InMemoryServerRepository::with_text_search`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryServerRepository {
    state: Arc<RwLock<InMemoryCatalogState>>,
    text_search: bool,
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    rows: BTreeMap<u64, ServerRecord>,
    id_index: HashMap<ServerId, u64>,
    next_row: u64,
}

impl InMemoryServerRepository {
    /// Creates an empty repository without native text search.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty repository that answers native text queries with
    /// token matching.
    #[must_use]
    pub fn with_text_search() -> Self {
        Self {
            text_search: true,
            ..Self::default()
        }
    }

    fn read_state(
        &self,
    ) -> ServerRepositoryResult<std::sync::RwLockReadGuard<'_, InMemoryCatalogState>> {
        self.state.read().map_err(|err| {
            ServerRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write_state(
        &self,
    ) -> ServerRepositoryResult<std::sync::RwLockWriteGuard<'_, InMemoryCatalogState>> {
        self.state.write().map_err(|err| {
            ServerRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn record_filter(
        &self,
        query: &ServerQuery,
    ) -> ServerRepositoryResult<impl Fn(&ServerRecord) -> bool> {
        let text_filter: Box<dyn Fn(&ServerRecord) -> bool> = match query.text() {
            None => Box::new(|_| true),
            Some(TextMatch::FullText(term)) => {
                if !self.text_search {
                    return Err(unsupported_text_search());
                }
                let tokens = matching::tokenize(term);
                Box::new(move |record| matching::matches_all_tokens(record, &tokens))
            }
            Some(TextMatch::Contains { pattern, .. }) => {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(ServerRepositoryError::persistence)?;
                Box::new(move |record| matching::any_field_matches(record, &regex))
            }
        };
        let tool_names = query.tool_names().clone();

        Ok(move |record: &ServerRecord| {
            text_filter(record)
                && (tool_names.is_empty() || record.offers_any_tool(tool_names.iter()))
        })
    }
}

fn unsupported_text_search() -> ServerRepositoryError {
    ServerRepositoryError::Unsupported("native text search is disabled".to_owned())
}

#[async_trait]
impl ServerRepository for InMemoryServerRepository {
    async fn upsert(&self, record: &ServerRecord) -> ServerRepositoryResult<UpsertOutcome> {
        let mut state = self.write_state()?;

        if let Some(&row) = state.id_index.get(record.id()) {
            let Some(stored) = state.rows.get(&row) else {
                return Err(ServerRepositoryError::persistence(std::io::Error::other(
                    format!("index points at missing row {row}"),
                )));
            };
            if stored.owner() != record.owner() {
                return Ok(UpsertOutcome::OwnerConflict);
            }
            let created_at = stored.created_at();
            state.rows.insert(row, record.clone().replacing(created_at));
            return Ok(UpsertOutcome::Replaced);
        }

        let row = state.next_row;
        state.next_row += 1;
        state.id_index.insert(record.id().clone(), row);
        state.rows.insert(row, record.clone());
        Ok(UpsertOutcome::Inserted)
    }

    async fn merge(
        &self,
        server_id: &ServerId,
        patch: &ServerPatch,
        updated_at: DateTime<Utc>,
    ) -> ServerRepositoryResult<Option<ServerRecord>> {
        let mut state = self.write_state()?;
        let Some(row) = state.id_index.get(server_id).copied() else {
            return Ok(None);
        };

        Ok(state.rows.get_mut(&row).map(|record| {
            record.apply_patch(patch, updated_at);
            record.clone()
        }))
    }

    async fn delete(&self, server_id: &ServerId) -> ServerRepositoryResult<bool> {
        let mut state = self.write_state()?;
        let Some(row) = state.id_index.remove(server_id) else {
            return Ok(false);
        };
        Ok(state.rows.remove(&row).is_some())
    }

    async fn find_by_id(
        &self,
        server_id: &ServerId,
    ) -> ServerRepositoryResult<Option<ServerRecord>> {
        let state = self.read_state()?;
        Ok(state
            .id_index
            .get(server_id)
            .and_then(|row| state.rows.get(row))
            .cloned())
    }

    async fn search(
        &self,
        query: &ServerQuery,
        page: PageRequest,
    ) -> ServerRepositoryResult<SearchPage> {
        let filter = self.record_filter(query)?;
        let state = self.read_state()?;

        let total = state.rows.values().filter(|record| filter(record)).count();
        let records = state
            .rows
            .values()
            .filter(|record| filter(record))
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit()).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok(SearchPage {
            records,
            total: u64::try_from(total).unwrap_or(u64::MAX),
            page,
        })
    }

    async fn probe_text_search(&self) -> ServerRepositoryResult<()> {
        if self.text_search {
            Ok(())
        } else {
            Err(unsupported_text_search())
        }
    }
}
