//! Saved and recent query lists, persisted through [`Storage`].
//!
//! Saved queries are named snapshots the user keeps on purpose; recent
//! queries are a rolling, deduplicated log of successful executions capped
//! at [`RECENT_QUERIES_CAP`] entries.

use crate::{
    KEY_RECENT_QUERIES, KEY_SAVED_QUERIES, QueryRunnerResult, Storage, UniqueElements,
};

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::debug;

/// Maximum number of entries kept in the recent-query list.
pub const RECENT_QUERIES_CAP: usize = 10;

/// A user-saved query snapshot.
///
/// Field names are persisted in camelCase so existing `savedQueries.json`
/// files keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQuery {
    /// Identity used for favorite toggling and deletion. Derived from the
    /// creation instant in Unix milliseconds.
    pub id: i64,
    /// Auto-generated display name ("Query 1", "Query 2", ...).
    pub name: String,
    /// The saved SQL text, exactly as it stood in the editor.
    pub query: String,
    /// Creation instant as an RFC 3339 string.
    pub timestamp: String,
    pub is_favorite: bool,
}

/// In-memory view of both persisted query lists.
///
/// Loaded once at startup; every mutation writes the affected list back
/// through [`Storage`].
#[derive(Debug)]
pub struct QueryHistory {
    storage: Storage,
    pub saved: Vec<SavedQuery>,
    pub recent: Vec<String>,
}

impl QueryHistory {
    /// Loads both lists from storage. Missing or corrupt state starts empty.
    pub fn load(storage: Storage) -> Self {
        let saved: Vec<SavedQuery> = storage.read_key(KEY_SAVED_QUERIES).unwrap_or_default();
        let recent: Vec<String> = storage.read_key(KEY_RECENT_QUERIES).unwrap_or_default();
        debug!(
            "QueryHistory::load: {} saved, {} recent",
            saved.len(),
            recent.len()
        );

        QueryHistory {
            storage,
            saved,
            recent,
        }
    }

    /// Saved queries flagged as favorites, in saved order.
    pub fn favorites(&self) -> impl Iterator<Item = &SavedQuery> {
        self.saved.iter().filter(|q| q.is_favorite)
    }

    /// Saves the current editor text as a new named query.
    ///
    /// Blank text (empty after trimming) is a silent no-op. The name is
    /// `Query N` with N one past the current saved count; the id is the
    /// creation instant in Unix milliseconds.
    pub fn save_query(&mut self, text: &str) -> QueryRunnerResult<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        let now = OffsetDateTime::now_utc();
        let entry = SavedQuery {
            id: (now.unix_timestamp_nanos() / 1_000_000) as i64,
            name: format!("Query {}", self.saved.len() + 1),
            query: text.to_string(),
            timestamp: now.format(&Rfc3339)?,
            is_favorite: false,
        };

        debug!("save_query: {:?}", entry.name);
        self.saved.push(entry);
        self.persist_saved()
    }

    /// Flips the favorite flag of the saved query with the given id.
    pub fn toggle_favorite(&mut self, id: i64) -> QueryRunnerResult<()> {
        if let Some(entry) = self.saved.iter_mut().find(|q| q.id == id) {
            entry.is_favorite = !entry.is_favorite;
            self.persist_saved()?;
        }
        Ok(())
    }

    /// Deletes the saved query with the given id. Deletion is by identity,
    /// so queries with identical text are removed individually.
    pub fn delete_saved(&mut self, id: i64) -> QueryRunnerResult<()> {
        let before = self.saved.len();
        self.saved.retain(|q| q.id != id);
        if self.saved.len() != before {
            self.persist_saved()?;
        }
        Ok(())
    }

    /// Removes one entry from the recent list by its text.
    pub fn delete_recent(&mut self, text: &str) -> QueryRunnerResult<()> {
        let before = self.recent.len();
        self.recent.retain(|q| q != text);
        if self.recent.len() != before {
            self.persist_recent()?;
        }
        Ok(())
    }

    /// Records a successful execution: the text moves to the front of the
    /// recent list, duplicates collapse onto it, and the list is truncated
    /// to [`RECENT_QUERIES_CAP`].
    pub fn record_execution(&mut self, text: &str) -> QueryRunnerResult<()> {
        self.recent.insert(0, text.to_string());
        self.recent.unique();
        self.recent.truncate(RECENT_QUERIES_CAP);
        self.persist_recent()
    }

    fn persist_saved(&self) -> QueryRunnerResult<()> {
        self.storage.write_key(KEY_SAVED_QUERIES, &self.saved)
    }

    fn persist_recent(&self) -> QueryRunnerResult<()> {
        self.storage.write_key(KEY_RECENT_QUERIES, &self.recent)
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

/// Run tests with:
/// `cargo test -- --show-output tests_history`
#[cfg(test)]
mod tests_history {
    use super::*;

    fn history_in(dir: &std::path::Path) -> QueryHistory {
        QueryHistory::load(Storage::new(dir.to_path_buf()))
    }

    #[test]
    fn starts_empty_without_persisted_state() -> QueryRunnerResult<()> {
        let dir = tempfile::tempdir()?;
        let history = history_in(dir.path());
        assert!(history.saved.is_empty());
        assert!(history.recent.is_empty());
        Ok(())
    }

    #[test]
    fn save_names_queries_sequentially() -> QueryRunnerResult<()> {
        let dir = tempfile::tempdir()?;
        let mut history = history_in(dir.path());

        history.save_query("SELECT * FROM customers;")?;
        history.save_query("SELECT * FROM orders;")?;

        assert_eq!(history.saved[0].name, "Query 1");
        assert_eq!(history.saved[1].name, "Query 2");
        assert!(!history.saved[0].is_favorite);
        Ok(())
    }

    #[test]
    fn blank_save_is_a_noop() -> QueryRunnerResult<()> {
        let dir = tempfile::tempdir()?;
        let mut history = history_in(dir.path());

        history.save_query("")?;
        history.save_query("   \n\t ")?;

        assert!(history.saved.is_empty());
        assert!(!dir.path().join("savedQueries.json").exists());
        Ok(())
    }

    #[test]
    fn favorite_toggle_round_trips_through_storage() -> QueryRunnerResult<()> {
        let dir = tempfile::tempdir()?;
        let mut history = history_in(dir.path());

        history.save_query("SELECT * FROM customers;")?;
        let id = history.saved[0].id;

        history.toggle_favorite(id)?;
        assert!(history.saved[0].is_favorite);
        assert_eq!(history.favorites().count(), 1);

        // Reload from disk: the flag survives.
        let reloaded = history_in(dir.path());
        assert!(reloaded.saved[0].is_favorite);

        history.toggle_favorite(id)?;
        assert!(!history.saved[0].is_favorite);
        Ok(())
    }

    #[test]
    fn saved_queries_persist_camel_case_fields() -> QueryRunnerResult<()> {
        let dir = tempfile::tempdir()?;
        let mut history = history_in(dir.path());
        history.save_query("SELECT * FROM customers;")?;

        let json = std::fs::read_to_string(dir.path().join("savedQueries.json"))?;
        assert!(json.contains("\"isFavorite\""));
        assert!(json.contains("\"query\""));
        Ok(())
    }

    #[test]
    fn deletion_is_by_identity() -> QueryRunnerResult<()> {
        let dir = tempfile::tempdir()?;
        let mut history = history_in(dir.path());

        history.save_query("SELECT * FROM customers;")?;
        history.save_query("SELECT * FROM customers;")?;
        // Identical text, distinct entries.
        let first_id = history.saved[0].id;
        history.saved[1].id = first_id + 1;

        history.delete_saved(first_id)?;
        assert_eq!(history.saved.len(), 1);
        assert_eq!(history.saved[0].id, first_id + 1);
        Ok(())
    }

    #[test]
    fn recent_list_dedups_and_caps() -> QueryRunnerResult<()> {
        let dir = tempfile::tempdir()?;
        let mut history = history_in(dir.path());

        for i in 0..12 {
            history.record_execution(&format!("SELECT {i};"))?;
        }
        assert_eq!(history.recent.len(), RECENT_QUERIES_CAP);
        assert_eq!(history.recent[0], "SELECT 11;");

        // Re-running an old query moves it to the front without duplication.
        history.record_execution("SELECT 5;")?;
        assert_eq!(history.recent[0], "SELECT 5;");
        assert_eq!(
            history.recent.iter().filter(|q| *q == "SELECT 5;").count(),
            1
        );
        Ok(())
    }

    #[test]
    fn recent_entries_can_be_removed() -> QueryRunnerResult<()> {
        let dir = tempfile::tempdir()?;
        let mut history = history_in(dir.path());

        history.record_execution("SELECT 1;")?;
        history.record_execution("SELECT 2;")?;
        history.delete_recent("SELECT 1;")?;

        assert_eq!(history.recent, ["SELECT 2;"]);

        let reloaded = history_in(dir.path());
        assert_eq!(reloaded.recent, ["SELECT 2;"]);
        Ok(())
    }
}
