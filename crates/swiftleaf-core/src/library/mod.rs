//! Saved documents, bookmarks, reading goal and history.
//!
//! Everything is persisted through one [`KeyValueStore`] under three logical
//! keys; see [`store`].

pub mod bookmarks;
pub mod documents;
pub mod goals;
pub mod history;
pub mod store;

pub use bookmarks::Bookmark;
pub use documents::{DocumentLibrary, SavedDocument, document_id};
pub use goals::{GoalError, GoalTracker, ReadingGoal};
pub use history::{CALENDAR_DAYS, CalendarDay, HistoryEntry, HistorySummary, ReadingHistory, intensity};
pub use store::{FileStore, KeyValueStore, MemoryStore, Repository};

use std::path::PathBuf;

/// All library facades over a shared repository.
pub struct Library<K> {
    pub documents: DocumentLibrary<K>,
    pub goals: GoalTracker<K>,
    pub history: ReadingHistory<K>,
}

impl<K: KeyValueStore> Library<K> {
    pub fn new(store: K) -> Self {
        let repo = Repository::new(store);
        Self {
            documents: DocumentLibrary::new(repo.clone()),
            goals: GoalTracker::new(repo.clone()),
            history: ReadingHistory::new(repo),
        }
    }
}

impl Library<FileStore> {
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self::new(FileStore::new(dir))
    }
}
