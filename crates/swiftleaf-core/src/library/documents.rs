use super::bookmarks::Bookmark;
use super::store::{DOCUMENTS_KEY, KeyValueStore, Repository};
use crate::text_utils::{sanitize_text, title_from_text};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

const TITLE_WORDS: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedDocument {
    pub id: String,
    pub title: String,
    pub text: String,
    pub last_read_at: Option<u64>,
    pub wpm: Option<u32>,
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
    pub completed_at: Option<u64>,
}

/// Same text always maps to the same id.
pub fn document_id(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sanitize_text(text).as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    format!("doc-{}", &hash[..16])
}

pub struct DocumentLibrary<K> {
    pub(super) repo: Repository<K>,
}

impl<K: KeyValueStore> DocumentLibrary<K> {
    pub fn new(repo: Repository<K>) -> Self {
        Self { repo }
    }

    /// Insert `text` or refresh the existing entry for it.
    pub fn save_text(&self, text: &str, wpm: u32, now: u64) -> Result<SavedDocument> {
        let id = document_id(text);
        self.repo
            .update(DOCUMENTS_KEY, Vec::<SavedDocument>::new(), |docs| {
                if let Some(doc) = docs.iter_mut().find(|doc| doc.id == id) {
                    doc.last_read_at = Some(now);
                    doc.wpm = Some(wpm);
                    return doc.clone();
                }
                let sanitized = sanitize_text(text);
                let doc = SavedDocument {
                    id: id.clone(),
                    title: title_from_text(&sanitized, TITLE_WORDS),
                    text: sanitized,
                    last_read_at: Some(now),
                    wpm: Some(wpm),
                    bookmarks: Vec::new(),
                    completed_at: None,
                };
                info!(id = %doc.id, title = %doc.title, "Saved new document");
                docs.push(doc.clone());
                doc
            })
    }

    /// Most recently read first.
    pub fn list(&self) -> Result<Vec<SavedDocument>> {
        let mut docs: Vec<SavedDocument> = self.repo.get(DOCUMENTS_KEY, Vec::new())?;
        docs.sort_by(|a, b| b.last_read_at.cmp(&a.last_read_at));
        Ok(docs)
    }

    pub fn search(&self, query: &str) -> Result<Vec<SavedDocument>> {
        let needle = query.trim().to_lowercase();
        let docs = self.list()?;
        if needle.is_empty() {
            return Ok(docs);
        }
        Ok(docs
            .into_iter()
            .filter(|doc| doc.title.to_lowercase().contains(&needle))
            .collect())
    }

    pub fn get(&self, id: &str) -> Result<Option<SavedDocument>> {
        let docs: Vec<SavedDocument> = self.repo.get(DOCUMENTS_KEY, Vec::new())?;
        Ok(docs.into_iter().find(|doc| doc.id == id))
    }

    pub fn delete(&self, id: &str) -> Result<bool> {
        self.repo
            .update(DOCUMENTS_KEY, Vec::<SavedDocument>::new(), |docs| {
                let before = docs.len();
                docs.retain(|doc| doc.id != id);
                docs.len() != before
            })
    }

    pub fn mark_completed(&self, id: &str, now: u64) -> Result<bool> {
        Ok(self
            .modify(id, |doc| doc.completed_at = Some(now))?
            .is_some())
    }

    pub fn set_wpm(&self, id: &str, wpm: u32) -> Result<bool> {
        Ok(self.modify(id, |doc| doc.wpm = Some(wpm))?.is_some())
    }

    /// Apply `change` to document `id`; `None` when it does not exist.
    pub(super) fn modify<R>(
        &self,
        id: &str,
        change: impl FnOnce(&mut SavedDocument) -> R,
    ) -> Result<Option<R>> {
        self.repo
            .update(DOCUMENTS_KEY, Vec::<SavedDocument>::new(), |docs| {
                docs.iter_mut().find(|doc| doc.id == id).map(change)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::store::MemoryStore;

    fn library() -> DocumentLibrary<MemoryStore> {
        DocumentLibrary::new(Repository::new(MemoryStore::new()))
    }

    #[test]
    fn ids_ignore_whitespace_differences() {
        assert_eq!(document_id("one  two\nthree"), document_id(" one two three "));
        assert_ne!(document_id("one two"), document_id("one three"));
        assert!(document_id("x").starts_with("doc-"));
    }

    #[test]
    fn saving_same_text_twice_upserts() {
        let library = library();
        let first = library.save_text("A tale of two cities", 400, 10).unwrap();
        let second = library.save_text("A tale of  two cities", 600, 20).unwrap();

        assert_eq!(first.id, second.id);
        let docs = library.list().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].wpm, Some(600));
        assert_eq!(docs[0].last_read_at, Some(20));
        assert_eq!(docs[0].title, "A tale of two cities");
    }

    #[test]
    fn list_orders_by_recency_and_search_matches_titles() {
        let library = library();
        library.save_text("Old harbour notes", 500, 1).unwrap();
        library.save_text("New garden notes", 500, 5).unwrap();
        library.save_text("Middle chapter", 500, 3).unwrap();

        let titles: Vec<String> = library.list().unwrap().into_iter().map(|d| d.title).collect();
        assert_eq!(titles, vec!["New garden notes", "Middle chapter", "Old harbour notes"]);

        let hits = library.search("NOTES").unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(library.search("  ").unwrap().len(), 3);
    }

    #[test]
    fn completion_wpm_and_delete() {
        let library = library();
        let doc = library.save_text("Something worth finishing", 500, 1).unwrap();

        assert!(library.mark_completed(&doc.id, 99).unwrap());
        assert!(library.set_wpm(&doc.id, 750).unwrap());
        let stored = library.get(&doc.id).unwrap().unwrap();
        assert_eq!(stored.completed_at, Some(99));
        assert_eq!(stored.wpm, Some(750));

        assert!(library.delete(&doc.id).unwrap());
        assert!(!library.delete(&doc.id).unwrap());
        assert!(!library.mark_completed(&doc.id, 100).unwrap());
        assert!(library.get(&doc.id).unwrap().is_none());
    }
}
