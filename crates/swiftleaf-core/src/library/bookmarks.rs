use super::documents::DocumentLibrary;
use super::store::KeyValueStore;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A saved position within a document's chunk list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub chunk_index: usize,
    pub note: Option<String>,
    pub created_at: u64,
}

impl<K: KeyValueStore> DocumentLibrary<K> {
    /// `None` when the document is unknown. Blank notes are dropped.
    pub fn add_bookmark(
        &self,
        document_id: &str,
        chunk_index: usize,
        note: Option<&str>,
        now: u64,
    ) -> Result<Option<Bookmark>> {
        let note = note
            .map(str::trim)
            .filter(|note| !note.is_empty())
            .map(str::to_string);
        self.modify(document_id, |doc| {
            let bookmark = Bookmark {
                id: format!("bm-{now}-{}", doc.bookmarks.len()),
                chunk_index,
                note,
                created_at: now,
            };
            debug!(document = %doc.id, chunk_index, "Added bookmark");
            doc.bookmarks.push(bookmark.clone());
            bookmark
        })
    }

    pub fn delete_bookmark(&self, document_id: &str, bookmark_id: &str) -> Result<bool> {
        let removed = self.modify(document_id, |doc| {
            let before = doc.bookmarks.len();
            doc.bookmarks.retain(|bookmark| bookmark.id != bookmark_id);
            doc.bookmarks.len() != before
        })?;
        Ok(removed.unwrap_or(false))
    }

    /// Bookmarks in reading order.
    pub fn bookmarks(&self, document_id: &str) -> Result<Vec<Bookmark>> {
        let mut bookmarks = self
            .get(document_id)?
            .map(|doc| doc.bookmarks)
            .unwrap_or_default();
        bookmarks.sort_by_key(|bookmark| bookmark.chunk_index);
        Ok(bookmarks)
    }
}

#[cfg(test)]
mod tests {
    use crate::library::documents::DocumentLibrary;
    use crate::library::store::{MemoryStore, Repository};

    #[test]
    fn bookmarks_sorted_by_position_with_optional_notes() {
        let library = DocumentLibrary::new(Repository::new(MemoryStore::new()));
        let doc = library.save_text("A document worth marking", 500, 1).unwrap();

        library.add_bookmark(&doc.id, 40, Some("  "), 5).unwrap();
        let early = library
            .add_bookmark(&doc.id, 3, Some(" key idea "), 6)
            .unwrap()
            .unwrap();

        let marks = library.bookmarks(&doc.id).unwrap();
        assert_eq!(marks.len(), 2);
        assert_eq!(marks[0].chunk_index, 3);
        assert_eq!(marks[0].note.as_deref(), Some("key idea"));
        assert_eq!(marks[1].note, None);
        assert_ne!(marks[0].id, marks[1].id);

        assert!(library.delete_bookmark(&doc.id, &early.id).unwrap());
        assert!(!library.delete_bookmark(&doc.id, &early.id).unwrap());
        assert_eq!(library.bookmarks(&doc.id).unwrap().len(), 1);
    }

    #[test]
    fn unknown_document_has_no_bookmarks() {
        let library = DocumentLibrary::new(Repository::new(MemoryStore::new()));
        assert!(library.add_bookmark("doc-missing", 1, None, 1).unwrap().is_none());
        assert!(library.bookmarks("doc-missing").unwrap().is_empty());
        assert!(!library.delete_bookmark("doc-missing", "bm-1-0").unwrap());
    }
}
