use serde::{Deserialize, Serialize};

/// One reading unit: a few words shown together, one of them emphasized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub words: Vec<String>,
    pub focus_index: usize,
}

impl Chunk {
    /// Builds a chunk with a placeholder id; ids are assigned by [`renumber`].
    pub fn new(words: Vec<String>, focus_index: usize) -> Self {
        let focus_index = focus_index.min(words.len().saturating_sub(1));
        Self {
            id: String::new(),
            words,
            focus_index,
        }
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn focus_word(&self) -> Option<&str> {
        self.words.get(self.focus_index).map(String::as_str)
    }

    pub fn text(&self) -> String {
        self.words.join(" ")
    }
}

pub fn chunk_id(index: usize) -> String {
    format!("chunk-{index}")
}

/// Assign `chunk-0`, `chunk-1`, ... over the whole list.
pub fn renumber(chunks: &mut [Chunk]) {
    for (idx, chunk) in chunks.iter_mut().enumerate() {
        chunk.id = chunk_id(idx);
    }
}

pub fn total_words(chunks: &[Chunk]) -> usize {
    chunks.iter().map(Chunk::word_count).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clamps_focus_index() {
        let chunk = Chunk::new(vec!["on".into(), "time".into()], 7);
        assert_eq!(chunk.focus_index, 1);
        assert_eq!(chunk.focus_word(), Some("time"));
    }

    #[test]
    fn renumber_assigns_sequential_ids() {
        let mut chunks = vec![
            Chunk::new(vec!["a".into()], 0),
            Chunk::new(vec!["b".into(), "c".into()], 1),
        ];
        renumber(&mut chunks);
        assert_eq!(chunks[0].id, "chunk-0");
        assert_eq!(chunks[1].id, "chunk-1");
        assert_eq!(total_words(&chunks), 3);
    }
}
