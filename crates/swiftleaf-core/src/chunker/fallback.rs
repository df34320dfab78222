//! Deterministic local segmentation used when the service cannot help.

use crate::chunk::Chunk;

const FUNCTION_WORDS: [&str; 10] = ["the", "a", "an", "in", "on", "at", "to", "for", "of", "with"];
const SHORT_WORD_CHARS: usize = 3;

fn leans_forward(word: &str) -> bool {
    let lower = word.to_lowercase();
    FUNCTION_WORDS.contains(&lower.as_str()) || word.chars().count() <= SHORT_WORD_CHARS
}

/// Pair a short or function word with the word after it, otherwise emit it alone.
///
/// Each step consumes at least one word, so every input word lands in exactly
/// one chunk, in order.
pub fn fallback_chunking(words: &[String]) -> Vec<Chunk> {
    let mut chunks = Vec::with_capacity(words.len());
    let mut i = 0usize;

    while i < words.len() {
        let word = &words[i];
        match words.get(i + 1) {
            Some(next) if leans_forward(word) => {
                chunks.push(Chunk::new(vec![word.clone(), next.clone()], 1));
                i += 2;
            }
            _ => {
                chunks.push(Chunk::new(vec![word.clone()], 0));
                i += 1;
            }
        }
    }

    crate::chunk::renumber(&mut chunks);
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_utils::split_words;

    fn flatten(chunks: &[Chunk]) -> Vec<String> {
        chunks.iter().flat_map(|c| c.words.clone()).collect()
    }

    #[test]
    fn pairs_function_and_short_words_with_next() {
        let words = split_words("The quick brown fox jumps over the lazy dog");
        let chunks = fallback_chunking(&words);
        let shapes: Vec<(Vec<&str>, usize)> = chunks
            .iter()
            .map(|c| (c.words.iter().map(String::as_str).collect(), c.focus_index))
            .collect();
        assert_eq!(
            shapes,
            vec![
                (vec!["The", "quick"], 1),
                (vec!["brown"], 0),
                (vec!["fox", "jumps"], 1),
                (vec!["over"], 0),
                (vec!["the", "lazy"], 1),
                (vec!["dog"], 0),
            ]
        );
    }

    #[test]
    fn trailing_short_word_stays_alone() {
        let words = split_words("remarkable to");
        let chunks = fallback_chunking(&words);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].words, vec!["to"]);
        assert_eq!(chunks[1].focus_index, 0);
    }

    #[test]
    fn long_sentence_keeps_every_word_in_order() {
        let words = split_words(
            "The quick brown fox jumps over the lazy dog near the old river bank today",
        );
        assert_eq!(words.len(), 15);
        let chunks = fallback_chunking(&words);
        assert_eq!(flatten(&chunks), words);
        assert!(chunks.iter().all(|c| c.focus_index < c.words.len()));
        assert!(chunks.iter().all(|c| !c.words.is_empty()));
    }

    #[test]
    fn preserves_words_for_assorted_inputs() {
        let samples = [
            "a",
            "an apple",
            "of to in at on",
            "Extraordinarily long words never pair themselves",
            "I am ok so be it",
            "ñu él año",
        ];
        for sample in samples {
            let words = split_words(sample);
            let chunks = fallback_chunking(&words);
            assert_eq!(flatten(&chunks), words, "sample {sample:?}");
            for (idx, chunk) in chunks.iter().enumerate() {
                assert!(chunk.focus_index < chunk.words.len());
                assert_eq!(chunk.id, format!("chunk-{idx}"));
            }
        }
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(fallback_chunking(&[]).is_empty());
    }
}
