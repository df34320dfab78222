/// Chunking instructions sent with every batch.
pub fn segmentation_prompt(text: &str) -> String {
    format!(
        r#"You are a text chunking expert for speed reading applications. Your task is to break the following text into optimal reading chunks.

Rules:
1. Each chunk should contain 1-3 words that form a natural semantic unit.
2. Keep phrases together (e.g., "in the morning", "as a result", "on the other hand").
3. Keep prepositional phrases intact.
4. Keep noun phrases together.
5. Keep short subject-verb pairs together.
6. The focus word in each chunk should be the most important word (usually a noun or verb).
7. Aim for an average of about 1.8 words per chunk.

Text:
{text}

Return ONLY a JSON object with a single property "chunks" containing an array of objects.
Each object must have:
- "words": array of strings (the words in this chunk)
- "focusIndex": number (0-based index of the most important word in the chunk)

Example format:
{{
  "chunks": [
    {{ "words": ["The", "cat"], "focusIndex": 1 }},
    {{ "words": ["sat"], "focusIndex": 0 }},
    {{ "words": ["on", "the", "mat"], "focusIndex": 2 }}
  ]
}}"#
    )
}
