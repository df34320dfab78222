pub fn summary_prompt(text: &str) -> String {
    format!(
        r#"You are a helpful reading assistant.
The user is studying the following text:

{text}

Task:
- Provide a concise summary in 3-7 bullet points
- Use simple, clear language
- Focus on the main ideas and key details only

Return ONLY the bullet points, one per line, starting with a dash (-)."#
    )
}

pub fn explain_simpler_prompt(text: &str) -> String {
    format!(
        r#"You are an assistant helping someone understand a difficult passage.

Text:
{text}

Task:
- Explain this in much simpler language
- Assume the reader is smart but not familiar with technical terms
- Use short sentences and plain words
- If there are key terms, briefly define them

Return your explanation as plain text."#
    )
}

pub fn flashcards_prompt(text: &str) -> String {
    format!(
        r#"You are creating study flashcards from the following text:

{text}

Task:
- Generate flashcards in JSON format
- Each flashcard should have "question" and "answer"
- Focus on key concepts, definitions, and important facts
- Create 5-10 flashcards depending on content length

Return ONLY a JSON object with a single property "flashcards" that contains an array of objects.
Format:
{{
  "flashcards": [
    {{ "question": "What is...", "answer": "..." }},
    {{ "question": "Define...", "answer": "..." }}
  ]
}}"#
    )
}

pub fn quiz_prompt(text: &str) -> String {
    format!(
        r#"You are creating a short quiz from the following text:

{text}

Task:
- Create a quiz with 5 multiple-choice questions
- Each question should have:
  - "question": string
  - "options": array of 4 strings (A, B, C, D)
  - "correctIndex": number (0-3)
- Focus on comprehension, not trick questions

Return ONLY a JSON object with a single property "questions" that contains an array.
Format:
{{
  "questions": [
    {{
      "question": "What is the main idea?",
      "options": ["Option A", "Option B", "Option C", "Option D"],
      "correctIndex": 1
    }}
  ]
}}"#
    )
}

pub fn vocabulary_prompt(text: &str) -> String {
    format!(
        r#"Analyze this text and identify 8-12 interesting vocabulary words that would be valuable for learning. Include a mix of difficulty levels.

Text: {text}

Return your response as a JSON object with a single property "words" that contains an array of vocabulary items. Each item should have:
- word: the vocabulary word
- definition: clear definition
- difficulty: "easy", "medium", or "hard"
- examples: array of 2-3 example sentences using the word

Format example:
{{
  "words": [
    {{
      "word": "example",
      "definition": "a thing characteristic of its kind or illustrating a general rule",
      "difficulty": "medium",
      "examples": ["This painting is a fine example of modern art.", "Let me give you an example."]
    }}
  ]
}}"#
    )
}

pub fn answer_prompt(question: &str, text: &str) -> String {
    format!(
        r#"You are a helpful reading tutor. Answer the user's question based on the following text.

Text:
{text}

User's Question:
{question}

Provide a clear, concise answer based on the text. If the answer isn't in the text, say so politely."#
    )
}
