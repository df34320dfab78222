//! Study aids generated from the source text by a language model.
//!
//! These calls never touch reading state; a failure is reported to the caller
//! and the session carries on.

pub mod prompts;

use crate::clock::now_millis;
use crate::services::{LanguageModel, ResponseFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StudyError {
    #[error("study tools are not available")]
    Unavailable,
    #[error("study request failed: {0}")]
    Service(String),
    #[error("malformed study reply: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: String,
    pub document_id: String,
    pub question: String,
    pub answer: String,
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub document_id: String,
    pub title: String,
    pub questions: Vec<QuizQuestion>,
    pub created_at: u64,
}

impl Quiz {
    /// Number of answers matching the correct option, by question order.
    pub fn score(&self, answers: &[usize]) -> usize {
        self.questions
            .iter()
            .zip(answers)
            .filter(|(question, answer)| question.correct_index == **answer)
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "easy" => Self::Easy,
            "hard" => Self::Hard,
            _ => Self::Medium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyWord {
    pub word: String,
    pub definition: String,
    pub difficulty: Difficulty,
    pub examples: Vec<String>,
}

pub const DEFAULT_QUIZ_TITLE: &str = "Reading Comprehension Quiz";

pub struct StudyTools<M> {
    model: M,
}

impl<M: LanguageModel> StudyTools<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub fn is_available(&self) -> bool {
        self.model.is_available()
    }

    pub async fn summary(&self, text: &str) -> Result<String, StudyError> {
        self.complete_text(&prompts::summary_prompt(text)).await
    }

    pub async fn explain_simpler(&self, text: &str) -> Result<String, StudyError> {
        self.complete_text(&prompts::explain_simpler_prompt(text))
            .await
    }

    pub async fn answer_question(&self, question: &str, text: &str) -> Result<String, StudyError> {
        self.complete_text(&prompts::answer_prompt(question, text))
            .await
    }

    pub async fn flashcards(
        &self,
        text: &str,
        document_id: &str,
    ) -> Result<Vec<Flashcard>, StudyError> {
        let reply = self.complete_json(&prompts::flashcards_prompt(text)).await?;
        let items = array_property(&reply, "flashcards")?;
        let created_at = now_millis();
        Ok(items
            .iter()
            .enumerate()
            .map(|(idx, item)| Flashcard {
                id: format!("fc-{created_at}-{idx}"),
                document_id: document_id.to_string(),
                question: string_field(item, "question"),
                answer: string_field(item, "answer"),
                created_at,
            })
            .collect())
    }

    pub async fn quiz(
        &self,
        text: &str,
        document_id: &str,
        title: Option<&str>,
    ) -> Result<Quiz, StudyError> {
        let reply = self.complete_json(&prompts::quiz_prompt(text)).await?;
        let items = array_property(&reply, "questions")?;
        let created_at = now_millis();
        Ok(Quiz {
            id: format!("quiz-{created_at}"),
            document_id: document_id.to_string(),
            title: title.unwrap_or(DEFAULT_QUIZ_TITLE).to_string(),
            questions: items.iter().map(quiz_question).collect(),
            created_at,
        })
    }

    pub async fn vocabulary(&self, text: &str) -> Result<Vec<VocabularyWord>, StudyError> {
        let reply = self.complete_json(&prompts::vocabulary_prompt(text)).await?;
        let items = array_property(&reply, "words")?;
        Ok(items
            .iter()
            .map(|item| VocabularyWord {
                word: string_field(item, "word"),
                definition: string_field(item, "definition"),
                difficulty: Difficulty::parse(&string_field(item, "difficulty")),
                examples: string_list(item.get("examples")),
            })
            .filter(|entry| !entry.word.is_empty())
            .collect())
    }

    async fn complete_text(&self, prompt: &str) -> Result<String, StudyError> {
        if !self.model.is_available() {
            return Err(StudyError::Unavailable);
        }
        let reply = self
            .model
            .complete(prompt, ResponseFormat::Text)
            .await
            .map_err(|err| {
                warn!("Study request failed: {err:#}");
                StudyError::Service(format!("{err:#}"))
            })?;
        Ok(reply.trim().to_string())
    }

    async fn complete_json(&self, prompt: &str) -> Result<Value, StudyError> {
        if !self.model.is_available() {
            return Err(StudyError::Unavailable);
        }
        let reply = self
            .model
            .complete(prompt, ResponseFormat::Json)
            .await
            .map_err(|err| {
                warn!("Study request failed: {err:#}");
                StudyError::Service(format!("{err:#}"))
            })?;
        debug!(bytes = reply.len(), "Study reply received");
        serde_json::from_str(reply.trim()).map_err(|err| StudyError::Malformed(err.to_string()))
    }
}

fn array_property<'a>(reply: &'a Value, property: &str) -> Result<&'a Vec<Value>, StudyError> {
    reply
        .get(property)
        .and_then(Value::as_array)
        .ok_or_else(|| StudyError::Malformed(format!("missing `{property}` array")))
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn string_field(item: &Value, field: &str) -> String {
    item.get(field).map(value_text).unwrap_or_default()
}

fn string_list(raw: Option<&Value>) -> Vec<String> {
    raw.and_then(Value::as_array)
        .map(|items| items.iter().map(value_text).collect())
        .unwrap_or_default()
}

fn quiz_question(item: &Value) -> QuizQuestion {
    let options = string_list(item.get("options"));
    let requested = item
        .get("correctIndex")
        .and_then(|value| value.as_i64().or_else(|| value.as_f64().map(|f| f as i64)))
        .unwrap_or(0);
    let last = options.len().saturating_sub(1) as i64;
    QuizQuestion {
        question: string_field(item, "question"),
        correct_index: requested.clamp(0, last) as usize,
        options,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::Unavailable;
    use anyhow::{Result, anyhow};
    use serde_json::json;
    use std::sync::Mutex;

    struct CannedModel {
        reply: Result<String, String>,
        requests: Mutex<Vec<(String, ResponseFormat)>>,
    }

    impl CannedModel {
        fn replying(reply: impl Into<String>) -> Self {
            Self {
                reply: Ok(reply.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl LanguageModel for CannedModel {
        async fn complete(&self, prompt: &str, format: ResponseFormat) -> Result<String> {
            self.requests
                .lock()
                .unwrap()
                .push((prompt.to_string(), format));
            self.reply.clone().map_err(|message| anyhow!(message))
        }
    }

    #[tokio::test]
    async fn summary_is_trimmed_text_request() {
        let tools = StudyTools::new(CannedModel::replying("\n- one\n- two\n"));

        let summary = tools.summary("source passage").await.unwrap();

        assert_eq!(summary, "- one\n- two");
        let requests = tools.model.requests.lock().unwrap();
        assert_eq!(requests[0].1, ResponseFormat::Text);
        assert!(requests[0].0.contains("source passage"));
    }

    #[tokio::test]
    async fn flashcards_fill_missing_fields() {
        let reply = json!({
            "flashcards": [
                { "question": "What is RSVP?", "answer": "Rapid serial visual presentation" },
                { "question": "Orphan question" }
            ]
        });
        let tools = StudyTools::new(CannedModel::replying(reply.to_string()));

        let cards = tools.flashcards("text", "doc-1").await.unwrap();

        assert_eq!(cards.len(), 2);
        assert_eq!(cards[1].answer, "");
        assert_eq!(cards[0].document_id, "doc-1");
        assert!(cards[0].id.starts_with("fc-"));
        assert!(cards[1].id.ends_with("-1"));
        assert_eq!(tools.model.requests.lock().unwrap()[0].1, ResponseFormat::Json);
    }

    #[tokio::test]
    async fn quiz_sanitizes_options_and_answer_index() {
        let reply = json!({
            "questions": [
                { "question": "Q1", "options": ["a", "b", "c", "d"], "correctIndex": 2 },
                { "question": "Q2", "options": ["a", "b"], "correctIndex": 7 },
                { "question": "Q3", "options": "none", "correctIndex": "1" },
                { "options": ["x", "y"], "correctIndex": -4 }
            ]
        });
        let tools = StudyTools::new(CannedModel::replying(reply.to_string()));

        let quiz = tools.quiz("text", "doc-1", None).await.unwrap();

        assert_eq!(quiz.title, DEFAULT_QUIZ_TITLE);
        let indices: Vec<usize> = quiz.questions.iter().map(|q| q.correct_index).collect();
        assert_eq!(indices, vec![2, 1, 0, 0]);
        assert!(quiz.questions[2].options.is_empty());
        assert_eq!(quiz.questions[3].question, "");
        assert_eq!(quiz.score(&[2, 0, 0, 0]), 3);
    }

    #[tokio::test]
    async fn vocabulary_maps_unknown_difficulty_to_medium() {
        let reply = json!({
            "words": [
                { "word": "ephemeral", "definition": "short-lived", "difficulty": "HARD",
                  "examples": ["An ephemeral trend."] },
                { "word": "tome", "definition": "a large book", "difficulty": "legendary" },
                { "definition": "no headword" }
            ]
        });
        let tools = StudyTools::new(CannedModel::replying(reply.to_string()));

        let words = tools.vocabulary("text").await.unwrap();

        assert_eq!(words.len(), 2);
        assert_eq!(words[0].difficulty, Difficulty::Hard);
        assert_eq!(words[0].examples.len(), 1);
        assert_eq!(words[1].difficulty, Difficulty::Medium);
        assert!(words[1].examples.is_empty());
    }

    #[tokio::test]
    async fn malformed_replies_are_errors() {
        let tools = StudyTools::new(CannedModel::replying("not json"));
        assert!(matches!(
            tools.flashcards("text", "doc").await,
            Err(StudyError::Malformed(_))
        ));

        let tools = StudyTools::new(CannedModel::replying(r#"{"cards": []}"#));
        assert_eq!(
            tools.quiz("text", "doc", Some("Quiz")).await.unwrap_err(),
            StudyError::Malformed("missing `questions` array".to_string())
        );
    }

    #[tokio::test]
    async fn service_failures_surface_as_errors() {
        let tools = StudyTools::new(CannedModel::failing("quota exceeded"));
        let err = tools.answer_question("why?", "text").await.unwrap_err();
        assert!(matches!(err, StudyError::Service(message) if message.contains("quota")));

        let offline = StudyTools::new(Unavailable);
        assert!(!offline.is_available());
        assert_eq!(
            offline.explain_simpler("text").await.unwrap_err(),
            StudyError::Unavailable
        );
    }
}
