//! Acceptance policy for text recognized from images.

use crate::session::IngestError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrWord {
    pub text: String,
    pub confidence: f32,
}

/// Recognized text with a confidence in `0..=100`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    pub text: String,
    pub confidence: f32,
    #[serde(default)]
    pub words: Vec<OcrWord>,
}

impl OcrResult {
    /// Confidence is the mean of the word confidences, 0 without words.
    pub fn from_words(text: impl Into<String>, words: Vec<OcrWord>) -> Self {
        let confidence = if words.is_empty() {
            0.0
        } else {
            words.iter().map(|word| word.confidence).sum::<f32>() / words.len() as f32
        };
        Self {
            text: text.into(),
            confidence,
            words,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OcrWarning {
    LowConfidence { confidence: f32, threshold: f32 },
}

impl std::fmt::Display for OcrWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LowConfidence {
                confidence,
                threshold,
            } => write!(
                f,
                "recognition confidence {confidence:.0}% is below {threshold:.0}%; review the text"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcrAssessment {
    pub text: String,
    pub warning: Option<OcrWarning>,
}

/// Low confidence only warns; the text stays usable.
pub fn assess(result: &OcrResult, threshold: f32) -> Result<OcrAssessment, IngestError> {
    let text = result.text.trim();
    if text.is_empty() {
        return Err(IngestError::NoTextDetected);
    }
    let warning = (result.confidence < threshold).then_some(OcrWarning::LowConfidence {
        confidence: result.confidence,
        threshold,
    });
    Ok(OcrAssessment {
        text: text.to_string(),
        warning,
    })
}
