//! Collaborator ports.
//!
//! The core never talks to a network service directly. Segmentation, study
//! tools and OCR go through these traits so tests can inject deterministic
//! fakes and the binary can plug in HTTP clients.

use crate::ocr::OcrResult;
use anyhow::{Result, anyhow};
use std::future::Future;

/// Shape the completion service is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    Json,
}

pub trait LanguageModel {
    fn is_available(&self) -> bool {
        true
    }

    fn complete(
        &self,
        prompt: &str,
        format: ResponseFormat,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Groups a batch of words into reading units; returns the raw service reply.
pub trait Segmenter {
    fn is_available(&self) -> bool;

    fn segment(&self, words: &[String]) -> impl Future<Output = Result<String>> + Send;
}

#[derive(Debug, Clone)]
pub struct OcrRequest {
    pub image: Vec<u8>,
    pub language: String,
}

pub trait OcrEngine {
    /// `progress` receives the recognition progress as a fraction in `[0, 1]`.
    fn recognize(
        &self,
        request: OcrRequest,
        progress: &(dyn Fn(f32) + Send + Sync),
    ) -> impl Future<Output = Result<OcrResult>> + Send;
}

/// Segmenter backed by a completion service and the chunking prompt.
#[derive(Debug, Clone)]
pub struct LlmSegmenter<M> {
    model: M,
}

impl<M> LlmSegmenter<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<M> Segmenter for LlmSegmenter<M>
where
    M: LanguageModel + Sync,
{
    fn is_available(&self) -> bool {
        self.model.is_available()
    }

    async fn segment(&self, words: &[String]) -> Result<String> {
        let prompt = crate::chunker::prompt::segmentation_prompt(&words.join(" "));
        self.model.complete(&prompt, ResponseFormat::Json).await
    }
}

/// Stand-in used when no service endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl Segmenter for Unavailable {
    fn is_available(&self) -> bool {
        false
    }

    async fn segment(&self, _words: &[String]) -> Result<String> {
        Err(anyhow!("segmentation service is not configured"))
    }
}

impl LanguageModel for Unavailable {
    fn is_available(&self) -> bool {
        false
    }

    async fn complete(&self, _prompt: &str, _format: ResponseFormat) -> Result<String> {
        Err(anyhow!("language model is not configured"))
    }
}

impl OcrEngine for Unavailable {
    async fn recognize(
        &self,
        _request: OcrRequest,
        _progress: &(dyn Fn(f32) + Send + Sync),
    ) -> Result<OcrResult> {
        Err(anyhow!("OCR service is not configured"))
    }
}
