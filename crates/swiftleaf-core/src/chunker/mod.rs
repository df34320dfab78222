//! Text to reading-unit segmentation.
//!
//! Text is split into batches, each batch is sent to a [`Segmenter`] and the
//! reply is validated. Failed batches are retried a bounded number of times
//! and then segmented locally, so a parse always produces chunks.

pub mod fallback;
pub mod prompt;
pub mod retry;
pub mod sanitize;

use crate::cancellation::CancellationToken;
use crate::chunk::{Chunk, renumber};
use crate::config::AppConfig;
use crate::services::Segmenter;
use crate::text_utils::split_words;
use anyhow::{Result, anyhow};
use tracing::{debug, info, warn};

pub use fallback::fallback_chunking;
pub use retry::{AttemptOutcome, RetryStep, next_step};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    pub batch_words: usize,
    pub max_retries: u32,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            batch_words: crate::config::defaults::default_batch_words(),
            max_retries: crate::config::defaults::default_max_retries(),
        }
    }
}

impl From<&AppConfig> for ChunkerConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            batch_words: config.batch_words.max(1),
            max_retries: config.max_retries,
        }
    }
}

pub struct Chunker<S> {
    segmenter: S,
    config: ChunkerConfig,
}

impl<S: Segmenter> Chunker<S> {
    pub fn new(segmenter: S, config: ChunkerConfig) -> Self {
        Self { segmenter, config }
    }

    pub fn config(&self) -> ChunkerConfig {
        self.config
    }

    pub fn segmenter(&self) -> &S {
        &self.segmenter
    }

    /// Segment `text` into renumbered chunks. Never fails; text without words
    /// yields an empty list.
    pub async fn parse_text_into_chunks(&self, text: &str) -> Vec<Chunk> {
        match self.parse_with_cancel(text, None).await {
            Ok(chunks) => chunks,
            Err(err) => {
                warn!("Uncancellable parse reported an error: {err:#}");
                fallback_chunking(&split_words(text))
            }
        }
    }

    /// Like [`Self::parse_text_into_chunks`], but stops early once `cancel`
    /// is triggered. Cancellation is the only error.
    pub async fn parse_with_cancel(
        &self,
        text: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<Chunk>> {
        let words = split_words(text);
        if words.is_empty() {
            return Ok(Vec::new());
        }

        let batch_words = self.config.batch_words.max(1);
        let batch_count = words.len().div_ceil(batch_words);
        info!(
            words = words.len(),
            batches = batch_count,
            "Starting chunk segmentation"
        );

        let mut chunks = Vec::with_capacity(words.len());
        for (batch_idx, batch) in words.chunks(batch_words).enumerate() {
            if let Some(token) = cancel {
                token.check_cancelled("batch")?;
            }
            let mut batch_chunks = self.segment_batch(batch_idx, batch, cancel).await?;
            chunks.append(&mut batch_chunks);
        }

        renumber(&mut chunks);
        debug!(chunks = chunks.len(), "Chunk segmentation finished");
        Ok(chunks)
    }

    async fn segment_batch(
        &self,
        batch_idx: usize,
        batch: &[String],
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<Chunk>> {
        let mut attempt = 0u32;
        loop {
            let outcome = self.attempt(batch).await;
            if let Some(token) = cancel {
                token.check_cancelled("response")?;
            }

            match next_step(attempt, self.config.max_retries, &outcome) {
                RetryStep::Accept => {
                    if let AttemptOutcome::Parsed(chunks) = outcome {
                        debug!(
                            batch = batch_idx,
                            attempt,
                            chunks = chunks.len(),
                            "Batch segmented by service"
                        );
                        return Ok(chunks);
                    }
                    return Err(anyhow!("accepted an attempt without parsed chunks"));
                }
                RetryStep::Retry(next) => {
                    warn!(
                        batch = batch_idx,
                        attempt,
                        reason = %outcome.reason(),
                        "Segmentation attempt failed; retrying"
                    );
                    attempt = next;
                }
                RetryStep::Fallback => {
                    warn!(
                        batch = batch_idx,
                        attempt,
                        reason = %outcome.reason(),
                        "Using local fallback segmentation"
                    );
                    return Ok(fallback_chunking(batch));
                }
            }
        }
    }

    async fn attempt(&self, batch: &[String]) -> AttemptOutcome {
        if !self.segmenter.is_available() {
            return AttemptOutcome::Fatal(anyhow!("segmentation service unavailable"));
        }
        match self.segmenter.segment(batch).await {
            Ok(raw) => match sanitize::parse_response(&raw) {
                Ok(chunks) => AttemptOutcome::Parsed(chunks),
                Err(err) => AttemptOutcome::Retryable(err),
            },
            Err(err) => AttemptOutcome::Retryable(err),
        }
    }
}
