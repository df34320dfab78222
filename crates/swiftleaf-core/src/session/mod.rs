//! Reading session: chunk list, playback and ingestion in one place.
//!
//! Every user action goes through [`ReadingSession::apply_command`], which
//! returns a fresh snapshot with derived progress metrics. Text ingestion is
//! split in two halves so parsing can run outside the session: a
//! [`ParseRequest`] is issued first and its result is accepted only if no newer
//! request was issued in the meantime.

pub mod shortcuts;

use crate::cancellation::CancellationToken;
use crate::chunk::{Chunk, total_words};
use crate::chunker::Chunker;
use crate::config::AppConfig;
use crate::ocr::{self, OcrResult, OcrWarning};
use crate::scheduler::{PlaybackPhase, PlaybackScheduler, PlaybackSettings, TickOutcome};
use crate::services::{OcrEngine, OcrRequest, Segmenter};
use crate::text_utils::count_words;
use crate::timer::Timer;
use serde::Serialize;
use shortcuts::{InputFocus, KeyBindings, KeyInput, ShortcutAction};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    #[error("please enter some text")]
    EmptyText,
    #[error("text has {found} words; at least {minimum} are required")]
    TooFewWords { found: usize, minimum: usize },
    #[error("no text was detected in the image")]
    NoTextDetected,
    #[error("text recognition failed: {0}")]
    Ocr(String),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReaderStats {
    pub chunk_index: usize,
    pub chunk_count: usize,
    pub progress_percent: f64,
    pub total_words: usize,
    pub words_read: usize,
    pub words_remaining: usize,
    pub minutes_remaining: f64,
}

impl ReaderStats {
    /// Words before `index` count as read; progress is `index / len`.
    pub fn compute(chunks: &[Chunk], index: usize, wpm: u32) -> Self {
        let chunk_count = chunks.len();
        let index = index.min(chunk_count.saturating_sub(1));
        let total = total_words(chunks);
        let words_read = total_words(&chunks[..index.min(chunk_count)]);
        let words_remaining = total - words_read;
        let progress_percent = if chunk_count == 0 {
            0.0
        } else {
            index as f64 / chunk_count as f64 * 100.0
        };
        let minutes_remaining = if words_remaining == 0 {
            0.0
        } else {
            words_remaining as f64 / f64::from(wpm.max(1))
        };
        Self {
            chunk_index: index,
            chunk_count,
            progress_percent,
            total_words: total,
            words_read,
            words_remaining,
            minutes_remaining,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub loaded: bool,
    pub current_chunk: Option<Chunk>,
    pub phase: PlaybackPhase,
    pub is_playing: bool,
    pub wpm: u32,
    pub parsing: bool,
    pub stats: ReaderStats,
}

#[derive(Debug, Clone)]
pub enum SessionCommand {
    GetSnapshot,
    Play,
    Pause,
    TogglePlayPause,
    SkipForward,
    SkipBackward,
    Restart,
    Seek { index: usize },
    SetWpm { wpm: u32 },
    AdjustWpm { increase: bool },
    KeyPressed { key: KeyInput, focus: InputFocus },
    TimerFired { generation: u64 },
    Close,
}

impl SessionCommand {
    pub fn action(&self) -> &'static str {
        match self {
            Self::GetSnapshot => "reader_get_snapshot",
            Self::Play => "reader_play",
            Self::Pause => "reader_pause",
            Self::TogglePlayPause => "reader_toggle_play_pause",
            Self::SkipForward => "reader_skip_forward",
            Self::SkipBackward => "reader_skip_backward",
            Self::Restart => "reader_restart",
            Self::Seek { .. } => "reader_seek",
            Self::SetWpm { .. } => "reader_set_wpm",
            Self::AdjustWpm { .. } => "reader_adjust_wpm",
            Self::KeyPressed { .. } => "reader_key_pressed",
            Self::TimerFired { .. } => "reader_timer_fired",
            Self::Close => "reader_close",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    ReadingComplete,
}

#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub action: &'static str,
    pub snapshot: SessionSnapshot,
    pub signal: Option<SessionSignal>,
}

/// A validated text waiting to be segmented.
#[derive(Debug, Clone)]
pub struct ParseRequest {
    pub id: u64,
    pub text: String,
    pub token: CancellationToken,
}

#[derive(Debug)]
struct PendingParse {
    id: u64,
    text: String,
    token: CancellationToken,
}

pub struct ReadingSession<T> {
    chunks: Vec<Chunk>,
    source_text: String,
    scheduler: PlaybackScheduler<T>,
    bindings: KeyBindings,
    min_words: usize,
    ocr_threshold: f32,
    parse_request_id: u64,
    pending_parse: Option<PendingParse>,
    words_shown: usize,
}

impl<T: Timer> ReadingSession<T> {
    pub fn new(timer: T, config: &AppConfig) -> Self {
        Self {
            chunks: Vec::new(),
            source_text: String::new(),
            scheduler: PlaybackScheduler::new(timer, PlaybackSettings::from(config)),
            bindings: KeyBindings::from(config),
            min_words: config.min_words,
            ocr_threshold: config.ocr_confidence_threshold,
            parse_request_id: 0,
            pending_parse: None,
            words_shown: 0,
        }
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn current_index(&self) -> usize {
        self.scheduler.current_index()
    }

    pub fn current_chunk(&self) -> Option<&Chunk> {
        self.chunks.get(self.scheduler.current_index())
    }

    pub fn wpm(&self) -> u32 {
        self.scheduler.wpm()
    }

    pub fn is_playing(&self) -> bool {
        self.scheduler.is_playing()
    }

    pub fn is_parsing(&self) -> bool {
        self.pending_parse.is_some()
    }

    pub fn scheduler(&self) -> &PlaybackScheduler<T> {
        &self.scheduler
    }

    pub fn stats(&self) -> ReaderStats {
        ReaderStats::compute(&self.chunks, self.scheduler.current_index(), self.scheduler.wpm())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            loaded: !self.chunks.is_empty(),
            current_chunk: self.current_chunk().cloned(),
            phase: self.scheduler.phase(),
            is_playing: self.scheduler.is_playing(),
            wpm: self.scheduler.wpm(),
            parsing: self.is_parsing(),
            stats: self.stats(),
        }
    }

    pub fn apply_command(&mut self, command: SessionCommand) -> SessionEvent {
        let action = command.action();
        let mut signal = None;
        match command {
            SessionCommand::GetSnapshot => {}
            SessionCommand::Play => {
                self.scheduler.play(&self.chunks);
            }
            SessionCommand::Pause => self.scheduler.pause(),
            SessionCommand::TogglePlayPause => {
                self.scheduler.toggle_play(&self.chunks);
            }
            SessionCommand::SkipForward => {
                self.scheduler.skip_forward(&self.chunks);
            }
            SessionCommand::SkipBackward => {
                self.scheduler.skip_backward(&self.chunks);
            }
            SessionCommand::Restart => self.scheduler.restart(),
            SessionCommand::Seek { index } => {
                self.scheduler.seek(index, &self.chunks);
            }
            SessionCommand::SetWpm { wpm } => {
                self.scheduler.set_wpm(wpm, &self.chunks);
            }
            SessionCommand::AdjustWpm { increase } => {
                self.scheduler.adjust_wpm(increase, &self.chunks);
            }
            SessionCommand::KeyPressed { key, focus } => {
                if let Some(shortcut) = self.bindings.resolve(&key, focus) {
                    self.run_shortcut(shortcut);
                }
            }
            SessionCommand::TimerFired { generation } => {
                let shown = self.scheduler.current_index();
                match self.scheduler.on_timer(generation, &self.chunks) {
                    TickOutcome::Stale => {}
                    TickOutcome::Advanced(_) => self.credit_shown(shown),
                    TickOutcome::Completed => {
                        self.credit_shown(shown);
                        info!(chunks = self.chunks.len(), "Reading complete");
                        signal = Some(SessionSignal::ReadingComplete);
                    }
                }
            }
            SessionCommand::Close => self.close(),
        }
        SessionEvent {
            action,
            snapshot: self.snapshot(),
            signal,
        }
    }

    fn run_shortcut(&mut self, shortcut: ShortcutAction) {
        debug!(?shortcut, "Keyboard shortcut");
        match shortcut {
            ShortcutAction::TogglePlayPause => {
                self.scheduler.toggle_play(&self.chunks);
            }
            ShortcutAction::SkipBackward => {
                self.scheduler.skip_backward(&self.chunks);
            }
            ShortcutAction::SkipForward => {
                self.scheduler.skip_forward(&self.chunks);
            }
            ShortcutAction::Restart => self.scheduler.restart(),
        }
    }

    /// Validate `text` and issue a new parse request. Any older in-flight
    /// request is cancelled. Nothing changes when validation fails.
    pub fn prepare_text(&mut self, text: &str) -> Result<ParseRequest, IngestError> {
        if text.trim().is_empty() {
            return Err(IngestError::EmptyText);
        }
        let found = count_words(text);
        if found < self.min_words {
            return Err(IngestError::TooFewWords {
                found,
                minimum: self.min_words,
            });
        }

        if let Some(previous) = self.pending_parse.take() {
            debug!(request_id = previous.id, "Cancelling superseded parse");
            previous.token.cancel();
        }
        self.parse_request_id += 1;
        let token = CancellationToken::new();
        self.pending_parse = Some(PendingParse {
            id: self.parse_request_id,
            text: text.to_string(),
            token: token.clone(),
        });
        info!(
            request_id = self.parse_request_id,
            words = found,
            "Queued text for chunking"
        );
        Ok(ParseRequest {
            id: self.parse_request_id,
            text: text.to_string(),
            token,
        })
    }

    /// Install parsed chunks if `request_id` is still the latest request.
    pub fn apply_parsed(&mut self, request_id: u64, chunks: Vec<Chunk>) -> bool {
        let is_current = self
            .pending_parse
            .as_ref()
            .is_some_and(|pending| pending.id == request_id && !pending.token.is_cancelled());
        if !is_current {
            info!(
                request_id,
                latest = self.parse_request_id,
                "Ignoring stale parse result"
            );
            return false;
        }
        let Some(pending) = self.pending_parse.take() else {
            return false;
        };

        self.scheduler.reset();
        self.chunks = chunks;
        self.words_shown = 0;
        self.source_text = pending.text;
        info!(
            request_id,
            chunks = self.chunks.len(),
            words = total_words(&self.chunks),
            "Loaded chunks"
        );
        true
    }

    /// Drop the in-flight request, if any; its result will be ignored.
    pub fn cancel_parse(&mut self) {
        if let Some(pending) = self.pending_parse.take() {
            pending.token.cancel();
        }
    }

    /// Validate, segment and install `text` in one step.
    pub async fn load_text<S: Segmenter>(
        &mut self,
        chunker: &Chunker<S>,
        text: &str,
    ) -> Result<bool, IngestError> {
        let request = self.prepare_text(text)?;
        match chunker
            .parse_with_cancel(&request.text, Some(&request.token))
            .await
        {
            Ok(chunks) => Ok(self.apply_parsed(request.id, chunks)),
            Err(err) => {
                debug!(request_id = request.id, "Parse abandoned: {err:#}");
                Ok(false)
            }
        }
    }

    /// Apply the recognition policy to `result` and queue its text.
    pub fn prepare_ocr(
        &mut self,
        result: &OcrResult,
    ) -> Result<(ParseRequest, Option<OcrWarning>), IngestError> {
        let assessment = ocr::assess(result, self.ocr_threshold)?;
        if let Some(warning) = &assessment.warning {
            warn!("{warning}");
        }
        let request = self.prepare_text(&assessment.text)?;
        Ok((request, assessment.warning))
    }

    /// Words whose full display time elapsed during playback since the last
    /// call. Skipped and sought-over chunks are not counted.
    pub fn take_words_shown(&mut self) -> usize {
        std::mem::take(&mut self.words_shown)
    }

    /// Recognize `request` with `engine`, apply the recognition policy, then
    /// segment and install the text. Recognizer failures become
    /// [`IngestError::Ocr`].
    pub async fn load_image<E, S>(
        &mut self,
        engine: &E,
        chunker: &Chunker<S>,
        request: OcrRequest,
        progress: &(dyn Fn(f32) + Send + Sync),
    ) -> Result<(bool, Option<OcrWarning>), IngestError>
    where
        E: OcrEngine,
        S: Segmenter,
    {
        let result = engine
            .recognize(request, progress)
            .await
            .map_err(|err| IngestError::Ocr(format!("{err:#}")))?;
        let (request, warning) = self.prepare_ocr(&result)?;
        match chunker
            .parse_with_cancel(&request.text, Some(&request.token))
            .await
        {
            Ok(chunks) => Ok((self.apply_parsed(request.id, chunks), warning)),
            Err(err) => {
                debug!(request_id = request.id, "Parse abandoned: {err:#}");
                Ok((false, warning))
            }
        }
    }

    fn credit_shown(&mut self, index: usize) {
        if let Some(chunk) = self.chunks.get(index) {
            self.words_shown += chunk.word_count();
        }
    }

    fn close(&mut self) {
        self.cancel_parse();
        self.scheduler.reset();
        self.chunks.clear();
        self.source_text.clear();
        self.words_shown = 0;
    }
}
