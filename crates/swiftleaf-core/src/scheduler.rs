//! Paced advancement through a chunk list.
//!
//! At most one advance is outstanding at any time. Each reschedule bumps a
//! generation counter, so a tick that raced with a pause, seek or speed change
//! is recognized as stale and dropped.

use crate::cancellation::CancellationToken;
use crate::chunk::Chunk;
use crate::config::AppConfig;
use crate::timer::Timer;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPhase {
    #[default]
    Idle,
    Playing,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Stale,
    Advanced(usize),
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSettings {
    pub wpm: u32,
    pub min_wpm: u32,
    pub max_wpm: u32,
    pub wpm_step: u32,
    pub skip_chunks: usize,
}

impl PlaybackSettings {
    /// Clamp to the configured range and snap to the nearest
    /// `min_wpm + k * wpm_step`.
    pub fn clamp_wpm(&self, wpm: u32) -> u32 {
        let max = self.max_wpm.max(self.min_wpm);
        let wpm = wpm.clamp(self.min_wpm, max);
        let step = self.wpm_step.max(1);
        let steps = (wpm - self.min_wpm + step / 2) / step;
        (self.min_wpm + steps * step).min(max)
    }
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for PlaybackSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            wpm: config.default_wpm,
            min_wpm: config.min_wpm,
            max_wpm: config.max_wpm,
            wpm_step: config.wpm_step,
            skip_chunks: config.skip_chunks,
        }
    }
}

/// Display time for a chunk: `60000 / wpm` ms per word.
pub fn chunk_delay(chunk_words: usize, wpm: u32) -> Duration {
    let micros = 60_000_000u64 * chunk_words.max(1) as u64 / u64::from(wpm.max(1));
    Duration::from_micros(micros)
}

pub struct PlaybackScheduler<T> {
    timer: T,
    settings: PlaybackSettings,
    phase: PlaybackPhase,
    current_index: usize,
    wpm: u32,
    generation: u64,
    pending: Option<CancellationToken>,
}

impl<T: Timer> PlaybackScheduler<T> {
    pub fn new(timer: T, settings: PlaybackSettings) -> Self {
        let wpm = settings.clamp_wpm(settings.wpm);
        Self {
            timer,
            settings,
            phase: PlaybackPhase::Idle,
            current_index: 0,
            wpm,
            generation: 0,
            pending: None,
        }
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == PlaybackPhase::Playing
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn wpm(&self) -> u32 {
        self.wpm
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    pub fn has_pending_advance(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    /// Start or resume. Rejected when there is nothing to show.
    pub fn play(&mut self, chunks: &[Chunk]) -> bool {
        if chunks.is_empty() {
            debug!("Ignoring play request without chunks");
            return false;
        }
        if self.is_playing() {
            return true;
        }
        self.current_index = self.current_index.min(chunks.len() - 1);
        self.phase = PlaybackPhase::Playing;
        self.schedule_current(chunks);
        debug!(index = self.current_index, wpm = self.wpm, "Playback started");
        true
    }

    pub fn pause(&mut self) {
        if !self.is_playing() {
            return;
        }
        self.cancel_pending();
        self.phase = PlaybackPhase::Idle;
        debug!(index = self.current_index, "Playback paused");
    }

    /// Returns whether playback is running afterwards.
    pub fn toggle_play(&mut self, chunks: &[Chunk]) -> bool {
        if self.is_playing() {
            self.pause();
            false
        } else {
            self.play(chunks)
        }
    }

    pub fn skip_forward(&mut self, chunks: &[Chunk]) -> usize {
        let Some(last) = chunks.len().checked_sub(1) else {
            return self.current_index;
        };
        let target = self
            .current_index
            .saturating_add(self.settings.skip_chunks)
            .min(last);
        self.move_to(target, chunks)
    }

    pub fn skip_backward(&mut self, chunks: &[Chunk]) -> usize {
        if chunks.is_empty() {
            return self.current_index;
        }
        let target = self.current_index.saturating_sub(self.settings.skip_chunks);
        self.move_to(target, chunks)
    }

    pub fn restart(&mut self) {
        self.cancel_pending();
        self.current_index = 0;
        self.phase = PlaybackPhase::Idle;
    }

    /// Jump to `index` (clamped) and stop. Returns the applied index.
    pub fn seek(&mut self, index: usize, chunks: &[Chunk]) -> usize {
        self.cancel_pending();
        self.current_index = index.min(chunks.len().saturating_sub(1));
        self.phase = PlaybackPhase::Idle;
        self.current_index
    }

    pub fn set_wpm(&mut self, wpm: u32, chunks: &[Chunk]) -> u32 {
        let wpm = self.settings.clamp_wpm(wpm);
        if wpm == self.wpm {
            return wpm;
        }
        self.wpm = wpm;
        if self.is_playing() {
            self.schedule_current(chunks);
        }
        wpm
    }

    pub fn adjust_wpm(&mut self, increase: bool, chunks: &[Chunk]) -> u32 {
        let step = self.settings.wpm_step;
        let target = if increase {
            self.wpm.saturating_add(step)
        } else {
            self.wpm.saturating_sub(step)
        };
        self.set_wpm(target, chunks)
    }

    pub fn on_timer(&mut self, generation: u64, chunks: &[Chunk]) -> TickOutcome {
        if !self.is_playing() || generation != self.generation {
            debug!(
                generation,
                current = self.generation,
                "Ignoring stale chunk advance"
            );
            return TickOutcome::Stale;
        }
        self.pending = None;

        if self.current_index + 1 < chunks.len() {
            self.current_index += 1;
            self.schedule_current(chunks);
            TickOutcome::Advanced(self.current_index)
        } else {
            self.phase = PlaybackPhase::Completed;
            debug!(index = self.current_index, "Reached end of chunks");
            TickOutcome::Completed
        }
    }

    /// Forget position and stop; used when the chunk list is replaced.
    pub fn reset(&mut self) {
        self.cancel_pending();
        self.current_index = 0;
        self.phase = PlaybackPhase::Idle;
    }

    fn move_to(&mut self, target: usize, chunks: &[Chunk]) -> usize {
        if target == self.current_index {
            return target;
        }
        self.current_index = target;
        match self.phase {
            PlaybackPhase::Playing => self.schedule_current(chunks),
            PlaybackPhase::Completed => self.phase = PlaybackPhase::Idle,
            PlaybackPhase::Idle => {}
        }
        target
    }

    fn schedule_current(&mut self, chunks: &[Chunk]) {
        self.cancel_pending();
        let Some(chunk) = chunks.get(self.current_index) else {
            self.phase = PlaybackPhase::Idle;
            return;
        };
        self.generation += 1;
        let delay = chunk_delay(chunk.word_count(), self.wpm);
        self.pending = Some(self.timer.schedule(delay, self.generation));
    }

    fn cancel_pending(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}
