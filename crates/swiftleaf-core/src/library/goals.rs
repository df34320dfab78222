use super::store::{GOAL_KEY, KeyValueStore, Repository};
use anyhow::Result;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_DAILY_WORD_TARGET: u64 = 1000;
pub const MIN_DAILY_WORD_TARGET: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GoalError {
    #[error("daily target must be at least {minimum} words (got {requested})")]
    TargetTooLow { requested: u64, minimum: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingGoal {
    pub daily_word_target: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_read_day: Option<Date>,
    pub words_read_today: u64,
    pub total_words_read: u64,
}

impl Default for ReadingGoal {
    fn default() -> Self {
        Self {
            daily_word_target: DEFAULT_DAILY_WORD_TARGET,
            current_streak: 0,
            longest_streak: 0,
            last_read_day: None,
            words_read_today: 0,
            total_words_read: 0,
        }
    }
}

impl ReadingGoal {
    pub fn set_daily_target(&mut self, target: u64) -> Result<(), GoalError> {
        if target < MIN_DAILY_WORD_TARGET {
            return Err(GoalError::TargetTooLow {
                requested: target,
                minimum: MIN_DAILY_WORD_TARGET,
            });
        }
        self.daily_word_target = target;
        Ok(())
    }

    /// Credit `words` to `today`, rolling the daily counter and streak.
    pub fn record_words(&mut self, words: u64, today: Date) {
        if words == 0 {
            return;
        }
        match self.last_read_day {
            Some(last) if today <= last => {
                self.words_read_today += words;
            }
            Some(last) if is_day_after(last, today) => {
                self.current_streak += 1;
                self.words_read_today = words;
                self.last_read_day = Some(today);
            }
            _ => {
                self.current_streak = 1;
                self.words_read_today = words;
                self.last_read_day = Some(today);
            }
        }
        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.total_words_read += words;
    }

    /// Words read today as seen on `today`; 0 once the day has passed.
    pub fn words_on(&self, today: Date) -> u64 {
        if self.last_read_day == Some(today) {
            self.words_read_today
        } else {
            0
        }
    }

    pub fn progress_percent(&self, today: Date) -> f64 {
        let target = self.daily_word_target.max(1) as f64;
        (self.words_on(today) as f64 / target * 100.0).min(100.0)
    }

    pub fn is_reached(&self, today: Date) -> bool {
        self.words_on(today) >= self.daily_word_target
    }

    /// The running streak as seen on `today`; 0 once a whole day was missed.
    pub fn streak_on(&self, today: Date) -> u32 {
        match self.last_read_day {
            Some(last) if last >= today || is_day_after(last, today) => self.current_streak,
            _ => 0,
        }
    }
}

fn is_day_after(day: Date, next: Date) -> bool {
    day.tomorrow().is_ok_and(|tomorrow| tomorrow == next)
}

pub struct GoalTracker<K> {
    repo: Repository<K>,
}

impl<K: KeyValueStore> GoalTracker<K> {
    pub fn new(repo: Repository<K>) -> Self {
        Self { repo }
    }

    pub fn load(&self) -> Result<ReadingGoal> {
        self.repo.get(GOAL_KEY, ReadingGoal::default())
    }

    /// Invalid targets are rejected before anything is written.
    pub fn set_daily_target(&self, target: u64) -> Result<ReadingGoal> {
        ReadingGoal::default().set_daily_target(target)?;
        self.repo.update(GOAL_KEY, ReadingGoal::default(), |goal| {
            goal.daily_word_target = target;
            goal.clone()
        })
    }

    pub fn record_words(&self, words: u64, today: Date) -> Result<ReadingGoal> {
        let goal = self.repo.update(GOAL_KEY, ReadingGoal::default(), |goal| {
            goal.record_words(words, today);
            goal.clone()
        })?;
        info!(
            words,
            today_total = goal.words_read_today,
            streak = goal.current_streak,
            "Recorded reading progress"
        );
        Ok(goal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::store::MemoryStore;
    use jiff::civil::date;

    #[test]
    fn streak_grows_on_consecutive_days_and_resets_after_gap() {
        let mut goal = ReadingGoal::default();
        goal.record_words(300, date(2024, 2, 28));
        goal.record_words(200, date(2024, 2, 28));
        assert_eq!(goal.current_streak, 1);
        assert_eq!(goal.words_read_today, 500);

        goal.record_words(50, date(2024, 2, 29));
        goal.record_words(50, date(2024, 3, 1));
        assert_eq!(goal.current_streak, 3);
        assert_eq!(goal.words_read_today, 50);

        goal.record_words(10, date(2024, 3, 9));
        assert_eq!(goal.current_streak, 1);
        assert_eq!(goal.longest_streak, 3);
        assert_eq!(goal.total_words_read, 610);
    }

    #[test]
    fn progress_is_capped_and_reached_flag_follows_target() {
        let day = date(2024, 5, 1);
        let mut goal = ReadingGoal::default();
        goal.record_words(500, day);
        assert_eq!(goal.progress_percent(day), 50.0);
        assert!(!goal.is_reached(day));

        goal.record_words(900, day);
        assert_eq!(goal.progress_percent(day), 100.0);
        assert!(goal.is_reached(day));
        assert_eq!(goal.words_on(day), 1400);
    }

    #[test]
    fn day_rollover_resets_progress_and_breaks_streak_after_gap() {
        let mut goal = ReadingGoal::default();
        goal.record_words(850, date(2024, 5, 1));
        goal.record_words(900, date(2024, 5, 2));

        let next = date(2024, 5, 3);
        assert_eq!(goal.words_on(next), 0);
        assert_eq!(goal.progress_percent(next), 0.0);
        assert!(!goal.is_reached(next));
        assert_eq!(goal.streak_on(next), 2);

        assert_eq!(goal.streak_on(date(2024, 5, 4)), 0);
        assert_eq!(goal.current_streak, 2);
    }

    #[test]
    fn rejects_targets_below_minimum() {
        let mut goal = ReadingGoal::default();
        assert_eq!(
            goal.set_daily_target(99),
            Err(GoalError::TargetTooLow {
                requested: 99,
                minimum: 100
            })
        );
        assert_eq!(goal.daily_word_target, 1000);
        assert!(goal.set_daily_target(100).is_ok());
    }

    #[test]
    fn tracker_persists_goal() {
        let day = date(2024, 7, 7);
        let tracker = GoalTracker::new(Repository::new(MemoryStore::new()));
        assert!(tracker.set_daily_target(20).is_err());
        assert_eq!(tracker.load().unwrap(), ReadingGoal::default());

        tracker.set_daily_target(250).unwrap();
        tracker.record_words(300, day).unwrap();

        let goal = tracker.load().unwrap();
        assert_eq!(goal.daily_word_target, 250);
        assert!(goal.is_reached(day));
        assert_eq!(goal.last_read_day, Some(day));
    }
}
