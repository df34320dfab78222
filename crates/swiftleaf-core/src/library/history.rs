use super::store::{HISTORY_KEY, KeyValueStore, Repository};
use anyhow::Result;
use jiff::ToSpan;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};

pub const CALENDAR_DAYS: i64 = 42;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub day: Date,
    pub words_read: u64,
    pub documents_read: u32,
    pub avg_wpm: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDay {
    pub day: Date,
    pub entry: Option<HistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    pub total_words: u64,
    pub total_documents: u32,
    pub avg_wpm: u32,
}

/// Heat bucket for a day's word count: 0 for nothing, up to 4.
pub fn intensity(words: u64) -> u8 {
    match words {
        0 => 0,
        1..500 => 1,
        500..1000 => 2,
        1000..2000 => 3,
        _ => 4,
    }
}

pub struct ReadingHistory<K> {
    repo: Repository<K>,
}

impl<K: KeyValueStore> ReadingHistory<K> {
    pub fn new(repo: Repository<K>) -> Self {
        Self { repo }
    }

    pub fn entries(&self) -> Result<Vec<HistoryEntry>> {
        self.repo.get(HISTORY_KEY, Vec::new())
    }

    /// Merge a finished reading into the entry for `day`. The day's average
    /// speed is weighted by words read.
    pub fn record(&self, day: Date, words: u64, wpm: u32, new_document: bool) -> Result<HistoryEntry> {
        self.repo
            .update(HISTORY_KEY, Vec::<HistoryEntry>::new(), |entries| {
                let documents = u32::from(new_document);
                if let Some(entry) = entries.iter_mut().find(|entry| entry.day == day) {
                    let combined = entry.words_read + words;
                    if combined > 0 {
                        entry.avg_wpm = (entry.avg_wpm * entry.words_read as f64
                            + f64::from(wpm) * words as f64)
                            / combined as f64;
                    }
                    entry.words_read = combined;
                    entry.documents_read += documents;
                    return entry.clone();
                }
                let entry = HistoryEntry {
                    day,
                    words_read: words,
                    documents_read: documents,
                    avg_wpm: f64::from(wpm),
                };
                entries.push(entry.clone());
                entries.sort_by_key(|entry| entry.day);
                entry
            })
    }

    /// The `days` days ending at `today`, oldest first.
    pub fn calendar(&self, today: Date, days: i64) -> Result<Vec<CalendarDay>> {
        let entries = self.entries()?;
        Ok((0..days.max(1))
            .rev()
            .filter_map(|back| today.checked_sub(back.days()).ok())
            .map(|day| CalendarDay {
                day,
                entry: entries.iter().find(|entry| entry.day == day).cloned(),
            })
            .collect())
    }

    pub fn summary(&self) -> Result<HistorySummary> {
        let entries = self.entries()?;
        let avg_wpm = if entries.is_empty() {
            0
        } else {
            (entries.iter().map(|entry| entry.avg_wpm).sum::<f64>() / entries.len() as f64).round()
                as u32
        };
        Ok(HistorySummary {
            total_words: entries.iter().map(|entry| entry.words_read).sum(),
            total_documents: entries.iter().map(|entry| entry.documents_read).sum(),
            avg_wpm,
        })
    }

    /// Newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let mut entries = self.entries()?;
        entries.sort_by(|a, b| b.day.cmp(&a.day));
        entries.truncate(limit);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::store::MemoryStore;
    use jiff::civil::date;

    fn history() -> ReadingHistory<MemoryStore> {
        ReadingHistory::new(Repository::new(MemoryStore::new()))
    }

    #[test]
    fn same_day_records_merge_with_weighted_speed() {
        let history = history();
        let day = date(2024, 6, 1);
        history.record(day, 300, 300, true).unwrap();
        let merged = history.record(day, 100, 700, false).unwrap();

        assert_eq!(merged.words_read, 400);
        assert_eq!(merged.documents_read, 1);
        assert!((merged.avg_wpm - 400.0).abs() < 1e-9);
        assert_eq!(history.entries().unwrap().len(), 1);
    }

    #[test]
    fn calendar_spans_window_ending_today() {
        let history = history();
        let today = date(2024, 3, 10);
        history.record(today, 800, 500, true).unwrap();
        history.record(date(2024, 1, 28), 50, 500, true).unwrap();

        let calendar = history.calendar(today, CALENDAR_DAYS).unwrap();

        assert_eq!(calendar.len(), 42);
        assert_eq!(calendar[0].day, date(2024, 1, 29));
        assert_eq!(calendar[31].day, date(2024, 2, 29));
        assert_eq!(calendar[41].day, today);
        assert!(calendar[41].entry.is_some());
        assert!(calendar.iter().take(41).all(|day| day.entry.is_none()));
    }

    #[test]
    fn intensity_buckets() {
        assert_eq!(intensity(0), 0);
        assert_eq!(intensity(499), 1);
        assert_eq!(intensity(500), 2);
        assert_eq!(intensity(1999), 3);
        assert_eq!(intensity(2000), 4);
    }

    #[test]
    fn summary_and_recent() {
        let history = history();
        assert_eq!(
            history.summary().unwrap(),
            HistorySummary {
                total_words: 0,
                total_documents: 0,
                avg_wpm: 0
            }
        );

        history.record(date(2024, 4, 3), 1000, 400, true).unwrap();
        history.record(date(2024, 4, 1), 500, 500, true).unwrap();
        history.record(date(2024, 4, 2), 200, 601, false).unwrap();

        let summary = history.summary().unwrap();
        assert_eq!(summary.total_words, 1700);
        assert_eq!(summary.total_documents, 2);
        assert_eq!(summary.avg_wpm, 500);

        let days: Vec<Date> = history.recent(2).unwrap().iter().map(|e| e.day).collect();
        assert_eq!(days, vec![date(2024, 4, 3), date(2024, 4, 2)]);
    }

    #[test]
    fn entries_survive_the_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let history = ReadingHistory::new(Repository::new(crate::library::FileStore::new(dir.path())));
        history.record(date(2024, 12, 31), 120, 450, true).unwrap();

        let reopened = ReadingHistory::new(Repository::new(crate::library::FileStore::new(dir.path())));
        assert_eq!(reopened.entries().unwrap()[0].day, date(2024, 12, 31));
    }
}
