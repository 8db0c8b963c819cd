//! Streak and journal statistics.
//!
//! Dates are bucketed by UTC calendar day. A streak is the run of consecutive
//! days with at least one entry, ending today, or yesterday when today has no
//! entry yet (so the streak survives until the child writes today).

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;
use std::collections::HashSet;
use uuid::Uuid;

/// The two diary fields the statistics need.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct EntryMark {
    pub entry_date: DateTime<Utc>,
    pub emotion_id: Uuid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JournalStats {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_entries: u32,
    pub distinct_emotions: u32,
}

impl JournalStats {
    pub fn from_entries(entries: &[EntryMark], today: NaiveDate) -> Self {
        let days = unique_days_desc(entries.iter().map(|e| e.entry_date));
        let distinct_emotions = entries
            .iter()
            .map(|e| e.emotion_id)
            .collect::<HashSet<_>>()
            .len() as u32;

        Self {
            current_streak: current_streak_from_days(&days, today),
            longest_streak: longest_streak_from_days(&days),
            total_entries: entries.len() as u32,
            distinct_emotions,
        }
    }
}

/// UTC days with at least one entry, newest first, no duplicates.
fn unique_days_desc<I>(dates: I) -> Vec<NaiveDate>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let mut days: Vec<NaiveDate> = dates.into_iter().map(|d| d.date_naive()).collect();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();
    days
}

/// Current streak ending today or yesterday.
pub fn calculate_streak<I>(dates: I, today: NaiveDate) -> u32
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    current_streak_from_days(&unique_days_desc(dates), today)
}

fn current_streak_from_days(days: &[NaiveDate], today: NaiveDate) -> u32 {
    // Entries dated in the future don't count toward today's streak.
    let mut iter = days.iter().skip_while(|d| **d > today).peekable();

    let mut expected = match iter.peek() {
        Some(&&d) if d == today => today,
        Some(&&d) if d == today - Duration::days(1) => d,
        _ => return 0,
    };

    let mut streak = 0;
    for day in iter {
        if *day != expected {
            break;
        }
        streak += 1;
        expected -= Duration::days(1);
    }
    streak
}

fn longest_streak_from_days(days: &[NaiveDate]) -> u32 {
    let mut longest = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;

    // days are newest first, so a consecutive day is exactly one earlier
    for day in days {
        run = match prev {
            Some(p) if *day == p - Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(*day);
    }
    longest
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    fn at(days_ago: i64, hour: u32) -> DateTime<Utc> {
        let date = today() - Duration::days(days_ago);
        Utc.from_utc_datetime(&date.and_hms_opt(hour, 30, 0).unwrap())
    }

    fn dates(offsets: &[i64]) -> Vec<DateTime<Utc>> {
        offsets.iter().map(|d| at(*d, 12)).collect()
    }

    #[test]
    fn test_streak_empty() {
        assert_eq!(calculate_streak(Vec::new(), today()), 0);
    }

    #[test]
    fn test_gap_free_run_ending_today_counts_every_day() {
        for n in 1..=10 {
            let offsets: Vec<i64> = (0..n).collect();
            assert_eq!(calculate_streak(dates(&offsets), today()), n as u32);
        }
    }

    #[test]
    fn test_single_entry_yesterday_is_one() {
        assert_eq!(calculate_streak(dates(&[1]), today()), 1);
    }

    #[test]
    fn test_run_ending_yesterday_still_counts() {
        assert_eq!(calculate_streak(dates(&[1, 2, 3]), today()), 3);
    }

    #[test]
    fn test_nothing_today_or_yesterday_is_zero() {
        assert_eq!(calculate_streak(dates(&[2, 3, 4]), today()), 0);
    }

    #[test]
    fn test_gap_stops_the_walk() {
        assert_eq!(calculate_streak(dates(&[0, 1, 2]), today()), 3);
        // Adding an entry past a one-day hole changes nothing
        assert_eq!(calculate_streak(dates(&[0, 1, 2, 4]), today()), 3);
    }

    #[test]
    fn test_same_day_entries_count_once() {
        let entries = vec![at(0, 1), at(0, 9), at(0, 23), at(1, 8), at(1, 20)];
        assert_eq!(calculate_streak(entries, today()), 2);
    }

    #[test]
    fn test_order_does_not_matter() {
        assert_eq!(calculate_streak(dates(&[2, 0, 1]), today()), 3);
    }

    #[test]
    fn test_future_entries_are_ignored() {
        assert_eq!(calculate_streak(dates(&[-1, 0, 1]), today()), 2);
    }

    #[test]
    fn test_longest_streak_finds_older_run() {
        let days = unique_days_desc(dates(&[0, 5, 6, 7, 8, 20]));
        assert_eq!(longest_streak_from_days(&days), 4);
        assert_eq!(longest_streak_from_days(&[]), 0);
    }

    #[test]
    fn test_stats_from_entries() {
        let happy = Uuid::new_v4();
        let sad = Uuid::new_v4();
        let entries = vec![
            EntryMark { entry_date: at(0, 10), emotion_id: happy },
            EntryMark { entry_date: at(0, 18), emotion_id: sad },
            EntryMark { entry_date: at(1, 10), emotion_id: happy },
            EntryMark { entry_date: at(3, 10), emotion_id: happy },
        ];
        let stats = JournalStats::from_entries(&entries, today());
        assert_eq!(
            stats,
            JournalStats {
                current_streak: 2,
                longest_streak: 2,
                total_entries: 4,
                distinct_emotions: 2,
            }
        );
    }
}
