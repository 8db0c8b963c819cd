use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::models::emotion::Emotion;
use crate::services::streak::{calculate_streak, EntryMark};

#[derive(Debug, Serialize)]
pub struct EmotionCount {
    pub emotion_id: Uuid,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub count: u32,
    pub share: f64,
}

#[derive(Debug, Serialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: u32,
}

#[derive(Debug, Serialize)]
pub struct EmotionReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_entries: u32,
    pub current_streak: u32,
    pub most_frequent: Option<String>,
    pub emotions: Vec<EmotionCount>,
    pub days: Vec<DayCount>,
}

/// Summarise `entries` falling in `[start, end]`. The streak always looks at
/// the whole history, so pass every entry, not a pre-filtered window.
pub fn build_report(
    emotions: &[Emotion],
    entries: &[EntryMark],
    start: NaiveDate,
    end: NaiveDate,
) -> EmotionReport {
    let in_window: Vec<&EntryMark> = entries
        .iter()
        .filter(|e| {
            let day = e.entry_date.date_naive();
            day >= start && day <= end
        })
        .collect();
    let total = in_window.len() as u32;

    let mut per_emotion: HashMap<Uuid, u32> = HashMap::new();
    let mut per_day: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for entry in &in_window {
        *per_emotion.entry(entry.emotion_id).or_default() += 1;
        *per_day.entry(entry.entry_date.date_naive()).or_default() += 1;
    }

    let mut counts: Vec<EmotionCount> = emotions
        .iter()
        .filter_map(|emotion| {
            let count = per_emotion.get(&emotion.id).copied()?;
            Some(EmotionCount {
                emotion_id: emotion.id,
                name: emotion.name.clone(),
                icon: emotion.icon.clone(),
                color: emotion.color.clone(),
                count,
                share: if total > 0 { count as f64 / total as f64 } else { 0.0 },
            })
        })
        .collect();
    // Most frequent first; ties broken by name so the order is stable
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

    EmotionReport {
        start_date: start,
        end_date: end,
        total_entries: total,
        current_streak: calculate_streak(entries.iter().map(|e| e.entry_date), end),
        most_frequent: counts.first().map(|c| c.name.clone()),
        emotions: counts,
        days: per_day
            .into_iter()
            .map(|(date, count)| DayCount { date, count })
            .collect(),
    }
}
