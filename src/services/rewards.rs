use serde::Serialize;
use std::collections::BTreeSet;

use crate::models::reward::{Reward, RewardRule};
use crate::services::streak::JournalStats;

/// Externally triggered milestones recorded on the profile.
#[derive(Debug, Clone, Default)]
pub struct RewardTriggers {
    pub has_shared: bool,
    pub special_flags: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnlockOutcome {
    /// Previously unlocked ids plus everything newly earned.
    pub unlocked: BTreeSet<String>,
    /// Every id earned by this evaluation, in catalog order.
    pub newly_unlocked_ids: Vec<String>,
    /// The one reward to celebrate, if any.
    pub newly_unlocked: Option<Reward>,
}

pub fn rule_satisfied(rule: &RewardRule, stats: &JournalStats, triggers: &RewardTriggers) -> bool {
    match rule {
        RewardRule::Streak(n) => stats.current_streak >= *n,
        RewardRule::Entries(n) => stats.total_entries >= *n,
        RewardRule::Emotions(n) => stats.distinct_emotions >= *n,
        RewardRule::Share => triggers.has_shared,
        RewardRule::Special(flag) => triggers.special_flags.contains(*flag),
    }
}

/// Evaluate every locked catalog reward. Never removes an unlocked id.
pub fn evaluate_rewards<'a, I>(
    already_unlocked: I,
    stats: &JournalStats,
    triggers: &RewardTriggers,
    catalog: &[Reward],
) -> UnlockOutcome
where
    I: IntoIterator<Item = &'a String>,
{
    let mut unlocked: BTreeSet<String> = already_unlocked.into_iter().cloned().collect();
    let mut newly_unlocked_ids = Vec::new();
    let mut newly_unlocked = None;

    for reward in catalog {
        if unlocked.contains(reward.id) {
            continue;
        }
        if rule_satisfied(&reward.rule, stats, triggers) {
            unlocked.insert(reward.id.to_string());
            newly_unlocked_ids.push(reward.id.to_string());
            if newly_unlocked.is_none() {
                newly_unlocked = Some(*reward);
            }
        }
    }

    UnlockOutcome {
        unlocked,
        newly_unlocked_ids,
        newly_unlocked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::reward::REWARDS;

    fn stats(streak: u32, entries: u32, emotions: u32) -> JournalStats {
        JournalStats {
            current_streak: streak,
            longest_streak: streak,
            total_entries: entries,
            distinct_emotions: emotions,
        }
    }

    #[test]
    fn test_nothing_unlocks_for_empty_journal() {
        let out = evaluate_rewards(&Vec::new(), &stats(0, 0, 0), &RewardTriggers::default(), REWARDS);
        assert!(out.unlocked.is_empty());
        assert!(out.newly_unlocked.is_none());
    }

    #[test]
    fn test_first_entry_unlocks_bunny() {
        let out = evaluate_rewards(&Vec::new(), &stats(1, 1, 1), &RewardTriggers::default(), REWARDS);
        assert_eq!(out.newly_unlocked.map(|r| r.id), Some("sprout-bunny"));
        assert_eq!(out.newly_unlocked_ids, vec!["sprout-bunny".to_string()]);
    }

    #[test]
    fn test_only_first_new_reward_is_displayed() {
        let out = evaluate_rewards(&Vec::new(), &stats(7, 10, 5), &RewardTriggers::default(), REWARDS);
        assert_eq!(out.newly_unlocked.map(|r| r.id), Some("sprout-bunny"));
        assert!(out.unlocked.contains("brave-lion"));
        assert!(out.unlocked.contains("wise-owl"));
        assert!(out.unlocked.contains("curious-cat"));
        assert_eq!(out.newly_unlocked_ids.len(), out.unlocked.len());
    }

    #[test]
    fn test_evaluation_is_monotonic() {
        let before = vec!["brave-lion".to_string(), "retired-reward".to_string()];
        // Streak dropped back to zero: nothing may be taken away
        let out = evaluate_rewards(&before, &stats(0, 1, 1), &RewardTriggers::default(), REWARDS);
        assert!(out.unlocked.contains("brave-lion"));
        assert!(out.unlocked.contains("retired-reward"));
        assert!(out.unlocked.contains("sprout-bunny"));
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let s = stats(3, 4, 2);
        let first = evaluate_rewards(&Vec::new(), &s, &RewardTriggers::default(), REWARDS);
        let ids: Vec<String> = first.unlocked.iter().cloned().collect();
        let second = evaluate_rewards(&ids, &s, &RewardTriggers::default(), REWARDS);
        assert_eq!(first.unlocked, second.unlocked);
        assert!(second.newly_unlocked.is_none());
        assert!(second.newly_unlocked_ids.is_empty());
    }

    #[test]
    fn test_growing_inputs_never_shrink_the_set() {
        let mut unlocked: Vec<String> = Vec::new();
        let mut previous = 0;
        for n in 0..40 {
            let out = evaluate_rewards(&unlocked, &stats(n, n * 2, n.min(8)), &RewardTriggers::default(), REWARDS);
            assert!(out.unlocked.len() >= previous);
            previous = out.unlocked.len();
            unlocked = out.unlocked.into_iter().collect();
        }
    }

    #[test]
    fn test_share_and_special_triggers() {
        let mut triggers = RewardTriggers {
            has_shared: true,
            ..Default::default()
        };
        let out = evaluate_rewards(&Vec::new(), &stats(0, 0, 0), &triggers, REWARDS);
        assert_eq!(out.newly_unlocked.map(|r| r.id), Some("friendly-dolphin"));
        assert!(!out.unlocked.contains("bubble-panda"));

        triggers.special_flags.insert("game:breathing-bubbles".into());
        let out = evaluate_rewards(&Vec::new(), &stats(0, 0, 0), &triggers, REWARDS);
        assert!(out.unlocked.contains("bubble-panda"));
    }
}
