use serde::Serialize;

/// Milestone a spirit animal is tied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RewardRule {
    /// Current streak of at least this many days.
    Streak(u32),
    /// At least this many diary entries.
    Entries(u32),
    /// At least this many different emotions written about.
    Emotions(u32),
    /// Shared progress at least once.
    Share,
    /// A special flag set by a game or event.
    Special(&'static str),
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Reward {
    pub id: &'static str,
    pub name: &'static str,
    pub animal: &'static str,
    pub description: &'static str,
    pub rule: RewardRule,
}

pub const REWARDS: &[Reward] = &[
    Reward {
        id: "sprout-bunny",
        name: "Sprout the Bunny",
        animal: "🐰",
        description: "Wrote your very first diary entry.",
        rule: RewardRule::Entries(1),
    },
    Reward {
        id: "steady-turtle",
        name: "Steady the Turtle",
        animal: "🐢",
        description: "Wrote in your diary 3 days in a row.",
        rule: RewardRule::Streak(3),
    },
    Reward {
        id: "curious-cat",
        name: "Curious the Cat",
        animal: "🐱",
        description: "Wrote about 5 different feelings.",
        rule: RewardRule::Emotions(5),
    },
    Reward {
        id: "brave-lion",
        name: "Brave the Lion",
        animal: "🦁",
        description: "Kept a 7 day streak.",
        rule: RewardRule::Streak(7),
    },
    Reward {
        id: "wise-owl",
        name: "Wise the Owl",
        animal: "🦉",
        description: "Wrote 10 diary entries.",
        rule: RewardRule::Entries(10),
    },
    Reward {
        id: "friendly-dolphin",
        name: "Friendly the Dolphin",
        animal: "🐬",
        description: "Shared your progress with someone you trust.",
        rule: RewardRule::Share,
    },
    Reward {
        id: "bubble-panda",
        name: "Bubble the Panda",
        animal: "🐼",
        description: "Finished the breathing bubbles game.",
        rule: RewardRule::Special("game:breathing-bubbles"),
    },
    Reward {
        id: "rainbow-chameleon",
        name: "Rainbow the Chameleon",
        animal: "🦎",
        description: "Wrote about 8 different feelings.",
        rule: RewardRule::Emotions(8),
    },
    Reward {
        id: "memory-elephant",
        name: "Memory the Elephant",
        animal: "🐘",
        description: "Wrote 50 diary entries.",
        rule: RewardRule::Entries(50),
    },
    Reward {
        id: "fire-phoenix",
        name: "Blaze the Phoenix",
        animal: "🐦‍🔥",
        description: "Kept a 30 day streak.",
        rule: RewardRule::Streak(30),
    },
];

pub fn find_reward(id: &str) -> Option<&'static Reward> {
    REWARDS.iter().find(|r| r.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_reward_ids_are_unique() {
        let ids: HashSet<_> = REWARDS.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), REWARDS.len());
    }

    #[test]
    fn test_rule_serializes_tagged() {
        let json = serde_json::to_value(RewardRule::Streak(7)).unwrap();
        assert_eq!(json["type"], "streak");
        assert_eq!(json["value"], 7);

        let json = serde_json::to_value(RewardRule::Share).unwrap();
        assert_eq!(json["type"], "share");
    }
}
