use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Emotion {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub description: String,
    pub is_custom: bool,
    pub created_at: DateTime<Utc>,
}

/// Built-in feeling seeded for every new account.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinEmotion {
    pub name: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub description: &'static str,
}

pub const BUILTIN_EMOTIONS: &[BuiltinEmotion] = &[
    BuiltinEmotion {
        name: "Happy",
        icon: "😊",
        color: "#facc15",
        description: "Feeling good and cheerful, like the sun is shining inside you.",
    },
    BuiltinEmotion {
        name: "Sad",
        icon: "😢",
        color: "#60a5fa",
        description: "Feeling down or like you want to cry. It's okay to feel sad sometimes.",
    },
    BuiltinEmotion {
        name: "Angry",
        icon: "😠",
        color: "#ef4444",
        description: "Feeling hot and upset when something seems unfair.",
    },
    BuiltinEmotion {
        name: "Scared",
        icon: "😨",
        color: "#a855f7",
        description: "Feeling afraid that something bad might happen.",
    },
    BuiltinEmotion {
        name: "Calm",
        icon: "😌",
        color: "#34d399",
        description: "Feeling peaceful and relaxed, like a quiet lake.",
    },
    BuiltinEmotion {
        name: "Excited",
        icon: "🤩",
        color: "#fb923c",
        description: "Feeling full of energy because something fun is coming.",
    },
    BuiltinEmotion {
        name: "Worried",
        icon: "😟",
        color: "#94a3b8",
        description: "Thinking a lot about something that might go wrong.",
    },
    BuiltinEmotion {
        name: "Proud",
        icon: "🥳",
        color: "#f472b6",
        description: "Feeling great about something you did or learned.",
    },
];

pub const DEFAULT_CUSTOM_ICON: &str = "💭";
pub const DEFAULT_CUSTOM_COLOR: &str = "#a78bfa";
