use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::services::streak::JournalStats;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub name: String,
    pub avatar: String,
    pub avatar_kind: AvatarKind,
    pub points: i64,
    pub unlocked_rewards: Vec<String>,
    pub purchased_items: Vec<String>,
    pub equipped_frame: Option<String>,
    pub equipped_background: Option<String>,
    pub equipped_theme: Option<String>,
    pub has_shared: bool,
    pub special_flags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "avatar_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AvatarKind {
    Emoji,
    Generated,
}

impl Default for AvatarKind {
    fn default() -> Self {
        Self::Emoji
    }
}

pub const DEFAULT_NAME: &str = "Friend";
pub const DEFAULT_AVATAR: &str = "🐣";

/// Profile as the client sees it: stored fields plus streak-derived ones.
#[derive(Debug, Serialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub profile: Profile,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_entries: u32,
    pub distinct_emotions: u32,
}

impl ProfileView {
    pub fn new(profile: Profile, stats: &JournalStats) -> Self {
        Self {
            profile,
            current_streak: stats.current_streak,
            longest_streak: stats.longest_streak,
            total_entries: stats.total_entries,
            distinct_emotions: stats.distinct_emotions,
        }
    }
}
