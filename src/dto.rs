//! # Heartnote: Request/Response DTOs
//!
//! Conventions:
//! - `*Request`  → deserialized from client JSON body or query params
//! - `*Response` / `*View` → serialized to client JSON
//! - Field limits are expressed via `validator` derive macros

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::diary_entry::DiaryEntry;
use crate::models::game::Game;
use crate::models::reward::Reward;
use crate::models::shop::{ShopItem, ShopItemKind};
use crate::services::genai::ChatTurn;
use crate::services::streak::JournalStats;

// ============================================================================
// Common
// ============================================================================

/// Standard delete confirmation
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub id: Uuid,
}

/// `#rgb` or `#rrggbb`.
pub fn validate_color(color: Option<&str>) -> AppResult<()> {
    let Some(color) = color else { return Ok(()) };
    let hex = color.strip_prefix('#').unwrap_or("");
    if (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(AppError::Validation("Color must look like #a1b2c3".into()))
    }
}

// ============================================================================
// Auth
// ============================================================================

/// POST /api/auth/anonymous
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user_id: Uuid,
}

/// POST /api/auth/refresh
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

// ============================================================================
// Profile
// ============================================================================

/// PUT /api/profile: merge write, absent fields are left alone
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 40, message = "Name must be 1-40 characters"))]
    pub name: Option<String>,

    /// Emoji avatar. Replaces a generated one.
    #[validate(length(min = 1, max = 16, message = "Pick one emoji"))]
    pub avatar_emoji: Option<String>,
}

/// POST /api/profile/avatar
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateAvatarRequest {
    #[validate(length(min = 3, max = 200, message = "Describe your avatar in 3-200 characters"))]
    pub description: String,
}

// ============================================================================
// Emotions
// ============================================================================

/// POST /api/emotions: custom emotion, checked by the AI before saving
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEmotionRequest {
    #[validate(length(min = 1, max = 30, message = "Feeling name must be 1-30 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 16))]
    pub icon: Option<String>,

    pub color: Option<String>,
}

/// PUT /api/emotions/{id}
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEmotionRequest {
    #[validate(length(min = 1, max = 30, message = "Feeling name must be 1-30 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 16))]
    pub icon: Option<String>,

    pub color: Option<String>,

    #[validate(length(max = 500, message = "Description must be under 500 characters"))]
    pub description: Option<String>,
}

/// DELETE /api/emotions/{id}
#[derive(Debug, Serialize)]
pub struct DeleteEmotionResponse {
    pub deleted: bool,
    pub id: Uuid,
    pub deleted_entries: u64,
}

// ============================================================================
// Diary
// ============================================================================

/// POST /api/diary
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDiaryEntryRequest {
    pub emotion_id: Uuid,

    /// Defaults to now
    pub entry_date: Option<DateTime<Utc>>,

    #[validate(length(max = 5000, message = "Reflection must be under 5000 characters"))]
    #[serde(default)]
    pub reflection: String,
}

/// PUT /api/diary/{id}
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDiaryEntryRequest {
    pub emotion_id: Option<Uuid>,
    pub entry_date: Option<DateTime<Utc>>,

    #[validate(length(max = 5000, message = "Reflection must be under 5000 characters"))]
    pub reflection: Option<String>,
}

/// GET /api/diary query
#[derive(Debug, Deserialize)]
pub struct DiaryQuery {
    pub emotion_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct DiaryEntryCreatedResponse {
    pub entry: DiaryEntry,
    pub points_awarded: i64,
    pub newly_unlocked: Option<Reward>,
}

// ============================================================================
// Streak & rewards
// ============================================================================

#[derive(Debug, Serialize)]
pub struct RewardView {
    #[serde(flatten)]
    pub reward: Reward,
    pub unlocked: bool,
}

/// GET /api/rewards
#[derive(Debug, Serialize)]
pub struct RewardsResponse {
    pub rewards: Vec<RewardView>,
    pub unlocked_count: usize,
    pub stats: JournalStats,
}

/// POST /api/rewards/evaluate
#[derive(Debug, Serialize)]
pub struct EvaluateRewardsResponse {
    pub unlocked: Vec<String>,
    pub newly_unlocked: Option<Reward>,
}

// ============================================================================
// Shop
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ShopItemView {
    #[serde(flatten)]
    pub item: ShopItem,
    pub owned: bool,
    pub equipped: bool,
}

/// GET /api/shop
#[derive(Debug, Serialize)]
pub struct ShopResponse {
    pub points: i64,
    pub items: Vec<ShopItemView>,
}

/// POST /api/shop/unequip
#[derive(Debug, Deserialize)]
pub struct UnequipRequest {
    pub kind: ShopItemKind,
}

// ============================================================================
// Games
// ============================================================================

#[derive(Debug, Serialize)]
pub struct GameView {
    #[serde(flatten)]
    pub game: Game,
    pub completed: bool,
}

/// POST /api/games/{id}/complete
#[derive(Debug, Serialize)]
pub struct GameCompletedResponse {
    pub game_id: &'static str,
    pub points_awarded: i64,
    pub first_completion: bool,
    pub newly_unlocked: Option<Reward>,
}

// ============================================================================
// Report & sharing
// ============================================================================

/// GET /api/report query
#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub days: Option<i64>,
}

/// POST /api/share, never includes reflection text
#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub summary: String,
    pub name: String,
    pub current_streak: u32,
    pub total_entries: u32,
    pub rewards: Vec<&'static str>,
    pub newly_unlocked: Option<Reward>,
}

// ============================================================================
// Companions
// ============================================================================

/// POST /api/companions/{id}/chat
#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 1000, message = "Message must be 1-1000 characters"))]
    pub message: String,

    /// Previous turns, oldest first
    #[validate(length(max = 40, message = "Too much chat history"))]
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    Model,
    Safety,
    Fallback,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub companion_id: &'static str,
    pub reply: String,
    pub source: ReplySource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_color() {
        assert!(validate_color(None).is_ok());
        assert!(validate_color(Some("#fff")).is_ok());
        assert!(validate_color(Some("#A1b2C3")).is_ok());
        assert!(validate_color(Some("fff")).is_err());
        assert!(validate_color(Some("#ggg")).is_err());
        assert!(validate_color(Some("#12345")).is_err());
    }

    #[test]
    fn test_create_diary_entry_defaults() {
        let json = format!(r#"{{"emotion_id":"{}"}}"#, Uuid::nil());
        let req: CreateDiaryEntryRequest = serde_json::from_str(&json).unwrap();
        assert!(req.entry_date.is_none());
        assert!(req.reflection.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_emotion_name_limits() {
        let req = CreateEmotionRequest {
            name: String::new(),
            icon: None,
            color: None,
        };
        assert!(req.validate().is_err());

        let req = CreateEmotionRequest {
            name: "Grateful".into(),
            icon: Some("🙏".into()),
            color: Some("#22c55e".into()),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_chat_request_history_defaults_empty() {
        let req: ChatRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert!(req.history.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_profile_update_rejects_long_name() {
        let req = UpdateProfileRequest {
            name: Some("x".repeat(41)),
            avatar_emoji: None,
        };
        let err = AppError::from(req.validate().unwrap_err());
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("1-40")));
    }

    #[test]
    fn test_reward_view_flattens() {
        let view = RewardView {
            reward: crate::models::reward::REWARDS[0],
            unlocked: true,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["id"], "sprout-bunny");
        assert_eq!(json["unlocked"], true);
    }
}
