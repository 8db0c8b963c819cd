//! Shared reads and the account bootstrap.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::emotion::BUILTIN_EMOTIONS;
use crate::models::profile::{AvatarKind, Profile, DEFAULT_AVATAR, DEFAULT_NAME};
use crate::models::reward::REWARDS;
use crate::services::rewards::{evaluate_rewards, RewardTriggers, UnlockOutcome};
use crate::services::streak::{EntryMark, JournalStats};

pub async fn fetch_profile(db: &PgPool, user_id: Uuid) -> AppResult<Profile> {
    sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound("Profile not found".into()))
}

pub async fn load_entry_marks(db: &PgPool, user_id: Uuid) -> AppResult<Vec<EntryMark>> {
    let marks = sqlx::query_as::<_, EntryMark>(
        "SELECT entry_date, emotion_id FROM diary_entries WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(marks)
}

pub async fn load_stats(db: &PgPool, user_id: Uuid) -> AppResult<JournalStats> {
    let marks = load_entry_marks(db, user_id).await?;
    Ok(JournalStats::from_entries(&marks, Utc::now().date_naive()))
}

pub fn triggers_for(profile: &Profile) -> RewardTriggers {
    RewardTriggers {
        has_shared: profile.has_shared,
        special_flags: profile.special_flags.iter().cloned().collect(),
    }
}

/// Load everything reward evaluation needs and run it. Does not write.
pub async fn evaluate_for_user(
    db: &PgPool,
    user_id: Uuid,
) -> AppResult<(Profile, JournalStats, UnlockOutcome)> {
    let profile = fetch_profile(db, user_id).await?;
    let stats = load_stats(db, user_id).await?;
    let outcome = evaluate_rewards(&profile.unlocked_rewards, &stats, &triggers_for(&profile), REWARDS);
    Ok((profile, stats, outcome))
}

/// Create the user, its profile and the built-in emotions in one transaction.
pub async fn bootstrap_user(db: &PgPool, user_id: Uuid) -> AppResult<Profile> {
    let mut tx = db.begin().await?;

    sqlx::query("INSERT INTO users (id) VALUES ($1)")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let profile = sqlx::query_as::<_, Profile>(
        r#"
        INSERT INTO profiles (user_id, name, avatar, avatar_kind)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(DEFAULT_NAME)
    .bind(DEFAULT_AVATAR)
    .bind(AvatarKind::Emoji)
    .fetch_one(&mut *tx)
    .await?;

    for emotion in BUILTIN_EMOTIONS {
        sqlx::query(
            r#"
            INSERT INTO emotions (id, user_id, name, icon, color, description, is_custom)
            VALUES ($1, $2, $3, $4, $5, $6, false)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(emotion.name)
        .bind(emotion.icon)
        .bind(emotion.color)
        .bind(emotion.description)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(profile)
}
