use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::PgPool;
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::db::guard::{ensure_owned, Collection};
use crate::db::journal::{evaluate_for_user, load_entry_marks};
use crate::db::writes::{award_points, persist_unlocks};
use crate::dto::{
    CreateDiaryEntryRequest, DeleteResponse, DiaryEntryCreatedResponse, DiaryQuery,
    UpdateDiaryEntryRequest,
};
use crate::error::{AppError, AppResult, Operation};
use crate::events::AppEvent;
use crate::models::diary_entry::DiaryEntry;
use crate::services::flows;
use crate::services::streak::JournalStats;
use crate::AppState;

/// Points for every saved diary entry.
pub const ENTRY_POINTS: i64 = 10;

#[derive(Debug, Serialize)]
pub struct StreakSummary {
    pub today: NaiveDate,
    pub has_entry_today: bool,
    #[serde(flatten)]
    pub stats: JournalStats,
}

fn check_entry_date(entry_date: DateTime<Utc>) -> AppResult<()> {
    // Allow for clients a timezone ahead of UTC
    if entry_date > Utc::now() + Duration::days(1) {
        return Err(AppError::Validation("Diary entries can't be dated in the future".into()));
    }
    Ok(())
}

/// Insert an entry only while its emotion still exists for this user.
/// `FOR SHARE` makes a concurrent emotion delete wait for this insert, or
/// makes this insert see the delete.
async fn insert_entry(
    db: &PgPool,
    user_id: Uuid,
    emotion_id: Uuid,
    entry_date: DateTime<Utc>,
    reflection: &str,
    calming_tip: &str,
) -> AppResult<DiaryEntry> {
    sqlx::query_as::<_, DiaryEntry>(
        r#"
        INSERT INTO diary_entries (id, user_id, emotion_id, entry_date, reflection, calming_tip)
        SELECT $1, $2, $3, $4, $5, $6
        WHERE EXISTS (SELECT 1 FROM emotions WHERE id = $3 AND user_id = $2 FOR SHARE)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(emotion_id)
    .bind(entry_date)
    .bind(reflection)
    .bind(calming_tip)
    .fetch_optional(db)
    .await?
    .ok_or(AppError::NotFound("Emotion not found".into()))
}

/// Merge update. A new `emotion_id` gets the same existence guard as an insert.
async fn update_entry(
    db: &PgPool,
    user_id: Uuid,
    entry_id: Uuid,
    body: &UpdateDiaryEntryRequest,
) -> AppResult<DiaryEntry> {
    sqlx::query_as::<_, DiaryEntry>(
        r#"
        UPDATE diary_entries SET
            emotion_id = COALESCE($3, emotion_id),
            entry_date = COALESCE($4, entry_date),
            reflection = COALESCE($5, reflection),
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
          AND ($3::uuid IS NULL
               OR EXISTS (SELECT 1 FROM emotions WHERE id = $3 AND user_id = $2 FOR SHARE))
        RETURNING *
        "#,
    )
    .bind(entry_id)
    .bind(user_id)
    .bind(body.emotion_id)
    .bind(body.entry_date)
    .bind(body.reflection.as_deref().map(str::trim))
    .fetch_optional(db)
    .await?
    .ok_or(AppError::NotFound("Diary entry or emotion not found".into()))
}

pub async fn list_diary_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<DiaryQuery>,
) -> AppResult<Json<Vec<DiaryEntry>>> {
    if let Some(emotion_id) = query.emotion_id {
        ensure_owned(&state, auth_user.id, Collection::Emotions, emotion_id, Operation::List).await?;
    }

    let entries = sqlx::query_as::<_, DiaryEntry>(
        r#"
        SELECT * FROM diary_entries
        WHERE user_id = $1
          AND ($2::uuid IS NULL OR emotion_id = $2)
          AND ($3::date IS NULL OR (entry_date AT TIME ZONE 'UTC')::date >= $3)
          AND ($4::date IS NULL OR (entry_date AT TIME ZONE 'UTC')::date <= $4)
        ORDER BY entry_date DESC
        "#,
    )
    .bind(auth_user.id)
    .bind(query.emotion_id)
    .bind(query.start_date)
    .bind(query.end_date)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(entries))
}

pub async fn get_diary_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<DiaryEntry>> {
    ensure_owned(&state, auth_user.id, Collection::DiaryEntries, entry_id, Operation::Get).await?;

    let entry = sqlx::query_as::<_, DiaryEntry>("SELECT * FROM diary_entries WHERE id = $1")
        .bind(entry_id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(entry))
}

pub async fn create_diary_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateDiaryEntryRequest>,
) -> AppResult<Json<DiaryEntryCreatedResponse>> {
    body.validate()?;
    ensure_owned(&state, auth_user.id, Collection::Emotions, body.emotion_id, Operation::Get).await?;

    let entry_date = body.entry_date.unwrap_or_else(Utc::now);
    check_entry_date(entry_date)?;

    let emotion_name = sqlx::query_scalar::<_, String>("SELECT name FROM emotions WHERE id = $1")
        .bind(body.emotion_id)
        .fetch_one(&state.db)
        .await?;

    // Never fails; a canned exercise stands in for the model
    let calming_tip =
        flows::suggest_calming_exercise(&state.genai, &emotion_name, &body.reflection).await;

    let entry = insert_entry(
        &state.db,
        auth_user.id,
        body.emotion_id,
        entry_date,
        body.reflection.trim(),
        &calming_tip,
    )
    .await?;

    // Answer with the unlock now; the profile writes finish in the background
    let (_, _, outcome) = evaluate_for_user(&state.db, auth_user.id).await?;
    persist_unlocks(&state, auth_user.id, &outcome);
    award_points(&state, auth_user.id, ENTRY_POINTS);

    state.events.publish(AppEvent::DiaryChanged {
        user_id: auth_user.id,
        entry_id: entry.id,
    });

    Ok(Json(DiaryEntryCreatedResponse {
        entry,
        points_awarded: ENTRY_POINTS,
        newly_unlocked: outcome.newly_unlocked,
    }))
}

pub async fn update_diary_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
    Json(body): Json<UpdateDiaryEntryRequest>,
) -> AppResult<Json<DiaryEntry>> {
    body.validate()?;
    ensure_owned(&state, auth_user.id, Collection::DiaryEntries, entry_id, Operation::Update).await?;
    if let Some(emotion_id) = body.emotion_id {
        ensure_owned(&state, auth_user.id, Collection::Emotions, emotion_id, Operation::Get).await?;
    }
    if let Some(entry_date) = body.entry_date {
        check_entry_date(entry_date)?;
    }

    let entry = update_entry(&state.db, auth_user.id, entry_id, &body).await?;

    // Back-dating can complete a streak
    let (_, _, outcome) = evaluate_for_user(&state.db, auth_user.id).await?;
    persist_unlocks(&state, auth_user.id, &outcome);

    state.events.publish(AppEvent::DiaryChanged {
        user_id: auth_user.id,
        entry_id,
    });

    Ok(Json(entry))
}

pub async fn delete_diary_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    ensure_owned(&state, auth_user.id, Collection::DiaryEntries, entry_id, Operation::Delete).await?;

    sqlx::query("DELETE FROM diary_entries WHERE id = $1 AND user_id = $2")
        .bind(entry_id)
        .bind(auth_user.id)
        .execute(&state.db)
        .await?;

    state.events.publish(AppEvent::DiaryChanged {
        user_id: auth_user.id,
        entry_id,
    });

    Ok(Json(DeleteResponse {
        deleted: true,
        id: entry_id,
    }))
}

pub async fn get_streak(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<StreakSummary>> {
    let today = Utc::now().date_naive();
    let marks = load_entry_marks(&state.db, auth_user.id).await?;
    let has_entry_today = marks.iter().any(|m| m.entry_date.date_naive() == today);

    Ok(Json(StreakSummary {
        today,
        has_entry_today,
        stats: JournalStats::from_entries(&marks, today),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::journal::bootstrap_user;

    async fn seeded_user(db: &PgPool) -> (Uuid, Vec<Uuid>) {
        let user_id = Uuid::new_v4();
        bootstrap_user(db, user_id).await.unwrap();
        let emotions = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM emotions WHERE user_id = $1 ORDER BY name",
        )
        .bind(user_id)
        .fetch_all(db)
        .await
        .unwrap();
        (user_id, emotions)
    }

    async fn orphan_count(db: &PgPool) -> i64 {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM diary_entries d
            WHERE NOT EXISTS (
                SELECT 1 FROM emotions e WHERE e.id = d.emotion_id AND e.user_id = d.user_id
            )
            "#,
        )
        .fetch_one(db)
        .await
        .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_insert_after_emotion_deleted_leaves_no_orphan(db: PgPool) {
        let (user_id, emotions) = seeded_user(&db).await;
        let emotion_id = emotions[0];

        // Emotion goes away between the ownership check and the insert
        sqlx::query("DELETE FROM emotions WHERE id = $1")
            .bind(emotion_id)
            .execute(&db)
            .await
            .unwrap();

        let result = insert_entry(&db, user_id, emotion_id, Utc::now(), "sad day", "breathe").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(orphan_count(&db).await, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_insert_with_another_users_emotion_is_refused(db: PgPool) {
        let (user_id, _) = seeded_user(&db).await;
        let (_, other_emotions) = seeded_user(&db).await;

        let result = insert_entry(&db, user_id, other_emotions[0], Utc::now(), "", "breathe").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(orphan_count(&db).await, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_to_deleted_emotion_is_refused(db: PgPool) {
        let (user_id, emotions) = seeded_user(&db).await;
        let entry = insert_entry(&db, user_id, emotions[0], Utc::now(), "ok", "breathe")
            .await
            .unwrap();

        sqlx::query("DELETE FROM emotions WHERE id = $1")
            .bind(emotions[1])
            .execute(&db)
            .await
            .unwrap();

        let body = UpdateDiaryEntryRequest {
            emotion_id: Some(emotions[1]),
            entry_date: None,
            reflection: None,
        };
        let result = update_entry(&db, user_id, entry.id, &body).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let stored = sqlx::query_scalar::<_, Uuid>("SELECT emotion_id FROM diary_entries WHERE id = $1")
            .bind(entry.id)
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(stored, emotions[0]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_entry_without_model_stores_canned_tip(db: PgPool) {
        let state = AppState::for_tests(db.clone());
        let (user_id, emotions) = seeded_user(&db).await;

        let Json(created) = create_diary_entry(
            State(state),
            Extension(AuthUser { id: user_id }),
            Json(CreateDiaryEntryRequest {
                emotion_id: emotions[0],
                entry_date: None,
                reflection: "I lost my ball".into(),
            }),
        )
        .await
        .unwrap();

        assert!(created.entry.calming_tip.is_some());
        assert_eq!(created.points_awarded, ENTRY_POINTS);
        assert_eq!(created.newly_unlocked.map(|r| r.id), Some("sprout-bunny"));
    }

    #[test]
    fn test_entry_date_today_and_past_are_fine() {
        assert!(check_entry_date(Utc::now()).is_ok());
        assert!(check_entry_date(Utc::now() - Duration::days(400)).is_ok());
    }

    #[test]
    fn test_far_future_entry_date_is_rejected() {
        assert!(matches!(
            check_entry_date(Utc::now() + Duration::days(3)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_streak_summary_flattens_stats() {
        let summary = StreakSummary {
            today: NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
            has_entry_today: true,
            stats: JournalStats {
                current_streak: 4,
                longest_streak: 9,
                total_entries: 20,
                distinct_emotions: 6,
            },
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["current_streak"], 4);
        assert_eq!(json["longest_streak"], 9);
        assert_eq!(json["has_entry_today"], true);
    }
}
