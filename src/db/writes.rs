//! Non-blocking profile writes.
//!
//! The request that triggers one of these has already answered the client.
//! Failures go to the event channel instead of the caller.

use sqlx::PgPool;
use std::future::Future;
use uuid::Uuid;

use crate::db::guard::profile_path;
use crate::error::Operation;
use crate::events::{AppEvent, EventBus};
use crate::models::reward::find_reward;
use crate::services::rewards::UnlockOutcome;
use crate::AppState;

pub fn spawn_write<F>(events: EventBus, user_id: Uuid, path: String, operation: Operation, write: F)
where
    F: Future<Output = Result<(), sqlx::Error>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = write.await {
            events.publish(AppEvent::WriteFailed {
                user_id,
                path,
                operation,
                message: e.to_string(),
            });
        }
    });
}

pub async fn add_points(db: &PgPool, user_id: Uuid, delta: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE profiles SET
            points = GREATEST(points + $2, 0),
            updated_at = NOW()
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .bind(delta)
    .execute(db)
    .await?;
    Ok(())
}

/// Union `ids` into the unlocked set. Never removes an id.
pub async fn merge_unlocked_rewards(db: &PgPool, user_id: Uuid, ids: &[String]) -> Result<(), sqlx::Error> {
    if ids.is_empty() {
        return Ok(());
    }
    sqlx::query(
        r#"
        UPDATE profiles SET
            unlocked_rewards = ARRAY(
                SELECT DISTINCT r FROM unnest(unlocked_rewards || $2::text[]) AS r ORDER BY r
            ),
            updated_at = NOW()
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .bind(ids)
    .execute(db)
    .await?;
    Ok(())
}

pub fn award_points(state: &AppState, user_id: Uuid, delta: i64) {
    let db = state.db.clone();
    let events = state.events.clone();
    let notify = events.clone();
    spawn_write(
        events,
        user_id,
        profile_path(user_id),
        Operation::Update,
        async move {
            add_points(&db, user_id, delta).await?;
            notify.publish(AppEvent::PointsChanged { user_id, delta });
            Ok::<(), sqlx::Error>(())
        },
    );
}

pub fn persist_unlocks(state: &AppState, user_id: Uuid, outcome: &UnlockOutcome) {
    if outcome.newly_unlocked_ids.is_empty() {
        return;
    }
    let db = state.db.clone();
    let events = state.events.clone();
    let notify = events.clone();
    let ids = outcome.newly_unlocked_ids.clone();
    spawn_write(
        events,
        user_id,
        profile_path(user_id),
        Operation::Update,
        async move {
            merge_unlocked_rewards(&db, user_id, &ids).await?;
            for id in &ids {
                if let Some(reward) = find_reward(id) {
                    notify.publish(AppEvent::RewardUnlocked {
                        user_id,
                        reward_id: reward.id.to_string(),
                        name: reward.name.to_string(),
                    });
                }
            }
            Ok::<(), sqlx::Error>(())
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failed_write_is_published() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let user_id = Uuid::new_v4();

        spawn_write(
            bus.clone(),
            user_id,
            profile_path(user_id),
            Operation::Update,
            async { Err::<(), _>(sqlx::Error::RowNotFound) },
        );

        match rx.recv().await.unwrap() {
            AppEvent::WriteFailed {
                user_id: uid,
                path,
                operation,
                ..
            } => {
                assert_eq!(uid, user_id);
                assert_eq!(path, format!("users/{}/profile", user_id));
                assert_eq!(operation, Operation::Update);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_successful_write_publishes_nothing() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let user_id = Uuid::new_v4();

        spawn_write(
            bus.clone(),
            user_id,
            profile_path(user_id),
            Operation::Update,
            async { Ok::<(), sqlx::Error>(()) },
        );

        let waited = tokio::time::timeout(std::time::Duration::from_millis(50), rx.recv()).await;
        assert!(waited.is_err(), "no event expected for a successful write");
    }
}
