use uuid::Uuid;

use crate::error::{AppError, AppResult, Operation, PermissionError};
use crate::events::AppEvent;
use crate::AppState;

/// Per-user collections addressed by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Emotions,
    DiaryEntries,
}

impl Collection {
    fn table(&self) -> &'static str {
        match self {
            Collection::Emotions => "emotions",
            Collection::DiaryEntries => "diary_entries",
        }
    }

    fn segment(&self) -> &'static str {
        match self {
            Collection::Emotions => "emotions",
            Collection::DiaryEntries => "diaryEntries",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Collection::Emotions => "Emotion not found",
            Collection::DiaryEntries => "Diary entry not found",
        }
    }
}

pub fn document_path(user_id: Uuid, collection: Collection, id: Uuid) -> String {
    format!("users/{}/{}/{}", user_id, collection.segment(), id)
}

pub fn profile_path(user_id: Uuid) -> String {
    format!("users/{}/profile", user_id)
}

/// Decide the outcome of an ownership lookup.
pub fn ownership_result(
    owner: Option<Uuid>,
    user_id: Uuid,
    collection: Collection,
    id: Uuid,
    operation: Operation,
) -> AppResult<()> {
    match owner {
        None => Err(AppError::NotFound(collection.label().into())),
        Some(owner) if owner == user_id => Ok(()),
        Some(_) => Err(AppError::Permission(PermissionError {
            path: document_path(user_id, collection, id),
            operation,
        })),
    }
}

/// Fail unless `id` exists in `collection` and belongs to `user_id`.
/// Permission failures are also published on the event channel.
pub async fn ensure_owned(
    state: &AppState,
    user_id: Uuid,
    collection: Collection,
    id: Uuid,
    operation: Operation,
) -> AppResult<()> {
    let sql = format!("SELECT user_id FROM {} WHERE id = $1", collection.table());
    let owner = sqlx::query_scalar::<_, Uuid>(&sql)
        .bind(id)
        .fetch_optional(&state.db)
        .await?;

    let result = ownership_result(owner, user_id, collection, id, operation);
    if let Err(AppError::Permission(ref err)) = result {
        state.events.publish(AppEvent::permission_denied(user_id, err));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_passes() {
        let user = Uuid::new_v4();
        let id = Uuid::new_v4();
        assert!(ownership_result(Some(user), user, Collection::Emotions, id, Operation::Get).is_ok());
    }

    #[test]
    fn test_missing_document_is_not_found() {
        let result = ownership_result(
            None,
            Uuid::new_v4(),
            Collection::DiaryEntries,
            Uuid::new_v4(),
            Operation::Update,
        );
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_foreign_document_is_permission_error() {
        let user = Uuid::new_v4();
        let id = Uuid::new_v4();
        let result = ownership_result(
            Some(Uuid::new_v4()),
            user,
            Collection::DiaryEntries,
            id,
            Operation::Delete,
        );
        match result {
            Err(AppError::Permission(err)) => {
                assert_eq!(err.path, format!("users/{}/diaryEntries/{}", user, id));
                assert_eq!(err.operation, Operation::Delete);
            }
            other => panic!("expected permission error, got {:?}", other),
        }
    }
}
