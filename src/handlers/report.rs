use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{Duration, Utc};

use crate::auth::middleware::AuthUser;
use crate::db::journal::load_entry_marks;
use crate::dto::ReportQuery;
use crate::error::AppResult;
use crate::models::emotion::Emotion;
use crate::services::report::{build_report, EmotionReport};
use crate::AppState;

const DEFAULT_REPORT_DAYS: i64 = 30;
const MAX_REPORT_DAYS: i64 = 365;

fn report_days(requested: Option<i64>) -> i64 {
    requested.unwrap_or(DEFAULT_REPORT_DAYS).clamp(1, MAX_REPORT_DAYS)
}

/// Emotion report for the last `days` days, today included.
pub async fn get_report(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<EmotionReport>> {
    let end = Utc::now().date_naive();
    let start = end - Duration::days(report_days(query.days) - 1);

    let emotions = sqlx::query_as::<_, Emotion>("SELECT * FROM emotions WHERE user_id = $1")
        .bind(auth_user.id)
        .fetch_all(&state.db)
        .await?;
    let marks = load_entry_marks(&state.db, auth_user.id).await?;

    Ok(Json(build_report(&emotions, &marks, start, end)))
}
