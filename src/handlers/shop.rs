use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::auth::middleware::AuthUser;
use crate::db::journal::fetch_profile;
use crate::dto::{ShopItemView, ShopResponse, UnequipRequest};
use crate::error::{AppError, AppResult};
use crate::events::AppEvent;
use crate::models::profile::Profile;
use crate::models::shop::{find_item, ShopItem, ShopItemKind, SHOP_ITEMS};
use crate::AppState;

fn equipped_slot(profile: &Profile, kind: ShopItemKind) -> Option<&str> {
    match kind {
        ShopItemKind::Frame => profile.equipped_frame.as_deref(),
        ShopItemKind::Background => profile.equipped_background.as_deref(),
        ShopItemKind::Theme => profile.equipped_theme.as_deref(),
    }
}

fn shop_view(profile: &Profile) -> ShopResponse {
    let items = SHOP_ITEMS
        .iter()
        .map(|item| ShopItemView {
            item: *item,
            owned: profile.purchased_items.iter().any(|p| p == item.id),
            equipped: equipped_slot(profile, item.kind) == Some(item.id),
        })
        .collect();
    ShopResponse {
        points: profile.points,
        items,
    }
}

fn lookup(item_id: &str) -> AppResult<&'static ShopItem> {
    find_item(item_id).ok_or(AppError::NotFound("Shop item not found".into()))
}

/// Why the conditional purchase matched no row, judged from a fresh read.
fn purchase_refusal(profile: &Profile, item: &ShopItem) -> AppError {
    if profile.purchased_items.iter().any(|p| p == item.id) {
        return AppError::Conflict(format!("You already own {}", item.name));
    }
    let missing = item.price - profile.points;
    if missing <= 0 {
        // Points changed between the update and the read
        return AppError::Conflict("Your points just changed. Please try again!".into());
    }
    AppError::Validation(format!("You need {} more points for {}", missing, item.name))
}

pub async fn list_shop(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<ShopResponse>> {
    let profile = fetch_profile(&state.db, auth_user.id).await?;
    Ok(Json(shop_view(&profile)))
}

pub async fn purchase_item(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(item_id): Path<String>,
) -> AppResult<Json<ShopResponse>> {
    let item = lookup(&item_id)?;

    // Single conditional update: points can't go negative and nothing is bought twice
    let updated = sqlx::query_as::<_, Profile>(
        r#"
        UPDATE profiles SET
            points = points - $3,
            purchased_items = array_append(purchased_items, $2),
            updated_at = NOW()
        WHERE user_id = $1
          AND points >= $3
          AND NOT ($2 = ANY(purchased_items))
        RETURNING *
        "#,
    )
    .bind(auth_user.id)
    .bind(item.id)
    .bind(item.price)
    .fetch_optional(&state.db)
    .await?;

    let profile = match updated {
        Some(profile) => profile,
        None => {
            let profile = fetch_profile(&state.db, auth_user.id).await?;
            return Err(purchase_refusal(&profile, item));
        }
    };

    tracing::info!(user_id = %auth_user.id, item_id = %item.id, price = item.price, "Shop item purchased");
    state.events.publish(AppEvent::PointsChanged {
        user_id: auth_user.id,
        delta: -item.price,
    });

    Ok(Json(shop_view(&profile)))
}

pub async fn equip_item(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(item_id): Path<String>,
) -> AppResult<Json<ShopResponse>> {
    let item = lookup(&item_id)?;

    // Column name comes from a closed enum, never from input
    let sql = format!(
        r#"
        UPDATE profiles SET {} = $2, updated_at = NOW()
        WHERE user_id = $1 AND $2 = ANY(purchased_items)
        RETURNING *
        "#,
        item.kind.column()
    );
    let profile = sqlx::query_as::<_, Profile>(&sql)
        .bind(auth_user.id)
        .bind(item.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::Validation(format!("Buy {} before using it", item.name)))?;

    Ok(Json(shop_view(&profile)))
}

pub async fn unequip_item(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<UnequipRequest>,
) -> AppResult<Json<ShopResponse>> {
    let sql = format!(
        "UPDATE profiles SET {} = NULL, updated_at = NOW() WHERE user_id = $1 RETURNING *",
        body.kind.column()
    );
    let profile = sqlx::query_as::<_, Profile>(&sql)
        .bind(auth_user.id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(shop_view(&profile)))
}
