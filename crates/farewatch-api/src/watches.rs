use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use farewatch_types::Watch;
use farewatch_types::api::CreateWatchRequest;

use crate::{AppState, blocking};

/// POST /watches — subscribes a user to price changes on one date.
/// The watch starts enabled with no notified price.
pub async fn create_watch(
    State(state): State<AppState>,
    Json(req): Json<CreateWatchRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let now = chrono::Utc::now();
    if req.watch_date < now.date_naive() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let db = state.db.clone();
    let user_id = req.user;
    if blocking(move || db.get_user_by_id(user_id)).await?.is_none() {
        return Err(StatusCode::NOT_FOUND);
    }

    let watch = Watch {
        id: Uuid::new_v4(),
        user: req.user,
        watch_date: req.watch_date,
        is_enabled: true,
        last_price: None,
        updated_at: now,
    };

    let db = state.db.clone();
    let row = watch.clone();
    blocking(move || db.create_watch(&row)).await?;

    info!(watch_id = %watch.id, date = %watch.watch_date, "Watch created");
    Ok((StatusCode::CREATED, Json(watch)))
}

pub async fn get_watch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.db.clone();
    let watch = blocking(move || db.get_watch(id))
        .await?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(watch))
}

/// DELETE /watches/{id} — unsubscribes. The row is kept, only disabled.
pub async fn delete_watch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let db = state.db.clone();
    if !blocking(move || db.disable_watch(id)).await? {
        return Err(StatusCode::NOT_FOUND);
    }

    info!(watch_id = %id, "Watch disabled");
    Ok(StatusCode::NO_CONTENT)
}
