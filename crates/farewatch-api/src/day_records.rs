use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;

use crate::{AppState, blocking};

/// GET /day-records/{date}/latest
pub async fn latest(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.db.clone();
    let record = blocking(move || db.get_latest_day_record(date))
        .await?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(record))
}
