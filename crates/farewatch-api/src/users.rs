use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;

use farewatch_types::User;
use farewatch_types::api::CreateUserRequest;

use crate::{AppState, blocking};

pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let email = req.email.trim().to_string();
    if email.len() < 3 || email.len() > 254 || !email.contains('@') {
        return Err(StatusCode::BAD_REQUEST);
    }

    let user = User {
        id: Uuid::new_v4(),
        email,
        created_at: chrono::Utc::now(),
    };

    let db = state.db.clone();
    let row = user.clone();
    if !blocking(move || db.create_user(&row)).await? {
        return Err(StatusCode::CONFLICT);
    }

    Ok((StatusCode::CREATED, Json(user)))
}
