use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    pub email: String,
}

// -- Watches --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateWatchRequest {
    pub user: Uuid,
    pub watch_date: NaiveDate,
}
