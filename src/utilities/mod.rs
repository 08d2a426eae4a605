//! Operator-facing listing endpoints.

use actix_web::{web, HttpResponse};

use crate::db::models::UserSummary;
use crate::error::AppError;
use crate::AppState;

/// Every registered account as its public projection.
pub async fn list_users(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let users = state.directory.list().await?;
    let summaries: Vec<UserSummary> = users.iter().map(UserSummary::from).collect();
    Ok(HttpResponse::Ok().json(summaries))
}
