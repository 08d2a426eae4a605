use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use tracing::{error, info};

use crate::error::{AppError, TokenError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

pub async fn sign_up(
    req: web::Json<SignUpRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received sign-up request for username: {}", req.username);
    validate_email(&req.email)?;
    validate_username(&req.username)?;

    // Registration mints the first session token, so sign-up doubles as
    // sign-in.
    match state
        .auth
        .register(&req.email, &req.username, &req.password)
        .await
    {
        Ok(token) => {
            info!("Sign-up successful for username: {}", req.username);
            Ok(HttpResponse::Created().json(token))
        }
        Err(e) => {
            error!("Sign-up failed for username {}: {}", req.username, e);
            Err(e)
        }
    }
}

pub async fn sign_in(
    req: web::Json<SignInRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received sign-in request for email: {}", req.email);
    match state.auth.authenticate(&req.email, &req.password).await {
        Ok(token) => {
            info!("Sign-in successful for email: {}", req.email);
            Ok(HttpResponse::Ok().json(token))
        }
        Err(e) => {
            error!("Sign-in failed for email {}: {}", req.email, e);
            Err(e)
        }
    }
}

pub async fn current_user(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let token = bearer_token(&req)?;
    let claim = state.auth.resolve_current_user(token)?;
    Ok(HttpResponse::Ok().json(claim))
}

/// Pull the compact token out of an `Authorization: Bearer <token>` header.
fn bearer_token(req: &HttpRequest) -> Result<&str, AppError> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AppError::Token(TokenError::InvalidToken))
}

fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.') =>
        {
            Ok(())
        }
        _ => Err(AppError::Validation(
            "email address is not valid".to_string(),
        )),
    }
}

fn validate_username(username: &str) -> Result<(), AppError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("username must not be empty".to_string()));
    }
    if username.chars().count() > 64 {
        return Err(AppError::Validation(
            "username must be at most 64 characters".to_string(),
        ));
    }
    Ok(())
}
