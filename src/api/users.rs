use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::auth::{self, AuthUser, TokenType};
use super::error::AppError;
use super::extract::AppJson;
use super::responses::{self, ProfileJson, UserJson};
use super::AppState;
use crate::database::models::{NewUser, UserChanges};
use crate::database::queries;

fn is_unique_violation(error: &diesel::result::Error) -> bool {
    matches!(
        error,
        diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )
    )
}

// sqlite names the violated constraint in the message, like
// "UNIQUE constraint failed: users.email".
fn taken_field(error: &diesel::result::Error) -> AppError {
    use diesel::result::DatabaseErrorInformation as _;

    let message = match error {
        diesel::result::Error::DatabaseError(_, info) => info.message(),
        _ => "",
    };
    if message.contains("users.username") {
        AppError::validation("username", "a user with this username already exists")
    } else {
        AppError::validation("email", "a user with this email already exists")
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password2: Option<String>,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<RegisterPayload>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let mut problems = Vec::new();
    let username = payload.username.unwrap_or_default();
    if username.trim().is_empty() {
        problems.push(("username", "this field is required"));
    }
    let email = payload.email.unwrap_or_default();
    if email.is_empty() {
        problems.push(("email", "this field is required"));
    } else if !email.contains('@') {
        problems.push(("email", "enter a valid email address"));
    }
    let password = payload.password.unwrap_or_default();
    let password2 = payload.password2.unwrap_or_default();
    if password.is_empty() {
        problems.push(("password", "this field is required"));
    } else if password.len() < 8 {
        problems.push(("password", "password must be at least 8 characters"));
    } else if password != password2 {
        problems.push(("password", "password fields didn't match"));
    }
    if !problems.is_empty() {
        return Err(AppError::Validation(problems));
    }

    let user = state
        .db(move |conn| {
            // Hashing is CPU-bound, so it runs on the blocking pool alongside
            // the insert.
            let password_hash = auth::hash_password(&password)?;
            let created = queries::create_user(
                conn,
                &NewUser {
                    username: &username,
                    email: &email,
                    password_hash: &password_hash,
                    bio: "",
                    avatar: None,
                    date_joined: chrono::Utc::now().naive_utc(),
                },
            );
            match created {
                Err(error) if is_unique_violation(&error) => Err(taken_field(&error)),
                other => Ok(other?),
            }
        })
        .await?;

    let token = state.tokens.issue_access(user.id)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "token": token, "user": UserJson::new(&user) })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: Option<String>,
    pub password: Option<String>,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<LoginPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut problems = Vec::new();
    let email = payload.email.unwrap_or_default();
    if email.is_empty() {
        problems.push(("email", "this field is required"));
    }
    let password = payload.password.unwrap_or_default();
    if password.is_empty() {
        problems.push(("password", "this field is required"));
    }
    if !problems.is_empty() {
        return Err(AppError::Validation(problems));
    }

    // Password verification is CPU-bound, so it stays on the blocking pool
    // with the lookup.
    let user = state
        .db(move |conn| {
            let user = queries::find_user_by_email(conn, &email)?
                .ok_or(AppError::InvalidCredentials)?;
            if !auth::verify_password(&password, &user.password_hash) {
                return Err(AppError::InvalidCredentials);
            }
            Ok(user)
        })
        .await?;

    let pair = state.tokens.issue_pair(user.id)?;
    Ok(Json(json!({
        "refresh": pair.refresh,
        "access": pair.access,
        "user": UserJson::new(&user),
    })))
}

#[derive(Debug, Deserialize)]
pub struct RefreshPayload {
    pub refresh: Option<String>,
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<RefreshPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    let token = payload
        .refresh
        .ok_or(AppError::validation("refresh", "this field is required"))?;
    let user = state.tokens.verify(&token, TokenType::Refresh)?;
    let access = state.tokens.issue_access(user)?;
    Ok(Json(json!({ "access": access })))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
) -> Result<Json<ProfileJson>, AppError> {
    let profile = state
        .db(move |conn| {
            // A token can outlive its account.
            let user = queries::find_user(conn, principal)?.ok_or(AppError::Unauthenticated)?;
            Ok(responses::profile_json(conn, &user)?)
        })
        .await?;
    Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
pub struct ProfilePayload {
    pub username: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
}

pub async fn update_me(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    AppJson(payload): AppJson<ProfilePayload>,
) -> Result<Json<ProfileJson>, AppError> {
    let mut problems = Vec::new();
    if matches!(&payload.username, Some(username) if username.trim().is_empty()) {
        problems.push(("username", "may not be blank"));
    }
    if matches!(&payload.email, Some(email) if !email.contains('@')) {
        problems.push(("email", "enter a valid email address"));
    }
    if !problems.is_empty() {
        return Err(AppError::Validation(problems));
    }

    let profile = state
        .db(move |conn| {
            let user = queries::find_user(conn, principal)?.ok_or(AppError::Unauthenticated)?;
            let unchanged =
                payload.username.is_none() && payload.email.is_none() && payload.bio.is_none();
            let user = if unchanged {
                user
            } else {
                let changes = UserChanges {
                    username: payload.username.as_deref(),
                    email: payload.email.as_deref(),
                    bio: payload.bio.as_deref(),
                };
                match queries::update_user(conn, principal, &changes) {
                    Err(error) if is_unique_violation(&error) => {
                        return Err(taken_field(&error))
                    }
                    other => other?,
                }
            };
            Ok(responses::profile_json(conn, &user)?)
        })
        .await?;
    Ok(Json(profile))
}
