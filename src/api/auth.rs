use std::ops::Add;

use aide::axum::routing::{delete_with, get_with, post_with};
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use aide::OperationOutput;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, Utc};
use headers::{HeaderMap, HeaderValue};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::database::AppState;
use crate::error::{ServiceError, ServiceResult};
use crate::request_state::RequestState;
use crate::{models, SESSION_COOKIE_NAME};

use super::users::UserDto;
use super::{password_hash, password_hash_verify};

/// Session validity, matches the cookie lifetime.
const SESSION_HOURS: i64 = 24;

pub fn router(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .api_route("/auth/register", post_with(auth_register, auth_register_docs))
        .api_route("/auth/login", post_with(auth_login, auth_login_docs))
        .api_route(
            "/auth/account",
            get_with(auth_get_account, auth_get_account_docs),
        )
        .api_route("/auth", delete_with(auth_delete, auth_delete_docs))
        .with_state(app_state)
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct SessionResponseDto {
    pub token: String,
    pub user: UserDto,
}

fn session_cookie(token: &str) -> HeaderMap {
    let cookie = HeaderValue::from_str(
        format!(
            "{}={}; Path=/api/v1; HttpOnly; SameSite=None",
            SESSION_COOKIE_NAME, token
        )
        .as_str(),
    )
    .unwrap();

    let mut header = HeaderMap::new();
    header.insert(header::SET_COOKIE, cookie);
    header
}

impl OperationOutput for SessionResponseDto {
    type Inner = SessionResponseDto;
}
impl IntoResponse for SessionResponseDto {
    fn into_response(self) -> axum::response::Response {
        let header = session_cookie(&self.token);
        (StatusCode::OK, header, Json(self)).into_response()
    }
}

/// Same payload as `SessionResponseDto` but answers with `201 Created`.
pub struct SessionCreatedDto(pub SessionResponseDto);

impl OperationOutput for SessionCreatedDto {
    type Inner = SessionResponseDto;
}
impl IntoResponse for SessionCreatedDto {
    fn into_response(self) -> axum::response::Response {
        let header = session_cookie(&self.0.token);
        (StatusCode::CREATED, header, Json(self.0)).into_response()
    }
}

fn validate_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[derive(Debug, PartialEq, Deserialize, JsonSchema)]
pub struct RegisterDto {
    pub name: String,
    pub email: String,
    pub password: String,
}

async fn auth_register(
    mut state: RequestState,
    form: Json<RegisterDto>,
) -> ServiceResult<SessionCreatedDto> {
    let form = form.0;

    if form.name.trim().len() < 2 {
        return Err(ServiceError::BadRequest(
            "Name must be at least 2 characters long".to_owned(),
        ));
    }
    if !validate_email(&form.email) {
        return Err(ServiceError::BadRequest(
            "Please enter a valid email".to_owned(),
        ));
    }
    if form.password.is_empty() {
        return Err(ServiceError::BadRequest(
            "Password is required".to_owned(),
        ));
    }

    let user = state
        .db
        .store_user(models::User {
            id: 0,
            name: form.name.trim().to_owned(),
            email: form.email.trim().to_lowercase(),
            password_hash: password_hash(&form.password),
            phone_number: None,
            points: 0,
            total_points_earned: 0,
            total_points_used: 0,
            last_points_update: Utc::now(),
            created_at: Utc::now(),
        })
        .await?;

    let token = state
        .db
        .create_session_token(user.id, Utc::now().add(Duration::hours(SESSION_HOURS)))
        .await?;

    Ok(SessionCreatedDto(SessionResponseDto {
        token,
        user: UserDto::from(&user),
    }))
}

fn auth_register_docs(op: TransformOperation) -> TransformOperation {
    op.description("Register a new user and start a session.")
        .tag("auth")
        .response::<201, Json<SessionResponseDto>>()
        .response_with::<400, (), _>(|res| {
            res.description("Invalid registration data or the email is already taken!")
        })
}

#[derive(Debug, PartialEq, Deserialize, JsonSchema)]
pub struct LoginDto {
    pub email: String,
    pub password: String,
}

async fn auth_login(
    mut state: RequestState,
    form: Json<LoginDto>,
) -> ServiceResult<SessionResponseDto> {
    let form = form.0;

    let user = state.db.get_user_by_email(&form.email).await?;

    if let Some(user) = user {
        if password_hash_verify(&user.password_hash, &form.password)? {
            let token = state
                .db
                .create_session_token(user.id, Utc::now().add(Duration::hours(SESSION_HOURS)))
                .await?;

            return Ok(SessionResponseDto {
                token,
                user: UserDto::from(&user),
            });
        }
    }

    Err(ServiceError::Unauthorized(
        "Invalid email or password".to_owned(),
    ))
}

fn auth_login_docs(op: TransformOperation) -> TransformOperation {
    op.description("Login with email and password.")
        .tag("auth")
        .response::<200, Json<SessionResponseDto>>()
        .response_with::<401, (), _>(|res| res.description("Invalid email or password!"))
}

async fn auth_get_account(mut state: RequestState) -> ServiceResult<Json<UserDto>> {
    let session = state.session_require()?;

    // reload, the session copy may be stale within this request
    let user = state.db.get_user_by_id(session.user.id).await?;

    if let Some(user) = user {
        return Ok(Json(UserDto::from(&user)));
    }

    Err(ServiceError::NotFound)
}

fn auth_get_account_docs(op: TransformOperation) -> TransformOperation {
    op.description("Get the currently logged in user.")
        .tag("auth")
        .response::<200, Json<UserDto>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement_scopes("SessionToken", ["self"])
}

async fn auth_delete(mut state: RequestState) -> ServiceResult<()> {
    let session = state.session_require()?;

    state.db.delete_session_token(session.token).await?;

    Ok(())
}

fn auth_delete_docs(op: TransformOperation) -> TransformOperation {
    op.description("Logout the current session.")
        .tag("auth")
        .response::<200, ()>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement_scopes("SessionToken", ["self"])
}

#[cfg(test)]
mod tests {
    use super::validate_email;

    #[test]
    fn email_validation() {
        assert!(validate_email("john.doe@example.org"));
        assert!(!validate_email("john.doe"));
        assert!(!validate_email("@example.org"));
        assert!(!validate_email("john doe@example.org"));
        assert!(!validate_email("john@example"));
    }
}
