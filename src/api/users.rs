use aide::axum::routing::get_with;
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::Path;
use axum::Json;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::database::AppState;
use crate::error::{ServiceError, ServiceResult};
use crate::models;
use crate::request_state::RequestState;

pub fn router(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .api_route(
            "/user/:id",
            get_with(get_user, get_user_docs).put_with(update_user, update_user_docs),
        )
        .with_state(app_state)
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct UserDto {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub points: i32,
    pub total_points_earned: i32,
    pub total_points_used: i32,
    pub last_points_update: String,
    pub created_at: String,
}

impl From<&models::User> for UserDto {
    fn from(value: &models::User) -> Self {
        Self {
            id: value.id.to_owned(),
            name: value.name.to_owned(),
            email: value.email.to_owned(),
            phone_number: value.phone_number.to_owned(),
            points: value.points.to_owned(),
            total_points_earned: value.total_points_earned.to_owned(),
            total_points_used: value.total_points_used.to_owned(),
            last_points_update: format!("{:?}", value.last_points_update),
            created_at: format!("{:?}", value.created_at),
        }
    }
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct PointsSummaryDto {
    pub current_points: i32,
    pub total_earned: i32,
    pub total_used: i32,
    pub last_update: String,
}

impl From<&models::PointsSummary> for PointsSummaryDto {
    fn from(value: &models::PointsSummary) -> Self {
        Self {
            current_points: value.current_points.to_owned(),
            total_earned: value.total_earned.to_owned(),
            total_used: value.total_used.to_owned(),
            last_update: format!("{:?}", value.last_update),
        }
    }
}

pub async fn get_user(
    mut state: RequestState,
    Path(id): Path<u64>,
) -> ServiceResult<Json<UserDto>> {
    state.session_require_self(id)?;

    let user = state.db.get_user_by_id(id).await?;

    if let Some(user) = user {
        return Ok(Json(UserDto::from(&user)));
    }

    Err(ServiceError::NotFound)
}

fn get_user_docs(op: TransformOperation) -> TransformOperation {
    op.description("Get a user by id.")
        .tag("users")
        .response::<200, Json<UserDto>>()
        .response_with::<404, (), _>(|res| res.description("The requested user does not exist!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["self"])
}

/// Profile edit. Email and password cannot be changed here.
#[derive(Debug, PartialEq, Deserialize, JsonSchema)]
pub struct UpdateUserDto {
    pub name: Option<String>,
    pub phone_number: Option<String>,
}

pub async fn update_user(
    mut state: RequestState,
    Path(id): Path<u64>,
    form: Json<UpdateUserDto>,
) -> ServiceResult<Json<UserDto>> {
    state.session_require_self(id)?;
    let form = form.0;

    let user = state.db.get_user_by_id(id).await?;
    let Some(mut user) = user else {
        return Err(ServiceError::NotFound);
    };

    if let Some(name) = form.name {
        if name.trim().len() < 2 {
            return Err(ServiceError::BadRequest(
                "Name must be at least 2 characters long".to_owned(),
            ));
        }
        user.name = name.trim().to_owned();
    }
    if let Some(phone_number) = form.phone_number {
        user.phone_number = Some(phone_number.trim().to_owned()).filter(|p| !p.is_empty());
    }

    let user = state.db.store_user(user).await?;
    Ok(Json(UserDto::from(&user)))
}

fn update_user_docs(op: TransformOperation) -> TransformOperation {
    op.description("Update the profile of a user.")
        .tag("users")
        .response::<200, Json<UserDto>>()
        .response_with::<400, (), _>(|res| res.description("Invalid profile data!"))
        .response_with::<404, (), _>(|res| res.description("The requested user does not exist!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["self"])
}
