use aide::axum::routing::{get_with, patch_with};
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::Path;
use axum::Json;
use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::database::AppState;
use crate::error::ServiceResult;
use crate::models;
use crate::request_state::RequestState;

pub fn router(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .api_route(
            "/user/points",
            patch_with(adjust_points, adjust_points_docs),
        )
        .api_route(
            "/user/:id/points-history",
            get_with(list_points_history, list_points_history_docs),
        )
        .with_state(app_state)
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub enum PointsEntryTypeDto {
    Earned,
    Used,
}

impl From<&models::PointsEntryType> for PointsEntryTypeDto {
    fn from(value: &models::PointsEntryType) -> Self {
        match value {
            models::PointsEntryType::Earned => PointsEntryTypeDto::Earned,
            models::PointsEntryType::Used => PointsEntryTypeDto::Used,
        }
    }
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct PointsEntryDto {
    pub id: u64,
    pub points: i32,
    pub entry_type: PointsEntryTypeDto,
    pub description: String,
    pub order_id: Option<u64>,
    pub timestamp: String,
}

impl From<&models::PointsEntry> for PointsEntryDto {
    fn from(value: &models::PointsEntry) -> Self {
        Self {
            id: value.id.to_owned(),
            points: value.points.to_owned(),
            entry_type: (&value.entry_type).into(),
            description: value.description.to_owned(),
            order_id: value.order_id.to_owned(),
            timestamp: format!("{:?}", value.timestamp),
        }
    }
}

#[derive(Debug, PartialEq, Deserialize, JsonSchema)]
pub struct AdjustPointsDto {
    /// Signed point delta, negative values redeem points.
    pub points: i32,
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct PointsBalanceDto {
    pub points: i32,
}

async fn adjust_points(
    mut state: RequestState,
    form: Json<AdjustPointsDto>,
) -> ServiceResult<Json<PointsBalanceDto>> {
    let session = state.session_require()?;

    let points = state
        .db
        .adjust_points(session.user.id, form.0.points, Utc::now())
        .await?;

    Ok(Json(PointsBalanceDto { points }))
}

fn adjust_points_docs(op: TransformOperation) -> TransformOperation {
    op.description("Apply a signed point delta to the logged in user. The balance never drops below zero.")
        .tag("points")
        .response::<200, Json<PointsBalanceDto>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement_scopes("SessionToken", ["self"])
}

pub async fn list_points_history(
    mut state: RequestState,
    Path(id): Path<u64>,
) -> ServiceResult<Json<Vec<PointsEntryDto>>> {
    state.session_require_self(id)?;

    let entries = state.db.get_points_history_by_account(id).await?;
    Ok(Json(entries.iter().map(|e| e.into()).collect()))
}

fn list_points_history_docs(op: TransformOperation) -> TransformOperation {
    op.description("List the latest point ledger entries for the given user, newest first.")
        .tag("points")
        .response::<200, Json<Vec<PointsEntryDto>>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["self"])
}
