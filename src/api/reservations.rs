use aide::axum::routing::{delete_with, get_with, post_with, put_with};
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use aide::OperationOutput;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::database::AppState;
use crate::error::{ServiceError, ServiceResult};
use crate::models;
use crate::request_state::RequestState;

pub fn router(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .api_route(
            "/reservations",
            post_with(create_reservation, create_reservation_docs),
        )
        .api_route(
            "/reservations/user/:id",
            get_with(list_reservations, list_reservations_docs),
        )
        .api_route(
            "/reservation/:id/status",
            put_with(update_reservation_status, update_reservation_status_docs),
        )
        .api_route(
            "/reservation/:id",
            delete_with(cancel_reservation, cancel_reservation_docs),
        )
        .with_state(app_state)
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Copy, JsonSchema)]
pub enum ReservationStatusDto {
    Pending,
    Confirmed,
    Cancelled,
}

impl From<&models::ReservationStatus> for ReservationStatusDto {
    fn from(value: &models::ReservationStatus) -> Self {
        match value {
            models::ReservationStatus::Pending => ReservationStatusDto::Pending,
            models::ReservationStatus::Confirmed => ReservationStatusDto::Confirmed,
            models::ReservationStatus::Cancelled => ReservationStatusDto::Cancelled,
        }
    }
}
impl From<ReservationStatusDto> for models::ReservationStatus {
    fn from(value: ReservationStatusDto) -> Self {
        match value {
            ReservationStatusDto::Pending => models::ReservationStatus::Pending,
            ReservationStatusDto::Confirmed => models::ReservationStatus::Confirmed,
            ReservationStatusDto::Cancelled => models::ReservationStatus::Cancelled,
        }
    }
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct ReservationDto {
    pub id: u64,
    pub account_id: Option<u64>,
    pub name: String,
    pub phone_number: String,
    pub date: NaiveDate,
    pub time: String,
    pub table_number: i32,
    pub party_size: i32,
    pub special_requests: Option<String>,
    pub status: ReservationStatusDto,
    pub created_at: String,
}

impl From<&models::Reservation> for ReservationDto {
    fn from(value: &models::Reservation) -> Self {
        Self {
            id: value.id.to_owned(),
            account_id: value.account_id.to_owned(),
            name: value.name.to_owned(),
            phone_number: value.phone_number.to_owned(),
            date: value.date.to_owned(),
            time: value.time.to_owned(),
            table_number: value.table_number.to_owned(),
            party_size: value.party_size.to_owned(),
            special_requests: value.special_requests.to_owned(),
            status: (&value.status).into(),
            created_at: format!("{:?}", value.created_at),
        }
    }
}

/// Same payload as `ReservationDto` but answers with `201 Created`.
pub struct ReservationCreatedDto(pub ReservationDto);

impl OperationOutput for ReservationCreatedDto {
    type Inner = ReservationDto;
}
impl IntoResponse for ReservationCreatedDto {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::CREATED, Json(self.0)).into_response()
    }
}

#[derive(Debug, PartialEq, Deserialize, JsonSchema)]
pub struct CreateReservationDto {
    pub date: NaiveDate,
    /// Time of day in the format HH:MM.
    pub time: String,
    pub table_number: i32,
    pub party_size: i32,
    pub name: String,
    pub phone_number: String,
    pub special_requests: Option<String>,
}

async fn create_reservation(
    mut state: RequestState,
    form: Json<CreateReservationDto>,
) -> ServiceResult<ReservationCreatedDto> {
    let form = form.0;

    // a reservation does not require a login, but a logged in caller owns it
    let account_id = state.session.as_ref().map(|session| session.user.id);

    let request = models::ReservationRequest {
        account_id,
        name: form.name.trim().to_owned(),
        phone_number: form.phone_number.trim().to_owned(),
        date: form.date,
        time: form.time,
        table_number: form.table_number,
        party_size: form.party_size,
        special_requests: form.special_requests,
    };
    request.validate(Utc::now().date_naive())?;

    let reservation = state.db.create_reservation(request).await?;
    Ok(ReservationCreatedDto(ReservationDto::from(&reservation)))
}

fn create_reservation_docs(op: TransformOperation) -> TransformOperation {
    op.description("Reserve a table. The same table cannot be booked twice for one slot.")
        .tag("reservations")
        .response::<201, Json<ReservationDto>>()
        .response_with::<400, (), _>(|res| {
            res.description("Invalid reservation data or the table is already reserved!")
        })
}

pub async fn list_reservations(
    mut state: RequestState,
    Path(id): Path<u64>,
) -> ServiceResult<Json<Vec<ReservationDto>>> {
    state.session_require_self(id)?;

    let reservations = state.db.get_reservations_by_account(id).await?;
    Ok(Json(reservations.iter().map(|r| r.into()).collect()))
}

fn list_reservations_docs(op: TransformOperation) -> TransformOperation {
    op.description("List all reservations of the given user ordered by slot.")
        .tag("reservations")
        .response::<200, Json<Vec<ReservationDto>>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["self"])
}

#[derive(Debug, PartialEq, Deserialize, JsonSchema)]
pub struct UpdateReservationStatusDto {
    pub status: ReservationStatusDto,
}

async fn load_owned_reservation(
    state: &mut RequestState,
    id: u64,
) -> ServiceResult<models::Reservation> {
    let session = state.session_require()?;

    let reservation = state.db.get_reservation_by_id(id).await?;
    let Some(reservation) = reservation else {
        return Err(ServiceError::NotFound);
    };
    // anonymous reservations cannot be modified over the api
    if reservation.account_id != Some(session.user.id) {
        return Err(ServiceError::NotFound);
    }

    Ok(reservation)
}

pub async fn update_reservation_status(
    mut state: RequestState,
    Path(id): Path<u64>,
    form: Json<UpdateReservationStatusDto>,
) -> ServiceResult<Json<ReservationDto>> {
    let reservation = load_owned_reservation(&mut state, id).await?;

    let reservation = state
        .db
        .update_reservation_status(reservation.id, form.0.status.into())
        .await?;
    Ok(Json(ReservationDto::from(&reservation)))
}

fn update_reservation_status_docs(op: TransformOperation) -> TransformOperation {
    op.description("Update the status of a reservation.")
        .tag("reservations")
        .response::<200, Json<ReservationDto>>()
        .response_with::<400, (), _>(|res| {
            res.description("The reservation slot is no longer available!")
        })
        .response_with::<404, (), _>(|res| {
            res.description("The requested reservation does not exist!")
        })
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement_scopes("SessionToken", ["self"])
}

pub async fn cancel_reservation(
    mut state: RequestState,
    Path(id): Path<u64>,
) -> ServiceResult<Json<ReservationDto>> {
    let reservation = load_owned_reservation(&mut state, id).await?;

    // cancellation is a status transition, the row is kept for the audit trail
    let reservation = state
        .db
        .update_reservation_status(reservation.id, models::ReservationStatus::Cancelled)
        .await?;
    Ok(Json(ReservationDto::from(&reservation)))
}

fn cancel_reservation_docs(op: TransformOperation) -> TransformOperation {
    op.description("Cancel a reservation and free its slot.")
        .tag("reservations")
        .response::<200, Json<ReservationDto>>()
        .response_with::<404, (), _>(|res| {
            res.description("The requested reservation does not exist!")
        })
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement_scopes("SessionToken", ["self"])
}
