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
        .api_route("/payment/:id", get_with(get_payment, get_payment_docs))
        .with_state(app_state)
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Copy, JsonSchema)]
pub enum PaymentMethodDto {
    Card,
    Cash,
}

impl From<&models::PaymentMethod> for PaymentMethodDto {
    fn from(value: &models::PaymentMethod) -> Self {
        match value {
            models::PaymentMethod::Card => PaymentMethodDto::Card,
            models::PaymentMethod::Cash => PaymentMethodDto::Cash,
        }
    }
}
impl From<PaymentMethodDto> for models::PaymentMethod {
    fn from(value: PaymentMethodDto) -> Self {
        match value {
            PaymentMethodDto::Card => models::PaymentMethod::Card,
            PaymentMethodDto::Cash => models::PaymentMethod::Cash,
        }
    }
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub enum PaymentStatusDto {
    Pending,
    Completed,
    Failed,
}

impl From<&models::PaymentStatus> for PaymentStatusDto {
    fn from(value: &models::PaymentStatus) -> Self {
        match value {
            models::PaymentStatus::Pending => PaymentStatusDto::Pending,
            models::PaymentStatus::Completed => PaymentStatusDto::Completed,
            models::PaymentStatus::Failed => PaymentStatusDto::Failed,
        }
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, JsonSchema)]
pub struct CardDetailsDto {
    pub last4: String,
    pub expiry: String,
}

impl From<&models::CardDetails> for CardDetailsDto {
    fn from(value: &models::CardDetails) -> Self {
        Self {
            last4: value.last4.to_owned(),
            expiry: value.expiry.to_owned(),
        }
    }
}
impl From<CardDetailsDto> for models::CardDetails {
    fn from(value: CardDetailsDto) -> Self {
        Self {
            last4: value.last4,
            expiry: value.expiry,
        }
    }
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct PaymentDto {
    pub id: u64,
    pub order_id: u64,
    pub account_id: u64,
    pub amount: f64,
    pub method: PaymentMethodDto,
    pub status: PaymentStatusDto,
    pub card_details: Option<CardDetailsDto>,
    pub created_at: String,
}

impl From<&models::Payment> for PaymentDto {
    fn from(value: &models::Payment) -> Self {
        Self {
            id: value.id.to_owned(),
            order_id: value.order_id.to_owned(),
            account_id: value.account_id.to_owned(),
            amount: models::cents_to_dollars(value.amount_cents),
            method: (&value.method).into(),
            status: (&value.status).into(),
            card_details: value.card_details.as_ref().map(|c| c.into()),
            created_at: format!("{:?}", value.created_at),
        }
    }
}

pub async fn get_payment(
    mut state: RequestState,
    Path(id): Path<u64>,
) -> ServiceResult<Json<PaymentDto>> {
    let payment = state.db.get_payment_by_id(id).await?;

    if let Some(payment) = payment {
        state.session_require_self(payment.account_id)?;
        return Ok(Json(PaymentDto::from(&payment)));
    }

    Err(ServiceError::NotFound)
}

fn get_payment_docs(op: TransformOperation) -> TransformOperation {
    op.description("Get a payment by id.")
        .tag("orders")
        .response::<200, Json<PaymentDto>>()
        .response_with::<404, (), _>(|res| res.description("The requested payment does not exist!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["self"])
}
