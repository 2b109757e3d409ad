use aide::axum::routing::{get_with, post_with, put_with};
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use aide::OperationOutput;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::database::AppState;
use crate::error::{ServiceError, ServiceResult};
use crate::models;
use crate::request_state::RequestState;

use super::payments::{CardDetailsDto, PaymentDto, PaymentMethodDto};
use super::users::PointsSummaryDto;

pub fn router(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .api_route("/orders", post_with(create_order, create_order_docs))
        .api_route(
            "/orders/user/:id",
            get_with(list_orders, list_orders_docs),
        )
        .api_route(
            "/orders/user/:id/completed",
            get_with(list_completed_orders, list_completed_orders_docs),
        )
        .api_route("/order/:id", get_with(get_order, get_order_docs))
        .api_route(
            "/order/:id/status",
            put_with(update_order_status, update_order_status_docs),
        )
        .api_route(
            "/order/:id/complete",
            post_with(complete_order, complete_order_docs),
        )
        .with_state(app_state)
}

#[derive(Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OrderItemDto {
    pub name: String,
    /// Unit price in dollars.
    pub price: f64,
    pub quantity: i32,
}

impl From<&models::OrderItem> for OrderItemDto {
    fn from(value: &models::OrderItem) -> Self {
        Self {
            name: value.name.to_owned(),
            price: models::cents_to_dollars(value.price_cents),
            quantity: value.quantity.to_owned(),
        }
    }
}

impl TryFrom<OrderItemDto> for models::OrderItem {
    type Error = ServiceError;

    fn try_from(value: OrderItemDto) -> ServiceResult<Self> {
        Ok(Self {
            name: value.name,
            price_cents: models::dollars_to_cents(value.price)?,
            quantity: value.quantity,
        })
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Copy, JsonSchema)]
pub enum OrderStatusDto {
    Pending,
    Completed,
    Cancelled,
}

impl From<&models::OrderStatus> for OrderStatusDto {
    fn from(value: &models::OrderStatus) -> Self {
        match value {
            models::OrderStatus::Pending => OrderStatusDto::Pending,
            models::OrderStatus::Completed => OrderStatusDto::Completed,
            models::OrderStatus::Cancelled => OrderStatusDto::Cancelled,
        }
    }
}
impl From<OrderStatusDto> for models::OrderStatus {
    fn from(value: OrderStatusDto) -> Self {
        match value {
            OrderStatusDto::Pending => models::OrderStatus::Pending,
            OrderStatusDto::Completed => models::OrderStatus::Completed,
            OrderStatusDto::Cancelled => models::OrderStatus::Cancelled,
        }
    }
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct OrderDto {
    pub id: u64,
    pub order_number: String,
    pub account_id: u64,
    pub items: Vec<OrderItemDto>,
    /// Total in dollars, always recomputed from the line items.
    pub total_amount: f64,
    pub status: OrderStatusDto,
    pub points_earned: i32,
    pub points_used: i32,
    pub table_number: i32,
    pub special_instructions: Option<String>,
    pub payment_id: Option<u64>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

impl From<&models::Order> for OrderDto {
    fn from(value: &models::Order) -> Self {
        Self {
            id: value.id.to_owned(),
            order_number: value.order_number.to_owned(),
            account_id: value.account_id.to_owned(),
            items: value.items.iter().map(|i| i.into()).collect(),
            total_amount: models::cents_to_dollars(value.total_cents),
            status: (&value.status).into(),
            points_earned: value.points_earned.to_owned(),
            points_used: value.points_used.to_owned(),
            table_number: value.table_number.to_owned(),
            special_instructions: value.special_instructions.to_owned(),
            payment_id: value.payment_id.to_owned(),
            created_at: format!("{:?}", value.created_at),
            completed_at: value.completed_at.map(|t| format!("{t:?}")),
        }
    }
}

#[derive(Debug, PartialEq, Deserialize, JsonSchema)]
pub struct CreateOrderDto {
    pub items: Vec<OrderItemDto>,
    /// Ignored. The total is recomputed from the line items on the server.
    pub total_amount: Option<f64>,
    pub points_used: Option<i32>,
    pub table_number: i32,
    pub special_instructions: Option<String>,
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct CheckoutResponseDto {
    pub order: OrderDto,
    pub points: i32,
    pub points_earned: i32,
    pub points_used: i32,
    pub points_summary: PointsSummaryDto,
}

impl OperationOutput for CheckoutResponseDto {
    type Inner = CheckoutResponseDto;
}
impl IntoResponse for CheckoutResponseDto {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::CREATED, Json(self)).into_response()
    }
}

async fn create_order(
    mut state: RequestState,
    form: Json<CreateOrderDto>,
) -> ServiceResult<CheckoutResponseDto> {
    let session = state.session_require()?;
    let form = form.0;

    let items = form
        .items
        .into_iter()
        .map(models::OrderItem::try_from)
        .collect::<ServiceResult<Vec<_>>>()?;

    let checkout = models::Checkout {
        account_id: session.user.id,
        items,
        points_used: form.points_used.unwrap_or(0),
        table_number: form.table_number,
        special_instructions: form.special_instructions,
    };

    let receipt = state.db.place_order(checkout, Utc::now()).await?;

    Ok(CheckoutResponseDto {
        order: OrderDto::from(&receipt.order),
        points: receipt.points,
        points_earned: receipt.points_earned,
        points_used: receipt.points_used,
        points_summary: PointsSummaryDto::from(&receipt.summary),
    })
}

fn create_order_docs(op: TransformOperation) -> TransformOperation {
    op.description("Place an order for the logged in user and settle its loyalty points.")
        .tag("orders")
        .response::<201, Json<CheckoutResponseDto>>()
        .response_with::<400, (), _>(|res| {
            res.description("Invalid order data or not enough points available!")
        })
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<500, (), _>(|res| res.description("The order transaction was aborted!"))
        .security_requirement_scopes("SessionToken", ["self"])
}

pub async fn list_orders(
    mut state: RequestState,
    Path(id): Path<u64>,
) -> ServiceResult<Json<Vec<OrderDto>>> {
    state.session_require_self(id)?;

    let orders = state.db.get_orders_by_account(id).await?;
    Ok(Json(orders.iter().map(|o| o.into()).collect()))
}

fn list_orders_docs(op: TransformOperation) -> TransformOperation {
    op.description("List all orders of the given user, newest first.")
        .tag("orders")
        .response::<200, Json<Vec<OrderDto>>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["self"])
}

pub async fn list_completed_orders(
    mut state: RequestState,
    Path(id): Path<u64>,
) -> ServiceResult<Json<Vec<OrderDto>>> {
    state.session_require_self(id)?;

    let orders = state.db.get_completed_orders_by_account(id).await?;
    Ok(Json(orders.iter().map(|o| o.into()).collect()))
}

fn list_completed_orders_docs(op: TransformOperation) -> TransformOperation {
    op.description("List the last completed orders of the given user.")
        .tag("orders")
        .response::<200, Json<Vec<OrderDto>>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["self"])
}

pub async fn get_order(
    mut state: RequestState,
    Path(id): Path<u64>,
) -> ServiceResult<Json<OrderDto>> {
    let order = state.db.get_order_by_id(id).await?;

    if let Some(order) = order {
        state.session_require_self(order.account_id)?;
        return Ok(Json(OrderDto::from(&order)));
    }

    Err(ServiceError::NotFound)
}

fn get_order_docs(op: TransformOperation) -> TransformOperation {
    op.description("Get an order by id.")
        .tag("orders")
        .response::<200, Json<OrderDto>>()
        .response_with::<404, (), _>(|res| res.description("The requested order does not exist!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["self"])
}

#[derive(Debug, PartialEq, Deserialize, JsonSchema)]
pub struct UpdateOrderStatusDto {
    pub status: OrderStatusDto,
}

pub async fn update_order_status(
    mut state: RequestState,
    Path(id): Path<u64>,
    form: Json<UpdateOrderStatusDto>,
) -> ServiceResult<Json<OrderDto>> {
    let order = state.db.get_order_by_id(id).await?;
    let Some(order) = order else {
        return Err(ServiceError::NotFound);
    };
    state.session_require_self(order.account_id)?;

    let order = state.db.update_order_status(id, form.0.status.into()).await?;
    Ok(Json(OrderDto::from(&order)))
}

fn update_order_status_docs(op: TransformOperation) -> TransformOperation {
    op.description("Update the status of an order.")
        .tag("orders")
        .response::<200, Json<OrderDto>>()
        .response_with::<404, (), _>(|res| res.description("The requested order does not exist!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["self"])
}

#[derive(Debug, PartialEq, Deserialize, JsonSchema)]
pub struct CompleteOrderDto {
    pub payment_method: PaymentMethodDto,
    pub card_details: Option<CardDetailsDto>,
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct CompleteOrderResponseDto {
    pub order: OrderDto,
    pub payment: PaymentDto,
    pub points: i32,
}

pub async fn complete_order(
    mut state: RequestState,
    Path(id): Path<u64>,
    form: Json<CompleteOrderDto>,
) -> ServiceResult<Json<CompleteOrderResponseDto>> {
    let session = state.session_require()?;
    let form = form.0;

    // card details are only kept for card payments
    let card_details = match form.payment_method {
        PaymentMethodDto::Card => form.card_details.map(|c| c.into()),
        PaymentMethodDto::Cash => None,
    };

    let (order, payment) = state
        .db
        .complete_order(
            id,
            session.user.id,
            form.payment_method.into(),
            card_details,
            Utc::now(),
        )
        .await?;

    let user = state.db.get_user_by_id(session.user.id).await?;

    Ok(Json(CompleteOrderResponseDto {
        order: OrderDto::from(&order),
        payment: PaymentDto::from(&payment),
        points: user.map(|u| u.points).unwrap_or(0),
    }))
}

fn complete_order_docs(op: TransformOperation) -> TransformOperation {
    op.description("Complete the payment for a pending order.")
        .tag("orders")
        .response::<200, Json<CompleteOrderResponseDto>>()
        .response_with::<400, (), _>(|res| res.description("The order is not pending!"))
        .response_with::<404, (), _>(|res| res.description("The requested order does not exist!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<500, (), _>(|res| res.description("The payment transaction was aborted!"))
        .security_requirement_scopes("SessionToken", ["self"])
}
