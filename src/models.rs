use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::error::{ServiceError, ServiceResult};

/// Tables that can be reserved. Orders and reservations outside this range are rejected.
pub const MIN_TABLE_NUMBER: i32 = 1;
pub const MAX_TABLE_NUMBER: i32 = 50;

pub const MIN_PARTY_SIZE: i32 = 1;
pub const MAX_PARTY_SIZE: i32 = 20;

#[derive(Debug, PartialEq, Clone)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub password_hash: Vec<u8>,
    pub phone_number: Option<String>,
    pub points: i32,
    pub total_points_earned: i32,
    pub total_points_used: i32,
    pub last_points_update: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn points_summary(&self) -> PointsSummary {
        PointsSummary {
            current_points: self.points,
            total_earned: self.total_points_earned,
            total_used: self.total_points_used,
            last_update: self.last_points_update,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct PointsSummary {
    pub current_points: i32,
    pub total_earned: i32,
    pub total_used: i32,
    pub last_update: DateTime<Utc>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
    pub valid_until: DateTime<Utc>,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> ServiceResult<Self> {
        match value {
            "pending" => Ok(OrderStatus::Pending),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(ServiceError::InternalServerError(format!(
                "Unknown order status '{other}'."
            ))),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct OrderItem {
    pub name: String,
    pub price_cents: i32,
    pub quantity: i32,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Order {
    pub id: u64,
    pub order_number: String,
    pub account_id: u64,
    pub items: Vec<OrderItem>,
    pub total_cents: i32,
    pub status: OrderStatus,
    pub points_earned: i32,
    pub points_used: i32,
    pub table_number: i32,
    pub special_instructions: Option<String>,
    pub payment_id: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Human readable order number, unique per order.
    pub fn generate_order_number(timestamp: DateTime<Utc>) -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(5)
            .map(|c| (c as char).to_ascii_lowercase())
            .collect();
        format!("ORD{}{}", timestamp.timestamp_millis(), suffix)
    }
}

/// Order request as accepted by the order placement service.
///
/// The total is never taken from the client, see `total_cents`.
#[derive(Debug, PartialEq, Clone)]
pub struct Checkout {
    pub account_id: u64,
    pub items: Vec<OrderItem>,
    pub points_used: i32,
    pub table_number: i32,
    pub special_instructions: Option<String>,
}

impl Checkout {
    /// Order total in cents, recomputed from the line items.
    pub fn total_cents(&self) -> i32 {
        self.items
            .iter()
            .map(|item| i64::from(item.price_cents) * i64::from(item.quantity))
            .sum::<i64>() as i32
    }

    pub fn validate(&self) -> ServiceResult<()> {
        if self.items.is_empty() {
            return Err(ServiceError::BadRequest(
                "Order must contain at least one item".to_owned(),
            ));
        }
        for item in &self.items {
            if item.name.trim().is_empty() {
                return Err(ServiceError::BadRequest(
                    "Order item name must not be empty".to_owned(),
                ));
            }
            if item.price_cents < 0 {
                return Err(ServiceError::BadRequest(
                    "Order item price must not be negative".to_owned(),
                ));
            }
            if item.quantity < 1 {
                return Err(ServiceError::BadRequest(
                    "Order item quantity must be at least 1".to_owned(),
                ));
            }
        }
        let total: i64 = self
            .items
            .iter()
            .map(|item| i64::from(item.price_cents) * i64::from(item.quantity))
            .sum();
        if total > i64::from(i32::MAX) {
            return Err(ServiceError::BadRequest(
                "Order total is out of range".to_owned(),
            ));
        }
        if self.points_used < 0 {
            return Err(ServiceError::BadRequest(
                "Invalid points value".to_owned(),
            ));
        }
        if !(MIN_TABLE_NUMBER..=MAX_TABLE_NUMBER).contains(&self.table_number) {
            return Err(ServiceError::BadRequest(
                "Invalid table number".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Result of a successful order placement.
#[derive(Debug, PartialEq, Clone)]
pub struct CheckoutReceipt {
    pub order: Order,
    pub points: i32,
    pub points_earned: i32,
    pub points_used: i32,
    pub summary: PointsSummary,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum PointsEntryType {
    Earned,
    Used,
}

impl PointsEntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointsEntryType::Earned => "earned",
            PointsEntryType::Used => "used",
        }
    }

    pub fn parse(value: &str) -> ServiceResult<Self> {
        match value {
            "earned" => Ok(PointsEntryType::Earned),
            "used" => Ok(PointsEntryType::Used),
            other => Err(ServiceError::InternalServerError(format!(
                "Unknown points entry type '{other}'."
            ))),
        }
    }
}

/// One immutable ledger row. Entries are only ever inserted.
#[derive(Debug, PartialEq, Clone)]
pub struct PointsEntry {
    pub id: u64,
    pub account_id: u64,
    pub points: i32,
    pub entry_type: PointsEntryType,
    pub description: String,
    pub order_id: Option<u64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum PaymentMethod {
    Card,
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Cash => "cash",
        }
    }

    pub fn parse(value: &str) -> ServiceResult<Self> {
        match value {
            "card" => Ok(PaymentMethod::Card),
            "cash" => Ok(PaymentMethod::Cash),
            other => Err(ServiceError::InternalServerError(format!(
                "Unknown payment method '{other}'."
            ))),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> ServiceResult<Self> {
        match value {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(ServiceError::InternalServerError(format!(
                "Unknown payment status '{other}'."
            ))),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct CardDetails {
    pub last4: String,
    pub expiry: String,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Payment {
    pub id: u64,
    pub order_id: u64,
    pub account_id: u64,
    pub amount_cents: i32,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub card_details: Option<CardDetails>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> ServiceResult<Self> {
        match value {
            "pending" => Ok(ReservationStatus::Pending),
            "confirmed" => Ok(ReservationStatus::Confirmed),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            other => Err(ServiceError::InternalServerError(format!(
                "Unknown reservation status '{other}'."
            ))),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Reservation {
    pub id: u64,
    pub account_id: Option<u64>,
    pub name: String,
    pub phone_number: String,
    pub date: NaiveDate,
    pub time: String,
    pub table_number: i32,
    pub party_size: i32,
    pub special_requests: Option<String>,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
}

/// Reservation request as accepted by the reservation service.
#[derive(Debug, PartialEq, Clone)]
pub struct ReservationRequest {
    pub account_id: Option<u64>,
    pub name: String,
    pub phone_number: String,
    pub date: NaiveDate,
    pub time: String,
    pub table_number: i32,
    pub party_size: i32,
    pub special_requests: Option<String>,
}

impl ReservationRequest {
    pub fn validate(&self, today: NaiveDate) -> ServiceResult<()> {
        if self.name.trim().is_empty() {
            return Err(ServiceError::BadRequest("Name is required".to_owned()));
        }
        if self.phone_number.trim().is_empty() {
            return Err(ServiceError::BadRequest(
                "Phone number is required".to_owned(),
            ));
        }
        if NaiveTime::parse_from_str(&self.time, "%H:%M").is_err() {
            return Err(ServiceError::BadRequest(
                "Time must use the format HH:MM".to_owned(),
            ));
        }
        if self.date < today {
            return Err(ServiceError::BadRequest(
                "Reservation date must be in the future".to_owned(),
            ));
        }
        if !(MIN_TABLE_NUMBER..=MAX_TABLE_NUMBER).contains(&self.table_number) {
            return Err(ServiceError::BadRequest(
                "Invalid table number".to_owned(),
            ));
        }
        if !(MIN_PARTY_SIZE..=MAX_PARTY_SIZE).contains(&self.party_size) {
            return Err(ServiceError::BadRequest(
                "Party size must be between 1 and 20".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Convert a dollar amount from the json interface into cents.
///
/// Rejects negative and non-finite values instead of trusting the client.
pub fn dollars_to_cents(value: f64) -> ServiceResult<i32> {
    if !value.is_finite() || value < 0.0 {
        return Err(ServiceError::BadRequest(
            "Invalid price value".to_owned(),
        ));
    }
    let cents = (value * 100.0).round();
    if cents > f64::from(i32::MAX) {
        return Err(ServiceError::BadRequest(
            "Price value is out of range".to_owned(),
        ));
    }
    Ok(cents as i32)
}

pub fn cents_to_dollars(cents: i32) -> f64 {
    f64::from(cents) / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkout(items: Vec<OrderItem>) -> Checkout {
        Checkout {
            account_id: 1,
            items,
            points_used: 0,
            table_number: 7,
            special_instructions: None,
        }
    }

    #[test]
    fn total_is_recomputed_from_line_items() {
        let checkout = checkout(vec![
            OrderItem {
                name: "Margherita".to_owned(),
                price_cents: 1000,
                quantity: 2,
            },
            OrderItem {
                name: "Espresso".to_owned(),
                price_cents: 500,
                quantity: 1,
            },
        ]);
        assert_eq!(checkout.total_cents(), 2500);
        assert!(checkout.validate().is_ok());
    }

    #[test]
    fn empty_orders_are_rejected() {
        let checkout = checkout(vec![]);
        assert_eq!(
            checkout.validate(),
            Err(ServiceError::BadRequest(
                "Order must contain at least one item".to_owned()
            ))
        );
    }

    #[test]
    fn non_positive_quantities_are_rejected() {
        let checkout = checkout(vec![OrderItem {
            name: "Espresso".to_owned(),
            price_cents: 500,
            quantity: 0,
        }]);
        assert!(checkout.validate().is_err());
    }

    #[test]
    fn table_number_must_be_in_reservation_range() {
        let mut invalid = checkout(vec![OrderItem {
            name: "Espresso".to_owned(),
            price_cents: 500,
            quantity: 1,
        }]);
        invalid.table_number = 51;
        assert!(invalid.validate().is_err());
        invalid.table_number = 0;
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn dollar_conversion_rounds_to_cents() {
        assert_eq!(dollars_to_cents(10.0).unwrap(), 1000);
        assert_eq!(dollars_to_cents(10.555).unwrap(), 1056);
        assert_eq!(dollars_to_cents(0.0).unwrap(), 0);
        assert!(dollars_to_cents(-1.0).is_err());
        assert!(dollars_to_cents(f64::NAN).is_err());
        assert_eq!(cents_to_dollars(2500), 25.0);
    }
}
