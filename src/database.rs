use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use log::warn;
use rand::Rng;
use sqlx::migrate::Migrator;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Connection, Pool, Postgres, Row};

use base64::engine::general_purpose;
use base64::Engine;

use crate::error::{ServiceError, ServiceResult};
use crate::models;
use crate::points::PointsBreakdown;

mod migration;

#[cfg(test)]
mod tests;

/// Page size of the points history read path.
pub const POINTS_HISTORY_PAGE_SIZE: i64 = 20;

/// Page size of the completed order history.
pub const COMPLETED_ORDERS_PAGE_SIZE: i64 = 10;

#[derive(Clone)]
pub struct AppState {
    pub pool: Pool<Postgres>,
}

impl AppState {
    /// Connect to the database with a bounded number of attempts and run all
    /// pending migrations. Only used at process startup, requests never retry.
    pub async fn connect(url: &str, retries: u32) -> ServiceResult<AppState> {
        let mut attempt = 0;
        let pool = loop {
            attempt += 1;
            match PgPoolOptions::new().max_connections(5).connect(url).await {
                Ok(pool) => break pool,
                Err(error) if attempt < retries => {
                    warn!(
                        "Database connection failed (attempt {attempt}/{retries}): {error}"
                    );
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
                Err(error) => return Err(error.into()),
            }
        };

        Self::migrate(&pool).await?;
        Ok(AppState { pool })
    }

    pub async fn from_pool(pool: Pool<Postgres>) -> ServiceResult<AppState> {
        Self::migrate(&pool).await?;
        Ok(AppState { pool })
    }

    async fn migrate(pool: &Pool<Postgres>) -> ServiceResult<()> {
        let migrator = Migrator::new(migration::postgresql_migrations())
            .await
            .map_err(|e| ServiceError::InternalServerError(e.to_string()))?;
        migrator
            .run(pool)
            .await
            .map_err(|e| ServiceError::InternalServerError(e.to_string()))?;
        Ok(())
    }
}

pub struct DatabaseConnection {
    pub connection: PoolConnection<Postgres>,
}

/// Failures inside an atomic write sequence abort the whole unit of work.
fn aborted(error: sqlx::Error) -> ServiceError {
    ServiceError::TransactionAborted(error.to_string())
}

fn is_unique_violation(error: &sqlx::Error, constraint: &str) -> bool {
    match error {
        sqlx::Error::Database(db_error) => db_error.constraint() == Some(constraint),
        _ => false,
    }
}

fn user_from_row(row: &PgRow) -> ServiceResult<models::User> {
    Ok(models::User {
        id: row.try_get::<i64, _>("id")? as u64,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        phone_number: row.try_get("phone_number")?,
        points: row.try_get("points")?,
        total_points_earned: row.try_get("total_points_earned")?,
        total_points_used: row.try_get("total_points_used")?,
        last_points_update: row.try_get("last_points_update")?,
        created_at: row.try_get("created_at")?,
    })
}

fn order_from_row(row: &PgRow, items: Vec<models::OrderItem>) -> ServiceResult<models::Order> {
    Ok(models::Order {
        id: row.try_get::<i64, _>("id")? as u64,
        order_number: row.try_get("order_number")?,
        account_id: row.try_get::<i64, _>("account_id")? as u64,
        items,
        total_cents: row.try_get("total_cents")?,
        status: models::OrderStatus::parse(row.try_get("status")?)?,
        points_earned: row.try_get("points_earned")?,
        points_used: row.try_get("points_used")?,
        table_number: row.try_get("table_number")?,
        special_instructions: row.try_get("special_instructions")?,
        payment_id: row
            .try_get::<Option<i64>, _>("payment_id")?
            .map(|id| id as u64),
        created_at: row.try_get("created_at")?,
        completed_at: row.try_get("completed_at")?,
    })
}

fn points_entry_from_row(row: &PgRow) -> ServiceResult<models::PointsEntry> {
    Ok(models::PointsEntry {
        id: row.try_get::<i64, _>("id")? as u64,
        account_id: row.try_get::<i64, _>("account_id")? as u64,
        points: row.try_get("points")?,
        entry_type: models::PointsEntryType::parse(row.try_get("entry_type")?)?,
        description: row.try_get("description")?,
        order_id: row
            .try_get::<Option<i64>, _>("order_id")?
            .map(|id| id as u64),
        timestamp: row.try_get("created_at")?,
    })
}

fn payment_from_row(row: &PgRow) -> ServiceResult<models::Payment> {
    let last4: Option<String> = row.try_get("card_last4")?;
    let expiry: Option<String> = row.try_get("card_expiry")?;
    let card_details = match (last4, expiry) {
        (Some(last4), Some(expiry)) => Some(models::CardDetails { last4, expiry }),
        _ => None,
    };

    Ok(models::Payment {
        id: row.try_get::<i64, _>("id")? as u64,
        order_id: row.try_get::<i64, _>("order_id")? as u64,
        account_id: row.try_get::<i64, _>("account_id")? as u64,
        amount_cents: row.try_get("amount_cents")?,
        method: models::PaymentMethod::parse(row.try_get("method")?)?,
        status: models::PaymentStatus::parse(row.try_get("status")?)?,
        card_details,
        created_at: row.try_get("created_at")?,
    })
}

fn reservation_from_row(row: &PgRow) -> ServiceResult<models::Reservation> {
    Ok(models::Reservation {
        id: row.try_get::<i64, _>("id")? as u64,
        account_id: row
            .try_get::<Option<i64>, _>("account_id")?
            .map(|id| id as u64),
        name: row.try_get("name")?,
        phone_number: row.try_get("phone_number")?,
        date: row.try_get("reservation_date")?,
        time: row.try_get("reservation_time")?,
        table_number: row.try_get("table_number")?,
        party_size: row.try_get("party_size")?,
        special_requests: row.try_get("special_requests")?,
        status: models::ReservationStatus::parse(row.try_get("status")?)?,
        created_at: row.try_get("created_at")?,
    })
}

impl DatabaseConnection {
    pub async fn store_user(&mut self, user: models::User) -> ServiceResult<models::User> {
        let result = if user.id == 0 {
            sqlx::query(
                r#"
                INSERT INTO account (name, email, password_hash, phone_number)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
            )
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.phone_number)
            .fetch_one(&mut *self.connection)
            .await
        } else {
            sqlx::query(
                r#"
                UPDATE account
                SET name = $2, email = $3, password_hash = $4, phone_number = $5
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(user.id as i64)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.phone_number)
            .fetch_one(&mut *self.connection)
            .await
        };

        let row = result.map_err(|error| {
            if is_unique_violation(&error, "account_email_key") {
                ServiceError::BadRequest("User already exists".to_owned())
            } else {
                error.into()
            }
        })?;
        user_from_row(&row)
    }

    pub async fn get_user_by_id(&mut self, id: u64) -> ServiceResult<Option<models::User>> {
        let row = sqlx::query("SELECT * FROM account WHERE id = $1")
            .bind(id as i64)
            .fetch_optional(&mut *self.connection)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn get_user_by_email(&mut self, email: &str) -> ServiceResult<Option<models::User>> {
        let row = sqlx::query("SELECT * FROM account WHERE email = lower($1)")
            .bind(email)
            .fetch_optional(&mut *self.connection)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn create_session_token(
        &mut self,
        account_id: u64,
        valid_until: DateTime<Utc>,
    ) -> ServiceResult<String> {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill(&mut bytes);
        let token = general_purpose::URL_SAFE_NO_PAD.encode(bytes);

        sqlx::query("INSERT INTO session (token, account_id, valid_until) VALUES ($1, $2, $3)")
            .bind(&token)
            .bind(account_id as i64)
            .bind(valid_until)
            .execute(&mut *self.connection)
            .await?;

        Ok(token)
    }

    pub async fn get_session_by_session_token(
        &mut self,
        token: String,
    ) -> ServiceResult<Option<models::Session>> {
        let row = sqlx::query(
            r#"
            SELECT account.*, session.token, session.valid_until
            FROM session
            JOIN account ON account.id = session.account_id
            WHERE session.token = $1 AND session.valid_until > now()
            "#,
        )
        .bind(&token)
        .fetch_optional(&mut *self.connection)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(models::Session {
            user: user_from_row(&row)?,
            token: row.try_get("token")?,
            valid_until: row.try_get("valid_until")?,
        }))
    }

    pub async fn delete_session_token(&mut self, token: String) -> ServiceResult<()> {
        sqlx::query("DELETE FROM session WHERE token = $1")
            .bind(&token)
            .execute(&mut *self.connection)
            .await?;

        Ok(())
    }

    /// Place an order and settle its point economics.
    ///
    /// The order insert, the balance update and all ledger appends happen in
    /// one transaction. The total is recomputed from the line items, the
    /// client supplied value never reaches this function.
    pub async fn place_order(
        &mut self,
        checkout: models::Checkout,
        timestamp: DateTime<Utc>,
    ) -> ServiceResult<models::CheckoutReceipt> {
        checkout.validate()?;

        let mut tx = self.connection.begin().await?;

        let account_row = sqlx::query("SELECT points FROM account WHERE id = $1 FOR UPDATE")
            .bind(checkout.account_id as i64)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(account_row) = account_row else {
            return Err(ServiceError::NotFound);
        };
        let balance: i32 = account_row.try_get("points")?;

        if checkout.points_used > balance {
            return Err(ServiceError::InsufficientPoints {
                requested: checkout.points_used,
                available: balance,
            });
        }

        let total_cents = checkout.total_cents();
        let breakdown =
            PointsBreakdown::calculate(total_cents, checkout.table_number, checkout.points_used);
        let order_number = models::Order::generate_order_number(timestamp);

        let order_row = sqlx::query(
            r#"
            INSERT INTO orders
                (order_number, account_id, total_cents, points_earned, points_used,
                 table_number, special_instructions, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&order_number)
        .bind(checkout.account_id as i64)
        .bind(total_cents)
        .bind(breakdown.earned())
        .bind(breakdown.used)
        .bind(checkout.table_number)
        .bind(&checkout.special_instructions)
        .bind(timestamp)
        .fetch_one(&mut *tx)
        .await
        .map_err(aborted)?;
        let order_id: i64 = order_row.try_get("id")?;

        for item in &checkout.items {
            sqlx::query(
                "INSERT INTO order_item (order_id, name, price_cents, quantity) VALUES ($1, $2, $3, $4)",
            )
            .bind(order_id)
            .bind(&item.name)
            .bind(item.price_cents)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await
            .map_err(aborted)?;
        }

        let new_points = (balance + breakdown.earned() - breakdown.used).max(0);
        let updated_row = sqlx::query(
            r#"
            UPDATE account
            SET points = $2,
                total_points_earned = total_points_earned + $3,
                total_points_used = total_points_used + $4,
                last_points_update = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(checkout.account_id as i64)
        .bind(new_points)
        .bind(breakdown.earned())
        .bind(breakdown.used)
        .bind(timestamp)
        .fetch_one(&mut *tx)
        .await
        .map_err(aborted)?;
        let user = user_from_row(&updated_row)?;

        let ledger_entries = [
            (
                breakdown.base,
                models::PointsEntryType::Earned,
                format!("Base points earned from order #{order_number}"),
            ),
            (
                breakdown.bonus,
                models::PointsEntryType::Earned,
                format!("Bonus points earned from order #{order_number}"),
            ),
            (
                -breakdown.used,
                models::PointsEntryType::Used,
                format!("Points used for order #{order_number}"),
            ),
        ];
        for (points, entry_type, description) in ledger_entries {
            if points == 0 {
                continue;
            }
            sqlx::query(
                r#"
                INSERT INTO points_history (account_id, points, entry_type, description, order_id, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(checkout.account_id as i64)
            .bind(points)
            .bind(entry_type.as_str())
            .bind(&description)
            .bind(order_id)
            .bind(timestamp)
            .execute(&mut *tx)
            .await
            .map_err(aborted)?;
        }

        tx.commit().await.map_err(aborted)?;

        let order = order_from_row(&order_row, checkout.items)?;
        Ok(models::CheckoutReceipt {
            order,
            points: user.points,
            points_earned: breakdown.earned(),
            points_used: breakdown.used,
            summary: user.points_summary(),
        })
    }

    async fn attach_order_items(
        &mut self,
        rows: Vec<PgRow>,
    ) -> ServiceResult<Vec<models::Order>> {
        let order_ids: Vec<i64> = rows
            .iter()
            .map(|row| row.try_get::<i64, _>("id"))
            .collect::<Result<_, _>>()?;

        let mut items_by_order: HashMap<i64, Vec<models::OrderItem>> = HashMap::new();
        {
            let mut item_rows = sqlx::query(
                "SELECT order_id, name, price_cents, quantity FROM order_item WHERE order_id = ANY($1) ORDER BY id",
            )
            .bind(&order_ids)
            .fetch(&mut *self.connection);
            while let Some(row) = item_rows.try_next().await? {
                items_by_order
                    .entry(row.try_get("order_id")?)
                    .or_default()
                    .push(models::OrderItem {
                        name: row.try_get("name")?,
                        price_cents: row.try_get("price_cents")?,
                        quantity: row.try_get("quantity")?,
                    });
            }
        }

        rows.iter()
            .zip(order_ids)
            .map(|(row, id)| {
                order_from_row(row, items_by_order.remove(&id).unwrap_or_default())
            })
            .collect()
    }

    pub async fn get_orders_by_account(
        &mut self,
        account_id: u64,
    ) -> ServiceResult<Vec<models::Order>> {
        let rows = sqlx::query(
            "SELECT * FROM orders WHERE account_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(account_id as i64)
        .fetch_all(&mut *self.connection)
        .await?;

        self.attach_order_items(rows).await
    }

    pub async fn get_completed_orders_by_account(
        &mut self,
        account_id: u64,
    ) -> ServiceResult<Vec<models::Order>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM orders
            WHERE account_id = $1 AND status = 'completed'
            ORDER BY completed_at DESC
            LIMIT $2
            "#,
        )
        .bind(account_id as i64)
        .bind(COMPLETED_ORDERS_PAGE_SIZE)
        .fetch_all(&mut *self.connection)
        .await?;

        self.attach_order_items(rows).await
    }

    pub async fn get_order_by_id(&mut self, id: u64) -> ServiceResult<Option<models::Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id as i64)
            .fetch_optional(&mut *self.connection)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.attach_order_items(vec![row]).await?.pop())
    }

    pub async fn update_order_status(
        &mut self,
        id: u64,
        status: models::OrderStatus,
    ) -> ServiceResult<models::Order> {
        let row = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1 RETURNING *")
            .bind(id as i64)
            .bind(status.as_str())
            .fetch_optional(&mut *self.connection)
            .await?;

        let Some(row) = row else {
            return Err(ServiceError::NotFound);
        };
        self.attach_order_items(vec![row])
            .await?
            .pop()
            .ok_or(ServiceError::NotFound)
    }

    /// Complete the payment for a pending order.
    ///
    /// Creates the payment record and advances the order in one transaction.
    pub async fn complete_order(
        &mut self,
        order_id: u64,
        account_id: u64,
        method: models::PaymentMethod,
        card_details: Option<models::CardDetails>,
        timestamp: DateTime<Utc>,
    ) -> ServiceResult<(models::Order, models::Payment)> {
        let mut tx = self.connection.begin().await?;

        let order_row = sqlx::query(
            "SELECT total_cents, status FROM orders WHERE id = $1 AND account_id = $2 FOR UPDATE",
        )
        .bind(order_id as i64)
        .bind(account_id as i64)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(order_row) = order_row else {
            return Err(ServiceError::NotFound);
        };

        let status = models::OrderStatus::parse(order_row.try_get("status")?)?;
        if status != models::OrderStatus::Pending {
            return Err(ServiceError::BadRequest(
                "Order is not pending".to_owned(),
            ));
        }
        let total_cents: i32 = order_row.try_get("total_cents")?;

        let payment_row = sqlx::query(
            r#"
            INSERT INTO payment
                (order_id, account_id, amount_cents, method, status, card_last4, card_expiry, created_at)
            VALUES ($1, $2, $3, $4, 'completed', $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(order_id as i64)
        .bind(account_id as i64)
        .bind(total_cents)
        .bind(method.as_str())
        .bind(card_details.as_ref().map(|c| c.last4.clone()))
        .bind(card_details.as_ref().map(|c| c.expiry.clone()))
        .bind(timestamp)
        .fetch_one(&mut *tx)
        .await
        .map_err(aborted)?;
        let payment = payment_from_row(&payment_row)?;

        let updated_row = sqlx::query(
            r#"
            UPDATE orders
            SET status = 'completed', payment_id = $2, completed_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(order_id as i64)
        .bind(payment.id as i64)
        .bind(timestamp)
        .fetch_one(&mut *tx)
        .await
        .map_err(aborted)?;

        tx.commit().await.map_err(aborted)?;

        let order = self
            .attach_order_items(vec![updated_row])
            .await?
            .pop()
            .ok_or(ServiceError::NotFound)?;
        Ok((order, payment))
    }

    pub async fn get_payment_by_id(&mut self, id: u64) -> ServiceResult<Option<models::Payment>> {
        let row = sqlx::query("SELECT * FROM payment WHERE id = $1")
            .bind(id as i64)
            .fetch_optional(&mut *self.connection)
            .await?;

        row.as_ref().map(payment_from_row).transpose()
    }

    /// Apply a signed point delta to an account.
    ///
    /// The balance is clamped at zero, the raw delta is recorded in the
    /// ledger. Returns the new balance.
    pub async fn adjust_points(
        &mut self,
        account_id: u64,
        delta: i32,
        timestamp: DateTime<Utc>,
    ) -> ServiceResult<i32> {
        let mut tx = self.connection.begin().await?;

        let account_row = sqlx::query("SELECT points FROM account WHERE id = $1 FOR UPDATE")
            .bind(account_id as i64)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(account_row) = account_row else {
            return Err(ServiceError::NotFound);
        };
        let balance: i32 = account_row.try_get("points")?;
        let new_points = (balance + delta).max(0);

        sqlx::query(
            r#"
            UPDATE account
            SET points = $2,
                total_points_earned = total_points_earned + $3,
                total_points_used = total_points_used + $4,
                last_points_update = $5
            WHERE id = $1
            "#,
        )
        .bind(account_id as i64)
        .bind(new_points)
        .bind(delta.max(0))
        .bind((-delta).max(0))
        .bind(timestamp)
        .execute(&mut *tx)
        .await
        .map_err(aborted)?;

        if delta != 0 {
            let (entry_type, description) = if delta > 0 {
                (models::PointsEntryType::Earned, "Points earned from order")
            } else {
                (models::PointsEntryType::Used, "Points used for order")
            };
            sqlx::query(
                r#"
                INSERT INTO points_history (account_id, points, entry_type, description, created_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(account_id as i64)
            .bind(delta)
            .bind(entry_type.as_str())
            .bind(description)
            .bind(timestamp)
            .execute(&mut *tx)
            .await
            .map_err(aborted)?;
        }

        tx.commit().await.map_err(aborted)?;
        Ok(new_points)
    }

    pub async fn get_points_history_by_account(
        &mut self,
        account_id: u64,
    ) -> ServiceResult<Vec<models::PointsEntry>> {
        let mut entries = Vec::new();
        let mut rows = sqlx::query(
            r#"
            SELECT * FROM points_history
            WHERE account_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(account_id as i64)
        .bind(POINTS_HISTORY_PAGE_SIZE)
        .fetch(&mut *self.connection);
        while let Some(row) = rows.try_next().await? {
            entries.push(points_entry_from_row(&row)?);
        }

        Ok(entries)
    }

    /// Create a reservation if the slot is free.
    ///
    /// The pre-check gives a friendly error on the serialized path; the
    /// partial unique index `reservation_slot_idx` closes the window between
    /// check and insert under concurrent requests.
    pub async fn create_reservation(
        &mut self,
        request: models::ReservationRequest,
    ) -> ServiceResult<models::Reservation> {
        let existing = sqlx::query(
            r#"
            SELECT id FROM reservation
            WHERE reservation_date = $1 AND reservation_time = $2
              AND table_number = $3 AND status <> 'cancelled'
            "#,
        )
        .bind(request.date)
        .bind(&request.time)
        .bind(request.table_number)
        .fetch_optional(&mut *self.connection)
        .await?;
        if existing.is_some() {
            return Err(ServiceError::ReservationConflict);
        }

        let row = sqlx::query(
            r#"
            INSERT INTO reservation
                (account_id, name, phone_number, reservation_date, reservation_time,
                 table_number, party_size, special_requests)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(request.account_id.map(|id| id as i64))
        .bind(&request.name)
        .bind(&request.phone_number)
        .bind(request.date)
        .bind(&request.time)
        .bind(request.table_number)
        .bind(request.party_size)
        .bind(&request.special_requests)
        .fetch_one(&mut *self.connection)
        .await
        .map_err(|error| {
            if is_unique_violation(&error, "reservation_slot_idx") {
                ServiceError::ReservationConflict
            } else {
                error.into()
            }
        })?;

        reservation_from_row(&row)
    }

    pub async fn get_reservations_by_account(
        &mut self,
        account_id: u64,
    ) -> ServiceResult<Vec<models::Reservation>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM reservation
            WHERE account_id = $1
            ORDER BY reservation_date, reservation_time
            "#,
        )
        .bind(account_id as i64)
        .fetch_all(&mut *self.connection)
        .await?;

        rows.iter().map(reservation_from_row).collect()
    }

    pub async fn get_reservation_by_id(
        &mut self,
        id: u64,
    ) -> ServiceResult<Option<models::Reservation>> {
        let row = sqlx::query("SELECT * FROM reservation WHERE id = $1")
            .bind(id as i64)
            .fetch_optional(&mut *self.connection)
            .await?;

        row.as_ref().map(reservation_from_row).transpose()
    }

    pub async fn update_reservation_status(
        &mut self,
        id: u64,
        status: models::ReservationStatus,
    ) -> ServiceResult<models::Reservation> {
        let row = sqlx::query("UPDATE reservation SET status = $2 WHERE id = $1 RETURNING *")
            .bind(id as i64)
            .bind(status.as_str())
            .fetch_optional(&mut *self.connection)
            .await
            .map_err(|error| {
                // reviving a cancelled reservation can collide with a newer booking
                if is_unique_violation(&error, "reservation_slot_idx") {
                    ServiceError::ReservationConflict
                } else {
                    error.into()
                }
            })?;

        let Some(row) = row else {
            return Err(ServiceError::NotFound);
        };
        reservation_from_row(&row)
    }
}
