use std::ops::Add;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use sqlx::PgPool;

use crate::error::ServiceError;
use crate::models::{
    Checkout, OrderItem, OrderStatus, PaymentMethod, PaymentStatus, PointsEntryType,
    ReservationRequest, ReservationStatus, User,
};

use super::{AppState, DatabaseConnection, POINTS_HISTORY_PAGE_SIZE};

async fn database_connection(pool: PgPool) -> DatabaseConnection {
    let app_state = AppState::from_pool(pool).await.unwrap();
    DatabaseConnection {
        connection: app_state.pool.acquire().await.unwrap(),
    }
}

async fn store_test_user(db: &mut DatabaseConnection, name: &str, email: &str) -> User {
    db.store_user(User {
        id: 0,
        name: name.to_string(),
        email: email.to_string(),
        password_hash: vec![13u8; 48],
        phone_number: None,
        points: 0,
        total_points_earned: 0,
        total_points_used: 0,
        last_points_update: Utc::now(),
        created_at: Utc::now(),
    })
    .await
    .unwrap()
}

fn checkout(account_id: u64, items: Vec<OrderItem>, points_used: i32, table: i32) -> Checkout {
    Checkout {
        account_id,
        items,
        points_used,
        table_number: table,
        special_instructions: None,
    }
}

fn item(name: &str, price_cents: i32, quantity: i32) -> OrderItem {
    OrderItem {
        name: name.to_string(),
        price_cents,
        quantity,
    }
}

fn reservation_request(table: i32, date: NaiveDate, time: &str) -> ReservationRequest {
    ReservationRequest {
        account_id: None,
        name: "John Doe".to_string(),
        phone_number: "+49 351 1234567".to_string(),
        date,
        time: time.to_string(),
        table_number: table,
        party_size: 4,
        special_requests: None,
    }
}

#[sqlx::test]
async fn test_user_crud_and_sessions(pool: PgPool) {
    let _ = env_logger::try_init();
    let mut db = database_connection(pool).await;

    let john = store_test_user(&mut db, "John Doe", "john.doe@example.org").await;
    assert!(john.id != 0);
    assert_eq!(john.points, 0);

    // emails are unique
    let duplicate = db
        .store_user(User {
            id: 0,
            ..john.clone()
        })
        .await;
    assert_eq!(
        duplicate,
        Err(ServiceError::BadRequest("User already exists".to_string()))
    );

    assert_eq!(db.get_user_by_id(john.id).await.unwrap(), Some(john.clone()));
    assert_eq!(
        db.get_user_by_email("john.doe@example.org").await.unwrap(),
        Some(john.clone())
    );
    assert_eq!(db.get_user_by_id(123213).await.unwrap(), None);

    let token = db
        .create_session_token(john.id, Utc::now().add(Duration::hours(24)))
        .await
        .unwrap();
    let session = db
        .get_session_by_session_token(token.clone())
        .await
        .unwrap()
        .expect("there is a session for the token");
    assert_eq!(session.user, john);
    assert_eq!(session.token, token);

    db.delete_session_token(token.clone()).await.unwrap();
    assert_eq!(db.get_session_by_session_token(token).await.unwrap(), None);

    // expired tokens do not resolve
    let expired = db
        .create_session_token(john.id, Utc::now() - Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!(db.get_session_by_session_token(expired).await.unwrap(), None);
}

#[sqlx::test]
async fn test_place_order_settles_points(pool: PgPool) {
    let _ = env_logger::try_init();
    let mut db = database_connection(pool).await;
    let john = store_test_user(&mut db, "John Doe", "john.doe@example.org").await;

    // $25.00 at vip table 1: 250 base + 100 vip bonus
    let t1 = Utc.with_ymd_and_hms(2024, 5, 4, 18, 0, 0).unwrap();
    let receipt = db
        .place_order(
            checkout(
                john.id,
                vec![item("Margherita", 1000, 2), item("Espresso", 500, 1)],
                0,
                1,
            ),
            t1,
        )
        .await
        .unwrap();

    assert_eq!(receipt.order.total_cents, 2500);
    assert_eq!(receipt.order.status, OrderStatus::Pending);
    assert_eq!(receipt.order.items.len(), 2);
    assert!(receipt.order.order_number.starts_with("ORD"));
    assert_eq!(receipt.points_earned, 350);
    assert_eq!(receipt.points_used, 0);
    assert_eq!(receipt.points, 350);
    assert_eq!(receipt.summary.total_earned, 350);
    assert_eq!(receipt.summary.total_used, 0);

    // $120.00 at vip table 3 redeeming 300 points:
    // 1200 base + 500 spend bonus + 100 vip bonus
    let t2 = t1.add(Duration::hours(1));
    let receipt = db
        .place_order(
            checkout(john.id, vec![item("Chef's menu", 12000, 1)], 300, 3),
            t2,
        )
        .await
        .unwrap();

    assert_eq!(receipt.points_earned, 1800);
    assert_eq!(receipt.points_used, 300);
    assert_eq!(receipt.points, 350 + 1800 - 300);
    assert_eq!(receipt.summary.total_earned, 2150);
    assert_eq!(receipt.summary.total_used, 300);

    let user = db.get_user_by_id(john.id).await.unwrap().unwrap();
    assert_eq!(user.points, 1850);
    assert_eq!(user.total_points_earned, 2150);
    assert_eq!(user.total_points_used, 300);
    assert_eq!(user.last_points_update, t2);

    // one ledger entry per non zero component, newest first
    let history = db.get_points_history_by_account(john.id).await.unwrap();
    let deltas: Vec<i32> = history.iter().map(|e| e.points).collect();
    assert_eq!(deltas, vec![-300, 600, 1200, 100, 250]);
    assert_eq!(history[0].entry_type, PointsEntryType::Used);
    assert_eq!(history[1].entry_type, PointsEntryType::Earned);
    assert!(history.iter().all(|e| e.order_id.is_some()));
}

#[sqlx::test]
async fn test_place_order_rejects_insufficient_points(pool: PgPool) {
    let _ = env_logger::try_init();
    let mut db = database_connection(pool).await;
    let john = store_test_user(&mut db, "John Doe", "john.doe@example.org").await;

    let result = db
        .place_order(
            checkout(john.id, vec![item("Espresso", 500, 1)], 100, 10),
            Utc::now(),
        )
        .await;
    assert_eq!(
        result,
        Err(ServiceError::InsufficientPoints {
            requested: 100,
            available: 0,
        })
    );

    // nothing was written
    let user = db.get_user_by_id(john.id).await.unwrap().unwrap();
    assert_eq!(user.points, 0);
    assert_eq!(db.get_orders_by_account(john.id).await.unwrap(), vec![]);
    assert_eq!(
        db.get_points_history_by_account(john.id).await.unwrap(),
        vec![]
    );
}

#[sqlx::test]
async fn test_order_history_is_newest_first(pool: PgPool) {
    let _ = env_logger::try_init();
    let mut db = database_connection(pool).await;
    let john = store_test_user(&mut db, "John Doe", "john.doe@example.org").await;

    let start = Utc.with_ymd_and_hms(2024, 5, 4, 12, 0, 0).unwrap();
    for i in 0..3 {
        db.place_order(
            checkout(john.id, vec![item("Espresso", 500, 1)], 0, 10),
            start.add(Duration::minutes(i)),
        )
        .await
        .unwrap();
    }

    let orders = db.get_orders_by_account(john.id).await.unwrap();
    assert_eq!(orders.len(), 3);
    assert!(orders
        .windows(2)
        .all(|pair| pair[0].created_at >= pair[1].created_at));

    let mut order_numbers: Vec<String> =
        orders.iter().map(|o| o.order_number.clone()).collect();
    order_numbers.sort();
    order_numbers.dedup();
    assert_eq!(order_numbers.len(), 3);
}

#[sqlx::test]
async fn test_complete_order_creates_payment(pool: PgPool) {
    let _ = env_logger::try_init();
    let mut db = database_connection(pool).await;
    let john = store_test_user(&mut db, "John Doe", "john.doe@example.org").await;

    let receipt = db
        .place_order(
            checkout(john.id, vec![item("Margherita", 1000, 2)], 0, 10),
            Utc::now(),
        )
        .await
        .unwrap();

    let completed_at = Utc.with_ymd_and_hms(2024, 5, 4, 20, 0, 0).unwrap();
    let (order, payment) = db
        .complete_order(
            receipt.order.id,
            john.id,
            PaymentMethod::Cash,
            None,
            completed_at,
        )
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Completed);
    assert_eq!(order.payment_id, Some(payment.id));
    assert_eq!(order.completed_at, Some(completed_at));
    assert_eq!(payment.amount_cents, 2000);
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.card_details, None);
    assert_eq!(
        db.get_payment_by_id(payment.id).await.unwrap(),
        Some(payment)
    );

    // a completed order cannot be paid twice
    let result = db
        .complete_order(receipt.order.id, john.id, PaymentMethod::Cash, None, Utc::now())
        .await;
    assert_eq!(
        result,
        Err(ServiceError::BadRequest("Order is not pending".to_string()))
    );

    // someone else's order is not visible
    let jane = store_test_user(&mut db, "Jane Doe", "jane.doe@example.org").await;
    let receipt = db
        .place_order(
            checkout(jane.id, vec![item("Espresso", 500, 1)], 0, 10),
            Utc::now(),
        )
        .await
        .unwrap();
    let result = db
        .complete_order(receipt.order.id, john.id, PaymentMethod::Cash, None, Utc::now())
        .await;
    assert_eq!(result, Err(ServiceError::NotFound));

    let completed = db.get_completed_orders_by_account(john.id).await.unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].status, OrderStatus::Completed);
}

#[sqlx::test]
async fn test_adjust_points_clamps_at_zero(pool: PgPool) {
    let _ = env_logger::try_init();
    let mut db = database_connection(pool).await;
    let john = store_test_user(&mut db, "John Doe", "john.doe@example.org").await;

    let t = Utc.with_ymd_and_hms(2024, 5, 4, 12, 0, 0).unwrap();
    assert_eq!(db.adjust_points(john.id, 100, t).await.unwrap(), 100);
    assert_eq!(
        db.adjust_points(john.id, -250, t.add(Duration::minutes(1)))
            .await
            .unwrap(),
        0
    );

    let user = db.get_user_by_id(john.id).await.unwrap().unwrap();
    assert_eq!(user.points, 0);

    // the ledger keeps the raw deltas
    let history = db.get_points_history_by_account(john.id).await.unwrap();
    let deltas: Vec<i32> = history.iter().map(|e| e.points).collect();
    assert_eq!(deltas, vec![-250, 100]);
}

#[sqlx::test]
async fn test_points_history_is_page_bounded(pool: PgPool) {
    let _ = env_logger::try_init();
    let mut db = database_connection(pool).await;
    let john = store_test_user(&mut db, "John Doe", "john.doe@example.org").await;

    let start = Utc.with_ymd_and_hms(2024, 5, 4, 12, 0, 0).unwrap();
    for i in 0..25 {
        db.adjust_points(john.id, 10, start.add(Duration::minutes(i)))
            .await
            .unwrap();
    }

    let history = db.get_points_history_by_account(john.id).await.unwrap();
    assert_eq!(history.len(), POINTS_HISTORY_PAGE_SIZE as usize);
    assert!(history
        .windows(2)
        .all(|pair| pair[0].timestamp >= pair[1].timestamp));
}

#[sqlx::test]
async fn test_reservation_slot_conflicts(pool: PgPool) {
    let _ = env_logger::try_init();
    let mut db = database_connection(pool).await;

    let date = NaiveDate::from_ymd_opt(2030, 12, 24).unwrap();
    let reservation = db
        .create_reservation(reservation_request(7, date, "19:30"))
        .await
        .unwrap();
    assert_eq!(reservation.status, ReservationStatus::Pending);

    // same slot, same table
    let result = db
        .create_reservation(reservation_request(7, date, "19:30"))
        .await;
    assert_eq!(result, Err(ServiceError::ReservationConflict));

    // other table and other time are free
    db.create_reservation(reservation_request(8, date, "19:30"))
        .await
        .unwrap();
    db.create_reservation(reservation_request(7, date, "20:30"))
        .await
        .unwrap();

    // cancelling frees the slot
    let cancelled = db
        .update_reservation_status(reservation.id, ReservationStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
    db.create_reservation(reservation_request(7, date, "19:30"))
        .await
        .unwrap();

    // the freed slot is taken again, the cancelled row cannot come back
    let result = db
        .update_reservation_status(reservation.id, ReservationStatus::Pending)
        .await;
    assert_eq!(result, Err(ServiceError::ReservationConflict));
}
