use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::models::{
    AdminBookingRow, BookingContactRow, BookingRow, UserBookingRow, PAYMENT_PAID, PAYMENT_PENDING,
    STATUS_APPROVED, STATUS_PENDING,
};

#[derive(Debug, Deserialize)]
pub struct BookingInput {
    #[serde(rename = "hallId")]
    pub hall_id: i64,
    #[serde(rename = "hallName")]
    pub hall_name: String,
    pub date: String,
    pub time: String,
    pub guests: i64,
    #[serde(rename = "eventType", default)]
    pub event_type: String,
    #[serde(rename = "specialRequests", default)]
    pub special_requests: String,
    #[serde(rename = "totalPrice")]
    pub total_price: i64,
}

#[derive(Debug, PartialEq)]
pub enum CreateOutcome {
    Created,
    SlotTaken,
}

#[derive(Debug, PartialEq)]
pub enum StatusOutcome {
    Updated,
    NotFound,
    SlotTaken,
}

const BOOKING_COLUMNS: &str = "id, user_id, hall_id, hall_name, date, time, guests, event_type, \
     special_requests, total_price, status, payment_status, payment_intent_id, created_at, updated_at";

/// Inserts a pending booking unless an approved booking already holds the
/// slot. The friendly pre-check produces the conflict message; the partial
/// unique index on approved slots is the actual guarantee.
pub async fn create_booking(
    pool: &SqlitePool,
    user_id: i64,
    input: &BookingInput,
) -> Result<CreateOutcome, sqlx::Error> {
    let taken = sqlx::query_as::<_, (i64,)>(
        "SELECT id FROM bookings WHERE hall_id = ? AND date = ? AND time = ? AND status = ? LIMIT 1",
    )
    .bind(input.hall_id)
    .bind(&input.date)
    .bind(&input.time)
    .bind(STATUS_APPROVED)
    .fetch_optional(pool)
    .await?;

    if taken.is_some() {
        return Ok(CreateOutcome::SlotTaken);
    }

    let now = Utc::now().to_rfc3339();
    sqlx::query(
        r#"INSERT INTO bookings
           (user_id, hall_id, hall_name, date, time, guests, event_type, special_requests,
            total_price, status, payment_status, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(user_id)
    .bind(input.hall_id)
    .bind(&input.hall_name)
    .bind(&input.date)
    .bind(&input.time)
    .bind(input.guests)
    .bind(&input.event_type)
    .bind(&input.special_requests)
    .bind(input.total_price)
    .bind(STATUS_PENDING)
    .bind(PAYMENT_PENDING)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(CreateOutcome::Created)
}

/// Admin approval or rejection. Approving a booking whose slot was approved
/// for someone else in the meantime trips the unique index and reports the
/// conflict instead of corrupting the slot invariant.
pub async fn set_status(
    pool: &SqlitePool,
    booking_id: i64,
    status: &str,
) -> Result<StatusOutcome, sqlx::Error> {
    let result = sqlx::query("UPDATE bookings SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(Utc::now().to_rfc3339())
        .bind(booking_id)
        .execute(pool)
        .await;

    match result {
        Ok(done) if done.rows_affected() > 0 => Ok(StatusOutcome::Updated),
        Ok(_) => Ok(StatusOutcome::NotFound),
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => Ok(StatusOutcome::SlotTaken),
        Err(err) => Err(err),
    }
}

pub async fn booking_by_id(pool: &SqlitePool, booking_id: i64) -> Option<BookingRow> {
    sqlx::query_as::<_, BookingRow>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ? LIMIT 1"
    ))
    .bind(booking_id)
    .fetch_optional(pool)
    .await
    .unwrap_or(None)
}

pub async fn mark_paid(
    pool: &SqlitePool,
    booking_id: i64,
    payment_intent_id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"UPDATE bookings
           SET payment_status = ?, payment_intent_id = ?, updated_at = ?
           WHERE id = ?"#,
    )
    .bind(PAYMENT_PAID)
    .bind(payment_intent_id)
    .bind(Utc::now().to_rfc3339())
    .bind(booking_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Unconditional delete: covers both self-service cancel and
/// remove-from-history, in any state.
pub async fn delete_booking(pool: &SqlitePool, booking_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM bookings WHERE id = ?")
        .bind(booking_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn bookings_for_user(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<UserBookingRow>, sqlx::Error> {
    sqlx::query_as::<_, UserBookingRow>(
        r#"SELECT b.*, h.name AS hallName
           FROM bookings b
           LEFT JOIN halls h ON b.hall_id = h.id
           WHERE b.user_id = ?
           ORDER BY b.created_at DESC"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn all_bookings(pool: &SqlitePool) -> Result<Vec<AdminBookingRow>, sqlx::Error> {
    sqlx::query_as::<_, AdminBookingRow>(
        r#"SELECT b.*, u.name AS userName, u.email AS userEmail, h.location AS hallLocation
           FROM bookings b
           JOIN users u ON b.user_id = u.id
           LEFT JOIN halls h ON b.hall_id = h.id
           ORDER BY b.created_at DESC"#,
    )
    .fetch_all(pool)
    .await
}

/// Owner identity and hall details for the notification templates.
pub async fn booking_contact(pool: &SqlitePool, booking_id: i64) -> Option<BookingContactRow> {
    sqlx::query_as::<_, BookingContactRow>(
        r#"SELECT b.id, b.hall_name, b.date, b.time, b.guests, b.event_type, b.total_price,
                  h.location AS hallLocation, u.name AS userName, u.email AS userEmail
           FROM bookings b
           JOIN users u ON b.user_id = u.id
           LEFT JOIN halls h ON b.hall_id = h.id
           WHERE b.id = ?
           LIMIT 1"#,
    )
    .bind(booking_id)
    .fetch_optional(pool)
    .await
    .unwrap_or(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{STATUS_REJECTED, TIME_SLOTS};
    use crate::{auth, db, halls};

    async fn test_pool() -> SqlitePool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        db::run_migrations(&pool).await.unwrap();
        pool
    }

    async fn seed_user(pool: &SqlitePool, email: &str) -> i64 {
        let hash = auth::hash_password("pw").unwrap();
        auth::insert_user(pool, "Test User", email, &hash, "0300", "user")
            .await
            .unwrap();
        auth::find_user_by_email(pool, email).await.unwrap().id
    }

    async fn seed_hall(pool: &SqlitePool, price: i64) -> i64 {
        halls::insert_hall(
            pool,
            &halls::HallInput {
                name: "Crystal Palace".to_string(),
                description: String::new(),
                capacity: 500,
                location: "Gulberg, Lahore".to_string(),
                price,
                contact: String::new(),
                image: String::new(),
            },
        )
        .await
        .unwrap()
    }

    fn input(hall_id: i64, date: &str, time: &str, price: i64) -> BookingInput {
        BookingInput {
            hall_id,
            hall_name: "Crystal Palace".to_string(),
            date: date.to_string(),
            time: time.to_string(),
            guests: 300,
            event_type: "Wedding".to_string(),
            special_requests: String::new(),
            total_price: price,
        }
    }

    #[tokio::test]
    async fn approved_slot_rejects_new_bookings() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "a@x.com").await;
        let hall = seed_hall(&pool, 50000).await;
        let slot = input(hall, "2025-12-01", TIME_SLOTS[2], 50000);

        assert_eq!(
            create_booking(&pool, user, &slot).await.unwrap(),
            CreateOutcome::Created
        );
        // Pending bookings do not block the slot yet.
        assert_eq!(
            create_booking(&pool, user, &slot).await.unwrap(),
            CreateOutcome::Created
        );

        assert_eq!(set_status(&pool, 1, STATUS_APPROVED).await.unwrap(), StatusOutcome::Updated);
        assert_eq!(
            create_booking(&pool, user, &slot).await.unwrap(),
            CreateOutcome::SlotTaken
        );
    }

    #[tokio::test]
    async fn approving_a_second_booking_for_a_taken_slot_conflicts() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "a@x.com").await;
        let hall = seed_hall(&pool, 50000).await;
        let slot = input(hall, "2025-12-01", TIME_SLOTS[2], 50000);

        create_booking(&pool, user, &slot).await.unwrap();
        create_booking(&pool, user, &slot).await.unwrap();

        assert_eq!(set_status(&pool, 1, STATUS_APPROVED).await.unwrap(), StatusOutcome::Updated);
        assert_eq!(set_status(&pool, 2, STATUS_APPROVED).await.unwrap(), StatusOutcome::SlotTaken);
        assert_eq!(set_status(&pool, 2, STATUS_REJECTED).await.unwrap(), StatusOutcome::Updated);
        assert_eq!(set_status(&pool, 99, STATUS_APPROVED).await.unwrap(), StatusOutcome::NotFound);
    }

    #[tokio::test]
    async fn removal_deletes_regardless_of_state() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "a@x.com").await;
        let hall = seed_hall(&pool, 50000).await;

        create_booking(&pool, user, &input(hall, "2025-12-01", TIME_SLOTS[0], 50000))
            .await
            .unwrap();
        set_status(&pool, 1, STATUS_APPROVED).await.unwrap();
        mark_paid(&pool, 1, "pi_123").await.unwrap();

        assert!(delete_booking(&pool, 1).await.unwrap());
        assert!(!delete_booking(&pool, 1).await.unwrap());
        assert!(booking_by_id(&pool, 1).await.is_none());
    }

    #[tokio::test]
    async fn end_to_end_book_approve_pay() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "asif@x.com").await;
        let hall = seed_hall(&pool, 50000).await;

        create_booking(&pool, user, &input(hall, "2025-12-01", "Evening (6 PM - 10 PM)", 50000))
            .await
            .unwrap();
        assert_eq!(set_status(&pool, 1, STATUS_APPROVED).await.unwrap(), StatusOutcome::Updated);
        assert!(mark_paid(&pool, 1, "pi_123").await.unwrap());

        let mine = bookings_for_user(&pool, user).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].booking.status, STATUS_APPROVED);
        assert_eq!(mine[0].booking.payment_status, PAYMENT_PAID);
        assert_eq!(mine[0].booking.payment_intent_id.as_deref(), Some("pi_123"));
        assert_eq!(mine[0].hall_name_joined.as_deref(), Some("Crystal Palace"));

        let contact = booking_contact(&pool, 1).await.unwrap();
        assert_eq!(contact.user_email, "asif@x.com");
        assert_eq!(contact.hall_location.as_deref(), Some("Gulberg, Lahore"));
        assert_eq!(contact.total_price, 50000);

        let admin_rows = all_bookings(&pool).await.unwrap();
        assert_eq!(admin_rows[0].user_name, "Test User");
    }
}
