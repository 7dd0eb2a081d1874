use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::models::{BookedDate, HallRow, HallWithBookings, STATUS_APPROVED};

#[derive(Debug, Deserialize)]
pub struct HallInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub capacity: i64,
    pub location: String,
    pub price: i64,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub image: String,
}

const HALL_COLUMNS: &str =
    "id, name, description, capacity, location, price, contact, image, is_active, created_at";

pub async fn active_halls(pool: &SqlitePool) -> Result<Vec<HallRow>, sqlx::Error> {
    sqlx::query_as::<_, HallRow>(&format!(
        "SELECT {HALL_COLUMNS} FROM halls WHERE is_active = 1 ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn all_halls(pool: &SqlitePool) -> Result<Vec<HallRow>, sqlx::Error> {
    sqlx::query_as::<_, HallRow>(&format!(
        "SELECT {HALL_COLUMNS} FROM halls ORDER BY is_active DESC, created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn search_by_location(
    pool: &SqlitePool,
    location: &str,
) -> Result<Vec<HallRow>, sqlx::Error> {
    sqlx::query_as::<_, HallRow>(&format!(
        "SELECT {HALL_COLUMNS} FROM halls WHERE location LIKE ? AND is_active = 1"
    ))
    .bind(format!("%{location}%"))
    .fetch_all(pool)
    .await
}

pub async fn insert_hall(pool: &SqlitePool, hall: &HallInput) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"INSERT INTO halls (name, description, capacity, location, price, contact, image, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&hall.name)
    .bind(&hall.description)
    .bind(hall.capacity)
    .bind(&hall.location)
    .bind(hall.price)
    .bind(&hall.contact)
    .bind(&hall.image)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Hard edit: overwrites every editable field in place.
pub async fn update_hall(pool: &SqlitePool, id: i64, hall: &HallInput) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"UPDATE halls
           SET name = ?, description = ?, capacity = ?, location = ?, price = ?, contact = ?, image = ?
           WHERE id = ?"#,
    )
    .bind(&hall.name)
    .bind(&hall.description)
    .bind(hall.capacity)
    .bind(&hall.location)
    .bind(hall.price)
    .bind(&hall.contact)
    .bind(&hall.image)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Soft delete / restore. History stays intact either way.
pub async fn set_active(pool: &SqlitePool, id: i64, active: bool) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE halls SET is_active = ? WHERE id = ?")
        .bind(active as i64)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Active halls, each carrying its approved (date, time) slots.
pub async fn halls_with_bookings(pool: &SqlitePool) -> Result<Vec<HallWithBookings>, sqlx::Error> {
    let halls = active_halls(pool).await?;
    let slots = sqlx::query_as::<_, (i64, String, String, i64)>(
        "SELECT hall_id, date, time, id FROM bookings WHERE status = ?",
    )
    .bind(STATUS_APPROVED)
    .fetch_all(pool)
    .await?;

    Ok(halls
        .into_iter()
        .map(|hall| {
            let booked_dates = slots
                .iter()
                .filter(|(hall_id, _, _, _)| *hall_id == hall.id)
                .map(|(_, date, time, booking_id)| BookedDate {
                    date: date.clone(),
                    time: time.clone(),
                    booking_id: *booking_id,
                })
                .collect();
            HallWithBookings { hall, booked_dates }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn test_pool() -> SqlitePool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        db::run_migrations(&pool).await.unwrap();
        pool
    }

    fn hall(name: &str, location: &str) -> HallInput {
        HallInput {
            name: name.to_string(),
            description: "Spacious".to_string(),
            capacity: 500,
            location: location.to_string(),
            price: 50000,
            contact: "0300".to_string(),
            image: String::new(),
        }
    }

    #[tokio::test]
    async fn soft_delete_hides_and_restore_reveals() {
        let pool = test_pool().await;
        let id = insert_hall(&pool, &hall("Crystal Palace", "Lahore"))
            .await
            .unwrap();

        assert_eq!(active_halls(&pool).await.unwrap().len(), 1);

        assert!(set_active(&pool, id, false).await.unwrap());
        assert!(active_halls(&pool).await.unwrap().is_empty());
        assert!(halls_with_bookings(&pool).await.unwrap().is_empty());
        assert_eq!(all_halls(&pool).await.unwrap().len(), 1);

        assert!(set_active(&pool, id, true).await.unwrap());
        assert_eq!(active_halls(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn location_search_matches_substring_on_active_only() {
        let pool = test_pool().await;
        insert_hall(&pool, &hall("A", "Gulberg, Lahore")).await.unwrap();
        insert_hall(&pool, &hall("B", "Karachi")).await.unwrap();
        let hidden = insert_hall(&pool, &hall("C", "DHA Lahore")).await.unwrap();
        set_active(&pool, hidden, false).await.unwrap();

        let found = search_by_location(&pool, "Lahore").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "A");
    }

    #[tokio::test]
    async fn hard_edit_overwrites_in_place() {
        let pool = test_pool().await;
        let id = insert_hall(&pool, &hall("Old", "Lahore")).await.unwrap();
        let mut updated = hall("New", "Islamabad");
        updated.price = 75000;
        assert!(update_hall(&pool, id, &updated).await.unwrap());

        let rows = all_halls(&pool).await.unwrap();
        assert_eq!(rows[0].name, "New");
        assert_eq!(rows[0].price, 75000);
        assert!(!update_hall(&pool, 999, &updated).await.unwrap());
    }
}
