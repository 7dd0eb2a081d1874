use serde::Serialize;

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_APPROVED: &str = "approved";
pub const STATUS_REJECTED: &str = "rejected";

pub const PAYMENT_PENDING: &str = "pending";
pub const PAYMENT_PAID: &str = "paid";

pub const TIME_SLOTS: [&str; 4] = [
    "Morning (9 AM - 12 PM)",
    "Afternoon (1 PM - 5 PM)",
    "Evening (6 PM - 10 PM)",
    "Full Day (9 AM - 10 PM)",
];

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub role: String,
    pub reset_token: Option<String>,
    pub reset_token_expiry: Option<String>,
    pub created_at: String,
}

/// The shape handed back to clients. Never carries the password hash or the
/// reset token.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub created_at: String,
}

impl From<UserRow> for PublicUser {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            role: row.role,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct HallRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub capacity: i64,
    pub location: String,
    pub price: i64,
    pub contact: String,
    pub image: String,
    pub is_active: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookedDate {
    pub date: String,
    pub time: String,
    #[serde(rename = "bookingId")]
    pub booking_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HallWithBookings {
    #[serde(flatten)]
    pub hall: HallRow,
    #[serde(rename = "bookedDates")]
    pub booked_dates: Vec<BookedDate>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct BookingRow {
    pub id: i64,
    pub user_id: i64,
    pub hall_id: i64,
    pub hall_name: String,
    pub date: String,
    pub time: String,
    pub guests: i64,
    pub event_type: String,
    pub special_requests: String,
    pub total_price: i64,
    pub status: String,
    pub payment_status: String,
    pub payment_intent_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A user's own booking joined with the live hall name.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct UserBookingRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub booking: BookingRow,
    #[sqlx(rename = "hallName")]
    #[serde(rename = "hallName")]
    pub hall_name_joined: Option<String>,
}

/// Admin dashboard row: booking plus owner identity and hall location.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct AdminBookingRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub booking: BookingRow,
    #[sqlx(rename = "userName")]
    #[serde(rename = "userName")]
    pub user_name: String,
    #[sqlx(rename = "userEmail")]
    #[serde(rename = "userEmail")]
    pub user_email: String,
    #[sqlx(rename = "hallLocation")]
    #[serde(rename = "hallLocation")]
    pub hall_location: Option<String>,
}

/// Everything the notification templates need about one booking.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingContactRow {
    pub id: i64,
    pub hall_name: String,
    pub date: String,
    pub time: String,
    pub guests: i64,
    pub event_type: String,
    pub total_price: i64,
    #[sqlx(rename = "hallLocation")]
    pub hall_location: Option<String>,
    #[sqlx(rename = "userName")]
    pub user_name: String,
    #[sqlx(rename = "userEmail")]
    pub user_email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_drops_credentials() {
        let row = UserRow {
            id: 1,
            name: "Asif".to_string(),
            email: "asif@example.com".to_string(),
            password_hash: "$argon2id$dummy".to_string(),
            phone: "0300".to_string(),
            role: ROLE_USER.to_string(),
            reset_token: Some("deadbeef".to_string()),
            reset_token_expiry: None,
            created_at: "2025-01-01T00:00:00+00:00".to_string(),
        };
        let json = serde_json::to_string(&PublicUser::from(row)).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("deadbeef"));
        assert!(json.contains("asif@example.com"));
    }
}
