use serde_json::json;

use crate::{config::Config, models::BookingContactRow};

/// Transactional email over the provider's HTTP API. Sends are
/// fire-and-forget: a failure is logged and never fails the request that
/// triggered it.
#[derive(Clone)]
pub struct Mailer {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
    admin_contact: String,
}

impl Mailer {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            api_url: config.mail_api_url.clone(),
            api_key: config.mail_api_key.clone(),
            from: config.mail_from.clone(),
            admin_contact: config.admin_contact.clone(),
        }
    }

    pub fn enabled(&self) -> bool {
        !(self.api_url.trim().is_empty() || self.api_key.trim().is_empty())
    }

    pub async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), String> {
        if !self.enabled() {
            return Err("mailer not configured".to_string());
        }

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": [to],
                "subject": subject,
                "html": html,
            }))
            .send()
            .await
            .map_err(|err| err.to_string())?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("mail provider returned {status}: {body}"));
        }
        Ok(())
    }

    /// Detached send for notifications that must not block or fail the
    /// surrounding request.
    pub fn send_detached(&self, to: String, subject: String, html: String) {
        let mailer = self.clone();
        tokio::spawn(async move {
            if let Err(err) = mailer.send(&to, &subject, &html).await {
                log::warn!("Email send to {to} failed: {err}");
            }
        });
    }

    pub fn admin_contact(&self) -> &str {
        &self.admin_contact
    }
}

pub fn approval_notice_html(
    hall_name: &str,
    location: &str,
    time: &str,
    capacity: i64,
    price: i64,
    admin_contact: &str,
) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #28a745;">Hall Booking Confirmation</h2>
  <div style="background-color: #f8f9fa; padding: 20px; border-radius: 8px; margin: 20px 0;">
    <p><strong>Hall Name:</strong> {hall_name}</p>
    <p><strong>Location:</strong> {location}</p>
    <p><strong>Time:</strong> {time}</p>
    <p><strong>Capacity:</strong> {capacity}</p>
    <p><strong>Price:</strong> {price} PKR</p>
    <p><strong>Contact Admin:</strong> {admin_contact}</p>
  </div>
  <p>Thank you for booking with us! Please proceed with payment to confirm your booking.</p>
</div>"#
    )
}

/// Sent when an admin approves a booking: the owner is asked to pay.
pub fn payment_required_html(booking: &BookingContactRow, admin_contact: &str) -> String {
    let location = booking.hall_location.as_deref().unwrap_or("-");
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #28a745;">Booking Approved - Payment Required</h2>
  <div style="background-color: #f8f9fa; padding: 20px; border-radius: 8px; margin: 20px 0;">
    <p><strong>Hall Name:</strong> {hall_name}</p>
    <p><strong>Location:</strong> {location}</p>
    <p><strong>Date:</strong> {date}</p>
    <p><strong>Time:</strong> {time}</p>
    <p><strong>Guests:</strong> {guests}</p>
    <p><strong>Price:</strong> {total_price} PKR</p>
    <p><strong>Contact Admin:</strong> {admin_contact}</p>
  </div>
  <p>Your booking has been approved! Please proceed with payment to confirm your booking.</p>
</div>"#,
        hall_name = booking.hall_name,
        date = booking.date,
        time = booking.time,
        guests = booking.guests,
        total_price = booking.total_price,
    )
}

pub fn payment_receipt_html(
    booking: &BookingContactRow,
    payment_intent_id: &str,
    admin_contact: &str,
) -> String {
    let location = booking.hall_location.as_deref().unwrap_or("-");
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #28a745;">Payment Successful!</h2>
  <p>Your payment for the hall booking has been processed successfully.</p>
  <div style="background-color: #f8f9fa; padding: 20px; border-radius: 8px; margin: 20px 0;">
    <h3>Booking Details:</h3>
    <p><strong>Hall Name:</strong> {hall_name}</p>
    <p><strong>Location:</strong> {location}</p>
    <p><strong>Date:</strong> {date}</p>
    <p><strong>Time:</strong> {time}</p>
    <p><strong>Guests:</strong> {guests}</p>
    <p><strong>Event Type:</strong> {event_type}</p>
    <p><strong>Total Paid:</strong> {total_price} PKR</p>
    <p><strong>Payment ID:</strong> {payment_intent_id}</p>
  </div>
  <p>Your booking is now confirmed and paid. Thank you for choosing our services!</p>
  <p><strong>Contact Admin:</strong> {admin_contact}</p>
</div>"#,
        hall_name = booking.hall_name,
        date = booking.date,
        time = booking.time,
        guests = booking.guests,
        event_type = booking.event_type,
        total_price = booking.total_price,
    )
}

pub fn reset_link_html(reset_url: &str) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #333;">Password Reset Request</h2>
  <p>You have requested to reset your password for your hall booking account.</p>
  <p>Click the button below to reset your password:</p>
  <a href="{reset_url}" style="display: inline-block; background-color: #007bff; color: white; padding: 12px 24px; text-decoration: none; border-radius: 4px; margin: 20px 0;">Reset Password</a>
  <p>If the button doesn't work, copy and paste this link into your browser:</p>
  <p style="word-break: break-all;">{reset_url}</p>
  <p><strong>Note:</strong> This link will expire in 1 hour for security purposes.</p>
  <p>If you didn't request this password reset, please ignore this email.</p>
</div>"#
    )
}
