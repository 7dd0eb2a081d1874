use std::collections::HashMap;

use serde::Deserialize;

pub type PaymentError = Box<dyn std::error::Error + Send + Sync>;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Stripe integration via REST API (no SDK dependency).
#[derive(Clone)]
pub struct PaymentClient {
    http: reqwest::Client,
    secret_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub status: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PaymentClient {
    pub fn new(http: reqwest::Client, secret_key: String) -> Self {
        Self { http, secret_key }
    }

    pub async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
        booking_id: i64,
    ) -> Result<PaymentIntent, PaymentError> {
        let response = self
            .http
            .post(format!("{STRIPE_API_BASE}/payment_intents"))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[
                ("amount", amount.to_string()),
                ("currency", currency.to_lowercase()),
                ("metadata[bookingId]", booking_id.to_string()),
            ])
            .send()
            .await?;

        parse_intent(response).await
    }

    pub async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError> {
        let response = self
            .http
            .get(format!("{STRIPE_API_BASE}/payment_intents/{intent_id}"))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await?;

        parse_intent(response).await
    }
}

async fn parse_intent(response: reqwest::Response) -> Result<PaymentIntent, PaymentError> {
    let body: serde_json::Value = response.json().await?;
    if let Some(message) = body["error"]["message"].as_str() {
        return Err(message.to_string().into());
    }
    Ok(serde_json::from_value(body)?)
}

/// A booking is only marked paid when the gateway reports the intent
/// succeeded AND the intent actually belongs to this booking for the full
/// amount. The latter two checks close the integrity gap of trusting a
/// client-reported intent id.
pub fn verify_intent_for_booking(
    intent: &PaymentIntent,
    booking_id: i64,
    total_price: i64,
) -> Result<(), String> {
    if intent.status != "succeeded" {
        return Err("Payment not completed".to_string());
    }
    if intent.metadata.get("bookingId").map(String::as_str) != Some(booking_id.to_string().as_str())
    {
        return Err("Payment does not belong to this booking".to_string());
    }
    if intent.amount != total_price {
        return Err("Payment amount does not match the booking total".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn succeeded_intent() -> PaymentIntent {
        PaymentIntent {
            id: "pi_123".to_string(),
            client_secret: Some("pi_123_secret".to_string()),
            status: "succeeded".to_string(),
            amount: 50000,
            currency: "pkr".to_string(),
            metadata: HashMap::from([("bookingId".to_string(), "7".to_string())]),
        }
    }

    #[test]
    fn succeeded_matching_intent_verifies() {
        assert!(verify_intent_for_booking(&succeeded_intent(), 7, 50000).is_ok());
    }

    #[test]
    fn non_succeeded_status_is_rejected() {
        let mut intent = succeeded_intent();
        intent.status = "requires_payment_method".to_string();
        assert_eq!(
            verify_intent_for_booking(&intent, 7, 50000).unwrap_err(),
            "Payment not completed"
        );
    }

    #[test]
    fn foreign_booking_metadata_is_rejected() {
        let intent = succeeded_intent();
        assert!(verify_intent_for_booking(&intent, 8, 50000).is_err());
    }

    #[test]
    fn amount_mismatch_is_rejected() {
        let intent = succeeded_intent();
        assert!(verify_intent_for_booking(&intent, 7, 45000).is_err());
    }

    #[test]
    fn intent_json_parses_with_metadata() {
        let body = serde_json::json!({
            "id": "pi_9",
            "object": "payment_intent",
            "client_secret": "pi_9_secret",
            "status": "succeeded",
            "amount": 120,
            "currency": "pkr",
            "metadata": { "bookingId": "3" }
        });
        let intent: PaymentIntent = serde_json::from_value(body).unwrap();
        assert_eq!(intent.metadata["bookingId"], "3");
        assert_eq!(intent.amount, 120);
    }
}
