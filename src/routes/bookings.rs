use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{bearer_validator, AuthUser},
    bookings::{self, BookingInput, CreateOutcome},
    mailer::{approval_notice_html, payment_receipt_html},
    models::{ROLE_ADMIN, TIME_SLOTS},
    payments::verify_intent_for_booking,
    state::AppState,
};

#[derive(Deserialize)]
struct CreateIntentPayload {
    amount: Option<i64>,
    #[serde(rename = "bookingId")]
    booking_id: Option<i64>,
    currency: Option<String>,
}

#[derive(Deserialize)]
struct PaymentCompletePayload {
    #[serde(rename = "paymentIntentId")]
    payment_intent_id: String,
}

#[derive(Deserialize)]
struct BookingEmailPayload {
    to: String,
    subject: String,
    #[serde(rename = "bookingDetails")]
    booking_details: BookingEmailDetails,
}

#[derive(Deserialize)]
struct BookingEmailDetails {
    #[serde(rename = "hallName")]
    hall_name: String,
    location: String,
    time: String,
    capacity: i64,
    price: i64,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/bookings")
            .wrap(HttpAuthentication::bearer(bearer_validator))
            .route(web::post().to(create_booking)),
    )
    .service(
        web::resource("/mybookings/{userId}")
            .wrap(HttpAuthentication::bearer(bearer_validator))
            .route(web::get().to(my_bookings)),
    )
    .service(
        web::resource("/bookings/{id}")
            .wrap(HttpAuthentication::bearer(bearer_validator))
            .route(web::delete().to(cancel_booking)),
    )
    .service(
        web::resource("/user/bookings/{id}/remove")
            .wrap(HttpAuthentication::bearer(bearer_validator))
            .route(web::delete().to(remove_from_history)),
    )
    .service(
        web::resource("/create-payment-intent")
            .wrap(HttpAuthentication::bearer(bearer_validator))
            .route(web::post().to(create_payment_intent)),
    )
    .service(
        web::resource("/bookings/{id}/payment-complete")
            .wrap(HttpAuthentication::bearer(bearer_validator))
            .route(web::put().to(complete_payment)),
    )
    .service(
        web::resource("/sendBookingEmail")
            .wrap(HttpAuthentication::bearer(bearer_validator))
            .route(web::post().to(send_booking_email)),
    );
}

async fn create_booking(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    payload: web::Json<BookingInput>,
) -> HttpResponse {
    let input = payload.into_inner();
    if !TIME_SLOTS.contains(&input.time.as_str()) {
        return HttpResponse::BadRequest()
            .json(json!({ "success": false, "message": "Invalid time slot" }));
    }

    // The owner is whoever holds the session token, never a body-supplied id.
    match bookings::create_booking(&state.db, auth.id, &input).await {
        Ok(CreateOutcome::Created) => HttpResponse::Ok()
            .json(json!({ "success": true, "message": "Booking created successfully" })),
        Ok(CreateOutcome::SlotTaken) => HttpResponse::Ok().json(
            json!({ "success": false, "message": "Hall is already booked for this date and time" }),
        ),
        Err(err) => {
            log::error!("Booking insert failed: {err}");
            HttpResponse::Ok().json(json!({ "success": false, "message": "Booking failed" }))
        }
    }
}

async fn my_bookings(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<i64>,
) -> HttpResponse {
    let user_id = path.into_inner();
    if auth.id != user_id && auth.role != ROLE_ADMIN {
        return HttpResponse::Forbidden()
            .json(json!({ "success": false, "message": "Not your booking history" }));
    }

    match bookings::bookings_for_user(&state.db, user_id).await {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(err) => {
            log::error!("Database error: {err}");
            HttpResponse::InternalServerError().json(json!({ "error": "Database error" }))
        }
    }
}

async fn cancel_booking(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    match bookings::delete_booking(&state.db, path.into_inner()).await {
        Ok(true) => HttpResponse::Ok()
            .json(json!({ "success": true, "message": "Booking cancelled successfully" })),
        Ok(false) => HttpResponse::NotFound()
            .json(json!({ "success": false, "message": "Booking not found" })),
        Err(err) => {
            log::error!("Database error: {err}");
            HttpResponse::InternalServerError()
                .json(json!({ "success": false, "message": "Failed to cancel booking" }))
        }
    }
}

async fn remove_from_history(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    match bookings::delete_booking(&state.db, path.into_inner()).await {
        Ok(true) => HttpResponse::Ok().json(
            json!({ "success": true, "message": "Booking removed from history successfully" }),
        ),
        Ok(false) => HttpResponse::NotFound()
            .json(json!({ "success": false, "message": "Booking not found" })),
        Err(err) => {
            log::error!("Database error: {err}");
            HttpResponse::InternalServerError().json(
                json!({ "success": false, "message": "Failed to remove booking from history" }),
            )
        }
    }
}

async fn create_payment_intent(
    state: web::Data<AppState>,
    payload: web::Json<CreateIntentPayload>,
) -> HttpResponse {
    let payload = payload.into_inner();
    let (amount, booking_id) = match (payload.amount, payload.booking_id) {
        (Some(amount), Some(booking_id)) => (amount, booking_id),
        _ => {
            return HttpResponse::BadRequest()
                .json(json!({ "error": "Amount and booking ID are required" }));
        }
    };
    let currency = payload.currency.unwrap_or_else(|| "pkr".to_string());

    match state.payments.create_intent(amount, &currency, booking_id).await {
        Ok(intent) => HttpResponse::Ok().json(json!({
            "client_secret": intent.client_secret,
            "payment_intent_id": intent.id,
        })),
        Err(err) => {
            log::error!("Error creating payment intent: {err}");
            HttpResponse::InternalServerError().json(json!({ "error": err.to_string() }))
        }
    }
}

async fn complete_payment(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    payload: web::Json<PaymentCompletePayload>,
) -> HttpResponse {
    let booking_id = path.into_inner();
    let intent_id = payload.into_inner().payment_intent_id;

    let booking = match bookings::booking_by_id(&state.db, booking_id).await {
        Some(booking) => booking,
        None => {
            return HttpResponse::NotFound()
                .json(json!({ "success": false, "message": "Booking not found" }));
        }
    };

    let intent = match state.payments.retrieve_intent(&intent_id).await {
        Ok(intent) => intent,
        Err(err) => {
            log::error!("Error completing payment: {err}");
            return HttpResponse::InternalServerError()
                .json(json!({ "success": false, "message": "Payment completion failed" }));
        }
    };

    if let Err(message) = verify_intent_for_booking(&intent, booking_id, booking.total_price) {
        return HttpResponse::BadRequest().json(json!({ "success": false, "message": message }));
    }

    match bookings::mark_paid(&state.db, booking_id, &intent.id).await {
        Ok(true) => {}
        Ok(false) => {
            return HttpResponse::NotFound()
                .json(json!({ "success": false, "message": "Booking not found" }));
        }
        Err(err) => {
            log::error!("Database error updating payment status: {err}");
            return HttpResponse::InternalServerError()
                .json(json!({ "success": false, "message": "Failed to update payment status" }));
        }
    }

    if let Some(contact) = bookings::booking_contact(&state.db, booking_id).await {
        let html = payment_receipt_html(&contact, &intent.id, state.mailer.admin_contact());
        state.mailer.send_detached(
            contact.user_email,
            "Payment Confirmation - Hall Booking".to_string(),
            html,
        );
    }

    HttpResponse::Ok().json(json!({ "success": true, "message": "Payment completed successfully" }))
}

async fn send_booking_email(
    state: web::Data<AppState>,
    payload: web::Json<BookingEmailPayload>,
) -> HttpResponse {
    let payload = payload.into_inner();
    let html = approval_notice_html(
        &payload.booking_details.hall_name,
        &payload.booking_details.location,
        &payload.booking_details.time,
        payload.booking_details.capacity,
        payload.booking_details.price,
        state.mailer.admin_contact(),
    );

    match state.mailer.send(&payload.to, &payload.subject, &html).await {
        Ok(()) => HttpResponse::Ok()
            .json(json!({ "success": true, "message": "Booking confirmation email sent!" })),
        Err(err) => {
            log::error!("Email sending failed: {err}");
            HttpResponse::InternalServerError()
                .json(json!({ "success": false, "message": "Email sending failed." }))
        }
    }
}
