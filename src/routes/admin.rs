use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::admin_validator,
    bookings::{self, StatusOutcome},
    halls::{self, HallInput},
    mailer::payment_required_html,
    models::{STATUS_APPROVED, STATUS_REJECTED},
    state::AppState,
};

#[derive(Deserialize)]
struct StatusPayload {
    status: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .wrap(HttpAuthentication::bearer(admin_validator))
            .service(web::resource("/bookings").route(web::get().to(list_bookings)))
            .service(
                web::resource("/bookings/{id}").route(web::put().to(update_booking_status)),
            )
            .service(
                web::resource("/bookings/{id}/remove").route(web::delete().to(remove_booking)),
            )
            .service(web::resource("/halls").route(web::get().to(active_halls)).route(web::post().to(add_hall)))
            .service(web::resource("/halls/all").route(web::get().to(all_halls)))
            .service(
                web::resource("/halls/{id}")
                    .route(web::put().to(edit_hall))
                    .route(web::delete().to(soft_delete_hall)),
            )
            .service(web::resource("/halls/{id}/restore").route(web::put().to(restore_hall))),
    );
}

async fn list_bookings(state: web::Data<AppState>) -> HttpResponse {
    match bookings::all_bookings(&state.db).await {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(err) => {
            log::error!("Database error: {err}");
            HttpResponse::InternalServerError().json(json!({ "error": "Database error" }))
        }
    }
}

async fn update_booking_status(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    payload: web::Json<StatusPayload>,
) -> HttpResponse {
    let booking_id = path.into_inner();
    let status = payload.into_inner().status;
    if status != STATUS_APPROVED && status != STATUS_REJECTED {
        return HttpResponse::BadRequest()
            .json(json!({ "success": false, "message": "Status must be approved or rejected" }));
    }

    match bookings::set_status(&state.db, booking_id, &status).await {
        Ok(StatusOutcome::Updated) => {}
        Ok(StatusOutcome::NotFound) => {
            return HttpResponse::NotFound()
                .json(json!({ "success": false, "message": "Booking not found" }));
        }
        Ok(StatusOutcome::SlotTaken) => {
            return HttpResponse::Ok().json(json!({
                "success": false,
                "message": "Hall is already booked for this date and time",
            }));
        }
        Err(err) => {
            log::error!("Database error: {err}");
            return HttpResponse::InternalServerError().json(json!({ "error": "Database error" }));
        }
    }

    // Approval asks the owner to pay. Rejection stays silent, and a failed
    // send never rolls back the status change.
    if status == STATUS_APPROVED {
        if let Some(contact) = bookings::booking_contact(&state.db, booking_id).await {
            let html = payment_required_html(&contact, state.mailer.admin_contact());
            state.mailer.send_detached(
                contact.user_email,
                "Booking Approved - Payment Required".to_string(),
                html,
            );
        }
    }

    HttpResponse::Ok().json(json!({ "success": true, "message": "Booking status updated" }))
}

async fn remove_booking(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
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

async fn active_halls(state: web::Data<AppState>) -> HttpResponse {
    match halls::active_halls(&state.db).await {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(err) => {
            log::error!("Database error: {err}");
            HttpResponse::InternalServerError().json(json!({ "error": "Database error" }))
        }
    }
}

async fn all_halls(state: web::Data<AppState>) -> HttpResponse {
    match halls::all_halls(&state.db).await {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(err) => {
            log::error!("Database error: {err}");
            HttpResponse::InternalServerError().json(json!({ "error": "Database error" }))
        }
    }
}

async fn add_hall(state: web::Data<AppState>, payload: web::Json<HallInput>) -> HttpResponse {
    match halls::insert_hall(&state.db, &payload).await {
        Ok(_) => {
            HttpResponse::Ok().json(json!({ "success": true, "message": "Hall added successfully" }))
        }
        Err(err) => {
            log::error!("Hall insert failed: {err}");
            HttpResponse::Ok().json(json!({ "success": false, "message": "Failed to add hall" }))
        }
    }
}

async fn edit_hall(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    payload: web::Json<HallInput>,
) -> HttpResponse {
    match halls::update_hall(&state.db, path.into_inner(), &payload).await {
        Ok(true) => HttpResponse::Ok()
            .json(json!({ "success": true, "message": "Hall updated successfully" })),
        Ok(false) => HttpResponse::NotFound()
            .json(json!({ "success": false, "message": "Hall not found" })),
        Err(err) => {
            log::error!("Hall update failed: {err}");
            HttpResponse::Ok().json(json!({ "success": false, "message": "Failed to update hall" }))
        }
    }
}

async fn soft_delete_hall(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    match halls::set_active(&state.db, path.into_inner(), false).await {
        Ok(true) => HttpResponse::Ok()
            .json(json!({ "success": true, "message": "Hall deleted successfully" })),
        Ok(false) => HttpResponse::NotFound()
            .json(json!({ "success": false, "message": "Hall not found" })),
        Err(err) => {
            log::error!("Hall delete failed: {err}");
            HttpResponse::Ok().json(json!({ "success": false, "message": "Failed to delete hall" }))
        }
    }
}

async fn restore_hall(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    match halls::set_active(&state.db, path.into_inner(), true).await {
        Ok(true) => HttpResponse::Ok()
            .json(json!({ "success": true, "message": "Hall restored successfully" })),
        Ok(false) => HttpResponse::NotFound()
            .json(json!({ "success": false, "message": "Hall not found" })),
        Err(err) => {
            log::error!("Hall restore failed: {err}");
            HttpResponse::InternalServerError().json(json!({ "error": "Database error" }))
        }
    }
}
