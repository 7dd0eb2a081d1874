use actix_web::{web, HttpResponse, Result};
use serde::Deserialize;
use serde_json::json;

use crate::{
    assistant::{grounded_prompt, AssistantError},
    auth::{
        authenticate_credentials, find_user_by_email, hash_password, issue_token, new_reset_token,
        store_reset_token, update_password, user_for_reset_token,
    },
    halls,
    mailer::reset_link_html,
    models::{PublicUser, ROLE_USER},
    state::AppState,
};

#[derive(Deserialize)]
struct RegisterPayload {
    name: String,
    email: String,
    password: String,
    #[serde(default)]
    phone: String,
}

#[derive(Deserialize)]
struct LoginPayload {
    email: String,
    password: String,
    role: String,
}

#[derive(Deserialize)]
struct ResetRequestPayload {
    email: String,
}

#[derive(Deserialize)]
struct UpdatePasswordPayload {
    token: String,
    #[serde(rename = "newPassword")]
    new_password: String,
}

#[derive(Deserialize)]
struct SearchPayload {
    location: Option<String>,
}

#[derive(Deserialize)]
struct PromptPayload {
    prompt: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/register").route(web::post().to(register)))
        .service(web::resource("/login").route(web::post().to(login)))
        .service(web::resource("/reset-password").route(web::post().to(request_password_reset)))
        .service(web::resource("/verify-reset-token/{token}").route(web::get().to(verify_reset_token)))
        .service(web::resource("/update-password").route(web::post().to(set_new_password)))
        .service(web::resource("/halls").route(web::get().to(list_halls)))
        .service(web::resource("/halls-with-bookings").route(web::get().to(halls_with_bookings)))
        .service(web::resource("/search-halls").route(web::post().to(search_halls)))
        .service(web::resource("/geminiPrompt").route(web::post().to(assistant_prompt)))
        .service(web::resource("/health").route(web::get().to(health)));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

async fn register(
    state: web::Data<AppState>,
    payload: web::Json<RegisterPayload>,
) -> Result<HttpResponse> {
    let payload = payload.into_inner();
    if payload.name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
    {
        return Ok(HttpResponse::BadRequest()
            .json(json!({ "success": false, "message": "Name, email and password are required" })));
    }

    if find_user_by_email(&state.db, payload.email.trim()).await.is_some() {
        return Ok(HttpResponse::Ok()
            .json(json!({ "success": false, "message": "Email already exists" })));
    }

    let password_hash = hash_password(&payload.password)
        .map_err(|_| actix_web::error::ErrorInternalServerError("hash failure"))?;

    if let Err(err) = crate::auth::insert_user(
        &state.db,
        payload.name.trim(),
        payload.email.trim(),
        &password_hash,
        payload.phone.trim(),
        ROLE_USER,
    )
    .await
    {
        log::error!("Registration failed: {err}");
        return Ok(HttpResponse::Ok()
            .json(json!({ "success": false, "message": "Registration failed" })));
    }

    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "User registered successfully" })))
}

async fn login(state: web::Data<AppState>, payload: web::Json<LoginPayload>) -> HttpResponse {
    let payload = payload.into_inner();
    let user = match authenticate_credentials(
        &state.db,
        payload.email.trim(),
        &payload.password,
        &payload.role,
    )
    .await
    {
        Some(user) => user,
        None => {
            return HttpResponse::Ok()
                .json(json!({ "success": false, "message": "Invalid credentials" }));
        }
    };

    let token = match issue_token(
        &state.config.jwt_secret,
        state.config.session_ttl_hours,
        user.id,
        &user.role,
    ) {
        Ok(token) => token,
        Err(err) => {
            log::error!("Token issue failed: {err}");
            return HttpResponse::InternalServerError()
                .json(json!({ "success": false, "message": "Login failed" }));
        }
    };

    HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Login successful",
        "user": PublicUser::from(user),
        "token": token,
    }))
}

async fn request_password_reset(
    state: web::Data<AppState>,
    payload: web::Json<ResetRequestPayload>,
) -> HttpResponse {
    let email = payload.email.trim().to_string();
    if email.is_empty() {
        return HttpResponse::BadRequest()
            .json(json!({ "success": false, "message": "Email is required" }));
    }

    // Known user-enumeration leak, kept for parity with the shipped product.
    if find_user_by_email(&state.db, &email).await.is_none() {
        return HttpResponse::NotFound()
            .json(json!({ "success": false, "message": "Email not found" }));
    }

    let token = new_reset_token();
    if let Err(err) = store_reset_token(&state.db, &email, &token).await {
        log::error!("Token update error: {err}");
        return HttpResponse::InternalServerError()
            .json(json!({ "success": false, "message": "Failed to generate reset token" }));
    }

    let reset_url = format!("{}/reset-password/{token}", state.config.frontend_base_url);
    if let Err(err) = state
        .mailer
        .send(&email, "Password Reset Request - Hall Booking", &reset_link_html(&reset_url))
        .await
    {
        log::error!("Email sending failed: {err}");
        return HttpResponse::InternalServerError().json(
            json!({ "success": false, "message": format!("Failed to send reset email: {err}") }),
        );
    }

    HttpResponse::Ok()
        .json(json!({ "success": true, "message": "Password reset link sent to your email" }))
}

async fn verify_reset_token(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let token = path.into_inner();
    match user_for_reset_token(&state.db, &token).await {
        Some(user) => HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Valid reset token",
            "email": user.email,
        })),
        None => HttpResponse::BadRequest()
            .json(json!({ "success": false, "message": "Invalid or expired reset token" })),
    }
}

async fn set_new_password(
    state: web::Data<AppState>,
    payload: web::Json<UpdatePasswordPayload>,
) -> Result<HttpResponse> {
    let payload = payload.into_inner();
    if payload.token.trim().is_empty() || payload.new_password.is_empty() {
        return Ok(HttpResponse::BadRequest()
            .json(json!({ "success": false, "message": "Token and new password are required" })));
    }

    if user_for_reset_token(&state.db, &payload.token).await.is_none() {
        return Ok(HttpResponse::BadRequest()
            .json(json!({ "success": false, "message": "Invalid or expired reset token" })));
    }

    let password_hash = hash_password(&payload.new_password)
        .map_err(|_| actix_web::error::ErrorInternalServerError("hash failure"))?;

    match update_password(&state.db, &payload.token, &password_hash).await {
        Ok(true) => Ok(HttpResponse::Ok()
            .json(json!({ "success": true, "message": "Password updated successfully" }))),
        Ok(false) => Ok(HttpResponse::BadRequest()
            .json(json!({ "success": false, "message": "Invalid or expired reset token" }))),
        Err(err) => {
            log::error!("Password update error: {err}");
            Ok(HttpResponse::InternalServerError()
                .json(json!({ "success": false, "message": "Failed to update password" })))
        }
    }
}

async fn list_halls(state: web::Data<AppState>) -> HttpResponse {
    match halls::active_halls(&state.db).await {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(err) => {
            log::error!("Database error: {err}");
            HttpResponse::InternalServerError().json(json!({ "error": "Database error" }))
        }
    }
}

async fn halls_with_bookings(state: web::Data<AppState>) -> HttpResponse {
    match halls::halls_with_bookings(&state.db).await {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(err) => {
            log::error!("Database error: {err}");
            HttpResponse::InternalServerError().json(json!({ "error": "Database error" }))
        }
    }
}

async fn search_halls(state: web::Data<AppState>, payload: web::Json<SearchPayload>) -> HttpResponse {
    let location = match payload.location.as_deref().map(str::trim) {
        Some(location) if !location.is_empty() => location.to_string(),
        _ => {
            return HttpResponse::BadRequest().json(json!({ "error": "Location is required" }));
        }
    };

    match halls::search_by_location(&state.db, &location).await {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(err) => {
            log::error!("Search query error: {err}");
            HttpResponse::InternalServerError().json(json!({ "error": "Database error" }))
        }
    }
}

async fn assistant_prompt(
    state: web::Data<AppState>,
    payload: web::Json<PromptPayload>,
) -> HttpResponse {
    let question = match payload.prompt.as_deref().map(str::trim) {
        Some(question) if !question.is_empty() => question.to_string(),
        _ => return HttpResponse::BadRequest().json(json!({ "error": "Prompt is required" })),
    };

    let halls = match halls::active_halls(&state.db).await {
        Ok(rows) => rows,
        Err(err) => {
            log::error!("Database error: {err}");
            return HttpResponse::InternalServerError().json(json!({ "error": "Database error" }));
        }
    };
    let halls_json = serde_json::to_string(&halls).unwrap_or_else(|_| "[]".to_string());

    match state
        .assistant
        .generate(&grounded_prompt(&halls_json, &question))
        .await
    {
        Ok(text) => HttpResponse::Ok().json(json!({ "result": text })),
        Err(AssistantError::Overloaded) => HttpResponse::ServiceUnavailable().json(json!({
            "error": "Assistant service is currently overloaded. Please try again in a few minutes.",
            "details": "Service temporarily unavailable",
        })),
        Err(AssistantError::Upstream(message)) => {
            log::error!("Assistant error after retries: {message}");
            HttpResponse::InternalServerError()
                .json(json!({ "error": "Assistant API error", "details": message }))
        }
    }
}
