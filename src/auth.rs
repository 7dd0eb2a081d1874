use actix_web::{dev::ServiceRequest, error::ErrorUnauthorized, web, Error, HttpMessage};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    models::{UserRow, ROLE_ADMIN},
    state::AppState,
};

pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;

#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: i64,
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub role: String,
    pub exp: i64,
}

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed_hash = PasswordHash::new(password_hash);
    match parsed_hash {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn issue_token(
    secret: &str,
    ttl_hours: i64,
    user_id: i64,
    role: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user_id,
        role: role.to_string(),
        exp: (Utc::now() + Duration::hours(ttl_hours)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn decode_token(secret: &str, token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

fn authenticate(req: &ServiceRequest, credentials: &BearerAuth) -> Result<AuthUser, Error> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ErrorUnauthorized("Unauthorized"))?;
    let claims = decode_token(&state.config.jwt_secret, credentials.token())
        .ok_or_else(|| ErrorUnauthorized("Unauthorized"))?;
    Ok(AuthUser {
        id: claims.sub,
        role: claims.role,
    })
}

pub async fn bearer_validator(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    match authenticate(&req, &credentials) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            Ok(req)
        }
        Err(err) => Err((err, req)),
    }
}

pub async fn admin_validator(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    match authenticate(&req, &credentials) {
        Ok(user) => {
            if user.role != ROLE_ADMIN {
                return Err((ErrorUnauthorized("Admin access required"), req));
            }
            req.extensions_mut().insert(user);
            Ok(req)
        }
        Err(err) => Err((err, req)),
    }
}

pub fn new_reset_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Option<UserRow> {
    sqlx::query_as::<_, UserRow>(
        r#"SELECT id, name, email, password_hash, phone, role, reset_token, reset_token_expiry, created_at
           FROM users
           WHERE email = ?
           LIMIT 1"#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .unwrap_or(None)
}

pub async fn insert_user(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password_hash: &str,
    phone: &str,
    role: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO users (name, email, password_hash, phone, role, created_at)
           VALUES (?, ?, ?, ?, ?, ?)"#,
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(phone)
    .bind(role)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}

/// Login lookup is keyed on (email, role): a user row cannot authenticate
/// through the admin path even with correct credentials.
pub async fn authenticate_credentials(
    pool: &SqlitePool,
    email: &str,
    password: &str,
    role: &str,
) -> Option<UserRow> {
    let user = sqlx::query_as::<_, UserRow>(
        r#"SELECT id, name, email, password_hash, phone, role, reset_token, reset_token_expiry, created_at
           FROM users
           WHERE email = ? AND role = ?
           LIMIT 1"#,
    )
    .bind(email)
    .bind(role)
    .fetch_optional(pool)
    .await
    .ok()??;

    if !verify_password(password, &user.password_hash) {
        return None;
    }

    Some(user)
}

pub async fn store_reset_token(
    pool: &SqlitePool,
    email: &str,
    token: &str,
) -> Result<(), sqlx::Error> {
    let expiry = (Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES)).to_rfc3339();
    sqlx::query("UPDATE users SET reset_token = ?, reset_token_expiry = ? WHERE email = ?")
        .bind(token)
        .bind(expiry)
        .bind(email)
        .execute(pool)
        .await?;
    Ok(())
}

/// Returns the user holding this token only while the token is unexpired.
pub async fn user_for_reset_token(pool: &SqlitePool, token: &str) -> Option<UserRow> {
    let user = sqlx::query_as::<_, UserRow>(
        r#"SELECT id, name, email, password_hash, phone, role, reset_token, reset_token_expiry, created_at
           FROM users
           WHERE reset_token = ?
           LIMIT 1"#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await
    .ok()??;

    let expiry = user.reset_token_expiry.as_deref()?;
    let expiry = DateTime::parse_from_rfc3339(expiry).ok()?;
    if expiry <= Utc::now() {
        return None;
    }
    Some(user)
}

/// Consumes the token: overwrites the hash and clears token + expiry.
pub async fn update_password(
    pool: &SqlitePool,
    token: &str,
    password_hash: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"UPDATE users
           SET password_hash = ?, reset_token = NULL, reset_token_expiry = NULL
           WHERE reset_token = ?"#,
    )
    .bind(password_hash)
    .bind(token)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::ROLE_USER;

    async fn test_pool() -> SqlitePool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        db::run_migrations(&pool).await.unwrap();
        pool
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn token_round_trip_carries_identity() {
        let token = issue_token("secret", 1, 42, ROLE_ADMIN).unwrap();
        let claims = decode_token("secret", &token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, ROLE_ADMIN);
        assert!(decode_token("other-secret", &token).is_none());
    }

    #[test]
    fn reset_tokens_are_256_bit_hex() {
        let token = new_reset_token();
        assert_eq!(token.len(), 64);
        assert_ne!(token, new_reset_token());
    }

    #[tokio::test]
    async fn login_is_keyed_on_email_and_role() {
        let pool = test_pool().await;
        let hash = hash_password("pw").unwrap();
        insert_user(&pool, "A", "a@x.com", &hash, "0300", ROLE_USER)
            .await
            .unwrap();

        assert!(authenticate_credentials(&pool, "a@x.com", "pw", ROLE_USER)
            .await
            .is_some());
        assert!(authenticate_credentials(&pool, "a@x.com", "pw", ROLE_ADMIN)
            .await
            .is_none());
        assert!(authenticate_credentials(&pool, "a@x.com", "bad", ROLE_USER)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn reset_token_flow_expires_and_consumes() {
        let pool = test_pool().await;
        let hash = hash_password("pw").unwrap();
        insert_user(&pool, "A", "a@x.com", &hash, "0300", ROLE_USER)
            .await
            .unwrap();

        let token = new_reset_token();
        store_reset_token(&pool, "a@x.com", &token).await.unwrap();
        let user = user_for_reset_token(&pool, &token).await.unwrap();
        assert_eq!(user.email, "a@x.com");

        // Simulate the 1-hour timeout.
        sqlx::query("UPDATE users SET reset_token_expiry = ? WHERE email = ?")
            .bind((Utc::now() - Duration::minutes(1)).to_rfc3339())
            .bind("a@x.com")
            .execute(&pool)
            .await
            .unwrap();
        assert!(user_for_reset_token(&pool, &token).await.is_none());

        // A fresh token is consumed by a successful update.
        store_reset_token(&pool, "a@x.com", &token).await.unwrap();
        let new_hash = hash_password("new-pw").unwrap();
        assert!(update_password(&pool, &token, &new_hash).await.unwrap());
        assert!(user_for_reset_token(&pool, &token).await.is_none());
        assert!(authenticate_credentials(&pool, "a@x.com", "new-pw", ROLE_USER)
            .await
            .is_some());
    }
}
