//! authentication api routes cookie based opaque session tokens

use actix_web::cookie::{time::Duration as CookieDuration, Cookie};
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use serde::Deserialize;

use crate::db::{SessionTable, UserTable};
use crate::models::{Session, User};
use crate::utils::auth::{
    generate_random_string, hash_password, verify_password, SESSION_TOKEN_LENGTH,
};

/// Session lifetime: 30 days in seconds
const SESSION_MAX_AGE: i64 = 30 * 24 * 3600;

/// Cookie carrying the session token
const SESSION_COOKIE: &str = "session";

/// signup / login request
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// register a new account and log it in
#[post("/register")]
pub async fn register(body: web::Json<CredentialsRequest>) -> impl Responder {
    let engine = match super::db() {
        Ok(e) => e,
        Err(resp) => return resp,
    };
    let pool = engine.pool();

    let username = body.username.trim();
    if username.is_empty() || body.password.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "msg": "Username and password are required"
        }));
    }

    match UserTable::get_by_username(pool, username).await {
        Ok(Some(_)) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "msg": "Username already exists"
            }));
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!("Database error checking username: {:#}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "msg": "Something went wrong"
            }));
        }
    }

    let password_hash = match hash_password(&body.password) {
        Ok(h) => h,
        Err(e) => {
            tracing::error!("Failed to hash password: {:#}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "msg": "Something went wrong"
            }));
        }
    };

    let user = User::new(username.to_string(), password_hash);
    if let Err(e) = UserTable::insert(pool, &user).await {
        tracing::error!("Failed to insert user: {:#}", e);
        return HttpResponse::InternalServerError().json(serde_json::json!({
            "msg": "Something went wrong"
        }));
    }

    start_session(pool, &user).await
}

/// login endpoint
#[post("/login")]
pub async fn login(body: web::Json<CredentialsRequest>) -> impl Responder {
    let engine = match super::db() {
        Ok(e) => e,
        Err(resp) => return resp,
    };
    let pool = engine.pool();

    match UserTable::get_by_username(pool, body.username.trim()).await {
        Ok(Some(user)) => {
            if verify_password(&body.password, &user.password).unwrap_or(false) {
                start_session(pool, &user).await
            } else {
                HttpResponse::Unauthorized().json(serde_json::json!({
                    "msg": "Invalid password"
                }))
            }
        }
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "msg": "User not found"
        })),
        Err(e) => {
            tracing::error!("Database error during login: {:#}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "msg": "Something went wrong"
            }))
        }
    }
}

/// logout deletes the session row and clears the cookie
#[post("/logout")]
pub async fn logout(req: HttpRequest) -> impl Responder {
    let engine = match super::db() {
        Ok(e) => e,
        Err(resp) => return resp,
    };
    let pool = engine.pool();

    if let Some(token) = session_token(&req) {
        if let Err(e) = SessionTable::delete(pool, &token).await {
            tracing::error!("Failed to delete session: {:#}", e);
        }
    }

    // opportunistic sweep of expired sessions
    let _ = SessionTable::delete_expired(pool, Utc::now().timestamp()).await;

    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .finish();
    cookie.make_removal();

    HttpResponse::Ok().cookie(cookie).json(serde_json::json!({
        "msg": "Logged out"
    }))
}

/// currently logged in user
#[get("/currentuser")]
pub async fn current_user(req: HttpRequest) -> impl Responder {
    let engine = match super::db() {
        Ok(e) => e,
        Err(resp) => return resp,
    };

    match require_user(engine.pool(), &req).await {
        Ok(user) => HttpResponse::Ok().json(user.to_public()),
        Err(resp) => resp,
    }
}

/// configure auth routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(login)
        .service(logout)
        .service(current_user);
}

/// Create a session for `user` and answer with the cookie and public profile
async fn start_session(pool: &sqlx::SqlitePool, user: &User) -> HttpResponse {
    let session = Session {
        id: generate_random_string(SESSION_TOKEN_LENGTH),
        userid: user.id.clone(),
        expires_at: Utc::now().timestamp() + SESSION_MAX_AGE,
    };

    if let Err(e) = SessionTable::insert(pool, &session).await {
        tracing::error!("Failed to create session: {:#}", e);
        return HttpResponse::InternalServerError().json(serde_json::json!({
            "msg": "Something went wrong"
        }));
    }

    let cookie = Cookie::build(SESSION_COOKIE, session.id.clone())
        .path("/")
        .http_only(true)
        .max_age(CookieDuration::seconds(SESSION_MAX_AGE))
        .finish();

    HttpResponse::Ok().cookie(cookie).json(serde_json::json!({
        "msg": format!("Logged in as {}", user.username),
        "user": user.to_public(),
    }))
}

/// Resolve the authenticated user or answer 401.
///
/// Used by every handler that mutates state; the session collaborator is
/// trusted completely once the token resolves.
pub(crate) async fn require_user(
    pool: &sqlx::SqlitePool,
    req: &HttpRequest,
) -> Result<User, HttpResponse> {
    match auth_user_optional(pool, req).await? {
        Some(user) => Ok(user),
        None => Err(HttpResponse::Unauthorized().json(serde_json::json!({
            "code": "UNAUTHORIZED",
            "msg": "Not authenticated"
        }))),
    }
}

/// Resolve the session token to a user, if a valid unexpired session exists
pub(crate) async fn auth_user_optional(
    pool: &sqlx::SqlitePool,
    req: &HttpRequest,
) -> Result<Option<User>, HttpResponse> {
    let Some(token) = session_token(req) else {
        return Ok(None);
    };

    let session = match SessionTable::get(pool, &token).await {
        Ok(Some(s)) => s,
        Ok(None) => return Ok(None),
        Err(e) => {
            tracing::error!("Database error resolving session: {:#}", e);
            return Err(HttpResponse::InternalServerError().json(serde_json::json!({
                "msg": "Something went wrong"
            })));
        }
    };

    if !session.is_valid(Utc::now().timestamp()) {
        return Ok(None);
    }

    match UserTable::get_by_id(pool, &session.userid).await {
        Ok(user) => Ok(user),
        Err(e) => {
            tracing::error!("Database error resolving session user: {:#}", e);
            Err(HttpResponse::InternalServerError().json(serde_json::json!({
                "msg": "Something went wrong"
            })))
        }
    }
}

/// Session token from the cookie, or a Bearer token as fallback
fn session_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    let header = req.headers().get("Authorization")?.to_str().ok()?.trim();
    let token = header.strip_prefix("Bearer ").unwrap_or(header);
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
