//! REST API routes for Trackboard

pub mod auth;
pub mod board;
pub mod track;

use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::db::DbEngine;

/// Configure all API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // Auth routes
        .service(web::scope("/auth").configure(auth::configure))
        // Board routes
        .service(web::scope("/board").configure(board::configure))
        // Track routes (upload + vote)
        .service(web::scope("/track").configure(track::configure));
}

/// Resolve the global database engine, or a 500 the handler can return
pub(crate) fn db() -> Result<Arc<DbEngine>, HttpResponse> {
    DbEngine::get().map_err(|e| {
        tracing::error!("Database unavailable: {:#}", e);
        HttpResponse::InternalServerError().json(serde_json::json!({
            "code": "DATABASE_ERROR",
            "msg": "Something went wrong"
        }))
    })
}
