//! Board API route

use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

use crate::api::auth::auth_user_optional;
use crate::config::UserConfig;
use crate::core::ranking::compute_board;
use crate::core::uploads::can_upload;

/// the ranked board, partitioned by category
///
/// Anonymous viewers get the same ranking with every `canVote` false and
/// `canUpload` false.
#[get("")]
pub async fn get_board(req: HttpRequest) -> impl Responder {
    let engine = match super::db() {
        Ok(e) => e,
        Err(resp) => return resp,
    };
    let pool = engine.pool();

    let viewer = match auth_user_optional(pool, &req).await {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let now = Utc::now().timestamp();

    let board = match compute_board(pool, viewer.as_ref(), now).await {
        Ok(board) => board,
        Err(e) => {
            tracing::error!("Failed to compute board: {:#}", e);
            return HttpResponse::InternalServerError().json(json!({
                "code": "DATABASE_ERROR",
                "msg": "Something went wrong"
            }));
        }
    };

    let uploading_allowed = match &viewer {
        Some(user) => {
            let bypass = UserConfig::load()
                .map(|cfg| cfg.bypass_upload_limit)
                .unwrap_or(false);
            can_upload(user, now, bypass)
        }
        None => false,
    };

    HttpResponse::Ok().json(json!({
        "tracksByType": board,
        "canUpload": uploading_allowed,
        "user": viewer.map(|u| u.to_public()),
    }))
}

/// Configure board routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_board);
}
