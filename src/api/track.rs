//! Track API routes: voting and uploading

use actix_multipart::Multipart;
use actix_web::{post, web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;

use crate::api::auth::require_user;
use crate::config::UserConfig;
use crate::core::uploads::{register_upload, TrackSubmission, UploadError, UploadedFile};
use crate::core::voting::{cast_vote, VoteError};
use crate::storage::BunnyStorage;
use crate::utils::dates::timestamp_to_relative;

#[derive(Debug, Deserialize)]
pub struct VoteBody {
    #[serde(rename = "songId")]
    pub song_id: i64,
}

/// cast an upvote on a track
#[post("/vote")]
pub async fn vote(req: HttpRequest, body: web::Json<VoteBody>) -> impl Responder {
    let engine = match super::db() {
        Ok(e) => e,
        Err(resp) => return resp,
    };
    let pool = engine.pool();

    let user = match require_user(pool, &req).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    let now = Utc::now().timestamp();

    match cast_vote(pool, &user.id, body.song_id, now).await {
        Ok(title) => HttpResponse::Ok().json(json!({
            "msg": format!("Voted for {}", title),
            "votedTrackName": title,
        })),
        Err(e) => vote_error_response(e),
    }
}

/// upload a new track (multipart: title, track_type, files)
#[post("/upload")]
pub async fn upload(req: HttpRequest, payload: Multipart) -> impl Responder {
    let engine = match super::db() {
        Ok(e) => e,
        Err(resp) => return resp,
    };
    let pool = engine.pool();

    let user = match require_user(pool, &req).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    let config = match UserConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Failed to load config: {:#}", e);
            return HttpResponse::InternalServerError().json(json!({
                "msg": "Something went wrong"
            }));
        }
    };

    let submission = match read_submission(payload).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let storage = BunnyStorage::from_config(&config);
    let now = Utc::now().timestamp();

    match register_upload(
        pool,
        &storage,
        &config.cdn_base_url,
        &user,
        submission,
        now,
        config.bypass_upload_limit,
    )
    .await
    {
        Ok(track) => HttpResponse::Ok().json(json!({
            "msg": format!("Uploaded {}", track.title),
            "track": track,
        })),
        Err(e) => upload_error_response(e),
    }
}

/// Configure track routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(vote).service(upload);
}

/// Collect the multipart form into a submission. Every part named `files`
/// becomes a file candidate; the registrar enforces the exactly-one rule.
async fn read_submission(mut payload: Multipart) -> Result<TrackSubmission, HttpResponse> {
    let mut title = String::new();
    let mut category = String::new();
    let mut files: Vec<UploadedFile> = Vec::new();

    while let Some(Ok(mut field)) = payload.next().await {
        let disp = field.content_disposition().clone();
        let name = disp.get_name().map(|s| s.to_string()).unwrap_or_default();
        let filename = disp.get_filename().map(|s| s.to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            match chunk {
                Ok(data) => bytes.extend_from_slice(&data),
                Err(e) => {
                    tracing::error!("Multipart read error: {}", e);
                    return Err(HttpResponse::BadRequest().json(json!({
                        "code": "INVALID_FORM",
                        "msg": "Could not read the upload form"
                    })));
                }
            }
        }

        match name.as_str() {
            "title" => {
                title = String::from_utf8_lossy(&bytes).trim().to_string();
            }
            "track_type" => {
                category = String::from_utf8_lossy(&bytes).trim().to_string();
            }
            "files" => {
                files.push(UploadedFile {
                    filename: filename.unwrap_or_default(),
                    bytes,
                });
            }
            _ => {}
        }
    }

    Ok(TrackSubmission {
        title,
        category,
        files,
    })
}

fn vote_error_response(err: VoteError) -> HttpResponse {
    match err {
        VoteError::Unauthorized => HttpResponse::Unauthorized().json(json!({
            "code": "UNAUTHORIZED",
            "msg": "Not authenticated"
        })),
        VoteError::InvalidTrackId => HttpResponse::BadRequest().json(json!({
            "code": "INVALID_SONG_ID",
            "msg": "Invalid track id"
        })),
        VoteError::RateLimited { next_vote } => HttpResponse::TooManyRequests().json(json!({
            "code": "DAILY_LIMIT_REACHED",
            "msg": format!("You can vote again {}", timestamp_to_relative(next_vote)),
            "nextVote": next_vote,
        })),
        VoteError::TrackNotFound => HttpResponse::NotFound().json(json!({
            "code": "SONG_NOT_FOUND",
            "msg": "That track does not exist"
        })),
        VoteError::PromotedTrack => HttpResponse::Forbidden().json(json!({
            "code": "CANNOT_VOTE_PROMOTED",
            "msg": "Promoted tracks cannot be voted on"
        })),
        VoteError::AlreadyVotedToday => HttpResponse::Conflict().json(json!({
            "code": "ALREADY_VOTED_TODAY",
            "msg": "You already voted on this track today"
        })),
        VoteError::OwnTrack => HttpResponse::Forbidden().json(json!({
            "code": "CANNOT_VOTE_OWN_SONG",
            "msg": "You cannot vote on your own track"
        })),
        VoteError::Database(e) => {
            tracing::error!("Database error casting vote: {:#}", e);
            HttpResponse::InternalServerError().json(json!({
                "code": "DATABASE_ERROR",
                "msg": "Something went wrong"
            }))
        }
    }
}

fn upload_error_response(err: UploadError) -> HttpResponse {
    match err {
        UploadError::Unauthorized => HttpResponse::Unauthorized().json(json!({
            "code": "UNAUTHORIZED",
            "msg": "Not authenticated"
        })),
        UploadError::RateLimited { next_upload } => HttpResponse::BadRequest().json(json!({
            "code": "MAXIMUM_LIMIT",
            "msg": format!("You can upload again {}", timestamp_to_relative(next_upload)),
            "nextUpload": next_upload,
        })),
        UploadError::MissingTitle => HttpResponse::BadRequest().json(json!({
            "code": "MISSING_TITLE",
            "msg": "A title is required"
        })),
        UploadError::InvalidCategory => HttpResponse::BadRequest().json(json!({
            "code": "INVALID_TRACK_TYPE",
            "msg": "Unknown track category"
        })),
        UploadError::NoFile => HttpResponse::BadRequest().json(json!({
            "code": "NO_FILE",
            "msg": "Submit exactly one file"
        })),
        UploadError::UploadFailed => HttpResponse::BadRequest().json(json!({
            "code": "UPLOAD_FAILED",
            "msg": "The file could not be stored, try again"
        })),
        UploadError::Database(e) => {
            tracing::error!("Database error registering upload: {:#}", e);
            HttpResponse::InternalServerError().json(json!({
                "code": "DATABASE_ERROR",
                "msg": "Something went wrong"
            }))
        }
    }
}
