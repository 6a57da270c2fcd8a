//! The upload write path
//!
//! `register_upload` validates a submission, streams the audio to blob
//! storage, and only then records the track and the uploader's cooldown
//! stamp in one transaction. A crash between the two phases leaves an
//! orphaned blob with no referencing track row; orphans are harmless and
//! accepted.

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{error, info};

use crate::core::eligibility::{can_act, next_eligible, ACTION_COOLDOWN_SECS};
use crate::db::TrackTable;
use crate::models::{Track, TrackType, User};
use crate::storage::BlobStorage;

/// Fallback extension when the submitted filename has none
const DEFAULT_AUDIO_EXT: &str = "mp3";

/// One file part of a multipart submission
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A parsed upload form: title, category, and however many file parts the
/// client sent (validated to exactly one here, not in the handler)
#[derive(Debug, Clone)]
pub struct TrackSubmission {
    pub title: String,
    pub category: String,
    pub files: Vec<UploadedFile>,
}

/// Everything that can go wrong when registering an upload
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("not authenticated")]
    Unauthorized,

    /// Upload cooldown not elapsed. Carries the timestamp at which the user
    /// becomes eligible again.
    #[error("upload limit reached")]
    RateLimited { next_upload: i64 },

    #[error("a title is required")]
    MissingTitle,

    #[error("unknown track category")]
    InvalidCategory,

    #[error("exactly one file must be submitted")]
    NoFile,

    #[error("the storage zone did not accept the file")]
    UploadFailed,

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

/// Whether `user` may upload at `now`. Advisory mirror of the registrar's
/// cooldown gate, used by the board payload.
pub fn can_upload(user: &User, now: i64, bypass_cooldown: bool) -> bool {
    bypass_cooldown || can_act(user.last_upload, now, ACTION_COOLDOWN_SECS)
}

/// Register an upload for `user` at `now`.
///
/// Precondition order: identity, cooldown (unless `bypass_cooldown`), title,
/// category, exactly-one-file. The blob write happens before any database
/// write; an unconfirmed blob write aborts with no database effects. The
/// cooldown bypass applies here only, never to votes.
pub async fn register_upload(
    pool: &SqlitePool,
    storage: &dyn BlobStorage,
    cdn_base_url: &str,
    user: &User,
    submission: TrackSubmission,
    now: i64,
    bypass_cooldown: bool,
) -> Result<Track, UploadError> {
    if user.id.trim().is_empty() {
        return Err(UploadError::Unauthorized);
    }

    if !bypass_cooldown && !can_act(user.last_upload, now, ACTION_COOLDOWN_SECS) {
        let last = user.last_upload.unwrap_or(now);
        return Err(UploadError::RateLimited {
            next_upload: next_eligible(last, ACTION_COOLDOWN_SECS),
        });
    }

    let title = submission.title.trim();
    if title.is_empty() {
        return Err(UploadError::MissingTitle);
    }

    let category = TrackType::from_str(&submission.category).ok_or(UploadError::InvalidCategory)?;

    // zero and multiple files are both rejected; with zero files the blob
    // store is never contacted
    let mut files = submission.files.into_iter();
    let (Some(file), None) = (files.next(), files.next()) else {
        return Err(UploadError::NoFile);
    };

    let ext = file_extension(&file.filename);
    let path = format!(
        "/{}/{}.{}",
        category.as_str(),
        uuid::Uuid::new_v4(),
        ext
    );

    info!("Uploading {} byte(s) to {}", file.bytes.len(), path);

    match storage.upload(&path, file.bytes).await {
        Ok(true) => {}
        Ok(false) => {
            error!("Storage zone rejected upload to {}", path);
            return Err(UploadError::UploadFailed);
        }
        Err(e) => {
            error!("Storage zone error uploading to {}: {:#}", path, e);
            return Err(UploadError::UploadFailed);
        }
    }

    let url = format!("{}{}", cdn_base_url.trim_end_matches('/'), path);
    let track = TrackTable::register(pool, &user.id, title, category, &url, now).await?;

    info!("Registered track {} ({})", track.id, track.title);
    Ok(track)
}

/// File extension of the submitted name, without the dot
fn file_extension(filename: &str) -> String {
    std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| DEFAULT_AUDIO_EXT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{test_pool, UserTable};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    const NOW: i64 = 1_750_000_000;
    const CDN: &str = "https://cdn.example";

    /// Blob store double: records upload paths, optionally refuses
    struct FakeStorage {
        accept: bool,
        fail: bool,
        uploads: Mutex<Vec<String>>,
    }

    impl FakeStorage {
        fn accepting() -> Self {
            Self {
                accept: true,
                fail: false,
                uploads: Mutex::new(Vec::new()),
            }
        }

        fn rejecting() -> Self {
            Self {
                accept: false,
                fail: false,
                uploads: Mutex::new(Vec::new()),
            }
        }

        fn erroring() -> Self {
            Self {
                accept: false,
                fail: true,
                uploads: Mutex::new(Vec::new()),
            }
        }

        fn upload_count(&self) -> usize {
            self.uploads.lock().len()
        }
    }

    #[async_trait]
    impl BlobStorage for FakeStorage {
        async fn upload(&self, path: &str, _bytes: Vec<u8>) -> anyhow::Result<bool> {
            self.uploads.lock().push(path.to_string());
            if self.fail {
                anyhow::bail!("connection reset");
            }
            Ok(self.accept)
        }
    }

    async fn seed_user(pool: &SqlitePool, username: &str) -> User {
        let user = User::new(username.to_string(), "hash".to_string());
        UserTable::insert(pool, &user).await.unwrap();
        user
    }

    fn submission(title: &str, category: &str, file_count: usize) -> TrackSubmission {
        let files = (0..file_count)
            .map(|i| UploadedFile {
                filename: format!("take{i}.mp3"),
                bytes: vec![0u8; 16],
            })
            .collect();
        TrackSubmission {
            title: title.to_string(),
            category: category.to_string(),
            files,
        }
    }

    #[tokio::test]
    async fn test_upload_success_stamps_user_and_inserts_track() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "uploader").await;
        let storage = FakeStorage::accepting();

        let track = register_upload(
            &pool,
            &storage,
            CDN,
            &user,
            submission("Riff1", "Bass", 1),
            NOW,
            false,
        )
        .await
        .unwrap();

        assert_eq!(track.title, "Riff1");
        assert_eq!(track.category, TrackType::Bass);
        assert!(!track.is_promoted);
        assert!(track.url.starts_with("https://cdn.example/Bass/"));
        assert!(track.url.ends_with(".mp3"));

        let user = UserTable::get_by_id(&pool, &user.id).await.unwrap().unwrap();
        assert_eq!(user.last_upload, Some(NOW));
        assert_eq!(storage.upload_count(), 1);
    }

    #[tokio::test]
    async fn test_second_upload_within_cooldown_rate_limits() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "uploader").await;
        let storage = FakeStorage::accepting();

        register_upload(
            &pool,
            &storage,
            CDN,
            &user,
            submission("Riff1", "Bass", 1),
            NOW,
            false,
        )
        .await
        .unwrap();

        // re-read the user so the fresh last_upload stamp is visible
        let user = UserTable::get_by_id(&pool, &user.id).await.unwrap().unwrap();
        let err = register_upload(
            &pool,
            &storage,
            CDN,
            &user,
            submission("Riff2", "Bass", 1),
            NOW + 3600,
            false,
        )
        .await
        .unwrap_err();

        match err {
            UploadError::RateLimited { next_upload } => {
                assert_eq!(next_upload, NOW + ACTION_COOLDOWN_SECS);
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }

        assert_eq!(TrackTable::count(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_bypass_skips_upload_cooldown() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "uploader").await;
        let storage = FakeStorage::accepting();

        register_upload(
            &pool,
            &storage,
            CDN,
            &user,
            submission("Riff1", "Bass", 1),
            NOW,
            true,
        )
        .await
        .unwrap();

        let user = UserTable::get_by_id(&pool, &user.id).await.unwrap().unwrap();
        register_upload(
            &pool,
            &storage,
            CDN,
            &user,
            submission("Riff2", "Drum", 1),
            NOW + 60,
            true,
        )
        .await
        .unwrap();

        assert_eq!(TrackTable::count(&pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_zero_files_rejected_without_blob_call() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "uploader").await;
        let storage = FakeStorage::accepting();

        let err = register_upload(
            &pool,
            &storage,
            CDN,
            &user,
            submission("Riff1", "Bass", 0),
            NOW,
            false,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, UploadError::NoFile));
        assert_eq!(storage.upload_count(), 0);
        assert_eq!(TrackTable::count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_two_files_rejected() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "uploader").await;
        let storage = FakeStorage::accepting();

        let err = register_upload(
            &pool,
            &storage,
            CDN,
            &user,
            submission("Riff1", "Bass", 2),
            NOW,
            false,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, UploadError::NoFile));
        assert_eq!(TrackTable::count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_title_and_category_validation() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "uploader").await;
        let storage = FakeStorage::accepting();

        let err = register_upload(
            &pool,
            &storage,
            CDN,
            &user,
            submission("   ", "Bass", 1),
            NOW,
            false,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, UploadError::MissingTitle));

        let err = register_upload(
            &pool,
            &storage,
            CDN,
            &user,
            submission("Riff1", "Vocals", 1),
            NOW,
            false,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, UploadError::InvalidCategory));

        assert_eq!(storage.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_unconfirmed_blob_upload_leaves_no_database_writes() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "uploader").await;

        for storage in [FakeStorage::rejecting(), FakeStorage::erroring()] {
            let err = register_upload(
                &pool,
                &storage,
                CDN,
                &user,
                submission("Riff1", "Bass", 1),
                NOW,
                false,
            )
            .await
            .unwrap_err();

            assert!(matches!(err, UploadError::UploadFailed));
            assert_eq!(storage.upload_count(), 1);
        }

        assert_eq!(TrackTable::count(&pool).await.unwrap(), 0);
        let user = UserTable::get_by_id(&pool, &user.id).await.unwrap().unwrap();
        assert_eq!(user.last_upload, None);
    }

    #[test]
    fn test_file_extension_derivation() {
        assert_eq!(file_extension("loop.wav"), "wav");
        assert_eq!(file_extension("loop.MP3"), "mp3");
        assert_eq!(file_extension("loop"), "mp3");
        assert_eq!(file_extension(""), "mp3");
    }
}
