//! External blob storage for uploaded audio files

mod bunny;

pub use bunny::BunnyStorage;

use anyhow::Result;
use async_trait::async_trait;

/// The blob storage collaborator.
///
/// `upload` returns `Ok(false)` or an error when the store did not confirm
/// the write; callers treat both the same way and must not persist any
/// metadata referencing the path.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<bool>;
}
