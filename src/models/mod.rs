//! Data models for Trackboard

pub mod track;
pub mod user;
pub mod vote;

pub use track::{Track, TrackType};
pub use user::{PublicUser, Session, User};
pub use vote::Upvote;
