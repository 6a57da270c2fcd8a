//! Table operations

mod session_table;
mod track_table;
mod user_table;
mod vote_table;

pub use session_table::SessionTable;
pub use track_table::{BoardRow, TrackTable};
pub use user_table::UserTable;
pub use vote_table::VoteTable;
