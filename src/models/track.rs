//! Track model and category enum

use serde::{Deserialize, Serialize};

/// Track categories
///
/// The board is partitioned into exactly these five lanes. The string forms
/// (including the space in "Other 1"/"Other 2") are the wire and database
/// representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackType {
    Melody,
    Bass,
    Drum,
    #[serde(rename = "Other 1")]
    Other1,
    #[serde(rename = "Other 2")]
    Other2,
}

impl TrackType {
    /// All categories, in board display order
    pub const ALL: [TrackType; 5] = [
        TrackType::Melody,
        TrackType::Bass,
        TrackType::Drum,
        TrackType::Other1,
        TrackType::Other2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackType::Melody => "Melody",
            TrackType::Bass => "Bass",
            TrackType::Drum => "Drum",
            TrackType::Other1 => "Other 1",
            TrackType::Other2 => "Other 2",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Melody" => Some(TrackType::Melody),
            "Bass" => Some(TrackType::Bass),
            "Drum" => Some(TrackType::Drum),
            "Other 1" => Some(TrackType::Other1),
            "Other 2" => Some(TrackType::Other2),
            _ => None,
        }
    }
}

/// An uploaded track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Database ID
    pub id: i64,
    /// Owning user ID
    pub userid: String,
    /// Track title
    pub title: String,
    /// Public CDN URL of the audio file
    pub url: String,
    /// Category lane
    #[serde(rename = "type")]
    pub category: TrackType,
    /// Promoted tracks pin to the top of the board and cannot be voted on
    #[serde(default)]
    pub is_promoted: bool,
    /// Unix timestamp of promotion, if promoted
    #[serde(default)]
    pub promoted_date: Option<i64>,
    /// Unix timestamp of upload
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_type_round_trip() {
        for t in TrackType::ALL {
            assert_eq!(TrackType::from_str(t.as_str()), Some(t));
        }
        assert_eq!(TrackType::from_str("Vocals"), None);
        assert_eq!(TrackType::from_str("other 1"), None);
    }
}
