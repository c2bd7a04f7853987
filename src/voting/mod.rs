pub mod plurality;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use plurality::calculate_results;

// Read-only snapshot of a poll's tallies
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollResults {
    pub poll_id: u64,
    pub name: String,
    pub is_open: bool,
    pub color: u32,
    pub created_at: DateTime<Utc>,
    pub footnote: Option<String>,
    pub tallies: Vec<VoteCount>,
    pub total_votes: usize,
    /// Keys of the choices with the most votes; empty when nobody voted.
    pub leaders: Vec<String>,
    /// Only filled in for the detailed view.
    pub voters: Option<Vec<VoterDetail>>,
}

// Vote count for one choice
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteCount {
    pub key: String,
    pub label: String,
    pub votes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoterDetail {
    pub user_id: String,
    pub choice_key: String,
    pub timestamp: DateTime<Utc>,
}
