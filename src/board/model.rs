use jiff::Timestamp;
use uuid::Uuid;

use crate::types::VoteType;

#[derive(Clone, Debug)]
pub struct ProblemRecord {
    pub id: Uuid,
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub created_at: Timestamp,
}

#[derive(Clone, Debug)]
pub struct SolutionRecord {
    pub id: Uuid,
    pub problem_id: Uuid,
    pub author_id: String,
    pub content: String,
    pub steps: Vec<String>,
    pub is_accepted: bool,
    /// Sum of all vote values, recomputed after every vote mutation.
    pub vote_count: i64,
    pub created_at: Timestamp,
    pub(crate) seq: u64,
    pub(crate) deleted: bool,
}

/// A solution as seen by one viewer.
#[derive(Clone, Debug)]
pub struct SolutionView {
    pub solution: SolutionRecord,
    pub current_user_vote: Option<VoteType>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoteOutcome {
    pub vote_count: i64,
    /// The voter's vote after the transition; `None` when it was toggled off.
    pub current_vote: Option<VoteType>,
}
