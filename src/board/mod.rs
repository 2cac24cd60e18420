//! Accept and vote transitions for problems and their solutions.
//!
//! All state sits behind one lock and every transition runs inside a single
//! write guard, so concurrent votes and accepts never lose updates.

mod model;

use std::cmp::Reverse;
use std::collections::HashMap;

use jiff::Timestamp;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::errors::Error;
use crate::types::VoteType;

pub use model::{ProblemRecord, SolutionRecord, SolutionView, VoteOutcome};

#[derive(Default)]
struct BoardState {
    problems: HashMap<Uuid, ProblemRecord>,
    solutions: HashMap<Uuid, SolutionRecord>,
    /// solution id -> voter id -> vote
    votes: HashMap<Uuid, HashMap<String, VoteType>>,
    seq: u64,
}

impl BoardState {
    fn live_solution(&self, id: Uuid) -> Result<&SolutionRecord, Error> {
        self.solutions
            .get(&id)
            .filter(|s| !s.deleted)
            .ok_or_else(|| Error::NotFound("Solution".into()))
    }

    fn tally(&mut self, solution_id: Uuid) -> i64 {
        let count = self
            .votes
            .get(&solution_id)
            .map(|votes| votes.values().map(|v| v.value()).sum())
            .unwrap_or(0);
        if let Some(solution) = self.solutions.get_mut(&solution_id) {
            solution.vote_count = count;
        }
        count
    }
}

#[derive(Default)]
pub struct Board {
    state: RwLock<BoardState>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_problem(
        &self,
        author_id: &str,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let mut state = self.state.write().await;
        state.problems.insert(
            id,
            ProblemRecord {
                id,
                author_id: author_id.to_string(),
                title: title.into(),
                content: content.into(),
                created_at: Timestamp::now(),
            },
        );
        id
    }

    pub async fn add_solution(
        &self,
        problem_id: Uuid,
        author_id: &str,
        content: impl Into<String>,
        steps: Vec<String>,
    ) -> Result<Uuid, Error> {
        let mut state = self.state.write().await;
        if !state.problems.contains_key(&problem_id) {
            return Err(Error::NotFound("Problem".into()));
        }
        state.seq += 1;
        let id = Uuid::new_v4();
        let seq = state.seq;
        state.solutions.insert(
            id,
            SolutionRecord {
                id,
                problem_id,
                author_id: author_id.to_string(),
                content: content.into(),
                steps,
                is_accepted: false,
                vote_count: 0,
                created_at: Timestamp::now(),
                seq,
                deleted: false,
            },
        );
        info!(solution_id = %id, problem_id = %problem_id, "solution created");
        Ok(id)
    }

    /// Marks `solution_id` as the accepted answer of its problem and clears
    /// the flag on every sibling. Only the problem's author may do this.
    pub async fn accept_solution(&self, solution_id: Uuid, actor_id: &str) -> Result<(), Error> {
        let mut state = self.state.write().await;
        let problem_id = state.live_solution(solution_id)?.problem_id;
        let problem = state
            .problems
            .get(&problem_id)
            .ok_or_else(|| Error::NotFound("Problem".into()))?;
        if problem.author_id != actor_id {
            return Err(Error::Forbidden(
                "Only the problem owner can accept solutions".into(),
            ));
        }

        for solution in state.solutions.values_mut() {
            if solution.problem_id == problem_id {
                solution.is_accepted = solution.id == solution_id;
            }
        }
        info!(
            solution_id = %solution_id,
            problem_id = %problem_id,
            user_id = actor_id,
            "solution accepted"
        );
        Ok(())
    }

    /// Casts, flips or toggles off a vote.
    ///
    /// Same value as the existing vote removes it; the opposite value
    /// overwrites it. Authors cannot vote on their own solutions.
    pub async fn vote(
        &self,
        solution_id: Uuid,
        voter_id: &str,
        vote: VoteType,
    ) -> Result<VoteOutcome, Error> {
        let mut state = self.state.write().await;
        if state.live_solution(solution_id)?.author_id == voter_id {
            return Err(Error::Forbidden(
                "You cannot vote on your own solution".into(),
            ));
        }

        let votes = state.votes.entry(solution_id).or_default();
        let current_vote = match votes.get(voter_id) {
            Some(existing) if *existing == vote => {
                votes.remove(voter_id);
                None
            }
            _ => {
                votes.insert(voter_id.to_string(), vote);
                Some(vote)
            }
        };
        let vote_count = state.tally(solution_id);
        info!(
            solution_id = %solution_id,
            user_id = voter_id,
            vote = ?current_vote,
            vote_count,
            "vote recorded"
        );
        Ok(VoteOutcome {
            vote_count,
            current_vote,
        })
    }

    /// Deletes the voter's vote outright and returns the new total.
    pub async fn remove_vote(&self, solution_id: Uuid, voter_id: &str) -> Result<i64, Error> {
        let mut state = self.state.write().await;
        state.live_solution(solution_id)?;
        let removed = state
            .votes
            .get_mut(&solution_id)
            .and_then(|votes| votes.remove(voter_id));
        if removed.is_none() {
            return Err(Error::NotFound("Vote".into()));
        }
        let vote_count = state.tally(solution_id);
        info!(solution_id = %solution_id, user_id = voter_id, vote_count, "vote removed");
        Ok(vote_count)
    }

    /// Soft-deletes a solution. Only its author may do this.
    pub async fn delete_solution(&self, solution_id: Uuid, actor_id: &str) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if state.live_solution(solution_id)?.author_id != actor_id {
            return Err(Error::Forbidden(
                "You don't have permission to delete this solution".into(),
            ));
        }
        if let Some(solution) = state.solutions.get_mut(&solution_id) {
            solution.deleted = true;
        }
        Ok(())
    }

    pub async fn solution(&self, solution_id: Uuid, viewer_id: Option<&str>) -> Result<SolutionView, Error> {
        let state = self.state.read().await;
        let solution = state.live_solution(solution_id)?.clone();
        let current_user_vote = viewer_id.and_then(|viewer| {
            state
                .votes
                .get(&solution_id)
                .and_then(|votes| votes.get(viewer))
                .copied()
        });
        Ok(SolutionView {
            solution,
            current_user_vote,
        })
    }

    pub async fn vote_count(&self, solution_id: Uuid) -> Result<i64, Error> {
        let state = self.state.read().await;
        Ok(state.live_solution(solution_id)?.vote_count)
    }

    /// Live solutions of a problem: accepted first, then by votes, then newest.
    pub async fn solutions_for_problem(&self, problem_id: Uuid) -> Vec<SolutionRecord> {
        let state = self.state.read().await;
        let mut solutions: Vec<SolutionRecord> = state
            .solutions
            .values()
            .filter(|s| s.problem_id == problem_id && !s.deleted)
            .cloned()
            .collect();
        solutions.sort_by_key(|s| {
            (
                Reverse(s.is_accepted),
                Reverse(s.vote_count),
                Reverse(s.created_at),
                Reverse(s.seq),
            )
        });
        solutions
    }

    pub async fn has_accepted_solution(&self, problem_id: Uuid) -> bool {
        let state = self.state.read().await;
        state
            .solutions
            .values()
            .any(|s| s.problem_id == problem_id && !s.deleted && s.is_accepted)
    }
}
