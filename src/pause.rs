//! Symmetric pause/resume negotiation.
//!
//! Either player pauses instantly; resuming needs a vote from both. Votes
//! are reset on every pause and once more when the resume completes.

use crate::common::{ClientId, Rejection};
use crate::session::SessionStatus;

/// Outcome of a single resume vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeVote {
    /// Voters so far, in voting order, including this one.
    pub ready_ids: Vec<ClientId>,
    /// True when this vote completed the set and the session is active again.
    pub resumed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PauseCoordinator {
    votes: Vec<ClientId>,
}

impl PauseCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suspend an active session and forget any earlier votes.
    pub fn pause(&mut self, status: &mut SessionStatus) -> Result<(), Rejection> {
        match status {
            SessionStatus::Active => {
                *status = SessionStatus::Paused;
                self.votes.clear();
                Ok(())
            }
            SessionStatus::Paused => Err(Rejection::GamePaused),
            _ => Err(Rejection::NotActive),
        }
    }

    /// Record `voter`'s wish to resume. Once every id in `players` has voted
    /// the votes are cleared and the session goes back to active.
    pub fn resume(
        &mut self,
        status: &mut SessionStatus,
        voter: ClientId,
        players: &[ClientId; 2],
    ) -> Result<ResumeVote, Rejection> {
        if *status != SessionStatus::Paused {
            return Err(Rejection::NotPaused);
        }
        if !self.votes.contains(&voter) {
            self.votes.push(voter);
        }
        let ready_ids = self.votes.clone();
        let resumed = players.iter().all(|p| self.votes.contains(p));
        if resumed {
            self.votes.clear();
            *status = SessionStatus::Active;
        }
        Ok(ResumeVote { ready_ids, resumed })
    }

    pub fn votes(&self) -> &[ClientId] {
        &self.votes
    }
}
