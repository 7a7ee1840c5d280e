use std::collections::HashSet;

use serde::{Serialize, Deserialize};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::PollSummary;
use crate::validation::{validate_poll_input, ValidationError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VoteError {
    #[error("You have already voted on this poll")] AlreadyVoted,
    #[error("Invalid option index: {0}")] InvalidOption(usize),
}

/// One choice within a poll. The text is fixed at creation; the counter
/// only ever moves up by one per accepted vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOption {
    pub text: String,
    pub votes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: Uuid,
    pub title: String,
    pub options: Vec<PollOption>,
    pub created_by: Uuid,
    pub voters: HashSet<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Poll {
    /// Validates the title and option texts and builds a poll with zeroed
    /// counters and an empty voter set. The option list is final: nothing
    /// adds or removes options after this point.
    pub fn new(title: String, options: Vec<String>, created_by: Uuid) -> Result<Self, ValidationError> {
        validate_poll_input(&title, &options)?;

        Ok(Self {
            id: Uuid::new_v4(),
            title,
            options: options.into_iter()
                .map(|text| PollOption { text, votes: 0 })
                .collect(),
            created_by,
            voters: HashSet::new(),
            created_at: OffsetDateTime::now_utc(),
        })
    }

    /// Applies one vote: bumps the chosen option and records the voter.
    ///
    /// Checked in order: a repeat voter is rejected before the index is
    /// looked at. On any error the poll is left untouched, so the sum of
    /// option counters always equals the voter-set size.
    pub fn record_vote(&mut self, voter: Uuid, option_index: usize) -> Result<(), VoteError> {
        if self.voters.contains(&voter) {
            return Err(VoteError::AlreadyVoted);
        }

        let option = self.options.get_mut(option_index)
            .ok_or(VoteError::InvalidOption(option_index))?;

        option.votes += 1;
        self.voters.insert(voter);
        Ok(())
    }

    pub fn has_voted(&self, voter: &Uuid) -> bool {
        self.voters.contains(voter)
    }

    pub fn total_votes(&self) -> usize {
        self.options.iter().map(|o| o.votes as usize).sum()
    }

    /// The list-view projection: id, title and creation time only.
    pub fn summary(&self) -> PollSummary {
        PollSummary {
            id: self.id,
            title: self.title.clone(),
            created_at: self.created_at,
        }
    }
}
