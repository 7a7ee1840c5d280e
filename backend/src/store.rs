use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;
use uuid::Uuid;

use shared::models::{PollSummary, User};
use shared::poll::{Poll, VoteError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Poll not found")]
    NotFound,
    #[error("You have already voted on this poll")]
    AlreadyVoted,
    #[error("Invalid option index: {0}")]
    InvalidOption(usize),
    #[error("Username is already taken")]
    UsernameTaken,
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<VoteError> for StoreError {
    fn from(e: VoteError) -> Self {
        match e {
            VoteError::AlreadyVoted => StoreError::AlreadyVoted,
            VoteError::InvalidOption(index) => StoreError::InvalidOption(index),
        }
    }
}

/// Persistence collaborator for polls and user accounts. Handlers only see
/// this trait; the concrete store is injected at startup, which is also how
/// the test suite swaps in [`MemoryStore`].
#[rocket::async_trait]
pub trait PollStore: Send + Sync {
    async fn insert_poll(&self, poll: &Poll) -> Result<(), StoreError>;

    async fn fetch_poll(&self, id: Uuid) -> Result<Option<Poll>, StoreError>;

    /// List-view projection of every poll. No ordering guarantee.
    async fn list_summaries(&self) -> Result<Vec<PollSummary>, StoreError>;

    /// The vote transition. The duplicate-voter check and the counter
    /// increment must commit as one unit per poll: two concurrent calls for
    /// the same poll never both succeed for the same voter, and none is
    /// ever half-applied.
    async fn record_vote(&self, poll_id: Uuid, option_index: usize, voter: Uuid)
        -> Result<Poll, StoreError>;

    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError>;
}

#[derive(Default)]
struct Inner {
    polls: HashMap<Uuid, Poll>,
    users: HashMap<String, User>,
}

/// In-memory store. Backs the test suite and the no-database fallback. The
/// single mutex scopes each vote's check-then-write, so transitions on a
/// poll are strictly ordered.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }
}

#[rocket::async_trait]
impl PollStore for MemoryStore {
    async fn insert_poll(&self, poll: &Poll) -> Result<(), StoreError> {
        self.lock()?.polls.insert(poll.id, poll.clone());
        Ok(())
    }

    async fn fetch_poll(&self, id: Uuid) -> Result<Option<Poll>, StoreError> {
        Ok(self.lock()?.polls.get(&id).cloned())
    }

    async fn list_summaries(&self) -> Result<Vec<PollSummary>, StoreError> {
        Ok(self.lock()?.polls.values().map(Poll::summary).collect())
    }

    async fn record_vote(&self, poll_id: Uuid, option_index: usize, voter: Uuid)
        -> Result<Poll, StoreError>
    {
        let mut inner = self.lock()?;
        let poll = inner.polls.get_mut(&poll_id).ok_or(StoreError::NotFound)?;
        poll.record_vote(voter, option_index)?;
        Ok(poll.clone())
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if inner.users.contains_key(&user.username) {
            return Err(StoreError::UsernameTaken);
        }
        inner.users.insert(user.username.clone(), user.clone());
        Ok(())
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.users.get(username).cloned())
    }
}
