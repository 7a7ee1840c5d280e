use std::collections::HashSet;

use sqlx::{PgPool, Row};
use uuid::Uuid;

use shared::models::{PollSummary, User};
use shared::poll::{Poll, PollOption};
use crate::store::{PollStore, StoreError};

/// Postgres-backed store. The vote transition relies on the
/// `one_vote_per_user` unique constraint: inserting the voter row is the
/// atomic membership check, and the counter bump rides the same
/// transaction, so a vote either fully commits or leaves no trace.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_poll(&self, id: Uuid) -> Result<Option<Poll>, StoreError> {
        let record = sqlx::query(
            "SELECT id, title, created_by, created_at FROM polls WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let Some(record) = record else { return Ok(None) };

        let option_rows = sqlx::query(
            "SELECT text, votes FROM poll_options WHERE poll_id = $1 ORDER BY idx ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let mut options = Vec::with_capacity(option_rows.len());
        for row in option_rows {
            options.push(PollOption {
                text: row.try_get("text").map_err(|e| StoreError::Unavailable(e.to_string()))?,
                votes: row.try_get::<i32, _>("votes")
                    .map_err(|e| StoreError::Unavailable(e.to_string()))? as u32,
            });
        }

        let voter_rows = sqlx::query("SELECT voter_id FROM poll_voters WHERE poll_id = $1")
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let mut voters = HashSet::with_capacity(voter_rows.len());
        for row in voter_rows {
            voters.insert(
                row.try_get::<Uuid, _>("voter_id")
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?,
            );
        }

        Ok(Some(Poll {
            id: record.try_get("id").map_err(|e| StoreError::Unavailable(e.to_string()))?,
            title: record.try_get("title").map_err(|e| StoreError::Unavailable(e.to_string()))?,
            options,
            created_by: record.try_get("created_by")
                .map_err(|e| StoreError::Unavailable(e.to_string()))?,
            voters,
            created_at: record.try_get("created_at")
                .map_err(|e| StoreError::Unavailable(e.to_string()))?,
        }))
    }
}

#[rocket::async_trait]
impl PollStore for PgStore {
    async fn insert_poll(&self, poll: &Poll) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        sqlx::query(
            "INSERT INTO polls (id, title, created_by, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(poll.id)
        .bind(&poll.title)
        .bind(poll.created_by)
        .bind(poll.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        for (idx, option) in poll.options.iter().enumerate() {
            sqlx::query(
                "INSERT INTO poll_options (poll_id, idx, text, votes) VALUES ($1, $2, $3, 0)",
            )
            .bind(poll.id)
            .bind(idx as i32)
            .bind(&option.text)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        }

        tx.commit().await.map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn fetch_poll(&self, id: Uuid) -> Result<Option<Poll>, StoreError> {
        self.load_poll(id).await
    }

    async fn list_summaries(&self) -> Result<Vec<PollSummary>, StoreError> {
        let rows = sqlx::query("SELECT id, title, created_at FROM polls ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            summaries.push(PollSummary {
                id: row.try_get("id").map_err(|e| StoreError::Unavailable(e.to_string()))?,
                title: row.try_get("title").map_err(|e| StoreError::Unavailable(e.to_string()))?,
                created_at: row.try_get("created_at")
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?,
            });
        }
        Ok(summaries)
    }

    async fn record_vote(&self, poll_id: Uuid, option_index: usize, voter: Uuid)
        -> Result<Poll, StoreError>
    {
        // Validate against a snapshot first so nothing is written for a
        // missing poll or an out-of-range index. A duplicate voter that
        // slips past this read loses the constraint race below instead.
        let mut snapshot = self.load_poll(poll_id).await?.ok_or(StoreError::NotFound)?;
        snapshot.record_vote(voter, option_index)?;

        let mut tx = self.pool.begin().await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        sqlx::query("INSERT INTO poll_voters (poll_id, voter_id) VALUES ($1, $2)")
            .bind(poll_id)
            .bind(voter)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if e.to_string().contains("one_vote_per_user") {
                    StoreError::AlreadyVoted
                } else {
                    StoreError::Unavailable(e.to_string())
                }
            })?;

        sqlx::query("UPDATE poll_options SET votes = votes + 1 WHERE poll_id = $1 AND idx = $2")
            .bind(poll_id)
            .bind(option_index as i32)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        tx.commit().await.map_err(|e| StoreError::Unavailable(e.to_string()))?;

        self.load_poll(poll_id).await?.ok_or(StoreError::NotFound)
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (id, username, password_hash, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map(|_| ())
        .map_err(|e| {
            if e.to_string().contains("unique_username") {
                StoreError::UsernameTaken
            } else {
                StoreError::Unavailable(e.to_string())
            }
        })
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        let record = sqlx::query(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let Some(record) = record else { return Ok(None) };

        Ok(Some(User {
            id: record.try_get("id").map_err(|e| StoreError::Unavailable(e.to_string()))?,
            username: record.try_get("username")
                .map_err(|e| StoreError::Unavailable(e.to_string()))?,
            password_hash: record.try_get("password_hash")
                .map_err(|e| StoreError::Unavailable(e.to_string()))?,
            created_at: record.try_get("created_at")
                .map_err(|e| StoreError::Unavailable(e.to_string()))?,
        }))
    }
}
