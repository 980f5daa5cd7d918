use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::adaptive::elo::PromptRating;
use crate::store::keys;
use crate::store::{Store, StoreError};

/// One learner interaction with one item. Attempts are never rewritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeAttempt {
    pub id: String,
    pub user_id: String,
    pub item_id: String,
    #[serde(default)]
    pub correct: Option<bool>,
    #[serde(default)]
    pub rating: Option<PromptRating>,
    pub score: f64,
    #[serde(default)]
    pub difficulty_before: Option<f64>,
    #[serde(default)]
    pub difficulty_after: Option<f64>,
    #[serde(default)]
    pub time_spent_ms: Option<u64>,
    pub created_at: DateTime<Utc>,
}

impl Store {
    pub fn append_attempt(&self, attempt: &PracticeAttempt) -> Result<(), StoreError> {
        let key = keys::attempt_key(
            &attempt.user_id,
            attempt.created_at.timestamp_millis(),
            &attempt.id,
        )?;
        self.practice_attempts
            .insert(key.as_bytes(), Self::serialize(attempt)?)?;
        Ok(())
    }

    /// Newest first.
    pub fn list_user_attempts(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<PracticeAttempt>, StoreError> {
        let prefix = keys::attempt_prefix(user_id)?;
        let mut attempts = Vec::new();
        for entry in self.practice_attempts.scan_prefix(prefix.as_bytes()) {
            if attempts.len() >= limit {
                break;
            }
            let (_, value) = entry?;
            attempts.push(Self::deserialize::<PracticeAttempt>(&value)?);
        }
        Ok(attempts)
    }
}
