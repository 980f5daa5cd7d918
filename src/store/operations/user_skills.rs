use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSkillRating {
    pub user_id: String,
    pub skill_id: String,
    pub rating: f64,
    pub deviation: f64,
    pub last_updated: DateTime<Utc>,
}

impl Store {
    pub fn get_user_skill(
        &self,
        user_id: &str,
        skill_id: &str,
    ) -> Result<Option<UserSkillRating>, StoreError> {
        let key = keys::user_skill_key(user_id, skill_id)?;
        match self.practice_user_skills.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Plain overwrite; concurrent updates of one skill are last-write-wins.
    pub fn set_user_skill(&self, skill: &UserSkillRating) -> Result<(), StoreError> {
        let key = keys::user_skill_key(&skill.user_id, &skill.skill_id)?;
        self.practice_user_skills
            .insert(key.as_bytes(), Self::serialize(skill)?)?;
        Ok(())
    }

    /// Tracked skills of a user in skill-id order.
    pub fn list_user_skills(&self, user_id: &str) -> Result<Vec<UserSkillRating>, StoreError> {
        let prefix = keys::user_skill_prefix(user_id)?;
        let mut skills = Vec::new();
        for entry in self.practice_user_skills.scan_prefix(prefix.as_bytes()) {
            let (_, value) = entry?;
            skills.push(Self::deserialize::<UserSkillRating>(&value)?);
        }
        Ok(skills)
    }
}
