use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::adaptive::config::AdaptiveConfig;
use crate::adaptive::elo::{
    actual_score, decay_deviation, elo_update, nudge_difficulty, DifficultyBand, PromptRating,
    Side,
};
use crate::constants::MAX_LIST_LIMIT;
use crate::store::operations::attempts::PracticeAttempt;
use crate::store::operations::practice_items::{ItemStatus, PracticeItem};
use crate::store::operations::user_skills::UserSkillRating;
use crate::store::{keys, Store, StoreError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("practice item not found: {0}")]
    ItemNotFound(String),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRatingUpdate {
    pub skill_id: String,
    pub old_rating: f64,
    pub new_rating: f64,
    pub deviation: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemEloUpdate {
    pub item_id: String,
    pub old_elo: f64,
    pub new_elo: f64,
    pub difficulty_band: DifficultyBand,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRatingOutcome {
    pub attempt_id: String,
    pub new_difficulty: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResult {
    pub attempt: PracticeAttempt,
    pub skills: Vec<SkillRatingUpdate>,
    pub item: ItemEloUpdate,
}

/// Author-facing shape of a practice item. Omitted fields keep their stored
/// value on update and take defaults on create.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeItemInput {
    pub id: Option<String>,
    pub title: String,
    pub prompt: String,
    pub elo: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: Option<ItemStatus>,
    pub params: Option<serde_json::Value>,
}

pub struct AdaptiveEngine {
    config: AdaptiveConfig,
    store: Arc<Store>,
}

impl AdaptiveEngine {
    pub fn new(config: AdaptiveConfig, store: Arc<Store>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &AdaptiveConfig {
        &self.config
    }

    fn default_skill(&self, user_id: &str, skill_id: &str) -> UserSkillRating {
        UserSkillRating {
            user_id: user_id.to_string(),
            skill_id: skill_id.to_string(),
            rating: self.config.default_rating,
            deviation: self.config.default_deviation,
            last_updated: Utc::now(),
        }
    }

    fn skill_or_default(&self, user_id: &str, skill_id: &str) -> Result<UserSkillRating, EngineError> {
        Ok(self
            .store
            .get_user_skill(user_id, skill_id)?
            .unwrap_or_else(|| self.default_skill(user_id, skill_id)))
    }

    fn require_item(&self, item_id: &str) -> Result<PracticeItem, EngineError> {
        self.store
            .get_practice_item(item_id)?
            .ok_or_else(|| EngineError::ItemNotFound(item_id.to_string()))
    }

    /// Moves one learner skill after an attempt against an item of `item_elo`.
    /// Untracked skills start from the default rating.
    pub fn update_skill_rating(
        &self,
        user_id: &str,
        skill_id: &str,
        item_elo: f64,
        correct: bool,
    ) -> Result<SkillRatingUpdate, EngineError> {
        let mut skill = self.skill_or_default(user_id, skill_id)?;
        let old_rating = skill.rating;

        skill.rating = elo_update(
            old_rating,
            item_elo,
            actual_score(correct, Side::Learner),
            self.config.user_k_factor,
        );
        skill.deviation = decay_deviation(
            skill.deviation,
            self.config.user_deviation_decay,
            self.config.deviation_floor,
        );
        skill.last_updated = Utc::now();
        self.store.set_user_skill(&skill)?;

        tracing::debug!(
            user_id,
            skill_id,
            old_rating,
            new_rating = skill.rating,
            correct,
            "Skill rating updated"
        );

        Ok(SkillRatingUpdate {
            skill_id: skill.skill_id,
            old_rating,
            new_rating: skill.rating,
            deviation: skill.deviation,
        })
    }

    /// Moves an item's difficulty. The item wins when the learner is wrong.
    pub fn update_item_elo(
        &self,
        item_id: &str,
        user_rating: f64,
        correct: bool,
    ) -> Result<ItemEloUpdate, EngineError> {
        let mut item = self.require_item(item_id)?;
        let old_elo = item.elo;

        item.elo = elo_update(
            old_elo,
            user_rating,
            actual_score(correct, Side::Item),
            self.config.item_k_factor(),
        );
        item.elo_deviation = decay_deviation(
            item.elo_deviation,
            self.config.item_deviation_decay,
            self.config.deviation_floor,
        );
        item.difficulty_band = DifficultyBand::from_elo(item.elo, &self.config);
        item.updated_at = Utc::now();
        self.store.upsert_practice_item(&item)?;

        Ok(ItemEloUpdate {
            item_id: item.id,
            old_elo,
            new_elo: item.elo,
            difficulty_band: item.difficulty_band,
        })
    }

    pub fn list_user_skills(&self, user_id: &str) -> Result<Vec<UserSkillRating>, EngineError> {
        Ok(self.store.list_user_skills(user_id)?)
    }

    /// Lowest-rated tracked skill; the first in skill-id order wins a tie.
    pub fn get_weakest_skill(&self, user_id: &str) -> Result<Option<UserSkillRating>, EngineError> {
        let skills = self.store.list_user_skills(user_id)?;
        Ok(skills
            .into_iter()
            .reduce(|best, next| if next.rating < best.rating { next } else { best }))
    }

    /// Picks the item that stretches the learner just past their current
    /// rating in one skill (the weakest tracked one unless `skill_filter` names
    /// another).
    pub fn pick_next_item(
        &self,
        user_id: &str,
        exclude_item_ids: &[String],
        skill_filter: Option<&str>,
    ) -> Result<Option<PracticeItem>, EngineError> {
        let (skill_id, rating) = match skill_filter {
            Some(skill_id) => {
                let skill = self.skill_or_default(user_id, skill_id)?;
                (skill.skill_id, skill.rating)
            }
            None => match self.get_weakest_skill(user_id)? {
                Some(skill) => (skill.skill_id, skill.rating),
                None => return self.random_foundation_item(exclude_item_ids),
            },
        };

        let target = rating + self.config.stretch_offset;
        let live = self.store.list_live_practice_items()?;
        let picked = live
            .into_iter()
            .filter(|item| item.has_tag(&skill_id) && !exclude_item_ids.contains(&item.id))
            .min_by(|a, b| {
                let da = (a.elo - target).abs();
                let db = (b.elo - target).abs();
                da.total_cmp(&db)
            });

        tracing::debug!(
            user_id,
            skill_id = %skill_id,
            target,
            picked = picked.as_ref().map(|item| item.id.as_str()),
            "Next practice item"
        );
        Ok(picked)
    }

    fn random_foundation_item(
        &self,
        exclude_item_ids: &[String],
    ) -> Result<Option<PracticeItem>, EngineError> {
        let foundation: Vec<PracticeItem> = self
            .store
            .list_live_practice_items()?
            .into_iter()
            .filter(|item| {
                item.difficulty_band == DifficultyBand::Foundation
                    && !exclude_item_ids.contains(&item.id)
            })
            .collect();
        Ok(foundation.choose(&mut rand::thread_rng()).cloned())
    }

    /// Self-rated "good / almost / bad" feedback on a prompt. Logs an attempt
    /// and returns the next difficulty for the rating game.
    pub fn record_prompt_rating(
        &self,
        user_id: &str,
        prompt_id: &str,
        rating: PromptRating,
        current_difficulty: f64,
    ) -> Result<PromptRatingOutcome, EngineError> {
        if !current_difficulty.is_finite() {
            return Err(EngineError::Invalid(
                "currentDifficulty must be a finite number".to_string(),
            ));
        }
        let new_difficulty = nudge_difficulty(current_difficulty, rating, &self.config.rating_game);

        let attempt = PracticeAttempt {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            item_id: prompt_id.to_string(),
            correct: None,
            rating: Some(rating),
            score: rating.score(),
            difficulty_before: Some(current_difficulty),
            difficulty_after: Some(new_difficulty),
            time_spent_ms: None,
            created_at: Utc::now(),
        };
        self.store.append_attempt(&attempt)?;

        Ok(PromptRatingOutcome {
            attempt_id: attempt.id,
            new_difficulty,
        })
    }

    /// Live items within the deck window of `difficulty`, closest first.
    /// A short deck is padded with other live items in random order.
    pub fn get_practice_items_for_deck(
        &self,
        user_id: &str,
        difficulty: f64,
        limit: Option<usize>,
    ) -> Result<Vec<PracticeItem>, EngineError> {
        let limit = limit.unwrap_or(self.config.deck.size).min(MAX_LIST_LIMIT);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let window = self.config.deck.window;
        let (mut near, mut rest): (Vec<PracticeItem>, Vec<PracticeItem>) = self
            .store
            .list_live_practice_items()?
            .into_iter()
            .partition(|item| (item.elo - difficulty).abs() <= window);

        near.sort_by(|a, b| {
            (a.elo - difficulty)
                .abs()
                .total_cmp(&(b.elo - difficulty).abs())
        });
        near.truncate(limit);

        if near.len() < limit {
            rest.shuffle(&mut rand::thread_rng());
            let missing = limit - near.len();
            near.extend(rest.into_iter().take(missing));
        }

        tracing::debug!(user_id, difficulty, size = near.len(), "Practice deck built");
        Ok(near)
    }

    /// Scores one answered item: every skill the item is tagged with moves
    /// against the item's pre-attempt elo, and the item moves against the mean
    /// pre-attempt rating of those skills.
    pub fn submit_attempt(
        &self,
        user_id: &str,
        item_id: &str,
        correct: bool,
        time_spent_ms: Option<u64>,
    ) -> Result<AttemptResult, EngineError> {
        let item = self.require_item(item_id)?;
        let item_elo = item.elo;

        let tags = unique_tags(&item.tags);
        let mut pre_ratings = Vec::with_capacity(tags.len());
        for tag in &tags {
            pre_ratings.push(self.skill_or_default(user_id, tag)?.rating);
        }
        let opponent = if pre_ratings.is_empty() {
            self.config.default_rating
        } else {
            pre_ratings.iter().sum::<f64>() / pre_ratings.len() as f64
        };

        let mut skills = Vec::with_capacity(tags.len());
        for tag in &tags {
            skills.push(self.update_skill_rating(user_id, tag, item_elo, correct)?);
        }
        let item_update = self.update_item_elo(item_id, opponent, correct)?;

        let attempt = PracticeAttempt {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            item_id: item_id.to_string(),
            correct: Some(correct),
            rating: None,
            score: if correct { 1.0 } else { 0.0 },
            difficulty_before: Some(item_update.old_elo),
            difficulty_after: Some(item_update.new_elo),
            time_spent_ms,
            created_at: Utc::now(),
        };
        self.store.append_attempt(&attempt)?;

        tracing::info!(
            user_id,
            item_id,
            correct,
            skills = skills.len(),
            "Practice attempt recorded"
        );

        Ok(AttemptResult {
            attempt,
            skills,
            item: item_update,
        })
    }

    pub fn list_attempts(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<PracticeAttempt>, EngineError> {
        Ok(self
            .store
            .list_user_attempts(user_id, limit.min(MAX_LIST_LIMIT))?)
    }

    pub fn get_item(&self, item_id: &str) -> Result<Option<PracticeItem>, EngineError> {
        Ok(self.store.get_practice_item(item_id)?)
    }

    pub fn list_items(&self, status: Option<ItemStatus>) -> Result<Vec<PracticeItem>, EngineError> {
        let items = self.store.list_practice_items()?;
        Ok(match status {
            Some(status) => items.into_iter().filter(|i| i.status == status).collect(),
            None => items,
        })
    }

    /// Creates or replaces an item. The band always follows the elo.
    pub fn upsert_item(&self, input: PracticeItemInput) -> Result<PracticeItem, EngineError> {
        if input.title.trim().is_empty() {
            return Err(EngineError::Invalid("title must not be empty".to_string()));
        }
        if input.prompt.trim().is_empty() {
            return Err(EngineError::Invalid("prompt must not be empty".to_string()));
        }
        if let Some(elo) = input.elo {
            if !elo.is_finite() {
                return Err(EngineError::Invalid("elo must be a finite number".to_string()));
            }
        }
        if input.tags.iter().any(|tag| tag.trim().is_empty()) {
            return Err(EngineError::Invalid("tags must not be blank".to_string()));
        }
        for tag in &input.tags {
            keys::validate_component("tag", tag).map_err(|e| match e {
                StoreError::Validation(msg) => EngineError::Invalid(msg),
                other => EngineError::Store(other),
            })?;
        }
        let tags = unique_tags(&input.tags);

        let now = Utc::now();
        let existing = match input.id.as_deref() {
            Some(id) => self.store.get_practice_item(id)?,
            None => None,
        };

        let item = match existing {
            Some(mut item) => {
                item.title = input.title;
                item.prompt = input.prompt;
                item.tags = tags;
                if let Some(elo) = input.elo {
                    item.elo = elo;
                }
                if let Some(status) = input.status {
                    item.status = status;
                }
                if let Some(params) = input.params {
                    item.params = params;
                }
                item.difficulty_band = DifficultyBand::from_elo(item.elo, &self.config);
                item.updated_at = now;
                item
            }
            None => {
                let elo = input.elo.unwrap_or(self.config.default_rating);
                PracticeItem {
                    id: input
                        .id
                        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                    title: input.title,
                    prompt: input.prompt,
                    elo,
                    elo_deviation: self.config.default_deviation,
                    difficulty_band: DifficultyBand::from_elo(elo, &self.config),
                    tags,
                    status: input.status.unwrap_or(ItemStatus::Draft),
                    params: input.params.unwrap_or(serde_json::Value::Null),
                    created_at: now,
                    updated_at: now,
                }
            }
        };

        self.store.upsert_practice_item(&item)?;
        tracing::info!(item_id = %item.id, elo = item.elo, status = ?item.status, "Practice item saved");
        Ok(item)
    }
}

/// Tags in first-seen order without repeats.
fn unique_tags(tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(tags.len());
    tags.iter()
        .filter(|tag| seen.insert(tag.as_str()))
        .cloned()
        .collect()
}
