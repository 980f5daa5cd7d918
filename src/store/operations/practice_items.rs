use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::adaptive::elo::DifficultyBand;
use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Draft,
    Live,
    Retired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeItem {
    pub id: String,
    pub title: String,
    pub prompt: String,
    pub elo: f64,
    pub elo_deviation: f64,
    pub difficulty_band: DifficultyBand,
    /// Skill ids this item exercises
    pub tags: Vec<String>,
    pub status: ItemStatus,
    #[serde(default)]
    pub params: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PracticeItem {
    pub fn is_live(&self) -> bool {
        self.status == ItemStatus::Live
    }

    pub fn has_tag(&self, skill_id: &str) -> bool {
        self.tags.iter().any(|tag| tag == skill_id)
    }
}

impl Store {
    pub fn upsert_practice_item(&self, item: &PracticeItem) -> Result<(), StoreError> {
        let key = keys::practice_item_key(&item.id)?;
        self.practice_items
            .insert(key.as_bytes(), Self::serialize(item)?)?;
        Ok(())
    }

    pub fn get_practice_item(&self, item_id: &str) -> Result<Option<PracticeItem>, StoreError> {
        let key = keys::practice_item_key(item_id)?;
        match self.practice_items.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// All items in key order.
    pub fn list_practice_items(&self) -> Result<Vec<PracticeItem>, StoreError> {
        let mut items = Vec::new();
        for entry in self.practice_items.iter() {
            let (_, value) = entry?;
            items.push(Self::deserialize::<PracticeItem>(&value)?);
        }
        Ok(items)
    }

    pub fn list_live_practice_items(&self) -> Result<Vec<PracticeItem>, StoreError> {
        Ok(self
            .list_practice_items()?
            .into_iter()
            .filter(PracticeItem::is_live)
            .collect())
    }

    pub fn count_practice_items(&self) -> usize {
        self.practice_items.len()
    }
}
