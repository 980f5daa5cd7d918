use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const BUNDLED_CATALOG: &str = include_str!("../../data/opportunities.json");

/// A catalog record as it appears in the seed file. Skill keys stay as raw
/// strings so that records referencing unknown skills can be detected and
/// skipped at match time instead of failing the whole load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub company: Option<String>,
    pub location: String,
    pub salary_range: String,
    pub employment_type: String,
    pub seniority: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub skill_thresholds: BTreeMap<String, u32>,
    #[serde(default)]
    pub prompt_score_min: Option<u32>,
    #[serde(default)]
    pub portfolio_projects: Option<u32>,
    #[serde(default)]
    pub recommended_projects: Vec<String>,
    #[serde(default)]
    pub remote_policy: Option<String>,
    #[serde(default)]
    pub visa_support: Option<bool>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Read-only opportunity catalog, kept in file order with an id index.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<Opportunity>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json(BUNDLED_CATALOG)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_json(&raw)?;
        tracing::info!(
            path = %path.as_ref().display(),
            records = catalog.len(),
            "Loaded opportunity catalog"
        );
        Ok(catalog)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let records: Vec<Opportunity> = serde_json::from_str(raw)?;
        Ok(Self::from_records(records))
    }

    pub fn from_records(records: Vec<Opportunity>) -> Self {
        let mut kept = Vec::with_capacity(records.len());
        let mut by_id = HashMap::with_capacity(records.len());

        for record in records {
            if by_id.contains_key(&record.id) {
                tracing::warn!(id = %record.id, "Duplicate opportunity id in catalog, keeping first");
                continue;
            }
            by_id.insert(record.id.clone(), kept.len());
            kept.push(record);
        }

        Self {
            records: kept,
            by_id,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Opportunity> {
        self.by_id.get(id).map(|idx| &self.records[*idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Opportunity> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
