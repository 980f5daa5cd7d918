use chrono::Utc;
use serde::Deserialize;

use crate::adaptive::config::AdaptiveConfig;
use crate::adaptive::elo::DifficultyBand;
use crate::store::operations::practice_items::{ItemStatus, PracticeItem};
use crate::store::{Store, StoreError};

const VERSION_KEY: &str = "_meta:version";

const PRACTICE_SEED: &str = include_str!("../../data/practice_items.json");

type MigrationFn = fn(&Store) -> Result<(), StoreError>;

fn migrations() -> Vec<(&'static str, MigrationFn)> {
    vec![
        ("001_initial", m001_initial),
        ("002_seed_practice_items", m002_seed_practice_items),
    ]
}

/// Version reached once every known migration has run.
pub fn latest_version() -> u32 {
    migrations().len() as u32
}

/// Applies every migration newer than the stored version.
///
/// Migrations must be idempotent: a crash between a migration and its
/// `set_version` checkpoint re-runs it on the next start. Versions only move
/// forward.
pub fn run(store: &Store) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    let all = migrations();

    for (index, (name, func)) in all.iter().enumerate() {
        let version = (index + 1) as u32;
        if version > current {
            tracing::info!(version, name, "Running migration");
            func(store)?;
            set_version(store, version)?;
            tracing::info!(version, name, "Migration complete");
        } else {
            tracing::debug!(version, name, "Migration already applied, skipping");
        }
    }

    Ok(())
}

pub fn get_current_version(store: &Store) -> Result<u32, StoreError> {
    match store.meta.get(VERSION_KEY.as_bytes())? {
        Some(raw) => {
            let bytes: [u8; 4] = raw.as_ref().try_into().map_err(|_| StoreError::Migration {
                version: 0,
                message: format!("corrupt version marker ({} bytes)", raw.len()),
            })?;
            Ok(u32::from_be_bytes(bytes))
        }
        None => Ok(0),
    }
}

pub fn set_version(store: &Store, version: u32) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    if version < current {
        return Err(StoreError::Migration {
            version,
            message: format!("Refuse to downgrade from {} to {}", current, version),
        });
    }

    store.meta.insert(VERSION_KEY.as_bytes(), &version.to_be_bytes())?;
    Ok(())
}

fn m001_initial(_store: &Store) -> Result<(), StoreError> {
    Ok(())
}

#[derive(Debug, Deserialize)]
struct SeedItem {
    id: String,
    title: String,
    prompt: String,
    elo: f64,
    tags: Vec<String>,
    #[serde(default)]
    params: serde_json::Value,
}

/// Inserts the bundled starter items. Ids already present are left alone.
fn m002_seed_practice_items(store: &Store) -> Result<(), StoreError> {
    let seed: Vec<SeedItem> = serde_json::from_str(PRACTICE_SEED)?;
    let defaults = AdaptiveConfig::default();
    let now = Utc::now();
    let mut inserted = 0usize;

    for raw in seed {
        if store.get_practice_item(&raw.id)?.is_some() {
            continue;
        }
        let item = PracticeItem {
            difficulty_band: DifficultyBand::from_elo(raw.elo, &defaults),
            id: raw.id,
            title: raw.title,
            prompt: raw.prompt,
            elo: raw.elo,
            elo_deviation: defaults.default_deviation,
            tags: raw.tags,
            status: ItemStatus::Live,
            params: raw.params,
            created_at: now,
            updated_at: now,
        };
        store.upsert_practice_item(&item)?;
        inserted += 1;
    }

    tracing::info!(inserted, "Seeded practice items");
    Ok(())
}
