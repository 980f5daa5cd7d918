use serde::{Deserialize, Serialize};

/// Tunables of the adaptive practice engine. The item K ratio and the stretch
/// offset have no derivation behind them; they are kept overridable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveConfig {
    pub user_k_factor: f64,
    /// Item K = user K × this ratio
    pub item_k_ratio: f64,
    pub default_rating: f64,
    pub default_deviation: f64,
    pub deviation_floor: f64,
    pub user_deviation_decay: f64,
    pub item_deviation_decay: f64,
    /// Items are targeted this far above the learner's rating
    pub stretch_offset: f64,
    /// Elo below this is `foundation`
    pub foundation_ceiling: f64,
    /// Elo below this (and at least `foundation_ceiling`) is `core`
    pub core_ceiling: f64,
    #[serde(default)]
    pub rating_game: RatingGameConfig,
    #[serde(default)]
    pub deck: DeckConfig,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            user_k_factor: 32.0,
            item_k_ratio: 0.5,
            default_rating: 1500.0,
            default_deviation: 350.0,
            deviation_floor: 50.0,
            user_deviation_decay: 0.95,
            item_deviation_decay: 0.98,
            stretch_offset: 100.0,
            foundation_ceiling: 1400.0,
            core_ceiling: 1600.0,
            rating_game: RatingGameConfig::default(),
            deck: DeckConfig::default(),
        }
    }
}

/// Step sizes of the self-rated "good / almost / bad" practice mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingGameConfig {
    pub good_step: f64,
    pub almost_step: f64,
    pub bad_step: f64,
    pub min_difficulty: f64,
    pub max_difficulty: f64,
}

impl Default for RatingGameConfig {
    fn default() -> Self {
        Self {
            good_step: 50.0,
            almost_step: 10.0,
            bad_step: -50.0,
            min_difficulty: 1000.0,
            max_difficulty: 2000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckConfig {
    pub window: f64,
    pub size: usize,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            window: 200.0,
            size: crate::constants::DEFAULT_DECK_SIZE,
        }
    }
}

impl AdaptiveConfig {
    pub fn from_env(env_config: &crate::config::AdaptiveEnvConfig) -> Self {
        let mut config = Self::default();
        config.user_k_factor = env_config.user_k_factor;
        config.item_k_ratio = env_config.item_k_ratio;
        config.stretch_offset = env_config.stretch_offset;
        config.deck.size = env_config.deck_size;
        config
    }

    pub fn item_k_factor(&self) -> f64 {
        self.user_k_factor * self.item_k_ratio
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.user_k_factor.is_finite() || self.user_k_factor <= 0.0 {
            return Err("userKFactor must be > 0".to_string());
        }
        if self.item_k_ratio.is_nan() || self.item_k_ratio <= 0.0 || self.item_k_ratio > 1.0 {
            return Err("itemKRatio must be in (0,1]".to_string());
        }
        if !(0.0..1.0).contains(&self.user_deviation_decay)
            || !(0.0..1.0).contains(&self.item_deviation_decay)
        {
            return Err("deviation decay factors must be in [0,1)".to_string());
        }
        if self.deviation_floor <= 0.0 || self.deviation_floor > self.default_deviation {
            return Err("deviationFloor must be in (0, defaultDeviation]".to_string());
        }
        if self.foundation_ceiling >= self.core_ceiling {
            return Err("foundationCeiling must be below coreCeiling".to_string());
        }
        if self.rating_game.min_difficulty >= self.rating_game.max_difficulty {
            return Err("ratingGame.minDifficulty must be below maxDifficulty".to_string());
        }
        if !self.stretch_offset.is_finite() {
            return Err("stretchOffset must be a finite number".to_string());
        }
        if self.deck.window.is_nan() || self.deck.window < 0.0 {
            return Err("deck.window must be >= 0".to_string());
        }
        if self.deck.size == 0 {
            return Err("deck.size must be > 0".to_string());
        }
        Ok(())
    }
}
