//! Elo rating core shared by the learner-skill pool and the item-difficulty
//! pool. Learners and items sit on opposite sides of every attempt: a correct
//! answer is a win for the learner and a loss for the item.

use serde::{Deserialize, Serialize};

use super::config::{AdaptiveConfig, RatingGameConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Learner,
    Item,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyBand {
    Foundation,
    Core,
    Challenge,
}

impl DifficultyBand {
    pub fn from_elo(elo: f64, config: &AdaptiveConfig) -> Self {
        if elo < config.foundation_ceiling {
            DifficultyBand::Foundation
        } else if elo < config.core_ceiling {
            DifficultyBand::Core
        } else {
            DifficultyBand::Challenge
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRating {
    Good,
    Almost,
    Bad,
}

impl PromptRating {
    /// Score recorded on the attempt log for this self-rating.
    pub fn score(&self) -> f64 {
        match self {
            PromptRating::Good => 1.0,
            PromptRating::Almost => 0.5,
            PromptRating::Bad => 0.0,
        }
    }
}

/// Expected score of `rating` against `opponent`
pub fn expected_score(rating: f64, opponent: f64) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf((opponent - rating) / 400.0))
}

pub fn elo_update(rating: f64, opponent: f64, actual: f64, k: f64) -> f64 {
    rating + k * (actual - expected_score(rating, opponent))
}

/// Outcome seen by `side` when the learner answered `correct`.
pub fn actual_score(correct: bool, side: Side) -> f64 {
    match (side, correct) {
        (Side::Learner, true) | (Side::Item, false) => 1.0,
        (Side::Learner, false) | (Side::Item, true) => 0.0,
    }
}

/// Deviation never increases and never drops below `floor`.
pub fn decay_deviation(deviation: f64, factor: f64, floor: f64) -> f64 {
    if deviation <= floor {
        return deviation;
    }
    (deviation * factor).max(floor)
}

pub fn nudge_difficulty(current: f64, rating: PromptRating, config: &RatingGameConfig) -> f64 {
    let step = match rating {
        PromptRating::Good => config.good_step,
        PromptRating::Almost => config.almost_step,
        PromptRating::Bad => config.bad_step,
    };
    (current + step).clamp(config.min_difficulty, config.max_difficulty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_match_moves_by_half_k() {
        assert!((elo_update(1500.0, 1500.0, 1.0, 32.0) - 1516.0).abs() < 1e-9);
        assert!((elo_update(1500.0, 1500.0, 0.0, 32.0) - 1484.0).abs() < 1e-9);
    }

    #[test]
    fn item_side_sees_inverted_outcome() {
        assert_eq!(actual_score(true, Side::Learner), 1.0);
        assert_eq!(actual_score(true, Side::Item), 0.0);
        assert_eq!(actual_score(false, Side::Learner), 0.0);
        assert_eq!(actual_score(false, Side::Item), 1.0);
    }

    #[test]
    fn band_boundaries() {
        let cfg = AdaptiveConfig::default();
        assert_eq!(DifficultyBand::from_elo(1399.0, &cfg), DifficultyBand::Foundation);
        assert_eq!(DifficultyBand::from_elo(1400.0, &cfg), DifficultyBand::Core);
        assert_eq!(DifficultyBand::from_elo(1599.0, &cfg), DifficultyBand::Core);
        assert_eq!(DifficultyBand::from_elo(1600.0, &cfg), DifficultyBand::Challenge);
    }

    #[test]
    fn deviation_decays_to_floor() {
        let mut deviation = 350.0;
        for _ in 0..200 {
            let next = decay_deviation(deviation, 0.95, 50.0);
            assert!(next <= deviation);
            assert!(next >= 50.0);
            deviation = next;
        }
        assert_eq!(deviation, 50.0);
    }

    #[test]
    fn deviation_below_floor_is_not_raised() {
        assert_eq!(decay_deviation(40.0, 0.95, 50.0), 40.0);
    }

    #[test]
    fn prompt_rating_nudges_are_clamped() {
        let cfg = RatingGameConfig::default();
        assert_eq!(nudge_difficulty(1990.0, PromptRating::Good, &cfg), 2000.0);
        assert_eq!(nudge_difficulty(1500.0, PromptRating::Almost, &cfg), 1510.0);
        assert_eq!(nudge_difficulty(1020.0, PromptRating::Bad, &cfg), 1000.0);
    }

    #[test]
    fn expected_score_is_symmetric() {
        let a = expected_score(1600.0, 1400.0);
        let b = expected_score(1400.0, 1600.0);
        assert!((a + b - 1.0).abs() < 1e-12);
        assert!(a > 0.5);
    }
}
