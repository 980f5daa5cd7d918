//! Adaptive practice: Elo ratings for learner skills and practice items, and
//! the item/deck selection built on them.

pub mod config;
pub mod elo;
pub mod engine;

pub use engine::{AdaptiveEngine, EngineError};
