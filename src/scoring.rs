//! Rubric scoring: turns a four-dimension prompt rubric into a PromptScore
//! and the 11-dimension skill vector used by matching.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Upper bound of a single rubric dimension.
pub const DIMENSION_MAX: f64 = 25.0;

/// Rubric dimensions are scaled by this factor so a perfect rubric maps to 100.
const SIGNAL_SCALE: f64 = 4.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rubric {
    pub clarity: f64,
    pub constraints: f64,
    pub iteration: f64,
    pub tool: f64,
}

impl Rubric {
    pub fn new(clarity: f64, constraints: f64, iteration: f64, tool: f64) -> Self {
        Self {
            clarity,
            constraints,
            iteration,
            tool,
        }
    }

    fn clamped(&self) -> Rubric {
        Rubric {
            clarity: clamp_dimension(self.clarity),
            constraints: clamp_dimension(self.constraints),
            iteration: clamp_dimension(self.iteration),
            tool: clamp_dimension(self.tool),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillKey {
    GenerativeAi,
    Agents,
    Synthesis,
    Communication,
    Logic,
    Explainability,
    Safety,
    DataAnalysis,
    Creativity,
    ProblemSolving,
    Strategy,
}

impl SkillKey {
    pub const ALL: [SkillKey; 11] = [
        SkillKey::GenerativeAi,
        SkillKey::Agents,
        SkillKey::Synthesis,
        SkillKey::Communication,
        SkillKey::Logic,
        SkillKey::Explainability,
        SkillKey::Safety,
        SkillKey::DataAnalysis,
        SkillKey::Creativity,
        SkillKey::ProblemSolving,
        SkillKey::Strategy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillKey::GenerativeAi => "generative_ai",
            SkillKey::Agents => "agents",
            SkillKey::Synthesis => "synthesis",
            SkillKey::Communication => "communication",
            SkillKey::Logic => "logic",
            SkillKey::Explainability => "explainability",
            SkillKey::Safety => "safety",
            SkillKey::DataAnalysis => "data_analysis",
            SkillKey::Creativity => "creativity",
            SkillKey::ProblemSolving => "problem_solving",
            SkillKey::Strategy => "strategy",
        }
    }

    /// Human readable name used in match reasons.
    pub fn label(&self) -> &'static str {
        match self {
            SkillKey::GenerativeAi => "Generative AI",
            SkillKey::Agents => "AI Agents",
            SkillKey::Synthesis => "Synthesis",
            SkillKey::Communication => "Communication",
            SkillKey::Logic => "Logic",
            SkillKey::Explainability => "Explainability",
            SkillKey::Safety => "AI Safety",
            SkillKey::DataAnalysis => "Data Analysis",
            SkillKey::Creativity => "Creativity",
            SkillKey::ProblemSolving => "Problem Solving",
            SkillKey::Strategy => "Strategy",
        }
    }

    /// Weights over (clarity, constraints, iteration, tool). Every row sums to 1.
    fn weights(&self) -> [f64; 4] {
        match self {
            SkillKey::GenerativeAi => [0.3, 0.3, 0.2, 0.2],
            SkillKey::Agents => [0.0, 0.0, 0.4, 0.6],
            SkillKey::Synthesis => [0.5, 0.0, 0.5, 0.0],
            SkillKey::Communication => [0.8, 0.0, 0.2, 0.0],
            SkillKey::Logic => [0.0, 0.7, 0.3, 0.0],
            SkillKey::Explainability => [0.6, 0.4, 0.0, 0.0],
            SkillKey::Safety => [0.0, 0.8, 0.0, 0.2],
            SkillKey::DataAnalysis => [0.0, 0.5, 0.0, 0.5],
            SkillKey::Creativity => [0.3, 0.0, 0.7, 0.0],
            SkillKey::ProblemSolving => [0.0, 0.4, 0.4, 0.2],
            SkillKey::Strategy => [0.4, 0.3, 0.3, 0.0],
        }
    }
}

impl fmt::Display for SkillKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown skill key: {0}")]
pub struct UnknownSkill(pub String);

impl FromStr for SkillKey {
    type Err = UnknownSkill;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SkillKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownSkill(s.to_string()))
    }
}

/// Skill vector keyed by skill, values in [0, 100].
pub type SkillSignals = BTreeMap<SkillKey, u32>;

/// Reads a skill value, treating an absent skill as 0.
pub fn skill_value(skills: &SkillSignals, key: SkillKey) -> u32 {
    skills.get(&key).copied().unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentScore {
    pub prompt_score: u32,
    pub skills: SkillSignals,
}

/// NaN is treated as 0 so the result always lands in [0, 25].
pub fn clamp_dimension(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, DIMENSION_MAX)
}

pub fn compute_prompt_score(rubric: &Rubric) -> u32 {
    let r = rubric.clamped();
    let sum = r.clarity + r.constraints + r.iteration + r.tool;
    sum.round() as u32
}

pub fn compute_skill_signals(rubric: &Rubric) -> SkillSignals {
    let r = rubric.clamped();
    let dims = [r.clarity, r.constraints, r.iteration, r.tool];

    SkillKey::ALL
        .iter()
        .map(|key| {
            let weighted: f64 = key
                .weights()
                .iter()
                .zip(dims.iter())
                .map(|(w, d)| w * d)
                .sum();
            let value = (weighted * SIGNAL_SCALE).round().clamp(0.0, 100.0) as u32;
            (*key, value)
        })
        .collect()
}

pub fn score_assessment(rubric: &Rubric) -> AssessmentScore {
    AssessmentScore {
        prompt_score: compute_prompt_score(rubric),
        skills: compute_skill_signals(rubric),
    }
}
