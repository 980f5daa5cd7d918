/// Skill level required when an opportunity lists a skill without a threshold
pub const DEFAULT_SKILL_THRESHOLD: u32 = 60;

/// Largest PromptScore shortfall still shown as "almost unlocked"
pub const ALMOST_PROMPT_SCORE_GAP_MAX: u32 = 10;

/// Largest completed-project shortfall still shown as "almost unlocked"
pub const ALMOST_PROJECT_GAP_MAX: u32 = 2;

/// Skill level counted as "near" a requirement
pub const ALMOST_SKILL_FLOOR: u32 = 50;

/// Default practice deck size
pub const DEFAULT_DECK_SIZE: usize = 24;

/// Upper bound for deck and attempt listing sizes
pub const MAX_LIST_LIMIT: usize = 200;

/// Default page size for attempt history
pub const DEFAULT_ATTEMPT_PAGE_SIZE: usize = 50;

/// Maximum accepted length of a coach question or prompt (characters)
pub const MAX_COACH_INPUT_CHARS: usize = 4000;
