pub const PRACTICE_ITEMS: &str = "practice_items";
pub const PRACTICE_USER_SKILLS: &str = "practice_user_skills";
pub const PRACTICE_ATTEMPTS: &str = "practice_attempts";
pub const META: &str = "meta";
