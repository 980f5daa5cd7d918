pub mod attempts;
pub mod practice_items;
pub mod user_skills;
