//! Opportunity matching: labels every catalog entry with its type, a short
//! reason and the data needed to decide eligibility.
//!
//! `compute_matches` never hides ineligible entries; callers combine it with
//! `meets_requirements` / `find_skill_gaps` to render locked cards with progress.

pub mod catalog;
pub mod live;

use std::collections::{BTreeMap, HashMap, HashSet};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_SKILL_THRESHOLD;
use crate::scoring::{skill_value, SkillKey, SkillSignals, UnknownSkill};

use self::catalog::{Catalog, Opportunity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Career,
    Business,
    Side,
    Trade,
}

impl MatchType {
    pub fn from_employment_type(employment_type: &str) -> Self {
        match employment_type {
            "Freelance" => MatchType::Side,
            "Founder" => MatchType::Business,
            "Trade" => MatchType::Trade,
            _ => MatchType::Career,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: String,
    pub title: String,
    pub company: Option<String>,
    pub match_type: MatchType,
    pub location: String,
    pub salary_range: String,
    pub employment_type: String,
    pub seniority: String,
    pub required_skills: Vec<SkillKey>,
    pub skill_thresholds: BTreeMap<SkillKey, u32>,
    pub prompt_score_min: Option<u32>,
    pub required_projects: Option<u32>,
    pub recommended_projects: Vec<String>,
    pub missing_projects: Vec<String>,
    pub remote_policy: Option<String>,
    pub visa_support: Option<bool>,
    pub description: Option<String>,
    pub reason: String,
}

impl Match {
    /// Skill requirements: explicit per-skill thresholds when present,
    /// otherwise every required skill at the flat default.
    pub fn skill_requirements(&self) -> Vec<(SkillKey, u32)> {
        if !self.skill_thresholds.is_empty() {
            return self
                .skill_thresholds
                .iter()
                .map(|(key, threshold)| (*key, *threshold))
                .collect();
        }

        self.required_skills
            .iter()
            .map(|key| (*key, DEFAULT_SKILL_THRESHOLD))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillGap {
    pub skill: SkillKey,
    pub label: String,
    pub current: u32,
    pub required: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPreferences {
    #[serde(default)]
    pub work_type: Option<String>,
    #[serde(default)]
    pub career_stage: Option<String>,
}

/// A match with its eligibility resolved for one user snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCard {
    #[serde(flatten)]
    pub opportunity: Match,
    pub unlocked: bool,
    pub skill_gaps: Vec<SkillGap>,
}

static WORK_TYPE_TABLE: Lazy<HashMap<&'static str, &'static [MatchType]>> = Lazy::new(|| {
    HashMap::from([
        ("full-time", &[MatchType::Career][..]),
        ("career", &[MatchType::Career][..]),
        ("side-hustle", &[MatchType::Side][..]),
        ("freelance", &[MatchType::Side][..]),
        ("business", &[MatchType::Business][..]),
        ("founder", &[MatchType::Business][..]),
        ("trade", &[MatchType::Trade][..]),
        ("hands-on", &[MatchType::Trade][..]),
        ("flexible", &[MatchType::Side, MatchType::Business][..]),
    ])
});

static CAREER_STAGE_TABLE: Lazy<HashMap<&'static str, &'static [&'static str]>> =
    Lazy::new(|| {
        HashMap::from([
            ("student", &["Entry", "Junior"][..]),
            ("exploring", &["Entry"][..]),
            ("early-career", &["Entry", "Junior", "Mid"][..]),
            ("career-switcher", &["Entry", "Junior", "Mid"][..]),
            ("mid-career", &["Mid", "Senior"][..]),
            ("experienced", &["Senior", "Lead"][..]),
            ("leader", &["Senior", "Lead"][..]),
        ])
    });

pub fn compute_matches(
    catalog: &Catalog,
    prompt_score: u32,
    skills: &SkillSignals,
    completed_project_count: u32,
    completed_project_slugs: &[String],
) -> Vec<Match> {
    let completed: HashSet<&str> = completed_project_slugs.iter().map(String::as_str).collect();

    let matches: Vec<Match> = catalog
        .iter()
        .filter_map(|opportunity| match build_match(opportunity, skills, &completed) {
            Ok(m) => Some(m),
            Err(e) => {
                tracing::warn!(
                    id = %opportunity.id,
                    error = %e,
                    "Skipping opportunity with invalid skill key"
                );
                None
            }
        })
        .collect();

    tracing::debug!(
        prompt_score,
        completed_project_count,
        total = matches.len(),
        "Computed opportunity matches"
    );

    matches
}

fn build_match(
    opportunity: &Opportunity,
    skills: &SkillSignals,
    completed: &HashSet<&str>,
) -> Result<Match, UnknownSkill> {
    let required_skills = opportunity
        .required_skills
        .iter()
        .map(|raw| raw.parse::<SkillKey>())
        .collect::<Result<Vec<_>, _>>()?;

    let skill_thresholds = opportunity
        .skill_thresholds
        .iter()
        .map(|(raw, threshold)| raw.parse::<SkillKey>().map(|key| (key, *threshold)))
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    let missing_projects = opportunity
        .recommended_projects
        .iter()
        .filter(|slug| !completed.contains(slug.as_str()))
        .cloned()
        .collect();

    let mut m = Match {
        id: opportunity.id.clone(),
        title: opportunity.title.clone(),
        company: opportunity.company.clone(),
        match_type: MatchType::from_employment_type(&opportunity.employment_type),
        location: opportunity.location.clone(),
        salary_range: opportunity.salary_range.clone(),
        employment_type: opportunity.employment_type.clone(),
        seniority: opportunity.seniority.clone(),
        required_skills,
        skill_thresholds,
        prompt_score_min: opportunity.prompt_score_min,
        required_projects: opportunity.portfolio_projects,
        recommended_projects: opportunity.recommended_projects.clone(),
        missing_projects,
        remote_policy: opportunity.remote_policy.clone(),
        visa_support: opportunity.visa_support,
        description: opportunity.description.clone(),
        reason: String::new(),
    };
    m.reason = build_reason(&m, skills);
    Ok(m)
}

fn build_reason(m: &Match, skills: &SkillSignals) -> String {
    let strengths: Vec<&'static str> = m
        .skill_requirements()
        .into_iter()
        .filter(|(key, _)| skill_value(skills, *key) >= DEFAULT_SKILL_THRESHOLD)
        .map(|(key, _)| key.label())
        .take(2)
        .collect();

    match strengths.as_slice() {
        [a, b] => format!("Your {a} and {b} skills are a strong fit for this role."),
        [a] => format!("Your {a} skills are a strong fit for this role."),
        _ => "Build your skills through practice to unlock this opportunity.".to_string(),
    }
}

pub fn meets_requirements(
    m: &Match,
    prompt_score: u32,
    skills: &SkillSignals,
    completed_projects: u32,
) -> bool {
    if let Some(min) = m.prompt_score_min {
        if prompt_score < min {
            return false;
        }
    }

    if let Some(min) = m.required_projects {
        if completed_projects < min {
            return false;
        }
    }

    m.skill_requirements()
        .into_iter()
        .all(|(key, threshold)| skill_value(skills, key) >= threshold)
}

pub fn find_skill_gaps(skills: &SkillSignals, m: &Match) -> Vec<SkillGap> {
    m.skill_requirements()
        .into_iter()
        .filter_map(|(key, required)| {
            let current = skill_value(skills, key);
            (current < required).then(|| SkillGap {
                skill: key,
                label: key.label().to_string(),
                current,
                required,
            })
        })
        .collect()
}

pub fn filter_by_preferences(matches: Vec<Match>, preferences: &MatchPreferences) -> Vec<Match> {
    let allowed_types = preferences
        .work_type
        .as_deref()
        .map(|raw| raw.trim().to_ascii_lowercase())
        .and_then(|key| WORK_TYPE_TABLE.get(key.as_str()).copied());

    let allowed_seniority = preferences
        .career_stage
        .as_deref()
        .map(|raw| raw.trim().to_ascii_lowercase())
        .and_then(|key| CAREER_STAGE_TABLE.get(key.as_str()).copied());

    matches
        .into_iter()
        .filter(|m| allowed_types.map_or(true, |types| types.contains(&m.match_type)))
        .filter(|m| {
            allowed_seniority.map_or(true, |levels| {
                levels
                    .iter()
                    .any(|level| level.eq_ignore_ascii_case(&m.seniority))
            })
        })
        .collect()
}

/// Computes every match and resolves eligibility and gaps for one snapshot.
pub fn evaluate_matches(
    catalog: &Catalog,
    prompt_score: u32,
    skills: &SkillSignals,
    completed_project_count: u32,
    completed_project_slugs: &[String],
    preferences: Option<&MatchPreferences>,
) -> Vec<MatchCard> {
    let mut matches = compute_matches(
        catalog,
        prompt_score,
        skills,
        completed_project_count,
        completed_project_slugs,
    );

    if let Some(prefs) = preferences {
        matches = filter_by_preferences(matches, prefs);
    }

    matches
        .into_iter()
        .map(|m| {
            let unlocked = meets_requirements(&m, prompt_score, skills, completed_project_count);
            let skill_gaps = find_skill_gaps(skills, &m);
            MatchCard {
                opportunity: m,
                unlocked,
                skill_gaps,
            }
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::test_support::opportunity;
    use super::*;

    fn skills(entries: &[(SkillKey, u32)]) -> SkillSignals {
        entries.iter().copied().collect()
    }

    fn single_match(opp: Opportunity, s: &SkillSignals) -> Match {
        let catalog = Catalog::from_records(vec![opp]);
        compute_matches(&catalog, 0, s, 0, &[]).remove(0)
    }

    #[test]
    fn classifies_by_employment_type() {
        assert_eq!(MatchType::from_employment_type("Freelance"), MatchType::Side);
        assert_eq!(MatchType::from_employment_type("Founder"), MatchType::Business);
        assert_eq!(MatchType::from_employment_type("Trade"), MatchType::Trade);
        assert_eq!(MatchType::from_employment_type("Full-time"), MatchType::Career);
        assert_eq!(MatchType::from_employment_type("Contract"), MatchType::Career);
    }

    #[test]
    fn returns_every_valid_entry_in_order() {
        let mut locked = opportunity("locked", "Full-time");
        locked.prompt_score_min = Some(99);
        let catalog = Catalog::from_records(vec![
            opportunity("a", "Full-time"),
            locked,
            opportunity("c", "Trade"),
        ]);

        let ids: Vec<String> = compute_matches(&catalog, 10, &SkillSignals::new(), 0, &[])
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["a", "locked", "c"]);
    }

    #[test]
    fn skips_records_with_unknown_skill_keys() {
        let mut bad = opportunity("bad", "Full-time");
        bad.skill_thresholds.insert("juggling".to_string(), 50);
        let mut bad_required = opportunity("bad-required", "Full-time");
        bad_required.required_skills = vec!["telepathy".to_string()];

        let catalog =
            Catalog::from_records(vec![bad, opportunity("good", "Full-time"), bad_required]);
        let matches = compute_matches(&catalog, 50, &SkillSignals::new(), 0, &[]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "good");
    }

    #[test]
    fn reason_names_up_to_two_strong_skills() {
        let mut opp = opportunity("r", "Full-time");
        opp.required_skills = vec![
            "logic".to_string(),
            "safety".to_string(),
            "strategy".to_string(),
        ];
        let s = skills(&[
            (SkillKey::Logic, 80),
            (SkillKey::Safety, 75),
            (SkillKey::Strategy, 90),
        ]);
        let m = single_match(opp, &s);
        assert_eq!(m.reason, "Your Logic and AI Safety skills are a strong fit for this role.");
    }

    #[test]
    fn reason_falls_back_without_strong_skills() {
        let mut opp = opportunity("r", "Full-time");
        opp.required_skills = vec!["logic".to_string()];
        let m = single_match(opp, &skills(&[(SkillKey::Logic, 59)]));
        assert!(m.reason.starts_with("Build your skills"));
    }

    #[test]
    fn missing_projects_excludes_completed_slugs() {
        let mut opp = opportunity("p", "Full-time");
        opp.recommended_projects = vec!["one".to_string(), "two".to_string()];
        let catalog = Catalog::from_records(vec![opp]);
        let m = compute_matches(&catalog, 0, &SkillSignals::new(), 1, &["one".to_string()])
            .remove(0);
        assert_eq!(m.missing_projects, vec!["two".to_string()]);
    }

    #[test]
    fn scenario_prompt_score_80_generative_ai_70_is_eligible() {
        let mut opp = opportunity("genai", "Full-time");
        opp.prompt_score_min = Some(70);
        opp.skill_thresholds.insert("generative_ai".to_string(), 60);
        let s = skills(&[(SkillKey::GenerativeAi, 70)]);
        let m = single_match(opp, &s);
        assert!(meets_requirements(&m, 80, &s, 0));
    }

    #[test]
    fn meets_requirements_boundaries() {
        let mut opp = opportunity("b", "Full-time");
        opp.prompt_score_min = Some(70);
        opp.portfolio_projects = Some(2);
        opp.skill_thresholds.insert("logic".to_string(), 65);
        opp.skill_thresholds.insert("safety".to_string(), 60);
        let at_threshold = skills(&[(SkillKey::Logic, 65), (SkillKey::Safety, 60)]);
        let m = single_match(opp, &at_threshold);

        assert!(meets_requirements(&m, 70, &at_threshold, 2));
        assert!(!meets_requirements(&m, 69, &at_threshold, 2));
        assert!(!meets_requirements(&m, 70, &at_threshold, 1));

        let one_short = skills(&[(SkillKey::Logic, 65), (SkillKey::Safety, 59)]);
        assert!(!meets_requirements(&m, 100, &one_short, 5));
    }

    #[test]
    fn flat_default_applies_without_thresholds() {
        let mut opp = opportunity("flat", "Freelance");
        opp.required_skills = vec!["agents".to_string()];
        let m = single_match(opp, &SkillSignals::new());

        assert!(meets_requirements(&m, 0, &skills(&[(SkillKey::Agents, 60)]), 0));
        assert!(!meets_requirements(&m, 0, &skills(&[(SkillKey::Agents, 59)]), 0));
        assert!(!meets_requirements(&m, 0, &SkillSignals::new(), 0));
    }

    #[test]
    fn unset_minimums_do_not_gate() {
        let m = single_match(opportunity("open", "Full-time"), &SkillSignals::new());
        assert!(meets_requirements(&m, 0, &SkillSignals::new(), 0));
    }

    #[test]
    fn skill_gaps_list_only_skills_below_threshold() {
        let mut opp = opportunity("g", "Full-time");
        opp.skill_thresholds.insert("logic".to_string(), 70);
        opp.skill_thresholds.insert("safety".to_string(), 50);
        let s = skills(&[(SkillKey::Logic, 40), (SkillKey::Safety, 80)]);
        let m = single_match(opp, &s);

        let gaps = find_skill_gaps(&s, &m);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].skill, SkillKey::Logic);
        assert_eq!(gaps[0].current, 40);
        assert_eq!(gaps[0].required, 70);
    }

    #[test]
    fn preferences_filter_by_type_and_stage() {
        let mut senior = opportunity("senior", "Full-time");
        senior.seniority = "Senior".to_string();
        let catalog = Catalog::from_records(vec![
            opportunity("career", "Full-time"),
            opportunity("side", "Freelance"),
            senior,
        ]);
        let matches = compute_matches(&catalog, 0, &SkillSignals::new(), 0, &[]);

        let by_type = filter_by_preferences(
            matches.clone(),
            &MatchPreferences {
                work_type: Some("Side-Hustle".to_string()),
                career_stage: None,
            },
        );
        assert_eq!(by_type.len(), 1);
        assert_eq!(by_type[0].id, "side");

        let by_stage = filter_by_preferences(
            matches.clone(),
            &MatchPreferences {
                work_type: Some("career".to_string()),
                career_stage: Some("student".to_string()),
            },
        );
        assert_eq!(by_stage.len(), 1);
        assert_eq!(by_stage[0].id, "career");

        let unknown = filter_by_preferences(
            matches,
            &MatchPreferences {
                work_type: Some("astronaut".to_string()),
                career_stage: None,
            },
        );
        assert_eq!(unknown.len(), 3);
    }

    #[test]
    fn evaluate_matches_marks_locked_cards() {
        let catalog = Catalog::bundled().unwrap();
        let cards = evaluate_matches(&catalog, 0, &SkillSignals::new(), 0, &[], None);
        assert_eq!(cards.len(), catalog.len());
        assert!(cards.iter().filter(|c| !c.unlocked).all(|c| {
            !c.skill_gaps.is_empty()
                || c.opportunity.prompt_score_min.unwrap_or(0) > 0
                || c.opportunity.required_projects.unwrap_or(0) > 0
        }));
    }
}
