//! Live match preview: which opportunities a skill snapshot unlocks, which are
//! within reach, and which became available since the previous snapshot.

use std::collections::HashSet;

use serde::Serialize;

use crate::constants::{
    ALMOST_PROJECT_GAP_MAX, ALMOST_PROMPT_SCORE_GAP_MAX, ALMOST_SKILL_FLOOR,
    DEFAULT_SKILL_THRESHOLD,
};
use crate::scoring::{skill_value, SkillKey, SkillSignals};

use super::catalog::Catalog;
use super::{compute_matches, meets_requirements, Match};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlmostUnlocked {
    #[serde(flatten)]
    pub opportunity: Match,
    pub prompt_score_gap: u32,
    pub missing_skills: Vec<SkillKey>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveMatchPreview {
    pub unlocked: Vec<Match>,
    pub almost_unlocked: Vec<AlmostUnlocked>,
    pub newly_unlocked: Vec<Match>,
}

/// Earlier snapshot used to compute `newly_unlocked`.
#[derive(Debug, Clone, Copy)]
pub struct PreviousSnapshot<'a> {
    pub prompt_score: u32,
    pub skills: &'a SkillSignals,
}

fn prompt_score_gap(m: &Match, prompt_score: u32) -> u32 {
    m.prompt_score_min
        .map(|min| min.saturating_sub(prompt_score))
        .unwrap_or(0)
}

/// Looser cousin of `meets_requirements` used for "almost there" cards.
pub fn is_close(m: &Match, prompt_score: u32, skills: &SkillSignals, completed_projects: u32) -> bool {
    if m.prompt_score_min.is_some() && prompt_score_gap(m, prompt_score) > ALMOST_PROMPT_SCORE_GAP_MAX {
        return false;
    }

    if let Some(min) = m.required_projects {
        if min.saturating_sub(completed_projects) > ALMOST_PROJECT_GAP_MAX {
            return false;
        }
    }

    let required = m.skill_requirements();
    let near = required
        .iter()
        .filter(|(key, _)| skill_value(skills, *key) >= ALMOST_SKILL_FLOOR)
        .count();

    near * 2 >= required.len()
}

pub fn get_live_match_preview(
    catalog: &Catalog,
    current_prompt_score: u32,
    current_skills: &SkillSignals,
    completed_projects: u32,
    completed_slugs: &[String],
    previous: Option<PreviousSnapshot<'_>>,
) -> LiveMatchPreview {
    let all = compute_matches(
        catalog,
        current_prompt_score,
        current_skills,
        completed_projects,
        completed_slugs,
    );

    let mut unlocked = Vec::new();
    let mut almost_unlocked = Vec::new();

    for m in &all {
        if meets_requirements(m, current_prompt_score, current_skills, completed_projects) {
            unlocked.push(m.clone());
        } else if is_close(m, current_prompt_score, current_skills, completed_projects) {
            let missing_skills = m
                .skill_requirements()
                .into_iter()
                .map(|(key, _)| key)
                .filter(|key| skill_value(current_skills, *key) < DEFAULT_SKILL_THRESHOLD)
                .collect();
            almost_unlocked.push(AlmostUnlocked {
                opportunity: m.clone(),
                prompt_score_gap: prompt_score_gap(m, current_prompt_score),
                missing_skills,
            });
        }
    }

    almost_unlocked.sort_by_key(|a| a.prompt_score_gap);

    let newly_unlocked = match previous {
        Some(prev) => {
            let before: HashSet<&str> = all
                .iter()
                .filter(|m| meets_requirements(m, prev.prompt_score, prev.skills, completed_projects))
                .map(|m| m.title.as_str())
                .collect();
            unlocked
                .iter()
                .filter(|m| !before.contains(m.title.as_str()))
                .cloned()
                .collect()
        }
        None => Vec::new(),
    };

    LiveMatchPreview {
        unlocked,
        almost_unlocked,
        newly_unlocked,
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::opportunity;
    use super::*;

    fn skills(entries: &[(SkillKey, u32)]) -> SkillSignals {
        entries.iter().copied().collect()
    }

    fn catalog() -> Catalog {
        let mut open = opportunity("open", "Full-time");
        open.prompt_score_min = Some(50);

        let mut near = opportunity("near", "Full-time");
        near.prompt_score_min = Some(65);
        near.skill_thresholds.insert("logic".to_string(), 60);
        near.skill_thresholds.insert("safety".to_string(), 60);

        let mut nearer = opportunity("nearer", "Freelance");
        nearer.prompt_score_min = Some(58);

        let mut far = opportunity("far", "Founder");
        far.prompt_score_min = Some(90);

        let mut projects = opportunity("projects", "Full-time");
        projects.portfolio_projects = Some(5);

        Catalog::from_records(vec![open, near, nearer, far, projects])
    }

    #[test]
    fn is_close_requires_half_of_skills_at_fifty() {
        let mut opp = opportunity("c", "Full-time");
        opp.skill_thresholds.insert("logic".to_string(), 70);
        opp.skill_thresholds.insert("safety".to_string(), 70);
        opp.skill_thresholds.insert("strategy".to_string(), 70);
        opp.skill_thresholds.insert("agents".to_string(), 70);
        let m = compute_matches(&Catalog::from_records(vec![opp]), 0, &SkillSignals::new(), 0, &[])
            .remove(0);

        let two_of_four = skills(&[(SkillKey::Logic, 50), (SkillKey::Safety, 55)]);
        assert!(is_close(&m, 0, &two_of_four, 0));

        let one_of_four = skills(&[(SkillKey::Logic, 50), (SkillKey::Safety, 49)]);
        assert!(!is_close(&m, 0, &one_of_four, 0));
    }

    #[test]
    fn preview_partitions_unlocked_and_almost() {
        let s = skills(&[(SkillKey::Logic, 55), (SkillKey::Safety, 40)]);
        let preview = get_live_match_preview(&catalog(), 56, &s, 2, &[], None);

        let unlocked: Vec<&str> = preview.unlocked.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(unlocked, vec!["open"]);

        let almost: Vec<&str> = preview
            .almost_unlocked
            .iter()
            .map(|a| a.opportunity.id.as_str())
            .collect();
        // nearer: gap 2, near: gap 9; far (gap 34) and projects (gap 3) excluded
        assert_eq!(almost, vec!["nearer", "near"]);
        assert_eq!(preview.almost_unlocked[0].prompt_score_gap, 2);
        assert_eq!(preview.almost_unlocked[1].prompt_score_gap, 9);
        assert_eq!(
            preview.almost_unlocked[1].missing_skills,
            vec![SkillKey::Logic, SkillKey::Safety]
        );

        for a in &preview.almost_unlocked {
            assert!(!unlocked.contains(&a.opportunity.id.as_str()));
        }
        assert!(preview.newly_unlocked.is_empty());
    }

    #[test]
    fn newly_unlocked_is_difference_between_snapshots() {
        let before = SkillSignals::new();
        let now = SkillSignals::new();
        let preview = get_live_match_preview(
            &catalog(),
            60,
            &now,
            0,
            &[],
            Some(PreviousSnapshot {
                prompt_score: 52,
                skills: &before,
            }),
        );

        let newly: Vec<&str> = preview.newly_unlocked.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(newly, vec!["nearer"]);
    }

    #[test]
    fn empty_catalog_yields_empty_preview() {
        let preview =
            get_live_match_preview(&Catalog::default(), 100, &SkillSignals::new(), 0, &[], None);
        assert!(preview.unlocked.is_empty());
        assert!(preview.almost_unlocked.is_empty());
        assert!(preview.newly_unlocked.is_empty());
    }
}
