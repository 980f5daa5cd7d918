use proptest::prelude::*;

use trainingx_backend::matching::catalog::Catalog;
use trainingx_backend::matching::live::get_live_match_preview;
use trainingx_backend::matching::{compute_matches, find_skill_gaps, meets_requirements};
use trainingx_backend::scoring::{
    clamp_dimension, compute_prompt_score, compute_skill_signals, Rubric, SkillKey, SkillSignals,
};

fn any_dimension() -> impl Strategy<Value = f64> {
    prop_oneof![
        -50.0_f64..75.0,
        Just(f64::NAN),
        Just(f64::INFINITY),
        Just(f64::NEG_INFINITY),
    ]
}

fn any_rubric() -> impl Strategy<Value = Rubric> {
    (any_dimension(), any_dimension(), any_dimension(), any_dimension())
        .prop_map(|(a, b, c, d)| Rubric::new(a, b, c, d))
}

fn any_skills() -> impl Strategy<Value = SkillSignals> {
    proptest::collection::vec(0_u32..=100, SkillKey::ALL.len()).prop_map(|values| {
        SkillKey::ALL.iter().copied().zip(values).collect()
    })
}

proptest! {
    #[test]
    fn pt_clamp_stays_in_range(x in any_dimension()) {
        let clamped = clamp_dimension(x);
        prop_assert!((0.0..=25.0).contains(&clamped));
    }

    #[test]
    fn pt_prompt_score_is_bounded(rubric in any_rubric()) {
        prop_assert!(compute_prompt_score(&rubric) <= 100);
    }

    #[test]
    fn pt_skill_signals_are_complete_bounded_and_deterministic(rubric in any_rubric()) {
        let first = compute_skill_signals(&rubric);
        let second = compute_skill_signals(&rubric);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.len(), SkillKey::ALL.len());
        prop_assert!(first.values().all(|v| *v <= 100));
    }

    #[test]
    fn pt_unlocked_means_no_skill_gaps(
        prompt_score in 0_u32..=100,
        skills in any_skills(),
        projects in 0_u32..6,
    ) {
        let catalog = Catalog::bundled().unwrap();
        for m in compute_matches(&catalog, prompt_score, &skills, projects, &[]) {
            if meets_requirements(&m, prompt_score, &skills, projects) {
                prop_assert!(find_skill_gaps(&skills, &m).is_empty());
            }
        }
    }

    #[test]
    fn pt_live_preview_partitions_unlocked_and_almost(
        prompt_score in 0_u32..=100,
        skills in any_skills(),
        projects in 0_u32..6,
    ) {
        let catalog = Catalog::bundled().unwrap();
        let preview = get_live_match_preview(&catalog, prompt_score, &skills, projects, &[], None);
        for almost in &preview.almost_unlocked {
            prop_assert!(preview.unlocked.iter().all(|m| m.id != almost.opportunity.id));
        }
        prop_assert!(preview.newly_unlocked.is_empty());
    }
}

#[test]
fn more_skill_never_locks_an_opportunity() {
    let catalog = Catalog::bundled().unwrap();
    let low: SkillSignals = SkillKey::ALL.iter().map(|k| (*k, 60)).collect();
    let high: SkillSignals = SkillKey::ALL.iter().map(|k| (*k, 100)).collect();

    for m in compute_matches(&catalog, 100, &low, 5, &[]) {
        if meets_requirements(&m, 100, &low, 5) {
            assert!(meets_requirements(&m, 100, &high, 5), "{} relocked", m.id);
        }
    }
}
