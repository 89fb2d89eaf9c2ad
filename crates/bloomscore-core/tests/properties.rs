//! Property tests over synthetic course designs and papers.

use std::collections::BTreeMap;

use proptest::prelude::*;

use bloomscore_core::model::{BloomLevel, CourseDesign, CourseOutcome, Module, Question};
use bloomscore_core::policy::{ScoreComponents, ScorePolicy, WeightedScorePolicy};
use bloomscore_core::scoring::{bloom_distribution, module_distribution, score_questions};
use bloomscore_core::BloomLevelMap;

fn arb_level() -> impl Strategy<Value = BloomLevel> {
    prop::sample::select(BloomLevel::CANONICAL.to_vec())
}

fn arb_target() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => arb_level().prop_map(|l| l.name().to_string()),
        1 => Just("synthesis".to_string()),
        1 => Just(String::new()),
    ]
}

fn arb_design() -> impl Strategy<Value = CourseDesign> {
    (
        prop::collection::vec((0.0f64..100.0, arb_target()), 1..8),
        prop::collection::vec(0.0f64..40.0, 1..6),
    )
        .prop_map(|(cos, hours)| CourseDesign {
            outcomes: cos
                .into_iter()
                .enumerate()
                .map(|(i, (weight, target))| CourseOutcome {
                    key: format!("CO{}", i + 1),
                    number: i as u32 + 1,
                    weight,
                    blooms: if target.is_empty() { vec![] } else { vec![target] },
                })
                .collect(),
            modules: hours
                .into_iter()
                .enumerate()
                .map(|(i, hours)| Module {
                    key: format!("M{}", i + 1),
                    hours,
                })
                .collect(),
            duplicate_keys: vec![],
        })
}

fn arb_questions() -> impl Strategy<Value = Vec<Question>> {
    prop::collection::vec(
        (0.0f64..20.0, 1u32..10, 1u32..8, prop::option::of(arb_level())),
        0..30,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (marks, co, module, level))| Question {
                text: format!("question {i}"),
                marks,
                co: format!("CO{co}"),
                module: format!("M{module}"),
                question_type: String::new(),
                verbs: level.iter().map(|l| l.example_verb().to_string()).collect(),
                highest_verb: level.map(|l| l.example_verb().to_string()),
                level,
                remark: None,
                extra: BTreeMap::new(),
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn level_map_is_a_bijection(targets in prop::collection::vec(arb_target(), 0..10)) {
        let map = BloomLevelMap::from_targets(targets.iter().map(String::as_str));
        let mut ordinals: Vec<u8> = BloomLevel::CANONICAL.iter().map(|l| map.ordinal(*l)).collect();
        ordinals.sort_unstable();
        prop_assert_eq!(ordinals, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn declared_targets_take_the_lowest_ordinals(
        targets in prop::collection::vec(arb_level(), 1..10)
    ) {
        let names: Vec<&str> = targets.iter().map(|l| l.name()).collect();
        let map = BloomLevelMap::from_targets(names.iter().copied());
        let mut distinct = targets.clone();
        distinct.sort();
        distinct.dedup();
        for level in &distinct {
            prop_assert!(map.ordinal(*level) as usize <= distinct.len());
        }
    }

    #[test]
    fn bloom_weights_sum_to_100(design in arb_design(), questions in arb_questions()) {
        let map = BloomLevelMap::for_design(&design);
        let blooms = bloom_distribution(&questions, &design, &map);
        let targeted: f64 = design
            .outcomes
            .iter()
            .filter(|co| co.target().is_some())
            .map(|co| co.weight)
            .sum();
        let sum: f64 = blooms.values().map(|b| b.weights).sum();
        if targeted > 0.0 {
            prop_assert!((sum - 100.0).abs() < 1e-6, "sum = {}", sum);
        } else {
            prop_assert_eq!(sum, 0.0);
        }
        prop_assert_eq!(blooms.len(), 6);
    }

    #[test]
    fn module_expected_sums_to_100(design in arb_design(), questions in arb_questions()) {
        let modules = module_distribution(&questions, &design);
        let sum: f64 = modules.iter().map(|m| m.expected).sum();
        if design.total_hours() > 0.0 {
            prop_assert!((sum - 100.0).abs() < 1e-6, "sum = {}", sum);
        } else {
            prop_assert_eq!(sum, 0.0);
        }
    }

    #[test]
    fn q_scores_are_one_two_or_three(design in arb_design(), questions in arb_questions()) {
        for q in score_questions(questions, &design) {
            if let Some(score) = q.q_score() {
                prop_assert!((1..=3).contains(&score));
            } else {
                let target = design.outcome(&q.co).and_then(|co| co.target());
                prop_assert!(q.is_unclassified() || target.is_none());
            }
        }
    }

    #[test]
    fn final_score_is_monotonic_in_match_ratio(
        a in 0.0f64..=1.0,
        b in 0.0f64..=1.0,
        variance in 0.0f64..=100.0,
        alignment_weight in 0.0f64..5.0,
        balance_weight in 0.0f64..5.0,
    ) {
        let policy = WeightedScorePolicy::new(alignment_weight, balance_weight);
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let score = |match_ratio| policy.final_score(&ScoreComponents {
            match_ratio,
            aggregate_variance: variance,
        });
        prop_assert!(score(low) <= score(high) + 1e-9);
        prop_assert!((0.0..=100.0).contains(&score(high)));
    }
}
