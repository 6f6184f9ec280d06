//! Property-based tests for the scoring engine using proptest

use proptest::prelude::*;
use rag_eval::analysis::standard_definitions;
use rag_eval::prelude::*;

// =========================================================================
// Example generation strategies
// =========================================================================

/// Words drawn from a small vocabulary so answers overlap their sources
fn arb_text(max_words: usize) -> impl Strategy<Value = String> {
    let word = prop_oneof![
        Just("the"),
        Just("sky"),
        Just("is"),
        Just("blue."),
        Just("water"),
        Just("boils"),
        Just("[1]"),
        Just("why?"),
        Just("quickly"),
        Just("retrieval"),
    ];
    prop::collection::vec(word, 0..max_words).prop_map(|words| words.join(" "))
}

fn arb_example() -> impl Strategy<Value = Example> {
    (
        arb_text(12),
        arb_text(20),
        prop::collection::vec(arb_text(25), 0..4),
        arb_text(80),
    )
        .prop_map(|(question, history, fragments, answer)| {
            Example::new(question, fragments, answer).with_history(history)
        })
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
}

// =========================================================================
// Heuristic bounds
// =========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn heuristics_stay_in_range(example in arb_example()) {
        for def in ScorerRegistry::standard().unwrap().iter() {
            let raw = (def.heuristic)(&example);
            prop_assert!(raw <= def.max_raw, "{} scored {} > {}", def.name, raw, def.max_raw);
        }
    }

    #[test]
    fn heuristics_are_deterministic(example in arb_example()) {
        for def in ScorerRegistry::standard().unwrap().iter() {
            prop_assert_eq!((def.heuristic)(&example), (def.heuristic)(&example.clone()));
        }
    }

    #[test]
    fn composite_stays_within_weight_sum(example in arb_example()) {
        let registry = ScorerRegistry::standard().unwrap();
        let judge = Judge::new(&registry, ScoringMode::Heuristic, None).unwrap();
        let result = runtime().block_on(judge.evaluate(&example)).unwrap();

        prop_assert!(result.composite() >= 0.0);
        prop_assert!(result.composite() <= registry.weight_sum() + 1e-12);
    }
}

// =========================================================================
// Composite aggregation
// =========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn composite_ignores_registry_order(
        example in arb_example(),
        shuffled in Just(standard_definitions()).prop_shuffle(),
    ) {
        let standard = ScorerRegistry::standard().unwrap();
        let permuted = ScorerRegistry::new(shuffled).unwrap();

        let rt = runtime();
        let a = rt
            .block_on(Judge::new(&standard, ScoringMode::Heuristic, None).unwrap().evaluate(&example))
            .unwrap();
        let b = rt
            .block_on(Judge::new(&permuted, ScoringMode::Heuristic, None).unwrap().evaluate(&example))
            .unwrap();

        prop_assert!((a.composite() - b.composite()).abs() < 1e-12);
        for name in standard.names() {
            prop_assert_eq!(a.score(name), b.score(name));
        }
        let order: Vec<&str> = b.scores().keys().map(String::as_str).collect();
        prop_assert_eq!(order, permuted.names());
    }
}

// =========================================================================
// Batch ordering
// =========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn batch_preserves_input_order(examples in prop::collection::vec(arb_example(), 0..12)) {
        let registry = ScorerRegistry::standard().unwrap();
        let judge = Judge::new(&registry, ScoringMode::Heuristic, None).unwrap();
        let runner = BatchRunner::new(judge, FailurePolicy::Abort);

        let outcomes = runtime().block_on(runner.run(&examples)).unwrap();

        prop_assert_eq!(outcomes.len(), examples.len());
        for (outcome, example) in outcomes.iter().zip(&examples) {
            prop_assert_eq!(outcome.example(), example);
        }

        let summary = Summary::from_outcomes(&registry, &outcomes);
        prop_assert_eq!(summary.total, examples.len());
        prop_assert!(summary.lowest.len() <= rag_eval::analysis::NOTABLE_COUNT);
        prop_assert!(summary
            .lowest
            .windows(2)
            .all(|w| w[0].composite <= w[1].composite));
    }
}
