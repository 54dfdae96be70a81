//! Every registered contender answers every probe on fuzzed input.

use serde_json::json;
use shelf_bench::contender::BenchmarkEnvironment;
use shelf_bench::contender::ContenderKind;
use shelf_bench::fuzzer::Bounds;
use shelf_bench::fuzzer::Content;
use shelf_bench::fuzzer::Fuzzer;
use shelf_bench::fuzzer::FuzzerConfig;

const DELTA_LABELS: [&str; 4] = ["state_vector", "random_merge", "field_change", "delete_all"];

fn fuzzer(seed: u64) -> Fuzzer {
    return Fuzzer::new(FuzzerConfig {
        seed,
        value_range: Bounds::new(0, 1000),
        depth_range: Bounds::new(1, 4),
        branch_range: Bounds::new(1, 5),
    });
}

fn edge_trees() -> Vec<Content> {
    return vec![json!({}), json!(5), json!({"a": {}}), json!({"a": {"b": {"c": 1}}})];
}

// =============================================================================
// Size probes
// =============================================================================

#[test]
fn delta_probe_reports_all_labels() {
    for kind in ContenderKind::ALL {
        let env = kind.environment();
        let mut fuzzer = fuzzer(4);
        for _ in 0..10 {
            let (first, second) = fuzzer.generate_pair();
            let sizes = env.test_delta_size(first, second).unwrap();
            for label in DELTA_LABELS {
                assert!(sizes.contains_key(label), "{} missing {label}", env.name());
            }
            assert!(sizes["field_change"] > 0, "{}", env.name());
            assert!(sizes["delete_all"] > 0, "{}", env.name());
        }
    }
}

#[test]
fn delta_probe_handles_edge_trees() {
    for kind in ContenderKind::ALL {
        let env = kind.environment();
        for first in edge_trees() {
            for second in edge_trees() {
                let result = env.test_delta_size(first.clone(), second.clone());
                assert!(result.is_ok(), "{} on {first} / {second}: {result:?}", env.name());
            }
        }
    }
}

#[test]
fn deletion_probe_reports_both_labels() {
    for kind in ContenderKind::ALL {
        let env = kind.environment();
        let values = fuzzer(9).generate_content();
        let sizes = env.test_size_after_deletion(values).unwrap();
        assert!(sizes["populated"] > 0, "{}", env.name());
        assert!(sizes.contains_key("deleted"), "{}", env.name());
    }
}

#[test]
fn crdt_size_grows_with_content() {
    for kind in ContenderKind::ALL {
        let env = kind.environment();
        let small = env.test_crdt_size(json!({"a": 1})).unwrap();
        let large = env
            .test_crdt_size(json!({"a": 1, "b": {"c": 2, "d": 3}, "e": "some text"}))
            .unwrap();
        assert!(large > small, "{}: {large} <= {small}", env.name());
    }
}

// =============================================================================
// Thunk probes
// =============================================================================

#[test]
fn thunks_are_repeatable() {
    for kind in ContenderKind::ALL {
        let env = kind.environment();

        let mut additions = env.test_n_additions(50).unwrap();
        additions().unwrap();
        additions().unwrap();

        let (first, second) = fuzzer(1).generate_pair();
        let mut merge = env.test_merge(first, second).unwrap();
        merge().unwrap();
        merge().unwrap();
    }
}
