//! Property-based tests for shelf merging and delta sync.

use proptest::prelude::*;
use serde_json::Map;
use serde_json::Value as Json;
use shelf::Clock;
use shelf::DotClock;
use shelf::LamportClock;
use shelf::SecureClock;
use shelf::Shelf;

// =============================================================================
// Test helpers
// =============================================================================

/// Small trees over a tiny key and value space, so replicas collide often.
fn arbitrary_tree() -> impl Strategy<Value = Json> {
    let leaf = (0i64..4).prop_map(Json::from);
    return leaf.prop_recursive(3, 24, 4, |inner| {
        prop::collection::btree_map(prop::sample::select(vec!["a", "b", "c", "d"]), inner, 0..4)
            .prop_map(|children| {
                let map: Map<String, Json> = children
                    .into_iter()
                    .map(|(key, child)| (key.to_string(), child))
                    .collect();
                Json::Object(map)
            })
    });
}

fn sync<C: Clock>(from: &Shelf<C>, to: &mut Shelf<C>) {
    if let Some(delta) = from.delta(&to.state_vector()) {
        let decoded = Shelf::decode(&delta.encode().unwrap()).unwrap();
        to.merge(decoded);
        to.garbage_collect();
    }
}

// =============================================================================
// Merge laws
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Merge order does not matter
    #[test]
    fn lamport_merge_commutes(left in arbitrary_tree(), right in arbitrary_tree()) {
        let a = Shelf::<LamportClock>::from_json(&left, 1).unwrap();
        let b = Shelf::<LamportClock>::from_json(&right, 2).unwrap();

        let mut ab = a.clone();
        ab.merge(b.clone());
        let mut ba = b;
        ba.merge(a);

        prop_assert_eq!(ab.to_json(), ba.to_json());
    }

    /// Merging a replica into itself changes nothing
    #[test]
    fn merge_is_idempotent(tree in arbitrary_tree()) {
        let shelf = Shelf::<DotClock>::from_json(&tree, 1).unwrap();
        let mut merged = shelf.clone();
        merged.merge(shelf.clone());
        prop_assert_eq!(merged.to_json(), tree);
    }
}

// =============================================================================
// Delta sync
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Exchanging deltas both ways converges to the full merge
    #[test]
    fn dot_delta_sync_converges(left in arbitrary_tree(), right in arbitrary_tree()) {
        let mut a = Shelf::<DotClock>::from_json(&left, 1).unwrap();
        let mut b = Shelf::<DotClock>::from_json(&right, 2).unwrap();

        let mut expected = a.clone();
        expected.merge(b.clone());

        sync(&a, &mut b);
        sync(&b, &mut a);

        prop_assert_eq!(a.to_json(), b.to_json());
        prop_assert_eq!(a.to_json(), expected.to_json());
    }

    /// Same-counter writes of different values still reach the other side
    #[test]
    fn secure_delta_sync_converges(left in arbitrary_tree(), right in arbitrary_tree()) {
        let mut a = Shelf::<SecureClock>::from_json(&left, 1).unwrap();
        let mut b = Shelf::<SecureClock>::from_json(&right, 2).unwrap();

        let mut expected = a.clone();
        expected.merge(b.clone());

        sync(&a, &mut b);
        sync(&b, &mut a);

        prop_assert_eq!(a.to_json(), b.to_json());
        prop_assert_eq!(a.to_json(), expected.to_json());
    }

    /// After a sync, a single edit is all that travels
    #[test]
    fn edit_after_sync_is_sent(
        left in arbitrary_tree().prop_filter("map root", Json::is_object),
        right in arbitrary_tree().prop_filter("map root", Json::is_object),
    ) {
        let mut a = Shelf::<DotClock>::from_json(&left, 1).unwrap();
        let mut b = Shelf::<DotClock>::from_json(&right, 2).unwrap();
        sync(&a, &mut b);
        sync(&b, &mut a);

        b.set(&["edited"], &Json::from("x"), 2).unwrap();
        prop_assert!(b.delta(&a.state_vector()).is_some());
        sync(&b, &mut a);
        prop_assert_eq!(a.to_json(), b.to_json());
    }
}
