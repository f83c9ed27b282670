//! Property tests for deployment list reordering.

use proptest::prelude::*;

use otactl::{Deployment, DeploymentList};

fn checksums() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::hash_set("[0-9a-f]{8}", 0..6).prop_map(|set| set.into_iter().collect())
}

fn list(checksums: &[String]) -> DeploymentList {
    checksums.iter().map(|c| Deployment::new(c.as_str())).collect()
}

fn revisions(list: &DeploymentList) -> Vec<String> {
    list.iter().map(|d| d.checksum().to_string()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: rollback moves position 1 to the front and keeps the rest in order.
    #[test]
    fn property_rollback_promotes_second_entry(revs in checksums()) {
        let before = list(&revs);
        match before.rolled_back() {
            None => prop_assert!(revs.len() < 2),
            Some(after) => {
                prop_assert!(revs.len() >= 2);
                let after = revisions(&after);
                prop_assert_eq!(after.len(), revs.len());
                prop_assert_eq!(&after[0], &revs[1]);

                let rest: Vec<&String> = revs.iter().enumerate()
                    .filter(|(i, _)| *i != 1)
                    .map(|(_, r)| r)
                    .collect();
                let after_rest: Vec<&String> = after[1..].iter().collect();
                prop_assert_eq!(after_rest, rest);
            }
        }
    }

    /// PROPERTY: with two deployments, rolling back twice is the identity.
    #[test]
    fn property_double_rollback_of_pair_is_identity(a in "[0-9a-f]{8}", b in "[0-9a-f]{8}") {
        prop_assume!(a != b);
        let pair = list(&[a, b]);
        let twice = pair.rolled_back().and_then(|l| l.rolled_back());
        prop_assert_eq!(twice, Some(pair));
    }

    /// PROPERTY: replaying the promotions from the current order reaches any
    /// permutation of it, and a rollback needs exactly one.
    #[test]
    fn property_promotions_reach_target(revs in checksums(), seed in any::<u64>()) {
        let before = list(&revs);
        let mut shuffled = revs.clone();
        let len = shuffled.len();
        for i in (1..len).rev() {
            let j = (seed.rotate_left(i as u32) % (i as u64 + 1)) as usize;
            shuffled.swap(i, j);
        }
        let target = list(&shuffled);

        let steps = before.promotions_to(&target).unwrap();
        prop_assert!(steps.len() <= len);
        let mut working = revs.clone();
        for index in steps {
            let moved = working.remove(index);
            working.insert(0, moved);
        }
        prop_assert_eq!(working, shuffled);

        if let Some(rolled) = before.rolled_back() {
            prop_assert_eq!(before.promotions_to(&rolled), Some(vec![1]));
        }
    }
}
