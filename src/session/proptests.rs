//! Property-based tests for thread-id derivation

use super::*;
use proptest::prelude::*;

fn arb_seed() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,40}"
}

proptest! {
    #[test]
    fn prop_resolution_is_deterministic(seed in arb_seed(), other in ".{0,20}") {
        let a = resolve_thread_id(Some(&seed), &other).unwrap();
        let b = resolve_thread_id(Some(&seed), &other).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_stable_id_ignores_session_seed(
        stable in arb_seed(),
        seed_a in arb_seed(),
        seed_b in arb_seed(),
    ) {
        prop_assert_eq!(
            resolve_thread_id(Some(&stable), &seed_a).unwrap(),
            resolve_thread_id(Some(&stable), &seed_b).unwrap()
        );
    }

    #[test]
    fn prop_distinct_seeds_give_distinct_threads(a in arb_seed(), b in arb_seed()) {
        prop_assume!(a != b);
        prop_assert_ne!(
            resolve_thread_id(None, &a).unwrap(),
            resolve_thread_id(None, &b).unwrap()
        );
    }

    #[test]
    fn prop_stable_and_seed_paths_agree(seed in arb_seed()) {
        // The seed's origin does not matter, only its value
        prop_assert_eq!(
            resolve_thread_id(Some(&seed), "").unwrap(),
            resolve_thread_id(None, &seed).unwrap()
        );
    }

    #[test]
    fn prop_context_thread_is_stable(seed in arb_seed(), calls in 1usize..8) {
        let mut ctx = SessionContext::with_seed(seed.clone());
        let first = ctx.thread_id().unwrap();
        for _ in 0..calls {
            prop_assert_eq!(ctx.thread_id().unwrap(), first);
        }
        prop_assert_eq!(first, resolve_thread_id(None, &seed).unwrap());
    }
}
