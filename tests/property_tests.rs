//! Property tests over randomly generated future-only LTL formulas.

use leviathan_ltl::engine::SolverResult;
use leviathan_ltl::formula::{Formula, FormulaPtr};
use leviathan_ltl::simplify::simplify;
use proptest::prelude::*;

fn arb_formula() -> impl Strategy<Value = FormulaPtr> {
    let leaf = prop_oneof![
        Just(Formula::atom("a")),
        Just(Formula::atom("b")),
        Just(Formula::atom("c")),
        Just(Formula::truth()),
        Just(Formula::falsity()),
    ];
    leaf.prop_recursive(4, 32, 3, |inner| {
        prop_oneof![
            inner.clone().prop_map(Formula::not),
            inner.clone().prop_map(Formula::next),
            inner.clone().prop_map(Formula::globally),
            inner.clone().prop_map(Formula::finally),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Formula::and(l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Formula::or(l, r)),
            (inner.clone(), inner).prop_map(|(l, r)| Formula::until(l, r)),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn simplify_is_idempotent(f in arb_formula()) {
        let once = simplify(&f).unwrap();
        let twice = simplify(&once).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn check_is_deterministic(f in arb_formula()) {
        let rendered = f.to_string();
        let first = leviathan_ltl::check(&rendered, 64, true).unwrap();
        let second = leviathan_ltl::check(&rendered, 64, true).unwrap();
        prop_assert_eq!(
            matches!(first, SolverResult::Satisfiable { .. }),
            matches!(second, SolverResult::Satisfiable { .. })
        );
    }

    #[test]
    fn sat_accelerator_never_flips_the_verdict(f in arb_formula()) {
        let rendered = f.to_string();
        let with = leviathan_ltl::check(&rendered, 64, true).unwrap();
        let without = leviathan_ltl::check(&rendered, 64, false).unwrap();
        prop_assert_eq!(
            matches!(with, SolverResult::Satisfiable { .. }),
            matches!(without, SolverResult::Satisfiable { .. })
        );
    }
}
