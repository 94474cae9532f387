//! A one-pass tableau satisfiability checker for Linear Temporal Logic.
//!
//! `parser::Parser::parse_formula` and `translator::translate` turn surface
//! syntax into a pure-future `Formula`; `pool::build` indexes it into the
//! subformula pool the `engine::Engine` runs its tableau search over;
//! `model::extract` reads a winning run back out as an ultimately periodic
//! witness trace.

pub mod engine;
pub mod error;
pub mod formula;
pub mod frame;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod pool;
pub mod pretty;
pub mod sat;
pub mod simplify;
pub mod translator;
pub mod id;

pub use engine::{Engine, SolverResult};
pub use error::{LtlError, LtlResult};
pub use formula::{Formula, FormulaPtr};
pub use model::{extract as extract_model, Literal, Model, State};
pub use parser::Parser;

/// Parses, translates away past operators, and decides satisfiability of a
/// single LTL formula in one call — the common case for the CLI driver and
/// for tests.
pub fn check(input: &str, max_depth: u64, use_sat_accelerator: bool) -> LtlResult<SolverResult> {
    let raw = Parser::parse_formula(input)?;
    let future_only = translator::translate(&raw);
    let pool = pool::build(&future_only, use_sat_accelerator)?;
    let engine = Engine::new(&pool, max_depth, use_sat_accelerator);
    Ok(engine.solve().0)
}

/// Like [`check`], but also returns the `Pool`/`Arena` needed to extract a
/// model when the result is satisfiable.
pub fn solve(
    input: &str,
    max_depth: u64,
    use_sat_accelerator: bool,
) -> LtlResult<(SolverResult, pool::Pool, frame::Arena)> {
    let raw = Parser::parse_formula(input)?;
    let future_only = translator::translate(&raw);
    let pool = pool::build(&future_only, use_sat_accelerator)?;
    let engine = Engine::new(&pool, max_depth, use_sat_accelerator);
    let (result, arena) = engine.solve();
    Ok((result, pool, arena))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_tautology_is_satisfiable() {
        let result = check("a | !a", 64, true).unwrap();
        assert!(matches!(result, SolverResult::Satisfiable { .. }));
    }

    #[test]
    fn a_contradiction_is_unsatisfiable() {
        let result = check("a & !a", 64, true).unwrap();
        assert!(matches!(result, SolverResult::Unsatisfiable));
    }

    #[test]
    fn solve_exposes_a_model_on_sat() {
        let (result, pool, arena) = solve("a", 64, false).unwrap();
        let SolverResult::Satisfiable { stack, loop_frame } = result else {
            panic!("expected SAT");
        };
        let model = extract_model(&pool, &arena, &stack, loop_frame);
        assert_eq!(model.states.len(), 1);
    }
}
