//! Model extraction and parsable-output rendering.
//!
//! Walks the winning stack bottom to top, skips CHOICE/SAT frames (they are
//! sub-steps of the instant a STEP frame already represents), and reads each
//! surviving frame's asserted atoms/negated-atoms off as a propositional
//! state.

use std::fmt;
use std::rc::Rc;

use crate::frame::{Arena, FrameKind};
use crate::pool::Pool;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Literal {
    pub name: Rc<str>,
    pub positive: bool,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.positive {
            write!(f, "!")?;
        }
        write!(f, "{}", self.name)
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct State {
    pub literals: Vec<Literal>,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, lit) in self.literals.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{lit}")?;
        }
        write!(f, "}}")
    }
}

/// A finite prefix-plus-loop witness: the formula is satisfied by the
/// infinite trace `states[0], states[1], ..., states[loop_state..]ᵒᵐᵉᵍᵃ`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Model {
    pub states: Vec<State>,
    pub loop_state: usize,
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, state) in self.states.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            if i == self.loop_state {
                write!(f, "*")?;
            }
            write!(f, "{state}")?;
        }
        Ok(())
    }
}

/// Extracts the witness model from a winning stack of arena indices.
///
/// Precondition: `stack` and `loop_frame` are the fields of a
/// `SolverResult::Satisfiable` produced against `pool`/`arena`.
pub fn extract(pool: &Pool, arena: &Arena, stack: &[usize], loop_frame: usize) -> Model {
    let mut states = Vec::new();
    let mut step_indices = Vec::new();

    for &idx in stack {
        let frame = arena.get(idx);
        if !matches!(frame.kind, FrameKind::Step) {
            continue;
        }
        step_indices.push(idx);
        states.push(state_of(pool, frame.formulas.ones()));
    }

    let top_idx = *stack.last().expect("winning stack is never empty");
    let top = arena.get(top_idx);
    if top.id.get() != 0 {
        states.pop();
        step_indices.pop();
    }

    let target = arena.instant_anchor(loop_frame);
    let loop_state = step_indices
        .iter()
        .position(|&i| i == target)
        .unwrap_or(0);

    Model { states, loop_state }
}

fn state_of(pool: &Pool, asserted: impl Iterator<Item = usize>) -> State {
    let mut literals = Vec::new();
    for i in asserted {
        if pool.categories.atom.contains(i) {
            if let Some(name) = &pool.atom_names[i] {
                literals.push(Literal { name: name.clone(), positive: true });
            }
        } else if pool.categories.negation.contains(i) {
            let child = pool.lhs[i].get();
            if pool.categories.atom.contains(child) {
                if let Some(name) = &pool.atom_names[child] {
                    literals.push(Literal { name: name.clone(), positive: false });
                }
            }
        }
    }
    literals.sort_by(|a, b| a.name.cmp(&b.name).then(b.positive.cmp(&a.positive)));
    State { literals }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Engine, SolverResult};
    use crate::formula::Formula;
    use crate::pool::build;

    fn solve(f: &crate::formula::FormulaPtr) -> Model {
        let pool = build(f, false).unwrap();
        let engine = Engine::new(&pool, 64, false);
        let (result, arena) = engine.solve();
        match result {
            SolverResult::Satisfiable { stack, loop_frame } => extract(&pool, &arena, &stack, loop_frame),
            _ => panic!("expected SAT"),
        }
    }

    #[test]
    fn single_atom_has_a_one_state_model() {
        let model = solve(&Formula::atom("a"));
        assert_eq!(model.states.len(), 1);
        assert_eq!(model.loop_state, 0);
        assert_eq!(model.states[0].literals, vec![Literal { name: "a".into(), positive: true }]);
    }

    #[test]
    fn finally_defers_until_the_state_it_holds() {
        let model = solve(&Formula::finally(Formula::atom("a")));
        let holds = model
            .states
            .iter()
            .any(|s| s.literals.iter().any(|l| l.positive && &*l.name == "a"));
        assert!(holds, "no state in {model} asserts a");
    }

    #[test]
    fn display_uses_braces_and_bang_prefixed_negatives() {
        let model = Model {
            states: vec![State {
                literals: vec![
                    Literal { name: "a".into(), positive: true },
                    Literal { name: "b".into(), positive: false },
                ],
            }],
            loop_state: 0,
        };
        assert_eq!(model.to_string(), "*{a,!b}");
    }
}
