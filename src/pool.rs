//! Subformula pool construction: closure enumeration, the canonical total
//! order, category bitsets, child tables, and the eventuality registry.

use std::collections::HashSet;
use std::rc::Rc;

use fixedbitset::FixedBitSet;

use crate::error::LtlResult;
use crate::formula::{Formula, FormulaPtr};
use crate::id::{EventualityId, Position};
use crate::simplify::simplify;

#[derive(Default)]
pub struct Categories {
    pub atom: FixedBitSet,
    pub negation: FixedBitSet,
    pub tomorrow: FixedBitSet,
    pub always: FixedBitSet,
    pub eventually: FixedBitSet,
    pub conjunction: FixedBitSet,
    pub disjunction: FixedBitSet,
    pub until: FixedBitSet,
    pub not_until: FixedBitSet,
}

impl Categories {
    fn with_len(n: usize) -> Self {
        Categories {
            atom: FixedBitSet::with_capacity(n),
            negation: FixedBitSet::with_capacity(n),
            tomorrow: FixedBitSet::with_capacity(n),
            always: FixedBitSet::with_capacity(n),
            eventually: FixedBitSet::with_capacity(n),
            conjunction: FixedBitSet::with_capacity(n),
            disjunction: FixedBitSet::with_capacity(n),
            until: FixedBitSet::with_capacity(n),
            not_until: FixedBitSet::with_capacity(n),
        }
    }
}

/// A single flattened clause of the SAT accelerator's per-position table,
/// expressed as DIMACS-style signed literals: `position + 1` for a positive
/// occurrence, negated for a negative one.
pub type Clause = Vec<i32>;

pub struct Pool {
    pub formulas: Vec<FormulaPtr>,
    pub start: Position,
    pub lhs: Vec<Position>,
    pub rhs: Vec<Position>,
    pub categories: Categories,
    pub atom_names: Vec<Option<Rc<str>>>,
    pub fw_eventualities: Vec<EventualityId>,
    pub bw_eventualities: Vec<Position>,
    /// For an Eventually/Until position, the id of the eventuality it
    /// requests (sentinel otherwise). Drives the NotRequested→NotYetSatisfied
    /// transition in the engine's eventuality bookkeeping.
    pub trigger: Vec<EventualityId>,
    /// `Some` only when the formula reduces to a single constant, bypassing
    /// the tableau entirely (mirrors the reference's early-out in `_initialize`).
    pub trivial: Option<bool>,
    pub clauses: Vec<Clause>,
}

impl Pool {
    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    pub fn eventuality_count(&self) -> usize {
        self.bw_eventualities.len()
    }
}

pub fn build(raw: &FormulaPtr, build_clauses: bool) -> LtlResult<Pool> {
    let simplified = simplify(raw)?;

    if matches!(*simplified, Formula::True) {
        return Ok(Pool {
            formulas: vec![simplified],
            start: Position::new(0),
            lhs: vec![],
            rhs: vec![],
            categories: Categories::with_len(0),
            atom_names: vec![],
            fw_eventualities: vec![],
            bw_eventualities: vec![],
            trigger: vec![],
            trivial: Some(true),
            clauses: vec![],
        });
    }
    if matches!(*simplified, Formula::False) {
        return Ok(Pool {
            formulas: vec![simplified],
            start: Position::new(0),
            lhs: vec![],
            rhs: vec![],
            categories: Categories::with_len(0),
            atom_names: vec![],
            fw_eventualities: vec![],
            bw_eventualities: vec![],
            trigger: vec![],
            trivial: Some(false),
            clauses: vec![],
        });
    }

    let mut closure = Vec::new();
    let mut seen = HashSet::new();
    collect_closure(&simplified, &mut closure, &mut seen);

    closure.sort_by(|a, b| order(a, b));
    closure.dedup();

    let n = closure.len();
    let position_of = |target: &FormulaPtr| -> Position {
        let idx = closure.partition_point(|f| order(f, target) == std::cmp::Ordering::Less);
        debug_assert!(idx < closure.len() && closure[idx] == *target, "subformula {target} missing from pool");
        Position::new(idx)
    };

    let start = position_of(&simplified);

    let mut categories = Categories::with_len(n);
    let mut lhs = vec![Position::max(); n];
    let mut rhs = vec![Position::max(); n];
    let mut atom_names: Vec<Option<Rc<str>>> = vec![None; n];

    for (i, f) in closure.iter().enumerate() {
        match &**f {
            Formula::Atom(name) => {
                categories.atom.set(i, true);
                atom_names[i] = Some(name.clone());
            }
            Formula::Not(inner) => match &**inner {
                Formula::Until(l, r) => {
                    categories.not_until.set(i, true);
                    let neg_l = simplify(&Formula::not(l.clone()))?;
                    let neg_r = simplify(&Formula::not(r.clone()))?;
                    lhs[i] = position_of(&neg_l);
                    rhs[i] = position_of(&neg_r);
                }
                _ => {
                    categories.negation.set(i, true);
                    lhs[i] = position_of(inner);
                }
            },
            Formula::Next(inner) => {
                categories.tomorrow.set(i, true);
                lhs[i] = position_of(inner);
            }
            Formula::Globally(inner) => {
                categories.always.set(i, true);
                lhs[i] = position_of(inner);
            }
            Formula::Finally(inner) => {
                categories.eventually.set(i, true);
                lhs[i] = position_of(inner);
            }
            Formula::And(l, r) => {
                categories.conjunction.set(i, true);
                lhs[i] = position_of(l);
                rhs[i] = position_of(r);
            }
            Formula::Or(l, r) => {
                categories.disjunction.set(i, true);
                lhs[i] = position_of(l);
                rhs[i] = position_of(r);
            }
            Formula::Until(l, r) => {
                categories.until.set(i, true);
                lhs[i] = position_of(l);
                rhs[i] = position_of(r);
            }
            Formula::True | Formula::False => {}
            other => unreachable!("non-NNF formula reached pool indexing: {other:?}"),
        }
    }

    let (fw_eventualities, bw_eventualities, trigger) =
        build_eventuality_registry(&closure, &categories, &lhs, &rhs, &position_of);

    let clauses = if build_clauses {
        crate::sat::build_clause_table(&closure, &categories, &lhs, &rhs)
    } else {
        Vec::new()
    };

    Ok(Pool {
        formulas: closure,
        start,
        lhs,
        rhs,
        categories,
        atom_names,
        fw_eventualities,
        bw_eventualities,
        trigger,
        trivial: None,
        clauses,
    })
}

/// Only `Eventually`/`Until` register an eventuality obligation. `NotUntil`
/// is the dual of `Until` (a `Release`-like safety construct): the branch
/// that defers forever is a legitimate model, not a broken promise, so it
/// carries no fairness constraint — standard in one-pass LTL tableaux.
fn build_eventuality_registry(
    closure: &[FormulaPtr],
    categories: &Categories,
    lhs: &[Position],
    rhs: &[Position],
    position_of: &impl Fn(&FormulaPtr) -> Position,
) -> (Vec<EventualityId>, Vec<Position>, Vec<EventualityId>) {
    let n = closure.len();
    let mut promised = Vec::new();
    for i in 0..n {
        if categories.eventually.contains(i) {
            promised.push(closure[lhs[i].get()].clone());
        } else if categories.until.contains(i) {
            promised.push(closure[rhs[i].get()].clone());
        }
    }
    promised.sort_by(order);
    promised.dedup();

    let mut fw = vec![EventualityId::max(); n];
    let mut bw = vec![Position::max(); promised.len()];
    for (k, f) in promised.iter().enumerate() {
        let pos = position_of(f);
        fw[pos.get()] = EventualityId::new(k);
        bw[k] = pos;
    }

    let mut trigger = vec![EventualityId::max(); n];
    for i in 0..n {
        if categories.eventually.contains(i) {
            trigger[i] = fw[lhs[i].get()];
        } else if categories.until.contains(i) {
            trigger[i] = fw[rhs[i].get()];
        }
    }

    (fw, bw, trigger)
}

/// Enumerates the syntactic closure plus the "tomorrow obligation" and
/// negation-dual companions the tableau needs.
fn collect_closure(f: &FormulaPtr, out: &mut Vec<FormulaPtr>, seen: &mut HashSet<FormulaPtr>) {
    if seen.contains(f) {
        return;
    }
    seen.insert(f.clone());
    out.push(f.clone());

    match &**f {
        Formula::True | Formula::False => {}
        Formula::Atom(name) => {
            let negated = Formula::not(Formula::atom(name.clone()));
            collect_closure(&negated, out, seen);
        }
        Formula::Not(inner) => match &**inner {
            Formula::Until(l, r) => {
                let tomorrow = Formula::next(f.clone());
                collect_closure(&tomorrow, out, seen);
                collect_closure(l, out, seen);
                collect_closure(r, out, seen);
                let neg_l = simplify(&Formula::not(l.clone())).expect("already-NNF children stay in the LTL fragment");
                let neg_r = simplify(&Formula::not(r.clone())).expect("already-NNF children stay in the LTL fragment");
                collect_closure(&neg_l, out, seen);
                collect_closure(&neg_r, out, seen);
            }
            _ => collect_closure(inner, out, seen),
        },
        Formula::Next(inner) => collect_closure(inner, out, seen),
        Formula::Globally(inner) => {
            let tomorrow = Formula::next(f.clone());
            collect_closure(&tomorrow, out, seen);
            collect_closure(inner, out, seen);
        }
        Formula::Finally(inner) => {
            let tomorrow = Formula::next(f.clone());
            collect_closure(&tomorrow, out, seen);
            collect_closure(inner, out, seen);
        }
        Formula::And(l, r) | Formula::Or(l, r) => {
            collect_closure(l, out, seen);
            collect_closure(r, out, seen);
        }
        Formula::Until(l, r) => {
            let tomorrow = Formula::next(f.clone());
            collect_closure(&tomorrow, out, seen);
            collect_closure(l, out, seen);
            collect_closure(r, out, seen);
        }
        other => unreachable!("non-NNF formula reached the subformula generator: {other:?}"),
    }
}

/// The canonical total order over subformulas used to lay out the pool.
pub fn order(a: &FormulaPtr, b: &FormulaPtr) -> std::cmp::Ordering {
    if less(a, b) {
        std::cmp::Ordering::Less
    } else if less(b, a) {
        std::cmp::Ordering::Greater
    } else {
        std::cmp::Ordering::Equal
    }
}

fn less(a: &FormulaPtr, b: &FormulaPtr) -> bool {
    use Formula::*;

    if let (Atom(na), Atom(nb)) = (&**a, &**b) {
        return na.as_ref() < nb.as_ref();
    }
    if let (Not(ia), Not(ib)) = (&**a, &**b) {
        return less(ia, ib);
    }
    if let Not(ia) = &**a {
        if ia == b {
            return false;
        }
        return less(ia, b);
    }
    if let Not(ib) = &**b {
        if ib == a {
            return true;
        }
        return less(a, ib);
    }
    if let (Next(ia), Next(ib)) = (&**a, &**b) {
        return less(ia, ib);
    }
    if let Next(ia) = &**a {
        if ia == b {
            return false;
        }
        return less(ia, b);
    }
    if let Next(ib) = &**b {
        if ib == a {
            return true;
        }
        return less(a, ib);
    }
    if let (Globally(ia), Globally(ib)) = (&**a, &**b) {
        return less(ia, ib);
    }
    if let (Finally(ia), Finally(ib)) = (&**a, &**b) {
        return less(ia, ib);
    }
    if let (And(la, ra), And(lb, rb)) = (&**a, &**b) {
        return if la != lb { less(la, lb) } else { less(ra, rb) };
    }
    if let (Or(la, ra), Or(lb, rb)) = (&**a, &**b) {
        return if la != lb { less(la, lb) } else { less(ra, rb) };
    }
    if let (Until(la, ra), Until(lb, rb)) = (&**a, &**b) {
        return if la != lb { less(la, lb) } else { less(ra, rb) };
    }

    rank(a) < rank(b)
}

fn rank(f: &Formula) -> u8 {
    match f {
        Formula::Atom(_) => 0,
        Formula::Not(_) => 1,
        Formula::Next(_) => 2,
        Formula::Globally(_) => 3,
        Formula::Finally(_) => 4,
        Formula::And(_, _) => 5,
        Formula::Or(_, _) => 6,
        Formula::Until(_, _) => 7,
        Formula::True => 8,
        Formula::False => 9,
        _ => unreachable!("non-NNF formula reached the pool comparator"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atom_and_its_negation_are_adjacent() {
        let f = Formula::atom("p");
        let pool = build(&f, false).unwrap();
        assert_eq!(pool.len(), 2);
        assert!(pool.categories.atom.contains(0));
        assert!(pool.categories.negation.contains(1));
        assert_eq!(pool.lhs[1], Position::new(0));
    }

    #[test]
    fn globally_has_adjacent_tomorrow_companion() {
        let f = Formula::globally(Formula::atom("p"));
        let pool = build(&f, false).unwrap();
        let g_pos = pool.categories.always.ones().next().unwrap();
        assert!(pool.categories.tomorrow.contains(g_pos + 1));
        assert_eq!(pool.lhs[g_pos + 1], Position::new(g_pos));
    }

    #[test]
    fn until_registers_its_right_child_as_an_eventuality() {
        let f = Formula::until(Formula::atom("p"), Formula::atom("q"));
        let pool = build(&f, false).unwrap();
        let u_pos = pool.categories.until.ones().next().unwrap();
        let rhs_pos = pool.rhs[u_pos];
        assert!(!pool.fw_eventualities[rhs_pos.get()].is_sentinel());
    }
}
