//! Optional SAT accelerator.
//!
//! Builds a propositional (Tseitin) skeleton of the subformula pool — each
//! compound position is defined in terms of its children's boolean
//! variables, with temporal operators' "tomorrow" companion treated as an
//! opaque free variable — and solves it with a two-watched-literal DPLL
//! core. 3-SAT-specific implication-graph machinery
//! (`extract_implication_candidates`/`test_implication`/pair branching) has
//! no propositional-skeleton counterpart here and is not carried over; see
//! DESIGN.md.
//!
//! A returned model is a candidate truth assignment over pool positions,
//! consistent with the formula's Boolean structure but ignorant of its
//! temporal semantics; the tableau engine installs it as a child frame and
//! lets the ordinary rules confirm or refute it.

use fixedbitset::FixedBitSet;

use crate::formula::FormulaPtr;
use crate::id::Position;
use crate::pool::{Categories, Clause};

type Literal = i32;
type Var = usize;

fn lit_var(lit: Literal) -> Var {
    lit.unsigned_abs() as usize
}

fn lit_idx(lit: Literal) -> usize {
    (lit_var(lit) * 2) + (lit < 0) as usize
}

pub fn build_clause_table(
    formulas: &[FormulaPtr],
    categories: &Categories,
    lhs: &[Position],
    rhs: &[Position],
) -> Vec<Clause> {
    let n = formulas.len();
    let var = |p: Position| (p.get() as i32) + 1;
    let mut clauses = Vec::new();

    for i in 0..n {
        let iv = (i as i32) + 1;
        if categories.negation.contains(i) {
            let l = var(lhs[i]);
            clauses.push(vec![-iv, -l]);
            clauses.push(vec![iv, l]);
        } else if categories.always.contains(i) {
            let l = var(lhs[i]);
            let nx = iv + 1;
            clauses.push(vec![-iv, l]);
            clauses.push(vec![-iv, nx]);
            clauses.push(vec![iv, -l, -nx]);
        } else if categories.eventually.contains(i) {
            let l = var(lhs[i]);
            let nx = iv + 1;
            clauses.push(vec![-iv, l, nx]);
            clauses.push(vec![iv, -l]);
            clauses.push(vec![iv, -nx]);
        } else if categories.until.contains(i) {
            let l = var(lhs[i]);
            let r = var(rhs[i]);
            let nx = iv + 1;
            clauses.push(vec![-iv, r, l]);
            clauses.push(vec![-iv, r, nx]);
            clauses.push(vec![iv, -r]);
            clauses.push(vec![iv, -l, -nx]);
        } else if categories.not_until.contains(i) {
            let l = var(lhs[i]);
            let r = var(rhs[i]);
            let nx = iv + 1;
            clauses.push(vec![-iv, r]);
            clauses.push(vec![-iv, l, nx]);
            clauses.push(vec![iv, -r, -l]);
            clauses.push(vec![iv, -r, -nx]);
        } else if categories.conjunction.contains(i) {
            let l = var(lhs[i]);
            let r = var(rhs[i]);
            clauses.push(vec![-iv, l]);
            clauses.push(vec![-iv, r]);
            clauses.push(vec![iv, -l, -r]);
        } else if categories.disjunction.contains(i) {
            let l = var(lhs[i]);
            let r = var(rhs[i]);
            clauses.push(vec![-iv, l, r]);
            clauses.push(vec![iv, -l]);
            clauses.push(vec![iv, -r]);
        }
        // Atom and Tomorrow positions are opaque free variables: no defining
        // clause relates them to anything else at this time step.
    }
    clauses
}

struct WorkingClause {
    literals: Vec<Literal>,
    watched: [usize; 2],
}

impl WorkingClause {
    fn find_replacement(&self, assignments: &[Option<bool>]) -> Option<usize> {
        self.literals.iter().enumerate().position(|(idx, &lit)| {
            idx != self.watched[0] && idx != self.watched[1] && value_of(assignments, lit) != Some(false)
        })
    }
}

fn value_of(assignments: &[Option<bool>], lit: Literal) -> Option<bool> {
    assignments[lit_var(lit)].map(|v| v == (lit > 0))
}

fn assign(assignments: &mut [Option<bool>], trail: &mut Vec<Var>, lit: Literal) -> bool {
    let var = lit_var(lit);
    match assignments[var] {
        None => {
            assignments[var] = Some(lit > 0);
            trail.push(var);
            true
        }
        Some(p) => p == (lit > 0),
    }
}

/// A single attempted-decision DPLL core: one free boolean per unassigned
/// variable, unit propagation over a two-watched-literal scheme, chronological
/// backtracking. Used to enumerate successive models of a pool's propositional
/// skeleton, under a fresh set of unit assumptions each time.
pub struct Instance {
    base_clauses: Vec<Clause>,
    num_vars: usize,
}

impl Instance {
    pub fn new(base_clauses: Vec<Clause>, num_vars: usize) -> Self {
        Instance { base_clauses, num_vars }
    }

    /// Solves the skeleton under `assumptions` (unit literals forced true),
    /// plus `blocking` clauses ruling out previously returned models.
    /// Returns a full assignment over `1..=num_vars` on success.
    pub fn solve(&self, assumptions: &[Literal], blocking: &[Clause]) -> Option<Vec<Option<bool>>> {
        let mut clauses: Vec<WorkingClause> = self
            .base_clauses
            .iter()
            .chain(blocking.iter())
            .map(|lits| {
                let len = lits.len();
                WorkingClause {
                    literals: lits.clone(),
                    watched: [0, 1.min(len.saturating_sub(1))],
                }
            })
            .collect();
        for &a in assumptions {
            clauses.push(WorkingClause { literals: vec![a], watched: [0, 0] });
        }

        let mut assignments: Vec<Option<bool>> = vec![None; self.num_vars + 1];
        let mut watch_lists: Vec<Vec<usize>> = vec![Vec::new(); (self.num_vars + 1) * 2];
        for (id, c) in clauses.iter().enumerate() {
            if let Some(&l0) = c.literals.get(c.watched[0]) {
                watch_lists[lit_idx(l0)].push(id);
            }
            if c.literals.len() > 1 {
                let l1 = c.literals[c.watched[1]];
                watch_lists[lit_idx(l1)].push(id);
            }
        }

        if clauses.iter().any(|c| c.literals.is_empty()) {
            return None;
        }

        let mut trail: Vec<Var> = Vec::new();
        let mut trail_lim: Vec<usize> = Vec::new();

        let units: Vec<Literal> = clauses
            .iter()
            .filter(|c| c.literals.len() == 1)
            .map(|c| c.literals[0])
            .collect();
        for l in units {
            if !assign(&mut assignments, &mut trail, l) || !propagate(&mut clauses, &mut watch_lists, &mut assignments, &mut trail, l) {
                return None;
            }
        }

        #[derive(Clone, Copy)]
        struct Decision {
            var: Var,
            tried_both: bool,
        }
        let mut stack: Vec<Decision> = Vec::new();

        fn undo_to(level: usize, trail: &mut Vec<Var>, trail_lim: &mut Vec<usize>, assignments: &mut [Option<bool>]) {
            if level >= trail_lim.len() {
                return;
            }
            let pos = trail_lim[level];
            while trail.len() > pos {
                let var = trail.pop().unwrap();
                assignments[var] = None;
            }
            trail_lim.truncate(level);
        }

        loop {
            let next_free = assignments.iter().enumerate().skip(1).find(|(_, a)| a.is_none()).map(|(i, _)| i);
            let mut ok = true;
            if let Some(var) = next_free {
                trail_lim.push(trail.len());
                let lit = var as Literal;
                ok = assign(&mut assignments, &mut trail, lit)
                    && propagate(&mut clauses, &mut watch_lists, &mut assignments, &mut trail, lit);
                stack.push(Decision { var, tried_both: false });
            } else {
                return Some(assignments);
            }

            if ok {
                continue;
            }

            // Backtrack: retry the most recent untried decision with the
            // opposite polarity, popping exhausted decisions otherwise.
            let mut resolved = false;
            while let Some(mut dec) = stack.pop() {
                let level = stack.len();
                if dec.tried_both {
                    undo_to(level, &mut trail, &mut trail_lim, &mut assignments);
                    continue;
                }
                undo_to(level, &mut trail, &mut trail_lim, &mut assignments);
                dec.tried_both = true;
                trail_lim.push(trail.len());
                let lit = -(dec.var as Literal);
                let retry_ok = assign(&mut assignments, &mut trail, lit)
                    && propagate(&mut clauses, &mut watch_lists, &mut assignments, &mut trail, lit);
                stack.push(dec);
                if retry_ok {
                    resolved = true;
                    break;
                }
            }
            if !resolved {
                return None;
            }
        }
    }
}

fn propagate(
    clauses: &mut [WorkingClause],
    watch_lists: &mut [Vec<usize>],
    assignments: &mut [Option<bool>],
    trail: &mut Vec<Var>,
    start: Literal,
) -> bool {
    let mut queue = vec![start];
    while let Some(lit) = queue.pop() {
        let falsified_idx = lit_idx(-lit);
        let mut affected = std::mem::take(&mut watch_lists[falsified_idx]);
        let mut conflict = false;

        let mut kept = Vec::with_capacity(affected.len());
        for cid in affected.drain(..) {
            if conflict {
                kept.push(cid);
                continue;
            }
            let c = &mut clauses[cid];
            if c.literals[c.watched[0]] == -lit {
                c.watched.swap(0, 1);
            }
            let w0 = c.literals[c.watched[0]];
            if value_of(assignments, w0) == Some(true) {
                kept.push(cid);
                continue;
            }
            if let Some(j) = c.find_replacement(assignments) {
                c.watched[1] = j;
                watch_lists[lit_idx(c.literals[j])].push(cid);
                continue;
            }
            match value_of(assignments, w0) {
                Some(false) => {
                    conflict = true;
                    kept.push(cid);
                }
                None => {
                    if !assign(assignments, trail, w0) {
                        conflict = true;
                    } else {
                        queue.push(w0);
                    }
                    kept.push(cid);
                }
                Some(true) => kept.push(cid),
            }
        }
        watch_lists[falsified_idx] = kept;
        if conflict {
            return false;
        }
    }
    true
}

/// Extracts positions forced `true` by a model, over pool positions `0..n`.
pub fn model_to_bitset(assignments: &[Option<bool>], n: usize) -> FixedBitSet {
    let mut set = FixedBitSet::with_capacity(n);
    for i in 0..n {
        if assignments.get(i + 1).copied().flatten() == Some(true) {
            set.set(i, true);
        }
    }
    set
}

/// Per-SAT-frame accelerator state: re-queries the underlying instance for
/// the next model under an accumulating set of blocking clauses each time
/// the tableau rolls back into it, mirroring the reference's re-query of its
/// attached solver on backtrack.
pub struct Accelerator {
    instance: std::rc::Rc<Instance>,
    assumptions: Vec<Literal>,
    blocking: Vec<Clause>,
}

impl Accelerator {
    pub fn new(instance: std::rc::Rc<Instance>, assumptions: Vec<Literal>) -> Self {
        Accelerator { instance, assumptions, blocking: Vec::new() }
    }

    /// Returns the next model consistent with the assumptions and not ruled
    /// out by any model already returned, or `None` once exhausted.
    pub fn next(&mut self, n: usize) -> Option<FixedBitSet> {
        let assignments = self.instance.solve(&self.assumptions, &self.blocking)?;
        let block: Clause = (1..=self.instance.num_vars)
            .filter_map(|v| assignments[v].map(|val| if val { -(v as Literal) } else { v as Literal }))
            .collect();
        self.blocking.push(block);
        Some(model_to_bitset(&assignments, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_a_small_satisfiable_skeleton() {
        // (x1 or x2) and (not x1 or x2)
        let instance = Instance::new(vec![vec![1, 2], vec![-1, 2]], 2);
        let model = instance.solve(&[], &[]).unwrap();
        assert_eq!(model[2], Some(true));
    }

    #[test]
    fn detects_unsatisfiable_skeleton() {
        let instance = Instance::new(vec![vec![1], vec![-1]], 1);
        assert!(instance.solve(&[], &[]).is_none());
    }

    #[test]
    fn accelerator_enumerates_distinct_models() {
        let instance = std::rc::Rc::new(Instance::new(vec![], 2));
        let mut acc = Accelerator::new(instance, vec![]);
        let first = acc.next(2).unwrap();
        let second = acc.next(2).unwrap();
        assert_ne!(first, second);
    }
}
