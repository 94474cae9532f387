//! The one-pass tableau engine: contradiction detection, deterministic
//! α-rule saturation, β-rule branching, eventuality bookkeeping, the
//! LOOP/PRUNE rules, and the STEP transition.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fixedbitset::FixedBitSet;

use crate::frame::{Arena, ChoiceKind, EventualityState, FrameKind};
use crate::id::Position;
use crate::pool::Pool;
use crate::sat::{Accelerator, Instance};

/// `Undefined` is reserved for a cancelled search — cancellation is not an
/// error, so it resolves to this infallible result rather than `Err`.
/// Nothing in this crate's CLI currently wires an OS signal to
/// `Engine::interrupt_handle`, but library embedders can.
pub enum SolverResult {
    Satisfiable { stack: Vec<usize>, loop_frame: usize },
    Unsatisfiable,
    Undefined,
}

pub struct Engine<'a> {
    pool: &'a Pool,
    arena: Arena,
    stack: Vec<usize>,
    max_depth: u64,
    sat_instance: Option<std::rc::Rc<Instance>>,
    sat_accelerators: std::collections::HashMap<usize, Accelerator>,
    interrupted: Arc<AtomicBool>,
}

impl<'a> Engine<'a> {
    pub fn new(pool: &'a Pool, max_depth: u64, use_sat_accelerator: bool) -> Self {
        let sat_instance = if use_sat_accelerator && !pool.clauses.is_empty() {
            Some(std::rc::Rc::new(Instance::new(pool.clauses.clone(), pool.len())))
        } else {
            None
        };
        Engine {
            pool,
            arena: Arena::new(),
            stack: Vec::new(),
            max_depth,
            sat_instance,
            sat_accelerators: std::collections::HashMap::new(),
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// A shared flag an embedder can set from a signal handler to cancel an
    /// in-progress `solve()` at the next rule-loop iteration.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.interrupted.clone()
    }

    pub fn solve(mut self) -> (SolverResult, Arena) {
        if let Some(trivial) = self.pool.trivial {
            let n = self.pool.len();
            let formulas = {
                let mut b = FixedBitSet::with_capacity(n.max(1));
                if trivial {
                    b.set(0, true);
                }
                b
            };
            if trivial {
                let root = self.arena.push_root(formulas, vec![]);
                self.stack.push(root);
                return (SolverResult::Satisfiable { stack: self.stack, loop_frame: root }, self.arena);
            }
            return (SolverResult::Unsatisfiable, self.arena);
        }

        let n = self.pool.len();
        let mut root_formulas = FixedBitSet::with_capacity(n);
        root_formulas.set(self.pool.start.get(), true);
        let root_eventualities = vec![EventualityState::NotRequested; self.pool.eventuality_count()];
        let root = self.arena.push_root(root_formulas, root_eventualities);
        self.stack.push(root);
        self.update_eventualities(root);

        loop {
            if self.interrupted.load(Ordering::Relaxed) {
                return (SolverResult::Undefined, self.arena);
            }

            let current = *self.stack.last().expect("stack only empties via Unsatisfiable return");

            // Nothing asserted at all: the instant is trivially satisfied and
            // every instant after it can repeat its immediate predecessor
            // forever. Checked ahead of everything else, same as the
            // reference solver's `frame.formulas.none()` fast path.
            if self.arena.get(current).formulas.ones().next().is_none() {
                let loop_frame = self
                    .arena
                    .get(current)
                    .chain
                    .expect("an empty non-root frame always has a predecessor");
                return (SolverResult::Satisfiable { stack: self.stack, loop_frame }, self.arena);
            }

            if self.has_contradiction(current) {
                if !self.rollback() {
                    return (SolverResult::Unsatisfiable, self.arena);
                }
                continue;
            }

            if self.alpha_saturate(current) {
                continue;
            }

            if let Some((pos, kind)) = self.pick_beta(current) {
                if kind == ChoiceKind::Disjunction && self.sat_instance.is_some() {
                    if !self.branch_sat(current) {
                        if !self.rollback() {
                            return (SolverResult::Unsatisfiable, self.arena);
                        }
                    }
                    continue;
                }
                self.branch(current, pos, kind);
                continue;
            }

            self.update_eventualities(current);

            if let Some(loop_frame) = self.check_loop(current) {
                return (SolverResult::Satisfiable { stack: self.stack, loop_frame }, self.arena);
            }
            if self.check_prune(current) {
                if !self.rollback() {
                    return (SolverResult::Unsatisfiable, self.arena);
                }
                continue;
            }
            if self.arena.get(current).id.get() >= self.max_depth {
                if !self.rollback() {
                    return (SolverResult::Unsatisfiable, self.arena);
                }
                continue;
            }

            self.step(current);
        }
    }

    fn has_contradiction(&self, index: usize) -> bool {
        let frame = self.arena.get(index);
        for i in frame.formulas.ones() {
            if self.pool.categories.negation.contains(i) && frame.formulas.contains(self.pool.lhs[i].get()) {
                return true;
            }
        }
        false
    }

    fn needs_processing(&self, i: usize) -> bool {
        let c = &self.pool.categories;
        c.conjunction.contains(i)
            || c.always.contains(i)
            || c.disjunction.contains(i)
            || c.eventually.contains(i)
            || c.until.contains(i)
            || c.not_until.contains(i)
    }

    /// Applies deterministic Conjunction/Always rules until no more apply.
    /// Returns `true` if any rule fired (caller should loop back to the
    /// contradiction check).
    fn alpha_saturate(&mut self, index: usize) -> bool {
        let mut applied = false;
        loop {
            let candidate = {
                let frame = self.arena.get(index);
                frame
                    .to_process
                    .ones()
                    .find(|&i| self.pool.categories.conjunction.contains(i) || self.pool.categories.always.contains(i))
            };
            let Some(i) = candidate else { break };

            let mut assert_positions = Vec::new();
            if self.pool.categories.conjunction.contains(i) {
                assert_positions.push(self.pool.lhs[i]);
                assert_positions.push(self.pool.rhs[i]);
            } else {
                // Always: the child, plus its adjacent tomorrow companion.
                assert_positions.push(self.pool.lhs[i]);
                assert_positions.push(Position::new(i + 1));
            }

            let frame = self.arena.get_mut(index);
            frame.to_process.set(i, false);
            for p in assert_positions {
                if !frame.formulas.contains(p.get()) {
                    frame.formulas.set(p.get(), true);
                    if self.needs_processing(p.get()) {
                        frame.to_process.set(p.get(), true);
                    }
                }
            }
            applied = true;
        }
        applied
    }

    fn pick_beta(&self, index: usize) -> Option<(Position, ChoiceKind)> {
        let frame = self.arena.get(index);
        let c = &self.pool.categories;
        if let Some(i) = frame.to_process.ones().find(|&i| c.disjunction.contains(i)) {
            return Some((Position::new(i), ChoiceKind::Disjunction));
        }
        if let Some(i) = frame.to_process.ones().find(|&i| c.eventually.contains(i)) {
            return Some((Position::new(i), ChoiceKind::Eventually));
        }
        if let Some(i) = frame.to_process.ones().find(|&i| c.until.contains(i)) {
            return Some((Position::new(i), ChoiceKind::Until));
        }
        if let Some(i) = frame.to_process.ones().find(|&i| c.not_until.contains(i)) {
            return Some((Position::new(i), ChoiceKind::NotUntil));
        }
        None
    }

    /// Builds the primary-branch formula set for a β-choice; `branch` pushes
    /// it and marks the position processed.
    fn primary_assertions(&self, pos: Position, kind: ChoiceKind) -> Vec<Position> {
        match kind {
            ChoiceKind::Disjunction => vec![self.pool.lhs[pos.get()]],
            ChoiceKind::Eventually => vec![self.pool.lhs[pos.get()]],
            ChoiceKind::Until => vec![self.pool.rhs[pos.get()]],
            // Unconditional ¬ψ plus the "¬φ now" branch.
            ChoiceKind::NotUntil => vec![self.pool.rhs[pos.get()], self.pool.lhs[pos.get()]],
        }
    }

    fn sibling_assertions(&self, pos: Position, kind: ChoiceKind) -> Vec<Position> {
        let next = Position::new(pos.get() + 1);
        match kind {
            ChoiceKind::Disjunction => vec![self.pool.rhs[pos.get()]],
            ChoiceKind::Eventually => vec![next],
            ChoiceKind::Until => vec![self.pool.lhs[pos.get()], next],
            ChoiceKind::NotUntil => vec![self.pool.rhs[pos.get()], next],
        }
    }

    /// Routes a pending disjunction through the SAT accelerator instead of
    /// the ordinary Choice(Disjunction) branch: clears every disjunction bit
    /// still in `to_process` (the accelerator resolves all of them from one
    /// CNF built over the frame's asserted atoms) and pushes the first
    /// satisfying model as a `Sat` frame. Returns `false` if the accelerator
    /// finds no model at all, in which case `parent` is a dead end.
    fn branch_sat(&mut self, parent: usize) -> bool {
        {
            let frame = self.arena.get_mut(parent);
            let pending: Vec<usize> = frame.to_process.ones().filter(|&i| self.pool.categories.disjunction.contains(i)).collect();
            for i in pending {
                frame.to_process.set(i, false);
            }
        }
        let Some(model) = self.next_sat_model(parent) else { return false };
        let eventualities = self.arena.get(parent).eventualities.clone();
        let new_index = self.arena.push_sat(parent, model, eventualities);
        {
            let f = self.arena.get(new_index);
            let to_process: Vec<usize> = f.formulas.ones().filter(|&p| self.needs_processing(p)).collect();
            let fm = self.arena.get_mut(new_index);
            fm.to_process.clear();
            for p in to_process {
                fm.to_process.set(p, true);
            }
        }
        self.update_eventualities(new_index);
        self.stack.push(new_index);
        true
    }

    fn branch(&mut self, parent: usize, pos: Position, kind: ChoiceKind) {
        {
            let frame = self.arena.get_mut(parent);
            frame.to_process.set(pos.get(), false);
        }
        let assertions = self.primary_assertions(pos, kind);
        self.push_choice_frame(parent, pos, kind, false, &assertions);
    }

    fn push_choice_frame(&mut self, parent: usize, pos: Position, kind: ChoiceKind, is_sibling: bool, assertions: &[Position]) {
        let parent_frame = self.arena.get(parent);
        let mut formulas = parent_frame.formulas.clone();
        let eventualities = parent_frame.eventualities.clone();
        for &p in assertions {
            if !formulas.contains(p.get()) {
                formulas.set(p.get(), true);
            }
        }
        let to_process: Vec<usize> = assertions
            .iter()
            .map(|p| p.get())
            .filter(|&p| self.needs_processing(p))
            .collect();

        let new_index = self.arena.push_choice(parent, kind, pos, is_sibling, formulas, eventualities);
        {
            let frame = self.arena.get_mut(new_index);
            frame.to_process.clear();
            for p in to_process {
                frame.to_process.set(p, true);
            }
        }
        self.update_eventualities(new_index);
        self.stack.push(new_index);
    }

    /// Recomputes every eventuality's state for `index` from its own
    /// current formula set (carrying forward whatever its parent already
    /// established, since `Arena::push_*` clones the parent's vector).
    fn update_eventualities(&mut self, index: usize) {
        let n = self.pool.eventuality_count();
        if n == 0 {
            return;
        }
        let frame = self.arena.get(index);
        let id = frame.id;
        let mut states = frame.eventualities.clone();

        for i in frame.formulas.ones() {
            let k = self.pool.trigger[i];
            if !k.is_sentinel() && states[k.get()].is_not_requested() {
                states[k.get()] = EventualityState::NotYetSatisfied;
            }
        }
        for (k, &promise) in self.pool.bw_eventualities.iter().enumerate() {
            if frame.formulas.contains(promise.get()) {
                states[k] = EventualityState::SatisfiedAt(id);
            }
        }

        self.arena.get_mut(index).eventualities = states;
    }

    /// `Some(loop_frame)` when the current instant closes a cycle back to an
    /// earlier one with every eventuality already discharged somewhere on the
    /// cycle; `loop_frame` is the arena index the model should loop back to.
    fn check_loop(&self, index: usize) -> Option<usize> {
        let frame = self.arena.get(index);
        let anchor = self.arena.instant_anchor(index);
        if frame.first == anchor {
            return None;
        }
        let first_id = self.arena.get(frame.first).id;
        let closes = frame.eventualities.iter().all(|&e| {
            e.is_not_requested() || matches!(e.satisfied_at(), Some(id) if id.get() > first_id.get())
        });
        closes.then_some(frame.first)
    }

    fn check_prune(&self, index: usize) -> bool {
        let frame = self.arena.get(index);
        if frame.prev == index {
            return false;
        }
        let prev = self.arena.get(frame.prev);

        let prune0 = !frame.eventualities.is_empty()
            && !frame.eventualities.iter().any(|&e| {
                !e.is_not_requested()
                    && !e.is_not_yet_satisfied()
                    && matches!(e.satisfied_at(), Some(id) if id.get() > prev.id.get())
            });
        if prune0 {
            return true;
        }

        if frame.prev == frame.first {
            return false;
        }
        let first_id = self.arena.get(frame.first).id;
        frame.eventualities.iter().enumerate().all(|(k, &e)| {
            let stale = e.is_not_requested() || e.is_not_yet_satisfied() || matches!(e.satisfied_at(), Some(id) if id.get() <= prev.id.get());
            let freshly_satisfied_by_prev = matches!(prev.eventualities[k].satisfied_at(), Some(id) if id.get() > first_id.get());
            stale || freshly_satisfied_by_prev
        })
    }

    fn step(&mut self, index: usize) {
        let frame = self.arena.get(index);
        let mut formulas = FixedBitSet::with_capacity(self.pool.len());
        for i in frame.formulas.ones() {
            if self.pool.categories.tomorrow.contains(i) {
                formulas.set(self.pool.lhs[i].get(), true);
            }
        }
        let eventualities = frame.eventualities.clone();
        let new_index = self.arena.push_step(index, formulas, eventualities);
        {
            let new_frame = self.arena.get(new_index);
            let to_process: Vec<usize> = new_frame.formulas.ones().filter(|&p| self.needs_processing(p)).collect();
            let f = self.arena.get_mut(new_index);
            f.to_process.clear();
            for p in to_process {
                f.to_process.set(p, true);
            }
        }
        self.update_eventualities(new_index);
        self.stack.push(new_index);
    }

    fn rollback(&mut self) -> bool {
        loop {
            let Some(&top_idx) = self.stack.last() else { return false };
            let top = self.arena.get(top_idx);
            match top.kind {
                FrameKind::Sat => {
                    let parent = top.chain.expect("Sat frames always have a parent");
                    if let Some(model) = self.next_sat_model(parent) {
                        self.stack.pop();
                        let parent_frame = self.arena.get(parent);
                        let eventualities = parent_frame.eventualities.clone();
                        let new_index = self.arena.push_sat(parent, model, eventualities);
                        {
                            let f = self.arena.get(new_index);
                            let to_process: Vec<usize> = f.formulas.ones().filter(|&p| self.needs_processing(p)).collect();
                            let fm = self.arena.get_mut(new_index);
                            fm.to_process.clear();
                            for p in to_process {
                                fm.to_process.set(p, true);
                            }
                        }
                        self.update_eventualities(new_index);
                        self.stack.push(new_index);
                        return true;
                    }
                    self.stack.pop();
                }
                FrameKind::Choice(kind) => {
                    if top.is_sibling {
                        self.stack.pop();
                        continue;
                    }
                    let parent = top.chain.expect("Choice frames always have a parent");
                    let pos = top.chosen;
                    self.stack.pop();
                    let assertions = self.sibling_assertions(pos, kind);
                    self.push_choice_frame(parent, pos, kind, true, &assertions);
                    return true;
                }
                FrameKind::Step => {
                    self.stack.pop();
                }
            }
        }
    }

    fn next_sat_model(&mut self, parent: usize) -> Option<FixedBitSet> {
        let instance = self.sat_instance.as_ref()?.clone();
        let n = self.pool.len();
        if !self.sat_accelerators.contains_key(&parent) {
            let parent_frame = self.arena.get(parent);
            let assumptions: Vec<i32> = parent_frame.formulas.ones().map(|p| (p as i32) + 1).collect();
            self.sat_accelerators.insert(parent, Accelerator::new(instance, assumptions));
        }
        self.sat_accelerators.get_mut(&parent)?.next(n)
    }
}
