//! Tableau frames and the frame arena.
//!
//! Every frame ever created lives in an append-only arena and is addressed
//! by index rather than by pointer, so `chain`/`step_prev`/`prev`/`first`
//! links stay valid no matter what the active path (`Engine::stack`) has
//! since popped; see DESIGN.md for why arena indices were chosen over raw
//! pointers.

use fixedbitset::FixedBitSet;

use crate::id::{EventualityId, FrameId, Position};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EventualityState {
    NotRequested,
    NotYetSatisfied,
    SatisfiedAt(FrameId),
}

impl EventualityState {
    pub fn is_not_requested(self) -> bool {
        matches!(self, EventualityState::NotRequested)
    }

    pub fn is_not_yet_satisfied(self) -> bool {
        matches!(self, EventualityState::NotYetSatisfied)
    }

    pub fn satisfied_at(self) -> Option<FrameId> {
        match self {
            EventualityState::SatisfiedAt(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ChoiceKind {
    Disjunction,
    Eventually,
    Until,
    NotUntil,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FrameKind {
    /// A time-step transition (the STEP rule fired to reach this frame).
    Step,
    /// A branch point; `chosen` names the β-formula position branched on.
    Choice(ChoiceKind),
    /// A model supplied by the SAT accelerator.
    Sat,
}

pub struct Frame {
    pub formulas: FixedBitSet,
    pub to_process: FixedBitSet,
    pub eventualities: Vec<EventualityState>,
    pub id: FrameId,
    pub kind: FrameKind,
    /// The β-formula position this frame branched on, if `kind` is `Choice`.
    pub chosen: Position,
    /// Whether this is the second (alternate) branch of a `Choice` already
    /// tried once; once a sibling also fails, the whole choice point — and
    /// therefore its parent — is unsatisfiable, so rollback propagates past
    /// it instead of re-picking another position from the same parent.
    pub is_sibling: bool,
    /// Immediate predecessor in the derivation, whatever its kind.
    pub chain: Option<usize>,
    /// Nearest STEP-kind ancestor (skipping CHOICE/SAT frames at the same
    /// time instant).
    pub step_prev: Option<usize>,
    /// Most recent STEP-kind ancestor sharing this frame's exact formula
    /// set, or this frame's own arena index if no such ancestor exists.
    /// Used by the PRUNE rules.
    pub prev: usize,
    /// Earliest STEP-kind ancestor sharing this frame's exact formula set,
    /// or this frame's own arena index if no such ancestor exists.
    pub first: usize,
}

/// Append-only store of every frame created during the search. Frames are
/// never removed; `Engine` tracks the active branch as a separate stack of
/// arena indices so rollback is just truncation.
pub struct Arena {
    frames: Vec<Frame>,
}

impl Arena {
    pub fn new() -> Self {
        Arena { frames: Vec::new() }
    }

    pub fn get(&self, index: usize) -> &Frame {
        &self.frames[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut Frame {
        &mut self.frames[index]
    }

    /// Pushes the root frame (no predecessor, id 0).
    pub fn push_root(&mut self, formulas: FixedBitSet, eventualities: Vec<EventualityState>) -> usize {
        let to_process = formulas.clone();
        let index = self.frames.len();
        self.frames.push(Frame {
            formulas,
            to_process,
            eventualities,
            id: FrameId::new(0),
            kind: FrameKind::Step,
            chosen: Position::max(),
            is_sibling: false,
            chain: None,
            step_prev: None,
            prev: index,
            first: index,
        });
        index
    }

    /// Pushes a CHOICE frame at the same time instant as `parent`, for
    /// either the first-tried branch or its alternate.
    pub fn push_choice(
        &mut self,
        parent: usize,
        kind: ChoiceKind,
        chosen: Position,
        is_sibling: bool,
        formulas: FixedBitSet,
        eventualities: Vec<EventualityState>,
    ) -> usize {
        self.push_same_instant(parent, FrameKind::Choice(kind), chosen, is_sibling, formulas, eventualities)
    }

    /// Pushes a SAT-accelerator frame at the same time instant as `parent`.
    pub fn push_sat(&mut self, parent: usize, formulas: FixedBitSet, eventualities: Vec<EventualityState>) -> usize {
        self.push_same_instant(parent, FrameKind::Sat, Position::max(), false, formulas, eventualities)
    }

    fn push_same_instant(
        &mut self,
        parent: usize,
        kind: FrameKind,
        chosen: Position,
        is_sibling: bool,
        formulas: FixedBitSet,
        eventualities: Vec<EventualityState>,
    ) -> usize {
        let to_process = formulas.clone();
        let p = self.get(parent);
        let id = p.id;
        let step_prev = p.step_prev;
        let prev = p.prev;
        let first = p.first;
        let index = self.frames.len();
        self.frames.push(Frame {
            formulas,
            to_process,
            eventualities,
            id,
            kind,
            chosen,
            is_sibling,
            chain: Some(parent),
            step_prev,
            prev,
            first,
        });
        index
    }

    /// Pushes a new STEP frame (one time instant later than `chain`),
    /// walking the STEP-ancestor chain for a formula-set match: `prev`
    /// becomes the nearest such ancestor (or this frame itself, if none
    /// matches), and `first` the earliest one found along the same walk.
    pub fn push_step(&mut self, chain: usize, formulas: FixedBitSet, eventualities: Vec<EventualityState>) -> usize {
        let to_process = formulas.clone();
        let parent = self.get(chain);
        let id = parent.id + 1;

        let mut prev = None;
        let mut first = None;
        let mut walk = Some(chain);
        while let Some(idx) = walk {
            let f = self.get(idx);
            if f.formulas == formulas {
                if prev.is_none() {
                    prev = Some(idx);
                }
                first = Some(idx);
            }
            walk = f.step_prev;
        }

        let index = self.frames.len();
        let prev = prev.unwrap_or(index);
        let first = first.unwrap_or(index);
        self.frames.push(Frame {
            formulas,
            to_process,
            eventualities,
            id,
            kind: FrameKind::Step,
            chosen: Position::max(),
            is_sibling: false,
            chain: Some(chain),
            step_prev: Some(chain),
            prev,
            first,
        });
        index
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Arena {
    /// Walks `chain` up from `index` to the STEP frame that opened the
    /// current time instant (itself, if `index` already is one). Needed
    /// because `first`/`step_prev` are computed once per instant and then
    /// shared unchanged by every CHOICE/SAT frame layered on top of it, so
    /// comparing them against a CHOICE/SAT frame's own index is meaningless.
    pub fn instant_anchor(&self, mut index: usize) -> usize {
        while !matches!(self.get(index).kind, FrameKind::Step) {
            index = self.get(index).chain.expect("non-root frame has a chain");
        }
        index
    }
}
