//! The LTL formula AST.
//!
//! Nodes are reference-counted so subtrees can be shared between the surface
//! formula, its simplified form, and the entries of the subformula pool
//! without cloning. Two `Formula`s compare equal iff structurally identical.

use std::fmt;
use std::rc::Rc;

pub type FormulaPtr = Rc<Formula>;

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Formula {
    True,
    False,
    Atom(Rc<str>),
    Not(FormulaPtr),
    Next(FormulaPtr),
    Globally(FormulaPtr),
    Finally(FormulaPtr),
    And(FormulaPtr, FormulaPtr),
    Or(FormulaPtr, FormulaPtr),
    Until(FormulaPtr, FormulaPtr),

    // Surface-only operators; removed by the simplifier/translator before a
    // formula ever reaches the subformula pool.
    Release(FormulaPtr, FormulaPtr),
    Implies(FormulaPtr, FormulaPtr),
    Iff(FormulaPtr, FormulaPtr),
    Yesterday(FormulaPtr),
    Since(FormulaPtr, FormulaPtr),
    Triggered(FormulaPtr, FormulaPtr),
    Past(FormulaPtr),
    Historically(FormulaPtr),
}

impl Formula {
    pub fn truth() -> FormulaPtr {
        Rc::new(Formula::True)
    }

    pub fn falsity() -> FormulaPtr {
        Rc::new(Formula::False)
    }

    pub fn atom(name: impl Into<Rc<str>>) -> FormulaPtr {
        Rc::new(Formula::Atom(name.into()))
    }

    pub fn not(f: FormulaPtr) -> FormulaPtr {
        Rc::new(Formula::Not(f))
    }

    pub fn next(f: FormulaPtr) -> FormulaPtr {
        Rc::new(Formula::Next(f))
    }

    pub fn globally(f: FormulaPtr) -> FormulaPtr {
        Rc::new(Formula::Globally(f))
    }

    pub fn finally(f: FormulaPtr) -> FormulaPtr {
        Rc::new(Formula::Finally(f))
    }

    pub fn and(l: FormulaPtr, r: FormulaPtr) -> FormulaPtr {
        Rc::new(Formula::And(l, r))
    }

    pub fn or(l: FormulaPtr, r: FormulaPtr) -> FormulaPtr {
        Rc::new(Formula::Or(l, r))
    }

    pub fn until(l: FormulaPtr, r: FormulaPtr) -> FormulaPtr {
        Rc::new(Formula::Until(l, r))
    }

    pub fn release(l: FormulaPtr, r: FormulaPtr) -> FormulaPtr {
        Rc::new(Formula::Release(l, r))
    }

    pub fn implies(l: FormulaPtr, r: FormulaPtr) -> FormulaPtr {
        Rc::new(Formula::Implies(l, r))
    }

    pub fn iff(l: FormulaPtr, r: FormulaPtr) -> FormulaPtr {
        Rc::new(Formula::Iff(l, r))
    }

    pub fn yesterday(f: FormulaPtr) -> FormulaPtr {
        Rc::new(Formula::Yesterday(f))
    }

    pub fn since(l: FormulaPtr, r: FormulaPtr) -> FormulaPtr {
        Rc::new(Formula::Since(l, r))
    }

    pub fn triggered(l: FormulaPtr, r: FormulaPtr) -> FormulaPtr {
        Rc::new(Formula::Triggered(l, r))
    }

    pub fn past(f: FormulaPtr) -> FormulaPtr {
        Rc::new(Formula::Past(f))
    }

    pub fn historically(f: FormulaPtr) -> FormulaPtr {
        Rc::new(Formula::Historically(f))
    }

    pub fn is_atom(&self) -> bool {
        matches!(self, Formula::Atom(_))
    }

    pub fn is_negation(&self) -> bool {
        matches!(self, Formula::Not(_))
    }

    pub fn is_until(&self) -> bool {
        matches!(self, Formula::Until(_, _))
    }

    /// Collects every atom name appearing anywhere in the tree, used by the
    /// past-to-future translator to pick collision-free fresh names.
    pub fn collect_atom_names(self: &FormulaPtr, out: &mut std::collections::HashSet<Rc<str>>) {
        match &**self {
            Formula::True | Formula::False => {}
            Formula::Atom(name) => {
                out.insert(name.clone());
            }
            Formula::Not(f)
            | Formula::Next(f)
            | Formula::Globally(f)
            | Formula::Finally(f)
            | Formula::Yesterday(f)
            | Formula::Past(f)
            | Formula::Historically(f) => f.collect_atom_names(out),
            Formula::And(l, r)
            | Formula::Or(l, r)
            | Formula::Until(l, r)
            | Formula::Release(l, r)
            | Formula::Implies(l, r)
            | Formula::Iff(l, r)
            | Formula::Since(l, r)
            | Formula::Triggered(l, r) => {
                l.collect_atom_names(out);
                r.collect_atom_names(out);
            }
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::pretty::write_formula(f, self)
    }
}
