//! Past-to-future translator.
//!
//! Rewrites Yesterday/Since/Past/Historically into fresh propositional atoms
//! plus conjoined equisatisfiable axioms, grounded on the reference
//! implementation's `Translator::translate`. `Triggered` is handled via its
//! standard duality with `Since` (`l T r ≡ ¬(¬l S ¬r)`) rather than by
//! porting the reference's three-fresh-atom combined axiom verbatim — see
//! DESIGN.md for why that substitution is equisatisfiable and preferred.

use std::collections::HashSet;
use std::rc::Rc;

use crate::formula::{Formula, FormulaPtr};

struct NameGen {
    used: HashSet<Rc<str>>,
    counter: u64,
}

impl NameGen {
    fn fresh(&mut self, prefix: &str) -> Rc<str> {
        loop {
            let candidate: Rc<str> = format!("__{}{}", prefix, self.counter).into();
            self.counter += 1;
            if !self.used.contains(&candidate) {
                self.used.insert(candidate.clone());
                return candidate;
            }
        }
    }
}

/// Returns a pure-future formula equisatisfiable with `f`. A no-op (besides
/// reference sharing) when `f` has no past operators.
pub fn translate(f: &FormulaPtr) -> FormulaPtr {
    let mut used = HashSet::new();
    f.collect_atom_names(&mut used);
    let mut gen = NameGen { used, counter: 0 };

    let mut axioms = Formula::truth();
    let body = translate_rec(f, &mut gen, &mut axioms);
    conc(body, axioms)
}

fn conc(main: FormulaPtr, axioms: FormulaPtr) -> FormulaPtr {
    if matches!(*axioms, Formula::True) {
        main
    } else {
        Formula::and(main, axioms)
    }
}

fn conjoin(axioms: &mut FormulaPtr, extra: FormulaPtr) {
    *axioms = conc(extra, axioms.clone());
}

fn translate_rec(f: &FormulaPtr, gen: &mut NameGen, axioms: &mut FormulaPtr) -> FormulaPtr {
    match &**f {
        Formula::True | Formula::False | Formula::Atom(_) => f.clone(),

        Formula::Not(inner) => Formula::not(translate_rec(inner, gen, axioms)),
        Formula::Next(inner) => Formula::next(translate_rec(inner, gen, axioms)),
        Formula::Globally(inner) => Formula::globally(translate_rec(inner, gen, axioms)),
        Formula::Finally(inner) => Formula::finally(translate_rec(inner, gen, axioms)),

        Formula::And(l, r) => Formula::and(
            translate_rec(l, gen, axioms),
            translate_rec(r, gen, axioms),
        ),
        Formula::Or(l, r) => Formula::or(
            translate_rec(l, gen, axioms),
            translate_rec(r, gen, axioms),
        ),
        Formula::Until(l, r) => Formula::until(
            translate_rec(l, gen, axioms),
            translate_rec(r, gen, axioms),
        ),
        Formula::Release(l, r) => Formula::release(
            translate_rec(l, gen, axioms),
            translate_rec(r, gen, axioms),
        ),
        Formula::Implies(l, r) => Formula::implies(
            translate_rec(l, gen, axioms),
            translate_rec(r, gen, axioms),
        ),
        Formula::Iff(l, r) => Formula::iff(
            translate_rec(l, gen, axioms),
            translate_rec(r, gen, axioms),
        ),

        Formula::Yesterday(inner) => {
            let fp = translate_rec(inner, gen, axioms);
            let y = Formula::atom(gen.fresh("y"));
            let axiom = Formula::and(
                Formula::not(y.clone()),
                Formula::globally(Formula::iff(Formula::next(y.clone()), fp)),
            );
            conjoin(axioms, axiom);
            y
        }

        Formula::Since(l, r) => {
            let lp = translate_rec(l, gen, axioms);
            let rp = translate_rec(r, gen, axioms);
            let s = Formula::atom(gen.fresh("s"));
            let step = Formula::or(
                Formula::next(rp.clone()),
                Formula::and(s.clone(), Formula::next(lp)),
            );
            let axiom = Formula::and(
                Formula::iff(s.clone(), rp),
                Formula::globally(Formula::iff(Formula::next(s.clone()), step)),
            );
            conjoin(axioms, axiom);
            s
        }

        Formula::Triggered(l, r) => {
            // l T r === !(!l S !r)
            let dual = Formula::not(Formula::since(Formula::not(l.clone()), Formula::not(r.clone())));
            translate_rec(&dual, gen, axioms)
        }

        Formula::Past(inner) => {
            let fp = translate_rec(inner, gen, axioms);
            let p = Formula::atom(gen.fresh("p"));
            let step = Formula::or(p.clone(), fp.clone());
            let axiom = Formula::and(
                Formula::iff(p.clone(), fp),
                Formula::globally(Formula::iff(Formula::next(p.clone()), step)),
            );
            conjoin(axioms, axiom);
            p
        }

        Formula::Historically(inner) => {
            let fp = translate_rec(inner, gen, axioms);
            let h = Formula::atom(gen.fresh("h"));
            let step = Formula::and(h.clone(), Formula::next(fp.clone()));
            let axiom = Formula::and(Formula::and(h.clone(), fp), Formula::globally(Formula::iff(Formula::next(h.clone()), step)));
            conjoin(axioms, axiom);
            h
        }
    }
}
