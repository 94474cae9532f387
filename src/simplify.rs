//! Negation-normal-form simplifier.
//!
//! Produces formulas over the primitive set `{True, False, Atom, ¬Atom, And,
//! Or, Next, Globally, Finally, Until, ¬Until}` by pushing negations inward
//! with a polarity-carrying recursive rewrite. `Release`/`Implies`/`Iff` are
//! eliminated by substitution into their `Until`/`Or`/`And` definitions
//! before the polarity push reaches them.

use crate::error::{LtlError, LtlResult};
use crate::formula::{Formula, FormulaPtr};

pub fn simplify(f: &FormulaPtr) -> LtlResult<FormulaPtr> {
    nnf(f, false)
}

fn nnf(f: &FormulaPtr, neg: bool) -> LtlResult<FormulaPtr> {
    match &**f {
        Formula::True => Ok(if neg { Formula::falsity() } else { Formula::truth() }),
        Formula::False => Ok(if neg { Formula::truth() } else { Formula::falsity() }),
        Formula::Atom(name) => Ok(if neg {
            Formula::not(Formula::atom(name.clone()))
        } else {
            f.clone()
        }),
        Formula::Not(inner) => nnf(inner, !neg),

        Formula::And(l, r) => {
            let l2 = nnf(l, neg)?;
            let r2 = nnf(r, neg)?;
            Ok(if neg { fold_or(l2, r2) } else { fold_and(l2, r2) })
        }
        Formula::Or(l, r) => {
            let l2 = nnf(l, neg)?;
            let r2 = nnf(r, neg)?;
            Ok(if neg { fold_and(l2, r2) } else { fold_or(l2, r2) })
        }

        Formula::Next(inner) => {
            let i2 = nnf(inner, neg)?;
            Ok(fold_next(i2))
        }
        Formula::Globally(inner) => {
            let i2 = nnf(inner, neg)?;
            Ok(if neg { fold_finally(i2) } else { fold_globally(i2) })
        }
        Formula::Finally(inner) => {
            let i2 = nnf(inner, neg)?;
            Ok(if neg { fold_globally(i2) } else { fold_finally(i2) })
        }

        Formula::Until(l, r) => {
            let l2 = nnf(l, false)?;
            let r2 = nnf(r, false)?;
            let positive = fold_until(l2, r2);
            Ok(if neg { Formula::not(positive) } else { positive })
        }

        Formula::Release(l, r) => {
            let rewritten = Formula::until(Formula::not(l.clone()), Formula::not(r.clone()));
            nnf(&rewritten, !neg)
        }
        Formula::Implies(l, r) => {
            let rewritten = Formula::or(Formula::not(l.clone()), r.clone());
            nnf(&rewritten, neg)
        }
        Formula::Iff(l, r) => {
            let rewritten = Formula::and(
                Formula::implies(l.clone(), r.clone()),
                Formula::implies(r.clone(), l.clone()),
            );
            nnf(&rewritten, neg)
        }

        Formula::Yesterday(_)
        | Formula::Since(_, _)
        | Formula::Triggered(_, _)
        | Formula::Past(_)
        | Formula::Historically(_) => Err(LtlError::unsupported(
            "past-time operator reached the simplifier untranslated",
        )),
    }
}

fn fold_and(l: FormulaPtr, r: FormulaPtr) -> FormulaPtr {
    if matches!(*l, Formula::False) || matches!(*r, Formula::False) {
        Formula::falsity()
    } else if matches!(*l, Formula::True) {
        r
    } else if matches!(*r, Formula::True) {
        l
    } else {
        Formula::and(l, r)
    }
}

fn fold_or(l: FormulaPtr, r: FormulaPtr) -> FormulaPtr {
    if matches!(*l, Formula::True) || matches!(*r, Formula::True) {
        Formula::truth()
    } else if matches!(*l, Formula::False) {
        r
    } else if matches!(*r, Formula::False) {
        l
    } else {
        Formula::or(l, r)
    }
}

fn fold_next(inner: FormulaPtr) -> FormulaPtr {
    match *inner {
        Formula::True => Formula::truth(),
        Formula::False => Formula::falsity(),
        _ => Formula::next(inner),
    }
}

fn fold_globally(inner: FormulaPtr) -> FormulaPtr {
    match *inner {
        Formula::True => Formula::truth(),
        Formula::False => Formula::falsity(),
        _ => Formula::globally(inner),
    }
}

fn fold_finally(inner: FormulaPtr) -> FormulaPtr {
    match *inner {
        Formula::True => Formula::truth(),
        Formula::False => Formula::falsity(),
        _ => Formula::finally(inner),
    }
}

fn fold_until(l: FormulaPtr, r: FormulaPtr) -> FormulaPtr {
    if matches!(*r, Formula::True) {
        Formula::truth()
    } else if matches!(*r, Formula::False) {
        Formula::falsity()
    } else if matches!(*l, Formula::False) {
        r
    } else {
        Formula::until(l, r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a(name: &str) -> FormulaPtr {
        Formula::atom(name)
    }

    #[test]
    fn double_negation_cancels() {
        let f = Formula::not(Formula::not(a("p")));
        assert_eq!(simplify(&f).unwrap(), a("p"));
    }

    #[test]
    fn demorgan_and() {
        let f = Formula::not(Formula::and(a("p"), a("q")));
        let expect = Formula::or(Formula::not(a("p")), Formula::not(a("q")));
        assert_eq!(simplify(&f).unwrap(), expect);
    }

    #[test]
    fn not_globally_becomes_finally_not() {
        let f = Formula::not(Formula::globally(a("p")));
        let expect = Formula::finally(Formula::not(a("p")));
        assert_eq!(simplify(&f).unwrap(), expect);
    }

    #[test]
    fn release_rewritten_as_not_until_of_nots() {
        let f = Formula::release(a("p"), a("q"));
        let expect = Formula::not(Formula::until(Formula::not(a("p")), Formula::not(a("q"))));
        assert_eq!(simplify(&f).unwrap(), expect);
    }

    #[test]
    fn idempotent_on_a_representative_formula() {
        let f = Formula::iff(
            Formula::globally(Formula::implies(a("a"), Formula::next(a("b")))),
            Formula::until(a("c"), Formula::not(a("d"))),
        );
        let once = simplify(&f).unwrap();
        let twice = simplify(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn constant_folding_and_or() {
        assert_eq!(
            simplify(&Formula::and(Formula::truth(), a("p"))).unwrap(),
            a("p")
        );
        assert_eq!(
            simplify(&Formula::or(Formula::falsity(), a("p"))).unwrap(),
            a("p")
        );
    }
}
