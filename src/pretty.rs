//! Renders a `Formula` back to infix text, for diagnostics and for the
//! free-text progress line the CLI prints while solving a batch file.

use std::fmt;

use crate::formula::Formula;

pub fn to_string(f: &Formula) -> String {
    let mut buf = String::new();
    write_formula_prec(&mut buf, f, 0).expect("writing to a String cannot fail");
    buf
}

pub fn write_formula(f: &mut fmt::Formatter<'_>, formula: &Formula) -> fmt::Result {
    let mut buf = String::new();
    write_formula_prec(&mut buf, formula, 0)?;
    f.write_str(&buf)
}

/// Precedence levels, lowest binds loosest: iff(0) < implies(1) < or(2) <
/// and(3) < until/release/since/triggered(4) < unary(5).
fn write_formula_prec(out: &mut String, formula: &Formula, min_prec: u8) -> fmt::Result {
    use fmt::Write;

    let (text, prec): (String, u8) = match formula {
        Formula::True => ("true".to_string(), 5),
        Formula::False => ("false".to_string(), 5),
        Formula::Atom(name) => (name.to_string(), 5),
        Formula::Not(f) => (format!("!{}", paren(f, 5)), 5),
        Formula::Next(f) => (format!("X {}", paren(f, 5)), 5),
        Formula::Globally(f) => (format!("G {}", paren(f, 5)), 5),
        Formula::Finally(f) => (format!("F {}", paren(f, 5)), 5),
        Formula::Yesterday(f) => (format!("Y {}", paren(f, 5)), 5),
        Formula::Past(f) => (format!("P {}", paren(f, 5)), 5),
        Formula::Historically(f) => (format!("H {}", paren(f, 5)), 5),
        Formula::And(l, r) => (format!("{} & {}", paren(l, 4), paren(r, 3)), 3),
        Formula::Or(l, r) => (format!("{} | {}", paren(l, 3), paren(r, 2)), 2),
        Formula::Until(l, r) => (format!("{} U {}", paren(l, 5), paren(r, 4)), 4),
        Formula::Release(l, r) => (format!("{} R {}", paren(l, 5), paren(r, 4)), 4),
        Formula::Since(l, r) => (format!("{} S {}", paren(l, 5), paren(r, 4)), 4),
        Formula::Triggered(l, r) => (format!("{} T {}", paren(l, 5), paren(r, 4)), 4),
        Formula::Implies(l, r) => (format!("{} -> {}", paren(l, 2), paren(r, 1)), 1),
        Formula::Iff(l, r) => (format!("{} <-> {}", paren(l, 1), paren(r, 0)), 0),
    };

    if prec < min_prec {
        write!(out, "({})", text)
    } else {
        write!(out, "{}", text)
    }
}

fn paren(f: &Formula, min_prec: u8) -> String {
    let mut s = String::new();
    write_formula_prec(&mut s, f, min_prec).expect("writing to a String cannot fail");
    s
}
