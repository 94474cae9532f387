use assert_cmd::Command;
use leviathan_ltl::engine::SolverResult;
use leviathan_ltl::{check, solve};
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn assert_sat(formula: &str) {
    let result = check(formula, 64, true).unwrap();
    assert!(
        matches!(result, SolverResult::Satisfiable { .. }),
        "expected SAT for {formula}"
    );
}

fn assert_unsat(formula: &str) {
    let result = check(formula, 64, true).unwrap();
    assert!(
        matches!(result, SolverResult::Unsatisfiable),
        "expected UNSAT for {formula}"
    );
}

#[test]
fn contradiction_is_unsat() {
    assert_unsat("a & !a");
}

#[test]
fn always_a_and_eventually_not_a_is_unsat() {
    assert_unsat("G a & F !a");
}

#[test]
fn lone_atom_is_sat_with_one_state_model() {
    let (result, pool, arena) = solve("a", 64, false).unwrap();
    let SolverResult::Satisfiable { stack, loop_frame } = result else {
        panic!("expected SAT");
    };
    let model = leviathan_ltl::extract_model(&pool, &arena, &stack, loop_frame);
    assert_eq!(model.states.len(), 1);
    assert_eq!(model.loop_state, 0);
    assert!(model.states[0].literals.iter().any(|l| l.positive && &*l.name == "a"));
}

#[test]
fn eventually_a_holds_somewhere_in_the_model() {
    let (result, pool, arena) = solve("F a", 64, false).unwrap();
    let SolverResult::Satisfiable { stack, loop_frame } = result else {
        panic!("expected SAT");
    };
    let model = leviathan_ltl::extract_model(&pool, &arena, &stack, loop_frame);
    assert!(model
        .states
        .iter()
        .any(|s| s.literals.iter().any(|l| l.positive && &*l.name == "a")));
}

#[test]
fn globally_implication_is_satisfiable_with_a_stable_tail() {
    assert_sat("G (a -> X b) & a & !b");
}

#[test]
fn unfulfillable_until_eventuality_is_unsat() {
    assert_unsat("(a U b) & G !b");
}

#[test]
fn propositional_tautology_matches_propositional_satisfiability() {
    assert_sat("a | !a");
}

#[test]
fn sat_accelerator_does_not_change_the_verdict() {
    for formula in ["a & !a", "G a & F !a", "a", "F a", "(a U b) & G !b", "G (a -> X b) & a & !b"] {
        let with = check(formula, 64, true).unwrap();
        let without = check(formula, 64, false).unwrap();
        assert_eq!(
            matches!(with, SolverResult::Satisfiable { .. }),
            matches!(without, SolverResult::Satisfiable { .. }),
            "accelerator changed the verdict for {formula}"
        );
    }
}

fn run_batch(content: &str) -> Command {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{content}").unwrap();
    let mut cmd = Command::cargo_bin("leviathan").unwrap();
    cmd.arg(file.path());
    // NamedTempFile deletes on drop; the caller runs `.assert()` after this
    // function returns, so keep the file on disk past this scope.
    std::mem::forget(file);
    cmd
}

#[test]
fn cli_reports_sat_for_a_satisfiable_batch() {
    run_batch("a\n").assert().success().stdout(predicate::str::contains("SAT"));
}

#[test]
fn cli_reports_unsat_for_an_unsatisfiable_batch() {
    run_batch("a & !a\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("UNSAT"));
}

#[test]
fn cli_skips_blank_and_comment_lines() {
    run_batch("# comment\n\na\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("SAT"));
}

#[test]
fn cli_parsable_model_uses_braces_and_loop_marker() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "a\n").unwrap();
    Command::cargo_bin("leviathan")
        .unwrap()
        .arg(file.path())
        .arg("--parsable")
        .arg("--model")
        .assert()
        .success()
        .stdout(predicate::str::contains("SAT;*{a}"));
}

#[test]
fn cli_single_formula_flag_ignores_the_batch_file() {
    Command::cargo_bin("leviathan")
        .unwrap()
        .arg("--ltl")
        .arg("a & !a")
        .assert()
        .success()
        .stdout(predicate::str::contains("UNSAT"));
}

#[test]
fn cli_fails_on_unreadable_batch_file() {
    Command::cargo_bin("leviathan")
        .unwrap()
        .arg("/nonexistent/path/to/formulas.txt")
        .assert()
        .failure();
}
