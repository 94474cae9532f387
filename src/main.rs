mod cli;

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;

use clap::Parser as _;
use leviathan_ltl::engine::SolverResult;
use leviathan_ltl::frame::Arena;
use leviathan_ltl::{model, pool, LtlError};

use cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli.log_filter().to_string()),
    )
    .init();

    if let Some(formula) = &cli.ltl {
        return run_one(&cli, formula, None);
    }
    run_batch(&cli)
}

fn run_batch(cli: &Cli) -> ExitCode {
    let reader: Box<dyn BufRead> = if cli.filename == Path::new("-") {
        Box::new(io::BufReader::new(io::stdin()))
    } else {
        match fs::File::open(&cli.filename) {
            Ok(f) => Box::new(io::BufReader::new(f)),
            Err(e) => {
                log::error!("unable to open {}: {e}", cli.filename.display());
                return ExitCode::FAILURE;
            }
        }
    };

    let mut had_failure = false;
    for (lineno, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::error!("read error on {}: {e}", cli.filename.display());
                had_failure = true;
                break;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        log::info!("line {}: {trimmed}", lineno + 1);
        if run_one(cli, trimmed, Some(&cli.filename)) == ExitCode::FAILURE {
            had_failure = true;
        }
    }

    if had_failure {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run_one(cli: &Cli, formula: &str, source: Option<&Path>) -> ExitCode {
    let (result, pool, arena) =
        match leviathan_ltl::solve(formula, cli.maximum_depth, cli.use_sat_accelerator()) {
            Ok(r) => r,
            Err(e) => {
                report_error(&e);
                return ExitCode::FAILURE;
            }
        };

    if cli.test {
        return run_test_mode(cli, &result, &pool, &arena, source);
    }

    render(cli, &result, &pool, &arena);
    ExitCode::SUCCESS
}

fn render(cli: &Cli, result: &SolverResult, pool: &pool::Pool, arena: &Arena) {
    let model = match result {
        SolverResult::Satisfiable { stack, loop_frame } => Some(model::extract(pool, arena, stack, *loop_frame)),
        SolverResult::Unsatisfiable | SolverResult::Undefined => None,
    };

    if cli.parsable {
        print!("{}", verdict_word(result));
        if cli.model {
            if let Some(model) = &model {
                print!(";{model}");
            }
        }
        println!();
        return;
    }

    println!("{}", verdict_word(result));
    if cli.model {
        if let Some(model) = &model {
            println!("{model}");
        }
    }
}

fn verdict_word(result: &SolverResult) -> &'static str {
    match result {
        SolverResult::Satisfiable { .. } => "SAT",
        SolverResult::Unsatisfiable => "UNSAT",
        SolverResult::Undefined => "UNDEFINED",
    }
}

fn run_test_mode(
    cli: &Cli,
    result: &SolverResult,
    pool: &pool::Pool,
    arena: &Arena,
    source: Option<&Path>,
) -> ExitCode {
    let Some(source) = source.filter(|p| *p != Path::new("-")) else {
        log::error!("--test requires a batch file, not stdin or --ltl");
        return ExitCode::FAILURE;
    };
    let answer_path = answer_sibling(source);
    let expected = match fs::read_to_string(&answer_path) {
        Ok(s) => s,
        Err(e) => {
            log::error!("unable to open {}: {e}", answer_path.display());
            return ExitCode::FAILURE;
        }
    };
    let expected = expected.trim();

    let actual = match result {
        SolverResult::Satisfiable { stack, loop_frame } => {
            model::extract(pool, arena, stack, *loop_frame).to_string()
        }
        SolverResult::Unsatisfiable | SolverResult::Undefined => String::new(),
    };

    if actual == expected {
        ExitCode::SUCCESS
    } else {
        let mut stderr = io::stderr();
        let _ = writeln!(stderr, "mismatch for {}: expected `{expected}`, got `{actual}`", source.display());
        ExitCode::FAILURE
    }
}

fn answer_sibling(source: &Path) -> std::path::PathBuf {
    let mut name = source.file_name().unwrap_or_default().to_os_string();
    name.push(".answer");
    source.with_file_name(name)
}

fn report_error(err: &LtlError) {
    log::error!("{err}");
}
