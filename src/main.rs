use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::Parser;

use setsuna::interpreter::Evaluator;
use setsuna::{lexer, parser, Value};

/// The Setsuna programming language: runs a script, or starts the REPL
/// when no file is given.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Script to evaluate (`Name.stsn`). Omit to start the REPL.
    file: Option<PathBuf>,
}

/// Where the standard prelude may live, tried in order. Missing prelude
/// is fine; the interpreter works without it.
const PRELUDE_SEARCH_PATHS: &[&str] = &[
    "stdlib/prelude.stsn",
    "../stdlib/prelude.stsn",
    "../../stdlib/prelude.stsn",
    "/usr/local/share/setsuna/prelude.stsn",
    "/usr/share/setsuna/prelude.stsn",
];

fn load_prelude(evaluator: &mut Evaluator) {
    let Some(path) = PRELUDE_SEARCH_PATHS
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
    else {
        return;
    };

    let Ok(source) = fs::read_to_string(path) else {
        return;
    };

    if let Err(e) = eval_source(evaluator, &source, &path.display().to_string()) {
        eprintln!("warning: failed to load prelude: {e}");
    }
}

fn eval_source(evaluator: &mut Evaluator, source: &str, filename: &str) -> setsuna::Result<Value> {
    let tokens = lexer::tokenize(source, filename)?;
    let program = parser::parse(tokens)?;
    evaluator.eval_program(&program)
}

fn run_file(path: &Path) -> anyhow::Result<()> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("could not open file: {}", path.display()))?;

    let mut evaluator = Evaluator::with_builtins();
    if let Some(dir) = path.parent() {
        evaluator.set_base_dir(dir);
    }
    load_prelude(&mut evaluator);

    let result = eval_source(&mut evaluator, &source, &path.display().to_string())?;

    if !result.is_unit() {
        println!("{result}");
    }
    Ok(())
}

fn repl() -> anyhow::Result<()> {
    println!("Setsuna v{} - Functional Programming Language", env!("CARGO_PKG_VERSION"));
    println!("Type expressions to evaluate. Type 'exit' or Ctrl+D to quit.\n");

    let mut evaluator = Evaluator::with_builtins();
    load_prelude(&mut evaluator);

    let stdin = io::stdin();
    let mut buffer = String::new();
    let mut open_braces = 0i32;
    let mut open_brackets = 0i32;
    let mut open_parens = 0i32;

    loop {
        if buffer.is_empty() {
            print!(">> ");
        } else {
            print!(".. ");
        }
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!("\nGoodbye!");
            break;
        }
        let line = line.trim_end_matches(['\n', '\r']);

        if buffer.is_empty() && line == "exit" {
            println!("Goodbye!");
            break;
        }

        // Track delimiter balance so multi-line forms accumulate until
        // they close.
        for c in line.chars() {
            match c {
                '{' => open_braces += 1,
                '}' => open_braces -= 1,
                '[' => open_brackets += 1,
                ']' => open_brackets -= 1,
                '(' => open_parens += 1,
                ')' => open_parens -= 1,
                _ => {}
            }
        }

        buffer.push_str(line);
        buffer.push('\n');

        if open_braces <= 0 && open_brackets <= 0 && open_parens <= 0 {
            open_braces = 0;
            open_brackets = 0;
            open_parens = 0;

            match eval_source(&mut evaluator, &buffer, "<repl>") {
                Ok(result) if !result.is_unit() => println!("=> {result}"),
                Ok(_) => {}
                Err(e) => eprintln!("{e}"),
            }

            buffer.clear();
        }
    }

    Ok(())
}

fn main() {
    let args = Args::parse();

    let result = match &args.file {
        Some(path) => run_file(path),
        None => repl(),
    };

    if let Err(e) = result {
        eprintln!("{e}");
        process::exit(1);
    }
}
