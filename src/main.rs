// ABOUTME: Command-line driver: script runner, -e evaluator, --test harness, REPL

use clap::Parser;
use psil::config::{HISTORY_FILE, PROMPT, VERSION, WELCOME_FOOTER, WELCOME_MESSAGE};
use psil::highlighter::PsilHelper;
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};
use std::path::PathBuf;

/// The transcript run by `--test` with no file.
const SELFTEST: &str = include_str!("selftest.psil");

/// A small Lisp interpreter with a tail-call trampoline and macros
#[derive(Parser, Debug)]
#[command(name = "psil")]
#[command(version = VERSION)]
#[command(about = "PSIL: a small Lisp interpreter")]
struct CliArgs {
    /// Evaluate an expression string and print the result
    #[arg(short = 'e', value_name = "EXPR")]
    expr: Option<String>,

    /// Run a doctest transcript (the built-in self test when FILE is omitted)
    #[arg(long = "test", value_name = "FILE", num_args = 0..=1)]
    test: Option<Option<PathBuf>>,

    /// Script file to execute (optional - if not provided, starts REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    if let Some(expr) = args.expr {
        psil::rep(&expr)?;
        return Ok(());
    }

    if let Some(test) = args.test {
        let (name, text) = match &test {
            Some(path) => (
                path.display().to_string(),
                std::fs::read_to_string(path)
                    .map_err(|e| format!("cannot read {}: {}", path.display(), e))?,
            ),
            None => ("selftest".to_string(), SELFTEST.to_string()),
        };
        let report = psil::doctest::run_transcript(&name, &text);
        println!("{}: {} passed, {} failed", name, report.passed, report.failed);
        if !report.ok() {
            std::process::exit(1);
        }
        return Ok(());
    }

    if let Some(script) = args.script {
        // Script files are trusted input, read straight off the filesystem.
        psil::include(&script.display().to_string())?;
        return Ok(());
    }

    repl()
}

/// Interactive loop: read a line, evaluate, print the non-nil result.
fn repl() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<PsilHelper, rustyline::history::DefaultHistory> =
        Editor::with_config(config)?;
    rl.set_helper(Some(PsilHelper::new()));
    let _ = rl.load_history(HISTORY_FILE);

    println!("{}", WELCOME_MESSAGE);
    println!("{}", WELCOME_FOOTER);

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "(quit)" || line == "(exit)" {
                    break;
                }
                if let Err(e) = psil::rep(line) {
                    eprintln!("error: {}", e);
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(err) => {
                eprintln!("error: {}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(HISTORY_FILE);
    Ok(())
}
