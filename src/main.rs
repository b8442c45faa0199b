/*
 * anonlang - command-line runner for AnonLang programs
 *
 * === Usage ===
 *
 *   anonlang <file>...   run each file in turn on a fresh variable store
 *   anonlang             interactive prompt, one statement per line
 *
 * Source files may put several statements on one line separated by `;`.
 * Program output goes to stdout; diagnostics and logs go to stderr. Set
 * `RUST_LOG` (or `ANONLANG_LOG`) to see the interpreter's tracing output.
 */

// --- Crate Imports & `use` statements ---
use std::fs;
use std::io::{self, Stdout};
use std::path::Path;
use std::process;

use anonlang::{split_statements, AnonError, Config, Engine, Interpreter};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

// --- Main Entry Point ---
fn main() {
    let config = Config::from_env();
    init_logging(&config);

    let files: Vec<String> = std::env::args().skip(1).collect();
    let mut interpreter = Interpreter::with_engine(io::stdout(), Engine::with_precision(config.precision));

    if files.is_empty() {
        if let Err(e) = run_interactive(&mut interpreter, &config) {
            eprintln!("anonlang: A critical error occurred: {}", e);
            process::exit(1);
        }
        return;
    }

    for file in &files {
        if let Err(e) = run_file(&mut interpreter, Path::new(file)) {
            println!();
            eprintln!("anonlang: {}: {}", file, e);
            process::exit(1);
        }
        println!();
    }
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn run_file(interpreter: &mut Interpreter<Stdout>, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let source = fs::read_to_string(path)?;
    let statements = split_statements(&source);
    interpreter.run_program(&statements)?;
    Ok(())
}

/// Runs the interactive prompt loop.
fn run_interactive(interpreter: &mut Interpreter<Stdout>, config: &Config) -> Result<(), AnonError> {
    let mut rl = DefaultEditor::new().map_err(|e| AnonError::Init(e.to_string()))?;

    if let Some(path) = &config.history_file {
        if path.exists() {
            let _ = rl.load_history(path);
        }
    }

    loop {
        let prompt = if interpreter.pending_repeat() { "anon...> " } else { "anon> " };
        match rl.readline(prompt) {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                for statement in split_statements(&line) {
                    if let Err(e) = interpreter.execute_line(&statement) {
                        println!();
                        eprintln!("anonlang: {}", e);
                        break;
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C
                println!("^C");
            }
            Err(ReadlineError::Eof) => {
                // Ctrl-D
                println!();
                break;
            }
            Err(err) => {
                eprintln!("anonlang: Readline error: {}", err);
                break;
            }
        }
    }

    if let Some(path) = &config.history_file {
        let _ = rl.save_history(path);
    }
    Ok(())
}
