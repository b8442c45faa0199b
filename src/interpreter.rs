//! The statement interpreter.
//!
//! A program is a slice of statements run top to bottom. `repeat <n>`
//! captures the line right after it as its body, runs that body `n` times
//! and then continues after it, so the body is never run a further time by
//! the sequential walk.

use std::io;

use tracing::{debug, info};

use crate::engine::Engine;
use crate::error::{AnonError, AnonResult, ProgramError};
use crate::statement::Statement;
use crate::substitute::{substitute, CONCAT_MARKER};
use crate::value::Value;
use crate::variables::VariableStore;

/// Where program output goes.
pub trait Sink {
    fn write_text(&mut self, text: &str) -> io::Result<()>;
    fn write_line(&mut self, text: &str) -> io::Result<()>;
}

impl<W: io::Write> Sink for W {
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        write!(self, "{}", text)?;
        self.flush()
    }

    fn write_line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self, "{}", text)
    }
}

pub struct Interpreter<S: Sink> {
    engine: Engine,
    variables: VariableStore,
    sink: S,
    /// Set by a `repeat` entered through `execute_line`; the next line is
    /// its body.
    pending_repeat: Option<u64>,
    session_line: usize,
}

impl<S: Sink> Interpreter<S> {
    pub fn new(sink: S) -> Self {
        Interpreter::with_engine(sink, Engine::new())
    }

    pub fn with_engine(sink: S, engine: Engine) -> Self {
        Interpreter { engine, variables: VariableStore::new(), sink, pending_repeat: None, session_line: 0 }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Mutable access to the engine, to register operators and functions.
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.read(name)
    }

    pub fn pending_repeat(&self) -> bool {
        self.pending_repeat.is_some()
    }

    pub fn output(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Forget all variables and any half-entered `repeat`.
    pub fn reset(&mut self) {
        self.variables.clear();
        self.pending_repeat = None;
        self.session_line = 0;
    }

    /// Run a whole program. The variable store starts and ends empty
    /// whether or not the run succeeds.
    pub fn run_program<L: AsRef<str>>(&mut self, lines: &[L]) -> Result<(), ProgramError> {
        self.reset();
        info!(statements = lines.len(), "running program");
        let result = self.run_lines(lines);
        self.reset();
        match &result {
            Ok(()) => info!("program finished"),
            Err(err) => info!(line = err.line, error = %err.kind, "program stopped"),
        }
        result
    }

    fn run_lines<L: AsRef<str>>(&mut self, lines: &[L]) -> Result<(), ProgramError> {
        let mut index = 0;
        while index < lines.len() {
            let number = index + 1;
            let line = lines[index].as_ref();
            debug!(line = number, text = line, "executing");
            let statement = parse_line(line, number)?;

            if let Statement::Repeat(amount) = &statement {
                let count = self.repeat_count(amount).map_err(|e| ProgramError::new(number, e))?;
                let body_line = lines.get(index + 1).ok_or_else(|| {
                    ProgramError::new(number, AnonError::MalformedRepeat("repeat has no line to repeat".into()))
                })?;
                let body = parse_line(body_line.as_ref(), number + 1)?;
                self.run_repeat(count, &body, number + 1).map_err(|e| ProgramError::new(number + 1, e))?;
                index += 2;
            } else {
                self.execute(&statement, number).map_err(|e| ProgramError::new(number, e))?;
                index += 1;
            }
        }
        Ok(())
    }

    /// Run one statement against the current session state. A `repeat`
    /// makes the next call's line its body.
    pub fn execute_line(&mut self, line: &str) -> AnonResult<()> {
        self.session_line += 1;
        let number = self.session_line;
        let statement = Statement::parse(line).ok_or(AnonError::MalformedLine(number));

        if let Some(count) = self.pending_repeat.take() {
            return self.run_repeat(count, &statement?, number);
        }
        match statement? {
            Statement::Repeat(amount) => {
                self.pending_repeat = Some(self.repeat_count(&amount)?);
                Ok(())
            }
            other => self.execute(&other, number),
        }
    }

    fn run_repeat(&mut self, count: u64, body: &Statement, number: usize) -> AnonResult<()> {
        debug!(count, line = number, "repeating");
        for _ in 0..count {
            self.execute(body, number)?;
        }
        Ok(())
    }

    fn execute(&mut self, statement: &Statement, number: usize) -> AnonResult<()> {
        match statement {
            Statement::Write(text) => {
                let rendered = self.render(text);
                self.sink.write_text(&rendered)?;
            }
            Statement::WriteLine(text) => {
                let rendered = text.as_deref().map(|t| self.render(t)).unwrap_or_default();
                self.sink.write_line(&rendered)?;
            }
            Statement::Declare { name, initializer } => {
                self.variables.check_declarable(name)?;
                let value = self.resolve(initializer);
                if value.to_string().is_empty() {
                    return Err(AnonError::MalformedDeclaration(format!(
                        "Initial value for variable {} not set",
                        name
                    )));
                }
                self.variables.declare(name, value)?;
            }
            Statement::Increment(name) => self.step(name, 1, "increment")?,
            Statement::Decrement(name) => self.step(name, -1, "decrement")?,
            Statement::Repeat(_) => {
                return Err(AnonError::MalformedRepeat("the line after a repeat cannot be another repeat".into()));
            }
            Statement::Assign { name, expression } => {
                if !self.variables.contains(name) {
                    return Err(AnonError::MalformedLine(number));
                }
                let value = self.resolve(expression);
                self.variables.assign(name, value)?;
            }
        }
        Ok(())
    }

    fn step(&mut self, name: &str, delta: i64, verb: &str) -> AnonResult<()> {
        let current = self
            .variables
            .read(name)
            .ok_or_else(|| AnonError::MalformedPrefix(format!("Tried to {} non-existent variable {}", verb, name)))?;
        if !current.is_numeric() {
            return Err(AnonError::MalformedPrefix(format!("Tried to {} non-numeric variable {}", verb, name)));
        }
        let next = current.offset(delta)?;
        self.variables.assign(name, next)
    }

    fn repeat_count(&self, amount: &str) -> AnonResult<u64> {
        let count = match self.resolve(amount) {
            Value::Integer(n) => Some(n),
            Value::Decimal(d) => match Value::from_decimal(d) {
                Value::Integer(n) => Some(n),
                _ => None,
            },
            Value::Text(_) => None,
        };
        match count {
            Some(n) if n > 0 => Ok(n as u64),
            _ => Err(AnonError::MalformedRepeat(format!("{} is not a valid repeat amount", amount))),
        }
    }

    fn resolve(&self, text: &str) -> Value {
        self.engine.resolve(&substitute(text, &self.variables))
    }

    /// Substitute, then resolve each `&conc&`-separated part on its own.
    fn render(&self, text: &str) -> String {
        substitute(text, &self.variables)
            .split(CONCAT_MARKER)
            .map(|part| self.engine.resolve(part.trim()).to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn parse_line(line: &str, number: usize) -> Result<Statement, ProgramError> {
    Statement::parse(line).ok_or_else(|| ProgramError::new(number, AnonError::MalformedLine(number)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(lines: &[&str]) -> Result<String, ProgramError> {
        let mut interpreter = Interpreter::new(Vec::new());
        interpreter.run_program(lines)?;
        Ok(String::from_utf8(interpreter.into_sink()).unwrap())
    }

    #[test]
    fn increment_then_write() {
        assert_eq!(run(&["var x = 5", "++x", "write x"]).unwrap(), "6");
    }

    #[test]
    fn writeln_and_concatenation() {
        let out = run(&["var a = 2", "writeln a * 3 &conc& a + 1", "writeln", "write hello"]).unwrap();
        assert_eq!(out, "6 3\n\nhello");
    }

    #[test]
    fn repeat_runs_body_and_skips_it_afterwards() {
        let out = run(&["var x = 0", "repeat 3", "++x", "write x"]).unwrap();
        assert_eq!(out, "3");
    }

    #[test]
    fn repeat_count_can_be_an_expression() {
        let out = run(&["var n = 2", "var t = 0", "repeat n * 2", "t = t + n", "write t"]).unwrap();
        assert_eq!(out, "8");
    }

    #[test]
    fn integral_decimal_count_is_accepted() {
        assert_eq!(run(&["var x = 0", "repeat 2.0", "++x", "write x"]).unwrap(), "2");
    }

    #[test]
    fn repeat_rejects_bad_counts() {
        for count in ["0", "-2", "1.5", "many"] {
            let repeat = format!("repeat {}", count);
            let err = run(&["var x = 0", repeat.as_str(), "++x"]).unwrap_err();
            assert!(matches!(err.kind(), AnonError::MalformedRepeat(_)), "{count}: {err}");
            assert_eq!(err.line, 2);
        }
    }

    #[test]
    fn repeat_needs_a_body_line() {
        let err = run(&["repeat 2"]).unwrap_err();
        assert!(matches!(err.kind(), AnonError::MalformedRepeat(_)));
    }

    #[test]
    fn nested_repeat_is_rejected() {
        let err = run(&["repeat 2", "repeat 2", "writeln 1"]).unwrap_err();
        assert!(matches!(err.kind(), AnonError::MalformedRepeat(_)));
        assert_eq!(err.line, 2);
    }

    #[test]
    fn body_errors_report_the_body_line() {
        let err = run(&["var s = abc", "repeat 2", "++s"]).unwrap_err();
        assert!(matches!(err.kind(), AnonError::MalformedPrefix(_)));
        assert_eq!(err.line, 3);
    }

    #[test]
    fn unknown_line_is_malformed() {
        let err = run(&["var x = 1", "print x"]).unwrap_err();
        assert!(matches!(err.kind(), AnonError::MalformedLine(2)));
        assert_eq!(err.to_string(), "line 2: Could not process line #2");
    }

    #[test]
    fn assignment_to_undeclared_name_is_malformed() {
        let err = run(&["y = 3"]).unwrap_err();
        assert!(matches!(err.kind(), AnonError::MalformedLine(1)));
    }

    #[test]
    fn declaration_errors() {
        assert!(matches!(run(&["var x = 1", "var x = 2"]).unwrap_err().kind(), AnonError::DuplicateDeclaration(_)));
        assert!(matches!(run(&["var = 2"]).unwrap_err().kind(), AnonError::IllegalName(_)));
        assert!(matches!(run(&["var x"]).unwrap_err().kind(), AnonError::MalformedDeclaration(_)));
    }

    #[test]
    fn prefix_errors() {
        assert!(matches!(run(&["++ghost"]).unwrap_err().kind(), AnonError::MalformedPrefix(_)));
        assert!(matches!(run(&["var s = text", "--s"]).unwrap_err().kind(), AnonError::MalformedPrefix(_)));
    }

    #[test]
    fn decimals_step_by_one() {
        assert_eq!(run(&["var d = 1.5", "--d", "--d", "write d"]).unwrap(), "-0.5");
    }

    #[test]
    fn store_is_cleared_after_each_run() {
        let mut interpreter = Interpreter::new(Vec::new());
        interpreter.run_program(&["var x = 1"]).unwrap();
        assert!(interpreter.variable("x").is_none());
        interpreter.run_program(&["var x = 2", "write x"]).unwrap();
        assert!(interpreter.run_program(&["oops"]).is_err());
        assert!(interpreter.variable("x").is_none());
        assert_eq!(interpreter.output(), b"2");
    }

    #[test]
    fn type_mismatch_keeps_old_value() {
        let mut interpreter = Interpreter::new(Vec::new());
        interpreter.execute_line("var x = 5").unwrap();
        let err = interpreter.execute_line("x = \"hello\"").unwrap_err();
        assert!(matches!(err, AnonError::TypeMismatch { .. }));
        assert_eq!(interpreter.variable("x"), Some(&Value::Integer(5)));
    }

    #[test]
    fn session_repeat_uses_next_line() {
        let mut interpreter = Interpreter::new(Vec::new());
        interpreter.execute_line("var i = 0").unwrap();
        interpreter.execute_line("repeat 4").unwrap();
        assert!(interpreter.pending_repeat());
        interpreter.execute_line("++i").unwrap();
        assert!(!interpreter.pending_repeat());
        assert_eq!(interpreter.variable("i"), Some(&Value::Integer(4)));
    }

    #[test]
    fn custom_function_is_visible_to_programs() {
        let mut interpreter = Interpreter::new(Vec::new());
        interpreter.engine_mut().add_function("triple", 1, |args, mc| {
            Ok(mc.multiply(&args[0], &bigdecimal::BigDecimal::from(3)))
        });
        interpreter.run_program(&["var x = triple(7)", "write x"]).unwrap();
        assert_eq!(interpreter.output(), b"21");
    }
}
