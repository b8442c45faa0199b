//! AnonLang: a small statement interpreter over an exact decimal expression
//! engine.
//!
//! # Overview
//!
//! A program is a flat list of statements (`write`, `writeln`, `var`,
//! `++`/`--`, `repeat` and assignment) run top to bottom against a
//! type-locked variable store. Every expression goes through the engine:
//!
//! 1. **Tokenizing (`logos`).** A declarative raw lexer classifies digits,
//!    words, parentheses and symbol runs; a thin wrapper tells a negative
//!    number from subtraction and checks symbols against the registry.
//! 2. **Shunting-yard parsing.** Tokens are reordered into postfix using the
//!    precedence and associativity of each registered operator.
//! 3. **Postfix evaluation.** A value stack computes one `BigDecimal`, every
//!    step rounded to 32 significant digits, half-up.
//!
//! Operators, functions and constants live in a [`Registry`] that embedders
//! can extend at runtime.
//!
//! ```
//! use anonlang::{Engine, Interpreter, Value};
//!
//! let engine = Engine::new();
//! assert_eq!(engine.resolve("2 + 3 * 4"), Value::Integer(14));
//!
//! let mut interpreter = Interpreter::new(Vec::new());
//! interpreter.run_program(&["var x = 5", "++x", "write x"]).unwrap();
//! assert_eq!(interpreter.output(), b"6");
//! ```

pub mod config;
pub mod decimal;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod interpreter;
pub mod parser;
pub mod registry;
pub mod source;
pub mod statement;
pub mod substitute;
pub mod tokenizer;
pub mod types;
pub mod value;
pub mod variables;

mod builtins;

pub use config::Config;
pub use engine::Engine;
pub use error::{AnonError, AnonResult, ProgramError};
pub use interpreter::{Interpreter, Sink};
pub use registry::Registry;
pub use source::split_statements;
pub use types::OperatorAssociativity;
pub use value::{Value, ValueKind};
