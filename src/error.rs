use std::io;
use thiserror::Error;

/// Every way an AnonLang expression or statement can fail.
#[derive(Debug, Error)]
pub enum AnonError {
    #[error("Lex Error: {0}")]
    Lex(String),
    #[error("Parse Error: {0}")]
    Parse(String),
    #[error("Evaluation Error: {0}")]
    Eval(String),
    #[error("Variable '{0}' is already declared")]
    DuplicateDeclaration(String),
    #[error("Illegal variable name '{0}'")]
    IllegalName(String),
    #[error("Malformed declaration: {0}")]
    MalformedDeclaration(String),
    #[error("Malformed prefix: {0}")]
    MalformedPrefix(String),
    #[error("Malformed repeat: {0}")]
    MalformedRepeat(String),
    #[error("Variable {name} is of type {expected} but was assigned value {value} of type {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
        value: String,
    },
    #[error("Could not process line #{0}")]
    MalformedLine(usize),
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
    #[error("Initialization failed: {0}")]
    Init(String),
}

impl AnonError {
    /// True for the failures the expression facade may swallow by falling
    /// back to literal text.
    pub fn is_expression_failure(&self) -> bool {
        matches!(self, AnonError::Lex(_) | AnonError::Parse(_) | AnonError::Eval(_))
    }
}

/// A failure while running a program, tagged with the 1-based line that
/// was executing.
#[derive(Debug, Error)]
#[error("line {line}: {kind}")]
pub struct ProgramError {
    pub line: usize,
    #[source]
    pub kind: AnonError,
}

impl ProgramError {
    pub fn new(line: usize, kind: AnonError) -> Self {
        ProgramError { line, kind }
    }

    pub fn kind(&self) -> &AnonError {
        &self.kind
    }
}

pub type AnonResult<T> = Result<T, AnonError>;
