use std::fmt;

use logos::Logos;

use crate::error::{AnonError, AnonResult};
use crate::registry::Registry;

/// Raw lexical classes. Classification that depends on context (signed
/// numbers, operator and function lookup) happens in [`Tokenizer`].
#[derive(Logos, Debug, PartialEq, Clone, Copy)]
#[logos(skip r"[ \t\r\n\f]+")]
enum RawToken {
    #[regex(r"[0-9][0-9.]*")]
    Number,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Word,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,

    // A run of symbol characters; a minus sign may only open a run.
    #[regex(r"[^A-Za-z0-9_ \t\r\n\f(),][^A-Za-z0-9_ \t\r\n\f(),\-]*")]
    Symbol,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Number(String),
    /// An identifier that is neither a function nor a constant.
    Identifier(String),
    Operator(String),
    /// A function name, lower-cased.
    Function(String),
    LeftParen,
    RightParen,
    Comma,
}

impl Token {
    pub fn text(&self) -> &str {
        match self {
            Token::Number(s) | Token::Identifier(s) | Token::Operator(s) | Token::Function(s) => s,
            Token::LeftParen => "(",
            Token::RightParen => ")",
            Token::Comma => ",",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Splits an expression into tokens, one per call to `next`.
///
/// The cursor only moves forward, and iteration stops after the first
/// error.
pub struct Tokenizer<'r, 's> {
    lexer: logos::Lexer<'s, RawToken>,
    registry: &'r Registry,
    previous: Option<Token>,
    finished: bool,
}

impl<'r, 's> Tokenizer<'r, 's> {
    pub fn new(input: &'s str, registry: &'r Registry) -> Self {
        Tokenizer { lexer: RawToken::lexer(input), registry, previous: None, finished: false }
    }

    /// Byte offset just past the last token read.
    pub fn offset(&self) -> usize {
        self.lexer.span().end
    }

    /// A minus sign starts a number only at the start of the expression or
    /// after `(`, `,` or an operator.
    fn sign_allowed(&self) -> bool {
        matches!(
            self.previous,
            None | Some(Token::LeftParen) | Some(Token::Comma) | Some(Token::Operator(_))
        )
    }

    fn classify(&mut self, raw: RawToken) -> AnonResult<Token> {
        let slice = self.lexer.slice();
        let token = match raw {
            RawToken::Number => Token::Number(slice.to_string()),
            RawToken::Word if self.registry.is_function(slice) => Token::Function(slice.to_lowercase()),
            RawToken::Word => Token::Identifier(slice.to_string()),
            RawToken::LParen => Token::LeftParen,
            RawToken::RParen => Token::RightParen,
            RawToken::Comma => Token::Comma,
            RawToken::Symbol => {
                if slice == "-"
                    && self.sign_allowed()
                    && self.lexer.remainder().starts_with(|c: char| c.is_ascii_digit())
                {
                    return match self.lexer.next() {
                        Some(Ok(RawToken::Number)) => Ok(Token::Number(format!("-{}", self.lexer.slice()))),
                        _ => Err(AnonError::Lex(format!("Malformed number at position {}", self.offset()))),
                    };
                }
                if !self.registry.is_operator(slice) {
                    return Err(AnonError::Lex(format!(
                        "Unknown operator '{}' at position {}",
                        slice,
                        self.lexer.span().start + 1
                    )));
                }
                Token::Operator(slice.to_string())
            }
        };
        Ok(token)
    }
}

impl<'r, 's> Iterator for Tokenizer<'r, 's> {
    type Item = AnonResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = match self.lexer.next()? {
            Ok(raw) => self.classify(raw),
            Err(()) => Err(AnonError::Lex(format!(
                "Unexpected character '{}' at position {}",
                self.lexer.slice(),
                self.lexer.span().start + 1
            ))),
        };
        match &result {
            Ok(token) => self.previous = Some(token.clone()),
            Err(_) => self.finished = true,
        }
        Some(result)
    }
}

/// Tokenize a whole expression eagerly.
pub fn tokenize(input: &str, registry: &Registry) -> AnonResult<Vec<Token>> {
    Tokenizer::new(input, registry).collect()
}
