use bigdecimal::BigDecimal;

use crate::decimal::{self, MathContext};
use crate::engine::Engine;
use crate::error::{AnonError, AnonResult};
use crate::parser;
use crate::registry::Registry;
use crate::tokenizer::{Token, Tokenizer};

/// Run a postfix sequence on a value stack.
///
/// Exactly one value must remain once every token has been consumed. The
/// result has its trailing zeros stripped.
pub fn evaluate_postfix(postfix: &[Token], registry: &Registry, context: &MathContext) -> AnonResult<BigDecimal> {
    let mut stack: Vec<BigDecimal> = Vec::with_capacity(postfix.len());

    for token in postfix {
        match token {
            Token::Operator(symbol) => {
                let (right, left) = match (stack.pop(), stack.pop()) {
                    (Some(right), Some(left)) => (right, left),
                    _ => {
                        return Err(AnonError::Eval(format!("Missing operand for '{}'", symbol)));
                    }
                };
                stack.push(registry.apply_operator(symbol, &left, &right, context)?);
            }
            Token::Function(name) => {
                let arity = registry
                    .function(name)
                    .map(|f| f.arity)
                    .ok_or_else(|| AnonError::Eval(format!("Unknown function '{}'", name)))?;
                if stack.len() < arity {
                    return Err(AnonError::Eval(format!(
                        "{}() takes {} argument(s) but got {}",
                        name,
                        arity,
                        stack.len()
                    )));
                }
                let args = stack.split_off(stack.len() - arity);
                stack.push(registry.apply_function(name, &args, context)?);
            }
            other => stack.push(decimal::parse(other.text(), context)?),
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(result), true) => Ok(result.normalized()),
        (None, _) => Err(AnonError::Eval("Empty expression".into())),
        (Some(_), false) => Err(AnonError::Eval(format!("Missing operator: {} values left over", stack.len() + 1))),
    }
}

/// A single expression bound to an engine.
///
/// The postfix form is computed on first use and reused by every later
/// evaluation.
pub struct Expression<'e> {
    engine: &'e Engine,
    text: String,
    postfix: Option<Vec<Token>>,
}

impl<'e> Expression<'e> {
    pub fn new(engine: &'e Engine, text: impl Into<String>) -> Self {
        Expression { engine, text: text.into(), postfix: None }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn postfix(&mut self) -> AnonResult<&[Token]> {
        if self.postfix.is_none() {
            let registry = self.engine.registry();
            self.postfix = Some(parser::to_postfix(Tokenizer::new(&self.text, registry), registry)?);
        }
        Ok(self.postfix.as_deref().unwrap_or_default())
    }

    pub fn evaluate(&mut self) -> AnonResult<BigDecimal> {
        let engine = self.engine;
        let postfix = self.postfix()?;
        evaluate_postfix(postfix, engine.registry(), engine.context())
    }
}
