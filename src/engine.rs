//! The expression engine facade.
//!
//! [`Engine`] owns the operator/function [`Registry`] and the
//! [`MathContext`] every arithmetic step is rounded through. Statements
//! reach it through [`Engine::resolve`], which never fails: text that is
//! not a number and not a valid expression comes back unchanged.

use bigdecimal::BigDecimal;
use tracing::trace;

use crate::decimal::{self, MathContext};
use crate::error::AnonResult;
use crate::evaluator::Expression;
use crate::registry::Registry;
use crate::types::OperatorAssociativity;
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct Engine {
    registry: Registry,
    context: MathContext,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

impl Engine {
    /// An engine with the built-in registry and a 32-digit context.
    pub fn new() -> Self {
        Engine::with_precision(MathContext::DEFAULT_PRECISION)
    }

    pub fn with_precision(precision: u64) -> Self {
        Engine { registry: Registry::with_builtins(), context: MathContext::new(precision) }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn context(&self) -> &MathContext {
        &self.context
    }

    /// Register a binary operator for every expression this engine
    /// evaluates from now on.
    pub fn add_operator<F>(&mut self, symbol: &str, precedence: u8, associativity: OperatorAssociativity, rule: F)
    where
        F: Fn(&BigDecimal, &BigDecimal, &MathContext) -> AnonResult<BigDecimal> + 'static,
    {
        self.registry.add_operator(symbol, precedence, associativity, rule);
    }

    pub fn add_function<F>(&mut self, name: &str, arity: usize, rule: F)
    where
        F: Fn(&[BigDecimal], &MathContext) -> AnonResult<BigDecimal> + 'static,
    {
        self.registry.add_function(name, arity, rule);
    }

    pub fn expression(&self, text: impl Into<String>) -> Expression<'_> {
        Expression::new(self, text)
    }

    /// Tokenize, parse and evaluate `text` in one go.
    pub fn evaluate(&self, text: &str) -> AnonResult<BigDecimal> {
        self.expression(text).evaluate()
    }

    /// Turn `text` into a value: an integer literal, then a decimal
    /// literal, then a full expression. Failing all three, the text itself.
    pub fn resolve(&self, text: &str) -> Value {
        if let Ok(n) = text.parse::<i64>() {
            return Value::Integer(n);
        }
        if let Ok(d) = decimal::parse(text, &self.context) {
            return Value::Decimal(d.normalized());
        }
        match self.evaluate(text) {
            Ok(result) => Value::from_decimal(result),
            Err(err) => {
                trace!(text, error = %err, "not an expression, keeping literal text");
                Value::Text(text.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnonError;

    #[test]
    fn resolve_prefers_literals() {
        let engine = Engine::new();
        assert_eq!(engine.resolve("42"), Value::Integer(42));
        assert_eq!(engine.resolve("-7"), Value::Integer(-7));
        assert_eq!(engine.resolve("2.50").to_string(), "2.5");
        assert!(matches!(engine.resolve("2.50"), Value::Decimal(_)));
    }

    #[test]
    fn resolve_evaluates_expressions() {
        let engine = Engine::new();
        assert_eq!(engine.resolve("2 + 3 * 4"), Value::Integer(14));
        assert_eq!(engine.resolve("10 / 4").to_string(), "2.5");
        assert_eq!(engine.resolve("1.5 * 2"), Value::Integer(3));
    }

    #[test]
    fn resolve_falls_back_to_text() {
        let engine = Engine::new();
        assert_eq!(engine.resolve("hello world"), Value::Text("hello world".into()));
        assert_eq!(engine.resolve("\"quoted\""), Value::Text("\"quoted\"".into()));
        assert_eq!(engine.resolve("1 / 0"), Value::Text("1 / 0".into()));
        assert_eq!(engine.resolve("1e999999999999999"), Value::Text("1e999999999999999".into()));
        assert_eq!(engine.resolve("10^2000000000"), Value::Text("10^2000000000".into()));
    }

    #[test]
    fn custom_function_and_operator() {
        let mut engine = Engine::new();
        engine.add_function("double", 1, |args, mc| Ok(mc.add(&args[0], &args[0])));
        engine.add_operator("@", 30, OperatorAssociativity::Left, |l, r, mc| {
            Ok(mc.subtract(&mc.multiply(l, r), &BigDecimal::from(1)))
        });
        assert_eq!(engine.resolve("DOUBLE(21)"), Value::Integer(42));
        assert_eq!(engine.resolve("3 @ 4 + 1"), Value::Integer(12));
    }

    #[test]
    fn precision_is_configurable() {
        let engine = Engine::with_precision(5);
        assert_eq!(engine.resolve("1 / 3").to_string(), "0.33333");
        assert!(matches!(engine.evaluate("1 $ 2"), Err(AnonError::Lex(_))));
    }
}
