use std::fmt;
use std::rc::Rc;

use bigdecimal::BigDecimal;

use crate::decimal::MathContext;
use crate::error::AnonResult;

/// Evaluation rule of a binary operator: `(left, right) -> result`.
pub type BinaryRule = Rc<dyn Fn(&BigDecimal, &BigDecimal, &MathContext) -> AnonResult<BigDecimal>>;

/// Evaluation rule of a function over its arguments in call order.
pub type FunctionRule = Rc<dyn Fn(&[BigDecimal], &MathContext) -> AnonResult<BigDecimal>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorAssociativity {
    Left,
    Right,
}

impl fmt::Display for OperatorAssociativity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// How an operator computes its result.
#[derive(Clone)]
pub enum OperatorRule {
    Native(BinaryRule),
    /// Delegates to whatever operator is registered under this symbol at
    /// evaluation time.
    Alias(String),
}

#[derive(Clone)]
pub struct OperatorDefinition {
    pub symbol: String,
    pub precedence: u8,
    pub associativity: OperatorAssociativity,
    pub rule: OperatorRule,
}

impl OperatorDefinition {
    /// Whether an operator already on the stack must be emitted before this
    /// one is pushed.
    pub fn yields_to(&self, stacked: &OperatorDefinition) -> bool {
        (self.associativity == OperatorAssociativity::Left && self.precedence <= stacked.precedence)
            || self.precedence < stacked.precedence
    }
}

impl fmt::Debug for OperatorDefinition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rule = match &self.rule {
            OperatorRule::Native(_) => "native".to_string(),
            OperatorRule::Alias(target) => format!("alias of {}", target),
        };
        f.debug_struct("OperatorDefinition")
            .field("symbol", &self.symbol)
            .field("precedence", &self.precedence)
            .field("associativity", &self.associativity)
            .field("rule", &rule)
            .finish()
    }
}

#[derive(Clone)]
pub struct FunctionDefinition {
    /// Lower-cased; lookups are case-insensitive.
    pub name: String,
    pub arity: usize,
    pub rule: FunctionRule,
}

impl fmt::Debug for FunctionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FunctionDefinition")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}
