use std::collections::HashMap;
use std::rc::Rc;

use bigdecimal::BigDecimal;
use tracing::debug;

use crate::decimal::MathContext;
use crate::error::{AnonError, AnonResult};
use crate::types::*;

/// Alias chains longer than this are treated as cycles.
const MAX_ALIAS_DEPTH: usize = 8;

/// Operators keyed by symbol, functions and constants keyed by lower-cased
/// name.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    operators: HashMap<String, OperatorDefinition>,
    functions: HashMap<String, FunctionDefinition>,
    constants: HashMap<String, BigDecimal>,
}

impl Registry {
    /// An empty registry with no operators, functions or constants.
    pub fn empty() -> Self {
        Registry::default()
    }

    /// A registry pre-populated with the built-in set.
    pub fn with_builtins() -> Self {
        let mut registry = Registry::empty();
        crate::builtins::install(&mut registry);
        registry
    }

    // --- Extension ---

    /// Register (or replace) a binary operator. Returns the previous
    /// definition for `symbol`, if any.
    pub fn add_operator<F>(
        &mut self,
        symbol: impl Into<String>,
        precedence: u8,
        associativity: OperatorAssociativity,
        rule: F,
    ) -> Option<OperatorDefinition>
    where
        F: Fn(&BigDecimal, &BigDecimal, &MathContext) -> AnonResult<BigDecimal> + 'static,
    {
        let symbol = symbol.into();
        debug!(symbol = %symbol, precedence, %associativity, "registering operator");
        self.operators.insert(
            symbol.clone(),
            OperatorDefinition { symbol, precedence, associativity, rule: OperatorRule::Native(Rc::new(rule)) },
        )
    }

    /// Register `symbol` as a synonym that evaluates through `target`.
    pub fn add_operator_alias(
        &mut self,
        symbol: impl Into<String>,
        precedence: u8,
        associativity: OperatorAssociativity,
        target: impl Into<String>,
    ) -> Option<OperatorDefinition> {
        let symbol = symbol.into();
        let target = target.into();
        debug!(symbol = %symbol, target = %target, "registering operator alias");
        self.operators.insert(
            symbol.clone(),
            OperatorDefinition { symbol, precedence, associativity, rule: OperatorRule::Alias(target) },
        )
    }

    /// Register (or replace) a fixed-arity function. The name is matched
    /// case-insensitively.
    pub fn add_function<F>(&mut self, name: &str, arity: usize, rule: F) -> Option<FunctionDefinition>
    where
        F: Fn(&[BigDecimal], &MathContext) -> AnonResult<BigDecimal> + 'static,
    {
        let name = name.to_lowercase();
        debug!(name = %name, arity, "registering function");
        self.functions.insert(name.clone(), FunctionDefinition { name, arity, rule: Rc::new(rule) })
    }

    /// Register a named constant, matched case-insensitively.
    pub fn add_constant(&mut self, name: &str, value: BigDecimal) -> Option<BigDecimal> {
        self.constants.insert(name.to_lowercase(), value)
    }

    // --- Lookup ---

    pub fn operator(&self, symbol: &str) -> Option<&OperatorDefinition> {
        self.operators.get(symbol)
    }

    pub fn is_operator(&self, symbol: &str) -> bool {
        self.operators.contains_key(symbol)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDefinition> {
        self.functions.get(&name.to_lowercase())
    }

    pub fn is_function(&self, name: &str) -> bool {
        self.function(name).is_some()
    }

    pub fn constant(&self, name: &str) -> Option<&BigDecimal> {
        self.constants.get(&name.to_lowercase())
    }

    // --- Evaluation ---

    /// Apply the operator registered under `symbol`, following aliases.
    /// Results with an out-of-range exponent are overflow errors.
    pub fn apply_operator(
        &self,
        symbol: &str,
        left: &BigDecimal,
        right: &BigDecimal,
        context: &MathContext,
    ) -> AnonResult<BigDecimal> {
        let mut current = symbol;
        for _ in 0..MAX_ALIAS_DEPTH {
            let op = self
                .operators
                .get(current)
                .ok_or_else(|| AnonError::Eval(format!("Unknown operator '{}'", current)))?;
            match &op.rule {
                OperatorRule::Native(rule) => return context.check(rule(left, right, context)?),
                OperatorRule::Alias(target) => current = target.as_str(),
            }
        }
        Err(AnonError::Eval(format!("Operator '{}' aliases itself", symbol)))
    }

    /// Apply the function registered under `name` to its arguments, which
    /// must match its arity exactly.
    pub fn apply_function(&self, name: &str, args: &[BigDecimal], context: &MathContext) -> AnonResult<BigDecimal> {
        let function = self
            .function(name)
            .ok_or_else(|| AnonError::Eval(format!("Unknown function '{}'", name)))?;
        if args.len() != function.arity {
            return Err(AnonError::Eval(format!(
                "{}() takes {} argument(s) but got {}",
                function.name,
                function.arity,
                args.len()
            )));
        }
        context.check((function.rule)(args, context)?)
    }
}
