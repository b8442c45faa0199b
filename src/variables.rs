use std::collections::HashMap;

use crate::error::{AnonError, AnonResult};
use crate::value::Value;

/// Program variables. A variable's type is fixed by its first value.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    vars: HashMap<String, Value>,
}

impl VariableStore {
    pub fn new() -> Self {
        VariableStore::default()
    }

    /// Create a new variable.
    pub fn declare(&mut self, name: &str, value: Value) -> AnonResult<()> {
        self.check_declarable(name)?;
        self.vars.insert(name.to_string(), value);
        Ok(())
    }

    /// Whether `declare(name, ..)` would accept the name.
    pub fn check_declarable(&self, name: &str) -> AnonResult<()> {
        check_name(name)?;
        if self.vars.contains_key(name) {
            return Err(AnonError::DuplicateDeclaration(name.to_string()));
        }
        Ok(())
    }

    /// Overwrite a variable through its type lock, declaring it if it does
    /// not exist yet. A rejected value leaves the variable untouched.
    pub fn assign(&mut self, name: &str, value: Value) -> AnonResult<()> {
        let current = match self.vars.get_mut(name) {
            Some(current) => current,
            None => return self.declare(name, value),
        };
        let expected = current.kind();
        let found = value.kind();
        if !expected.accepts(found) {
            return Err(AnonError::TypeMismatch {
                name: name.to_string(),
                expected: expected.name(),
                found: found.name(),
                value: value.to_string(),
            });
        }
        *current = value.coerce(expected)?;
        Ok(())
    }

    pub fn read(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn clear(&mut self) {
        self.vars.clear();
    }
}

fn check_name(name: &str) -> AnonResult<()> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(AnonError::IllegalName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    #[test]
    fn declare_rejects_duplicates_and_bad_names() {
        let mut store = VariableStore::new();
        store.declare("x", Value::Integer(1)).unwrap();
        assert!(matches!(store.declare("x", Value::Integer(2)), Err(AnonError::DuplicateDeclaration(n)) if n == "x"));
        assert!(matches!(store.declare("", Value::Integer(2)), Err(AnonError::IllegalName(_))));
        assert!(matches!(store.declare("a b", Value::Integer(2)), Err(AnonError::IllegalName(_))));
        assert_eq!(store.read("x"), Some(&Value::Integer(1)));
    }

    #[test]
    fn assign_coerces_between_numbers() {
        let mut store = VariableStore::new();
        store.declare("n", Value::Integer(1)).unwrap();
        store.assign("n", Value::Decimal(BigDecimal::from_str("2.5").unwrap())).unwrap();
        assert_eq!(store.read("n"), Some(&Value::Integer(3)));

        store.declare("d", Value::Decimal(BigDecimal::from_str("0.5").unwrap())).unwrap();
        store.assign("d", Value::Integer(7)).unwrap();
        assert_eq!(store.read("d").map(Value::kind), Some(ValueKind::Decimal));
        assert_eq!(store.read("d").map(Value::to_string).as_deref(), Some("7"));
    }

    #[test]
    fn integer_overflow_is_not_a_type_mismatch() {
        let mut store = VariableStore::new();
        store.declare("n", Value::Integer(1)).unwrap();
        let err = store.assign("n", Value::Decimal(BigDecimal::from_str("1e20").unwrap())).unwrap_err();
        assert!(matches!(err, AnonError::Eval(_)), "{err:?}");
        assert_eq!(store.read("n"), Some(&Value::Integer(1)));
    }

    #[test]
    fn text_and_numbers_do_not_mix() {
        let mut store = VariableStore::new();
        store.declare("x", Value::Integer(5)).unwrap();
        let err = store.assign("x", Value::from("\"hello\"")).unwrap_err();
        assert!(matches!(err, AnonError::TypeMismatch { expected: "Integer", found: "Text", .. }));
        assert_eq!(store.read("x"), Some(&Value::Integer(5)));

        store.declare("s", Value::from("abc")).unwrap();
        assert!(store.assign("s", Value::Integer(1)).is_err());
        assert_eq!(store.read("s"), Some(&Value::from("abc")));
    }

    #[test]
    fn assign_declares_missing_names() {
        let mut store = VariableStore::new();
        store.assign("fresh", Value::from("text")).unwrap();
        assert_eq!(store.read("fresh").map(Value::kind), Some(ValueKind::Text));
        assert!(store.assign("bad name", Value::Integer(1)).is_err());
    }

    #[test]
    fn clear_empties_the_store() {
        let mut store = VariableStore::new();
        store.declare("a", Value::Integer(1)).unwrap();
        store.declare("b", Value::Integer(2)).unwrap();
        assert_eq!(store.len(), 2);
        store.clear();
        assert!(store.is_empty());
        assert!(!store.contains("a"));
    }
}
