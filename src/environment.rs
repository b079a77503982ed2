use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;

/// A lexical scope: a name→value map linked to its enclosing scope.
///
/// Scopes are shared (`Rc<RefCell<_>>`) because every function value keeps a
/// reference to the environment in effect at its declaration site, which must
/// outlive the block that created it.
#[derive(Debug, Clone)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Unconditionally insert into this scope; shadowing is allowed.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined_variable(name))
        }
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if self.values.contains_key(&name.lexeme) {
            self.values.insert(name.lexeme.clone(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined_variable(name))
        }
    }

    /// Read strictly from the scope `distance` hops out; `None` when that
    /// scope has no such binding. The caller owns the error wording.
    pub fn get_at(&self, distance: usize, name: &str) -> Option<Value> {
        if distance == 0 {
            self.values.get(name).cloned()
        } else {
            self.enclosing
                .as_ref()
                .and_then(|enclosing| enclosing.borrow().get_at(distance - 1, name))
        }
    }

    /// Write strictly into the scope `distance` hops out; `false` when that
    /// scope has no such binding.
    pub fn assign_at(&mut self, distance: usize, name: &str, value: Value) -> bool {
        if distance == 0 {
            if self.values.contains_key(name) {
                self.values.insert(name.to_string(), value);
                true
            } else {
                false
            }
        } else {
            match &self.enclosing {
                Some(enclosing) => enclosing.borrow_mut().assign_at(distance - 1, name, value),
                None => false,
            }
        }
    }
}

pub(crate) fn undefined_variable(name: &Token) -> LoxError {
    LoxError::runtime_at(name, format!("Undefined variable '{}'.", name.lexeme))
}
