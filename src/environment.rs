use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;

/// Shared handle to a scope.  Closures, bound methods and nested scopes all
/// hold one, so a scope lives as long as anything can still reach it.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One scope of the runtime chain: name → value plus the enclosing scope.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wraps a fresh child of `enclosing` in a shared handle.
    pub fn child_of(enclosing: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            enclosing,
        ))))
    }

    pub fn enclosing(&self) -> Option<EnvRef> {
        self.enclosing.clone()
    }

    /// Binds `name` in this scope, replacing any previous binding.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Names bound directly in this scope.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Reads `name` from this scope only.
    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    /// Looks `name` up, walking outward until a scope defines it.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(LoxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    /// Rebinds an existing `name`, walking outward like [`get`](Self::get).
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(LoxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }
}

/// Follows exactly `distance` enclosing links from `env`.
pub fn ancestor(env: &EnvRef, distance: usize, name: &Token) -> Result<EnvRef> {
    let mut scope: EnvRef = Rc::clone(env);

    for _ in 0..distance {
        let parent: Option<EnvRef> = scope.borrow().enclosing();

        scope = parent.ok_or_else(|| {
            LoxError::runtime(
                name,
                format!("No scope {} levels out for '{}'.", distance, name.lexeme),
            )
        })?;
    }

    Ok(scope)
}

/// Reads `name` from the scope exactly `distance` hops out, without searching.
pub fn get_at(env: &EnvRef, distance: usize, name: &Token) -> Result<Value> {
    debug!("get_at '{}' distance {}", name.lexeme, distance);

    let scope: EnvRef = ancestor(env, distance, name)?;
    let value: Option<Value> = scope.borrow().values.get(&name.lexeme).cloned();

    value.ok_or_else(|| {
        LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
    })
}

/// Writes `name` in the scope exactly `distance` hops out, without searching.
pub fn assign_at(env: &EnvRef, distance: usize, name: &Token, value: Value) -> Result<()> {
    debug!("assign_at '{}' distance {}", name.lexeme, distance);

    let scope: EnvRef = ancestor(env, distance, name)?;
    scope.borrow_mut().define(&name.lexeme, value);

    Ok(())
}
