use crate::builtins;
use crate::types::{Symbol, Value};
use itertools::Itertools;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

#[derive(Debug)]
pub struct UnboundVariable(pub Symbol);

#[derive(Debug)]
pub struct DuplicateDefinition(pub Symbol);

/// One scope in the chain. Shared through `Rc`: closures hold on to the scope
/// they were created in, so a scope lives as long as anything can still reach it.
pub struct Environment {
    symbols: RefCell<HashMap<Symbol, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    pub fn spawn_from(parent: &Rc<Environment>) -> Rc<Self> {
        Rc::new(Self {
            symbols: RefCell::new(HashMap::new()),
            parent: Some(parent.clone()),
        })
    }

    /// Binds `key` in this scope, replacing any existing binding here.
    pub fn set(&self, key: Symbol, value: Value) -> Option<Value> {
        self.symbols.borrow_mut().insert(key, value)
    }

    pub fn get(&self, key: &Symbol) -> Option<Value> {
        let mut env = self;
        loop {
            if let Some(value) = env.symbols.borrow().get(key) {
                return Some(value.clone());
            }
            match &env.parent {
                Some(parent) => env = parent.as_ref(),
                None => return None,
            }
        }
    }

    pub fn fetch(&self, key: &Symbol) -> Result<Value, UnboundVariable> {
        self.get(key).ok_or_else(|| UnboundVariable(key.clone()))
    }

    pub fn defines(&self, key: &Symbol) -> bool {
        self.symbols.borrow().contains_key(key)
    }

    /// Binds `key` in this scope. Shadowing an outer binding is fine; binding the
    /// same name twice in one scope is not.
    pub fn define(&self, key: &Symbol, value: Value) -> Result<(), DuplicateDefinition> {
        let mut symbols = self.symbols.borrow_mut();
        if symbols.contains_key(key) {
            return Err(DuplicateDefinition(key.clone()));
        }
        symbols.insert(key.clone(), value);
        Ok(())
    }

    /// Overwrites the nearest existing binding of `key`.
    pub fn assign(&self, key: &Symbol, value: Value) -> Result<(), UnboundVariable> {
        let mut env = self;
        loop {
            if let Some(slot) = env.symbols.borrow_mut().get_mut(key) {
                *slot = value;
                return Ok(());
            }
            match &env.parent {
                Some(parent) => env = parent.as_ref(),
                None => return Err(UnboundVariable(key.clone())),
            }
        }
    }

    pub fn define_or_assign(&self, key: &Symbol, value: Value) {
        if self.get(key).is_some() {
            // Cannot fail: the binding was just found.
            self.assign(key, value).ok();
        } else {
            self.set(key.clone(), value);
        }
    }

    pub fn depth(&self) -> usize {
        match &self.parent {
            Some(parent) => 1 + parent.depth(),
            None => 0,
        }
    }
}

impl Default for Environment {
    /// The root scope, holding the builtins plus `true` and `false`.
    fn default() -> Self {
        let env = Self {
            symbols: RefCell::new(HashMap::new()),
            parent: None,
        };
        for (&name, &func) in builtins::CORE.iter() {
            env.set(Symbol::from(name), Value::Primitive(func));
        }
        env.set(Symbol::from("true"), Value::Bool(true));
        env.set(Symbol::from("false"), Value::Bool(false));
        env
    }
}

impl fmt::Debug for Environment {
    // Values may be closures holding this very environment, so only list names.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Environment{{depth: {}, symbols: [{}]}}",
            self.depth(),
            self.symbols.borrow().keys().map(|k| k.as_str()).sorted().join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> Symbol {
        Symbol::from(name)
    }

    #[test]
    fn root_has_builtins_and_booleans() {
        let root = Environment::default();
        assert!(root.get(&sym("+")).is_some());
        assert_eq!(root.get(&sym("true")), Some(Value::Bool(true)));
        assert_eq!(root.depth(), 0);
    }

    #[test]
    fn lookup_walks_outward() {
        let root = Rc::new(Environment::default());
        root.define(&sym("x"), Value::Integer(1)).unwrap();
        let child = Environment::spawn_from(&root);
        assert_eq!(child.fetch(&sym("x")).unwrap(), Value::Integer(1));
        assert!(child.fetch(&sym("zzz")).is_err());
    }

    #[test]
    fn define_rejects_same_scope_but_allows_shadowing() {
        let root = Rc::new(Environment::default());
        root.define(&sym("x"), Value::Integer(1)).unwrap();
        assert!(root.define(&sym("x"), Value::Integer(2)).is_err());

        let child = Environment::spawn_from(&root);
        child.define(&sym("x"), Value::Integer(3)).unwrap();
        assert_eq!(child.fetch(&sym("x")).unwrap(), Value::Integer(3));
        assert_eq!(root.fetch(&sym("x")).unwrap(), Value::Integer(1));
    }

    #[test]
    fn assign_mutates_nearest_binding() {
        let root = Rc::new(Environment::default());
        root.define(&sym("x"), Value::Integer(1)).unwrap();
        let child = Environment::spawn_from(&root);
        child.assign(&sym("x"), Value::Integer(2)).unwrap();
        assert_eq!(root.fetch(&sym("x")).unwrap(), Value::Integer(2));
        assert!(!child.defines(&sym("x")));
        assert!(child.assign(&sym("y"), Value::Nothing).is_err());
    }

    #[test]
    fn define_or_assign() {
        let root = Rc::new(Environment::default());
        root.define(&sym("x"), Value::Integer(1)).unwrap();
        let child = Environment::spawn_from(&root);
        child.define_or_assign(&sym("x"), Value::Integer(5));
        child.define_or_assign(&sym("y"), Value::Integer(6));
        assert_eq!(root.fetch(&sym("x")).unwrap(), Value::Integer(5));
        assert!(child.defines(&sym("y")));
        assert!(!root.defines(&sym("y")));
    }

    #[test]
    fn child_keeps_parent_alive() {
        let child = {
            let root = Rc::new(Environment::default());
            root.define(&sym("kept"), Value::Integer(7)).unwrap();
            Environment::spawn_from(&root)
        };
        assert_eq!(child.fetch(&sym("kept")).unwrap(), Value::Integer(7));
        assert_eq!(child.depth(), 1);
    }
}
