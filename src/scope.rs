// ABOUTME: Lexical scope chain with a host-supplied globals fallback table

use crate::error::PsilError;
use crate::symbol::Symbol;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// An externally supplied name table consulted at lookup time, letting an
/// embedding host expose bindings without copying them into the scope.
/// Writes never go through it.
pub type GlobalsTable = HashMap<Symbol, Value>;

/// One link in the lexical environment chain. A child scope is created for
/// every function or macro call; the chain is rooted at the globals scope.
#[derive(Debug)]
pub struct Scope {
    parent: Option<Rc<Scope>>,
    symbols: RefCell<HashMap<Symbol, Value>>,
    globals: RefCell<Option<GlobalsTable>>,
}

impl Scope {
    /// Creates a root scope with no parent.
    pub fn root() -> Rc<Self> {
        Rc::new(Scope {
            parent: None,
            symbols: RefCell::new(HashMap::new()),
            globals: RefCell::new(None),
        })
    }

    /// Creates a child scope of `parent`.
    pub fn child(parent: Rc<Scope>) -> Rc<Self> {
        Rc::new(Scope {
            parent: Some(parent),
            symbols: RefCell::new(HashMap::new()),
            globals: RefCell::new(None),
        })
    }

    /// Install (or clear) the fallback table.
    pub fn setglobals(&self, table: Option<GlobalsTable>) {
        *self.globals.borrow_mut() = table;
    }

    /// Bind `name` in this scope, warning when an existing binding here is
    /// overwritten. Returns the value.
    pub fn define(&self, name: Symbol, value: Value) -> Value {
        if self.symbols.borrow().contains_key(&name) {
            eprintln!("*** warning: redefining {}", name);
        }
        self.symbols.borrow_mut().insert(name, value.clone());
        value
    }

    /// Update the nearest existing binding of `name` on the chain.
    pub fn set(&self, name: Symbol, value: Value) -> Result<(), PsilError> {
        let mut scope = self;
        loop {
            if scope.symbols.borrow().contains_key(&name) {
                scope.symbols.borrow_mut().insert(name, value);
                return Ok(());
            }
            match &scope.parent {
                Some(parent) => scope = parent,
                None => return Err(PsilError::UndefinedSymbol(name.to_string())),
            }
        }
    }

    /// Walk the chain for `name`. A scope carrying a fallback table
    /// consults it after its own bindings, before climbing further.
    pub fn lookup(&self, name: Symbol) -> Option<Value> {
        let mut scope = self;
        loop {
            if let Some(value) = scope.symbols.borrow().get(&name) {
                return Some(value.clone());
            }
            if let Some(table) = scope.globals.borrow().as_ref() {
                if let Some(value) = table.get(&name) {
                    return Some(value.clone());
                }
            }
            match &scope.parent {
                Some(parent) => scope = parent,
                None => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_lookup() {
        let scope = Scope::root();
        scope.define(Symbol::new("x"), Value::Int(42));

        match scope.lookup(Symbol::new("x")) {
            Some(Value::Int(42)) => {}
            other => panic!("expected Int(42), got {:?}", other),
        }
    }

    #[test]
    fn test_lookup_misses_unbound() {
        let scope = Scope::root();
        assert!(scope.lookup(Symbol::new("missing")).is_none());
    }

    #[test]
    fn test_child_shadows_parent() {
        let parent = Scope::root();
        parent.define(Symbol::new("x"), Value::Int(1));

        let child = Scope::child(parent.clone());
        child.define(Symbol::new("x"), Value::Int(2));

        assert!(matches!(child.lookup(Symbol::new("x")), Some(Value::Int(2))));
        assert!(matches!(parent.lookup(Symbol::new("x")), Some(Value::Int(1))));
    }

    #[test]
    fn test_set_updates_nearest_binding() {
        let root = Scope::root();
        root.define(Symbol::new("x"), Value::Int(1));

        let mid = Scope::child(root.clone());
        mid.define(Symbol::new("x"), Value::Int(2));

        let leaf = Scope::child(mid.clone());
        leaf.set(Symbol::new("x"), Value::Int(99)).unwrap();

        // Nearest binding (mid) changed; the root binding did not.
        assert!(matches!(mid.lookup(Symbol::new("x")), Some(Value::Int(99))));
        assert!(matches!(root.lookup(Symbol::new("x")), Some(Value::Int(1))));
    }

    #[test]
    fn test_set_of_unbound_name_errors() {
        let scope = Scope::child(Scope::root());
        let result = scope.set(Symbol::new("missing"), Value::Int(1));
        assert!(matches!(result, Err(PsilError::UndefinedSymbol(_))));
    }

    #[test]
    fn test_globals_fallback_consulted_after_own_bindings() {
        let root = Scope::root();
        root.define(Symbol::new("x"), Value::Int(1));

        let mut table = GlobalsTable::new();
        table.insert(Symbol::new("x"), Value::Int(100));
        table.insert(Symbol::new("host-only"), Value::Int(7));
        root.setglobals(Some(table));

        // Own binding wins; fallback fills the gaps.
        assert!(matches!(root.lookup(Symbol::new("x")), Some(Value::Int(1))));
        assert!(matches!(
            root.lookup(Symbol::new("host-only")),
            Some(Value::Int(7))
        ));

        // Visible from child scopes through the chain.
        let child = Scope::child(root);
        assert!(matches!(
            child.lookup(Symbol::new("host-only")),
            Some(Value::Int(7))
        ));
    }

    #[test]
    fn test_clearing_globals_removes_fallback() {
        let root = Scope::root();
        let mut table = GlobalsTable::new();
        table.insert(Symbol::new("g"), Value::Int(1));
        root.setglobals(Some(table));
        assert!(root.lookup(Symbol::new("g")).is_some());

        root.setglobals(None);
        assert!(root.lookup(Symbol::new("g")).is_none());
    }
}
