// ABOUTME: Process-wide symbol interner giving every name a single identity

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// An interned symbol. Two symbols with the same name are always the same
/// value, so equality is a plain id comparison and never touches the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(u32);

/// Names the evaluator recognizes by identity. Interned first, in this
/// order, so the associated constants below line up with their ids.
const WELL_KNOWN: [&str; 9] = [
    "quote",
    "quasiquote",
    "unquote",
    "unquote-splicing",
    "define",
    "defmacro",
    "if",
    "lambda",
    "set!",
];

struct Interner {
    names: Vec<Rc<str>>,
    ids: HashMap<Rc<str>, u32>,
    gensym_counter: u64,
}

impl Interner {
    fn with_well_known() -> Self {
        let mut interner = Interner {
            names: Vec::new(),
            ids: HashMap::new(),
            gensym_counter: 0,
        };
        for name in WELL_KNOWN {
            interner.intern(name);
        }
        interner
    }

    fn intern(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.names.len() as u32;
        let name: Rc<str> = Rc::from(name);
        self.names.push(name.clone());
        self.ids.insert(name, id);
        id
    }
}

thread_local! {
    static INTERNER: RefCell<Interner> = RefCell::new(Interner::with_well_known());
}

impl Symbol {
    pub const QUOTE: Symbol = Symbol(0);
    pub const QUASIQUOTE: Symbol = Symbol(1);
    pub const UNQUOTE: Symbol = Symbol(2);
    pub const UNQUOTE_SPLICING: Symbol = Symbol(3);
    pub const DEFINE: Symbol = Symbol(4);
    pub const DEFMACRO: Symbol = Symbol(5);
    pub const IF: Symbol = Symbol(6);
    pub const LAMBDA: Symbol = Symbol(7);
    pub const SET: Symbol = Symbol(8);

    /// Intern `name`, returning the existing symbol if one exists.
    pub fn new(name: &str) -> Symbol {
        INTERNER.with(|i| Symbol(i.borrow_mut().intern(name)))
    }

    /// Returns a fresh symbol `_g_<N>`. No token the reader produces
    /// collides with the counter-suffixed names.
    pub fn gensym() -> Symbol {
        INTERNER.with(|i| {
            let mut interner = i.borrow_mut();
            interner.gensym_counter += 1;
            let name = format!("_g_{}", interner.gensym_counter);
            Symbol(interner.intern(&name))
        })
    }

    pub fn name(self) -> Rc<str> {
        INTERNER.with(|i| i.borrow().names[self.0 as usize].clone())
    }

    /// Symbols spelled with a leading `:` evaluate to themselves.
    pub fn is_keyword(self) -> bool {
        self.name().starts_with(':')
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
