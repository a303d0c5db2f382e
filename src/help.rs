// ABOUTME: Help and documentation registry behind the (help) and (doc) builtins

use std::cell::RefCell;
use std::collections::HashMap;

/// A help entry for a builtin, macro, or special form
#[derive(Debug, Clone)]
pub struct HelpEntry {
    pub name: String,
    pub signature: String,
    pub description: String,
    pub examples: Vec<String>,
    pub related: Vec<String>,
    pub category: String,
}

/// Macro for defining help entries with less boilerplate
/// Usage: help_entry!("name", "category", "signature", "description", ["ex1"], ["related1"])
macro_rules! help_entry {
    (
        $name:literal,
        $category:literal,
        $signature:literal,
        $description:literal,
        [$($example:literal),* $(,)?],
        [$($related:literal),* $(,)?]
    ) => {
        register_help(HelpEntry {
            name: $name.to_string(),
            category: $category.to_string(),
            signature: $signature.to_string(),
            description: $description.trim().to_string(),
            examples: vec![$($example.to_string()),*],
            related: vec![$($related.to_string()),*],
        });
    };
}

/// Registry for all documentation entries
pub struct HelpRegistry {
    entries: HashMap<String, HelpEntry>,
}

impl HelpRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn register(&mut self, entry: HelpEntry) {
        self.entries.insert(entry.name.clone(), entry);
    }

    pub fn get(&self, name: &str) -> Option<HelpEntry> {
        self.entries.get(name).cloned()
    }

    /// All entries grouped by category, each group sorted by name
    pub fn by_category(&self) -> Vec<(String, Vec<HelpEntry>)> {
        let mut by_cat: HashMap<String, Vec<HelpEntry>> = HashMap::new();
        for entry in self.entries.values() {
            by_cat
                .entry(entry.category.clone())
                .or_default()
                .push(entry.clone());
        }
        let mut groups: Vec<(String, Vec<HelpEntry>)> = by_cat.into_iter().collect();
        groups.sort_by(|a, b| a.0.cmp(&b.0));
        for (_, entries) in &mut groups {
            entries.sort_by(|a, b| a.name.cmp(&b.name));
        }
        groups
    }
}

impl Default for HelpRegistry {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    static HELP_REGISTRY: RefCell<HelpRegistry> = RefCell::new(HelpRegistry::new());
}

/// Register a help entry in the registry
pub fn register_help(entry: HelpEntry) {
    HELP_REGISTRY.with(|reg| {
        reg.borrow_mut().register(entry);
    });
}

/// Get a help entry by name
pub fn get_help(name: &str) -> Option<HelpEntry> {
    HELP_REGISTRY.with(|reg| reg.borrow().get(name))
}

/// All entries grouped by category
pub fn all_by_category() -> Vec<(String, Vec<HelpEntry>)> {
    HELP_REGISTRY.with(|reg| reg.borrow().by_category())
}

/// Entries for the evaluator's special forms, which have no builtin
/// function to hang documentation on.
pub fn register_special_forms() {
    help_entry!(
        "quote",
        "Special forms",
        "(quote x) or 'x",
        "Returns x unevaluated.",
        ["'(1 2 3) => (1 2 3)", "'x => x"],
        ["quasiquote"]
    );
    help_entry!(
        "quasiquote",
        "Special forms",
        "(quasiquote x) or `x",
        "Like quote, but ,expr evaluates expr and ,@expr splices a list, at matching nesting depth only.",
        ["`(a ,(+ 1 2) ,@(list 3 4)) => (a 3 3 4)"],
        ["quote"]
    );
    help_entry!(
        "if",
        "Special forms",
        "(if test then [else])",
        "Evaluates then or else depending on test. Both arms are in tail position. Without an else, a false test yields nil.",
        ["(if (< 1 2) 'yes 'no) => yes"],
        ["cond", "when"]
    );
    help_entry!(
        "lambda",
        "Special forms",
        "(lambda params body...)",
        "Creates a function closing over the current scope. params is a list of symbols, a symbol capturing the whole argument list, or a list with a . rest tail; (o name) marks an optional parameter.",
        ["((lambda (x) (* x x)) 7) => 49", "((lambda args args) 1 2) => (1 2)"],
        ["define"]
    );
    help_entry!(
        "define",
        "Special forms",
        "(define name value) or (define (name params...) body...)",
        "Binds name in the current scope and returns the value. The second form is sugar for a named lambda.",
        ["(define x 42) => 42", "(define (square x) (* x x))"],
        ["set!", "lambda", "defmacro"]
    );
    help_entry!(
        "defmacro",
        "Special forms",
        "(defmacro name params body...)",
        "Defines a macro. Calls are rewritten during the expansion pass: the body runs on the unevaluated argument forms and its result replaces the call site.",
        ["(defmacro unless (c . body) `(if ,c nil (begin ,@body)))"],
        ["define", "macroexpand"]
    );
    help_entry!(
        "set!",
        "Special forms",
        "(set! name value)",
        "Assigns to the nearest existing binding of name; an error if name is unbound.",
        ["(define x 1) (set! x 2) x => 2"],
        ["define"]
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        register_help(HelpEntry {
            name: "test-entry".to_string(),
            signature: "(test-entry ...)".to_string(),
            description: "A test entry".to_string(),
            examples: vec![],
            related: vec![],
            category: "Testing".to_string(),
        });

        let entry = get_help("test-entry").expect("entry should exist");
        assert_eq!(entry.category, "Testing");
        assert!(get_help("no-such-entry").is_none());
    }

    #[test]
    fn test_special_forms_registered() {
        register_special_forms();
        assert!(get_help("lambda").is_some());
        assert!(get_help("set!").is_some());
    }

    #[test]
    fn test_categories_are_sorted() {
        register_special_forms();
        let groups = all_by_category();
        let names: Vec<&String> = groups.iter().map(|(c, _)| c).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
