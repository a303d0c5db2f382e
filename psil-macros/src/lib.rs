//! Procedural macros for psil builtin functions
//!
//! Provides the `#[builtin]` attribute macro. Applied to a
//! `fn(&[Value]) -> Result<Value, PsilError>`, it generates a
//! `register_<fn>` function that binds the builtin into a scope and files a
//! help entry derived from the function's rustdoc comment.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, ItemFn, Meta};

/// Rustdoc comment split into the sections the help system cares about.
struct DocSections {
    summary: String,
    examples: Vec<String>,
    see_also: Vec<String>,
}

/// Collect the string content of every `#[doc = "..."]` attribute.
fn extract_doc_comments(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .filter_map(|attr| {
            if attr.path().is_ident("doc") {
                if let Meta::NameValue(nv) = &attr.meta {
                    if let syn::Expr::Lit(syn::ExprLit {
                        lit: syn::Lit::Str(lit_str),
                        ..
                    }) = &nv.value
                    {
                        return Some(lit_str.value());
                    }
                }
            }
            None
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split a rustdoc comment into summary, `# Examples` code lines, and
/// `# See Also` names.
fn parse_doc_sections(raw: &str) -> DocSections {
    let mut summary = String::new();
    let mut examples = Vec::new();
    let mut see_also = Vec::new();

    let mut section = "summary";
    let mut in_code = false;

    for line in raw.lines() {
        let trimmed = line.trim();
        if let Some(header) = trimmed.strip_prefix("# ") {
            let header = header.trim().to_lowercase();
            section = if header.contains("example") {
                "examples"
            } else if header.contains("see") || header.contains("related") {
                "see also"
            } else {
                "other"
            };
            in_code = false;
            continue;
        }
        match section {
            "summary" => {
                if !trimmed.is_empty() {
                    if !summary.is_empty() {
                        summary.push(' ');
                    }
                    summary.push_str(trimmed);
                }
            }
            "examples" => {
                if trimmed.starts_with("```") {
                    in_code = !in_code;
                } else if in_code && !trimmed.is_empty() {
                    examples.push(trimmed.to_string());
                }
            }
            "see also" => {
                for name in trimmed.split(',') {
                    let name = name.trim();
                    if !name.is_empty() {
                        see_also.push(name.to_string());
                    }
                }
            }
            _ => {}
        }
    }

    DocSections {
        summary,
        examples,
        see_also,
    }
}

/// Parse attribute arguments: `name = "..."`, `category = "..."`,
/// `related(a, b, c)`.
fn parse_builtin_args(attr_stream: TokenStream) -> (String, String, Vec<String>) {
    let attr_str = attr_stream.to_string();

    let mut name = String::new();
    let mut category = String::new();
    let mut related = Vec::new();

    if let Some(start) = attr_str.find("name = \"") {
        let rest = &attr_str[start + 8..];
        if let Some(end) = rest.find('"') {
            name = rest[..end].to_string();
        }
    }

    if let Some(start) = attr_str.find("category = \"") {
        let rest = &attr_str[start + 12..];
        if let Some(end) = rest.find('"') {
            category = rest[..end].to_string();
        }
    }

    if let Some(start) = attr_str.find("related") {
        let rest = &attr_str[start..];
        if let (Some(open), Some(close)) = (rest.find('('), rest.find(')')) {
            if open < close {
                // Token-stream stringification spaces out punctuation
                // (`map - get`); collapse it back to the lisp name.
                related = rest[open + 1..close]
                    .split(',')
                    .map(|s| s.replace(' ', ""))
                    .filter(|s| !s.is_empty())
                    .collect();
            }
        }
    }

    (name, category, related)
}

/// Attribute macro for defining PSIL builtin functions.
///
/// # Attribute Arguments
///
/// - `name`: the PSIL name for this builtin (e.g. `"symbol?"`)
/// - `category`: category for help organization (e.g. `"Symbols"`)
/// - `related`: related builtins to list in help
///
/// # Example
///
/// ```ignore
/// #[builtin(name = "gensym", category = "Symbols", related(string->symbol))]
/// /// Returns a fresh uninterned-looking symbol.
/// pub fn builtin_gensym(args: &[Value]) -> Result<Value, PsilError> {
///     // ...
/// }
/// ```
///
/// Expands to the function itself plus `register_<fn>(scope)`, which binds
/// the builtin in the given scope and registers its help entry.
#[proc_macro_attribute]
pub fn builtin(attr: TokenStream, item: TokenStream) -> TokenStream {
    let func = parse_macro_input!(item as ItemFn);

    let (psil_name, category, related) = parse_builtin_args(attr);

    let fn_name = func.sig.ident.clone();
    let name_to_use = if psil_name.is_empty() {
        fn_name.to_string()
    } else {
        psil_name
    };

    let docs = parse_doc_sections(&extract_doc_comments(&func.attrs));
    let description = docs.summary;
    let examples = docs.examples;
    let related = if related.is_empty() {
        docs.see_also
    } else {
        related
    };
    let category = if category.is_empty() {
        "Other".to_string()
    } else {
        category
    };
    let signature = format!("({} ...)", name_to_use);

    let register_fn_name = quote::format_ident!("register_{}", fn_name);

    let expanded = quote! {
        #func

        #[allow(dead_code)]
        pub fn #register_fn_name(scope: &std::rc::Rc<crate::scope::Scope>) {
            scope.define(
                crate::symbol::Symbol::new(#name_to_use),
                crate::value::Value::Builtin(crate::value::Builtin {
                    name: #name_to_use,
                    func: #fn_name,
                }),
            );
            crate::help::register_help(crate::help::HelpEntry {
                name: #name_to_use.to_string(),
                signature: #signature.to_string(),
                description: #description.to_string(),
                examples: vec![#(#examples.to_string()),*],
                related: vec![#(#related.to_string()),*],
                category: #category.to_string(),
            });
        }
    };

    TokenStream::from(expanded)
}
