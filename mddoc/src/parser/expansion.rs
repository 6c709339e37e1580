use thiserror::Error;

use crate::macros::MacroTable;
use crate::macros::template::{TemplateError, instantiate};
use crate::parser::error::{Warning, warn};
use crate::parser::invocation::{Invocation, find_invocations};

/// Deepest argument nesting the expander will follow.
pub const MAX_EXPANSION_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    #[error("arguments failure while expanding command `{name}`: {source}")]
    Template {
        name: String,
        #[source]
        source: TemplateError,
    },
    #[error("command `{name}` nests deeper than {MAX_EXPANSION_DEPTH} levels")]
    TooDeep { name: String },
}

/// Expand every author-defined command in `text`.
///
/// Arguments are expanded on their own before they are substituted into the
/// command's template; the instantiated template is not scanned again.
/// Invocations of names missing from `macros` are copied through untouched
/// (the renderer handles the intrinsic ones). An invocation that fails to
/// instantiate is dropped from the output and reported against `line`.
pub fn expand(
    text: &str,
    macros: &MacroTable,
    line: usize,
    diagnostics: &mut Vec<Warning>,
) -> String {
    match expand_at(text, macros, line, 0, diagnostics) {
        Ok(expanded) => expanded,
        // Depth errors are reported by the outermost invocation and never
        // escape depth 0.
        Err(_) => text.to_string(),
    }
}

fn expand_at(
    text: &str,
    macros: &MacroTable,
    line: usize,
    depth: usize,
    diagnostics: &mut Vec<Warning>,
) -> Result<String, ExpandError> {
    let mut out = String::with_capacity(text.len());
    let mut col = 0;

    for invocation in find_invocations(text) {
        let Some(template) = macros.get(&invocation.name) else {
            continue;
        };

        out.push_str(&text[col..invocation.span.start]);
        col = invocation.span.end;

        match expand_invocation(&invocation, template, macros, line, depth, diagnostics) {
            Ok(expanded) => out.push_str(&expanded),
            Err(err @ ExpandError::TooDeep { .. }) if depth > 0 => return Err(err),
            Err(err) => warn(diagnostics, line, err.to_string()),
        }
    }

    out.push_str(&text[col..]);
    Ok(out)
}

fn expand_invocation(
    invocation: &Invocation,
    template: &str,
    macros: &MacroTable,
    line: usize,
    depth: usize,
    diagnostics: &mut Vec<Warning>,
) -> Result<String, ExpandError> {
    if depth >= MAX_EXPANSION_DEPTH {
        return Err(ExpandError::TooDeep {
            name: invocation.name.clone(),
        });
    }

    let args = invocation
        .args
        .iter()
        .map(|arg| expand_at(arg, macros, line, depth + 1, diagnostics))
        .collect::<Result<Vec<_>, _>>()?;

    instantiate(template, &args).map_err(|source| ExpandError::Template {
        name: invocation.name.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(defs: &[(&str, &str)]) -> MacroTable {
        let mut macros = MacroTable::new();
        for (name, template) in defs {
            macros.define(*name, *template).unwrap();
        }
        macros
    }

    fn run(text: &str, macros: &MacroTable) -> (String, Vec<Warning>) {
        let mut diagnostics = Vec::new();
        let out = expand(text, macros, 7, &mut diagnostics);
        (out, diagnostics)
    }

    #[test]
    fn empty_table_leaves_text_unchanged() {
        let text = "plain %b{x} @{note} \\% text";
        assert_eq!(run(text, &MacroTable::new()), (text.to_string(), vec![]));
    }

    #[test]
    fn substitutes_template() {
        let macros = table(&[("b", "**{0}**")]);
        assert_eq!(run("Hello %b{World}", &macros).0, "Hello **World**");
    }

    #[test]
    fn arguments_are_expanded_first() {
        let macros = table(&[("greet", "Hello {0}"), ("name", "World")]);
        assert_eq!(run("%greet{%name{}}", &macros).0, "Hello World");
    }

    #[test]
    fn unknown_commands_pass_through() {
        let macros = table(&[("b", "[{0}]")]);
        assert_eq!(
            run("%center{} %b{x} %pagenum", &macros).0,
            "%center{} [x] %pagenum"
        );
    }

    #[test]
    fn arity_failure_drops_only_the_invocation() {
        let macros = table(&[("pair", "{0} and {1}")]);
        let (out, diagnostics) = run("before %pair{} after", &macros);
        assert_eq!(out, "before  after");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 7);
        assert!(diagnostics[0].message.contains("`pair`"));
    }

    #[test]
    fn footnote_shorthand_uses_footnote_macro() {
        let macros = table(&[("footnote", "({0})")]);
        assert_eq!(run("see@{here}", &macros).0, "see(here)");
    }

    #[test]
    fn template_output_is_not_rescanned() {
        let macros = table(&[("me", "%me{{}}")]);
        let (out, diagnostics) = run("%me{}", &macros);
        assert_eq!(out, "%me{}");
        assert!(diagnostics.is_empty());

        let (out, _) = run("a %me{} b", &macros);
        assert_eq!(out, "a %me{} b");
    }

    #[test]
    fn excessive_nesting_fails_once() {
        let macros = table(&[("a", "{0}")]);
        let depth = MAX_EXPANSION_DEPTH + 5;
        let text = format!("x {}y{} z", "%a{".repeat(depth), "}".repeat(depth));
        let (out, diagnostics) = run(&text, &macros);
        assert_eq!(out, "x  z");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("nests deeper"));
    }

    #[test]
    fn nesting_within_limit_expands() {
        let macros = table(&[("a", "<{0}>")]);
        let text = format!("{}y{}", "%a{".repeat(10), "}".repeat(10));
        assert_eq!(
            run(&text, &macros).0,
            format!("{}y{}", "<".repeat(10), ">".repeat(10))
        );
    }
}
