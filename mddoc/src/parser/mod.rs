pub mod error;
pub mod expansion;
pub mod invocation;
mod structural;

pub use error::Warning;
pub use expansion::expand;
pub use invocation::{Invocation, find_invocations};
pub use structural::{segment, split_lines};

use crate::Document;

/// Parser entry point.
pub struct Parser {
    source: String,
}

impl Parser {
    pub fn new(source: impl Into<String>) -> Self {
        Parser {
            source: source.into(),
        }
    }

    /// Segment the source and expand author-defined commands in every
    /// element. Problems never abort parsing; they are returned as warnings
    /// in source order of discovery.
    pub fn parse(&self) -> (Document, Vec<Warning>) {
        let mut diagnostics = Vec::new();
        let (mut elements, macros) = segment(&self.source, &mut diagnostics);

        for element in &mut elements {
            let expanded = expand(element.text(), &macros, element.line, &mut diagnostics);
            element.text = Some(expanded);
        }

        (Document { elements, macros }, diagnostics)
    }
}
