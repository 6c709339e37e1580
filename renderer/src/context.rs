use mddoc::parser::error::warn;
use mddoc::{MacroTable, Warning};

use crate::counters::Counters;
use crate::formatting::Formatting;
use crate::options::RenderOptions;
use crate::style;
use crate::style::property::PropertyRegistry;

/// All mutable state of one conversion run.
///
/// Owned by the dispatcher and threaded through every rendering step.
#[derive(Debug)]
pub struct ConversionContext {
    /// Author commands and named styles, including the captured default.
    pub macros: MacroTable,
    pub counters: Counters,
    pub properties: PropertyRegistry,
    pub options: RenderOptions,
    pub diagnostics: Vec<Warning>,
    /// Source line of the element being rendered.
    pub line: usize,
}

impl ConversionContext {
    pub fn new(macros: MacroTable, options: RenderOptions) -> Self {
        ConversionContext {
            macros,
            counters: Counters::new(),
            properties: PropertyRegistry::standard(),
            options,
            diagnostics: Vec::new(),
            line: 0,
        }
    }

    /// Record a warning against the current element's line.
    pub fn warn(&mut self, message: impl Into<String>) {
        warn(&mut self.diagnostics, self.line, message);
    }

    pub fn apply_style(&self, name: &str, formatting: &mut Formatting) -> bool {
        style::apply(name, &self.macros, formatting, &self.properties)
    }

    /// Snapshot `formatting` as the default style, replacing any author
    /// definition of it.
    pub fn capture_default_style(&mut self, formatting: &Formatting) {
        let snapshot = style::capture("", formatting, &self.properties, &mut self.macros);
        log::debug!("default style: {}", snapshot);
    }

    pub fn into_diagnostics(self) -> Vec<Warning> {
        self.diagnostics
    }
}
