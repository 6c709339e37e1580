pub mod template;

use std::collections::HashMap;

use thiserror::Error;

/// Prefix under which named styles are stored in the macro table.
pub const STYLE_PREFIX: &str = "style-";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefineError {
    #[error("command `{0}` already defined")]
    AlreadyDefined(String),
}

/// Author-defined command name -> positional template mapping.
///
/// Names are case-sensitive. Built while segmenting, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacroTable {
    commands: HashMap<String, String>,
}

impl MacroTable {
    pub fn new() -> Self {
        MacroTable::default()
    }

    /// Define a new command. An existing definition is kept and reported.
    pub fn define(
        &mut self,
        name: impl Into<String>,
        template: impl Into<String>,
    ) -> Result<(), DefineError> {
        let name = name.into();
        if self.commands.contains_key(&name) {
            return Err(DefineError::AlreadyDefined(name));
        }
        self.commands.insert(name, template.into());
        Ok(())
    }

    /// Define a command, replacing any previous template.
    pub fn define_or_overwrite(&mut self, name: impl Into<String>, template: impl Into<String>) {
        self.commands.insert(name.into(), template.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.commands.get(name).map(|s| s.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.commands.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Directive list of the named style (`""` is the default style).
    pub fn style(&self, name: &str) -> Option<&str> {
        self.get(&format!("{}{}", STYLE_PREFIX, name))
    }

    pub fn set_style(&mut self, name: &str, directives: impl Into<String>) {
        self.define_or_overwrite(format!("{}{}", STYLE_PREFIX, name), directives);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_rejects_redefinition() {
        let mut table = MacroTable::new();
        table.define("x", "A").unwrap();
        assert_eq!(
            table.define("x", "B"),
            Err(DefineError::AlreadyDefined("x".into()))
        );
        assert_eq!(table.get("x"), Some("A"));
    }

    #[test]
    fn overwrite_replaces() {
        let mut table = MacroTable::new();
        table.define("x", "A").unwrap();
        table.define_or_overwrite("x", "B");
        assert_eq!(table.get("x"), Some("B"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn names_are_case_sensitive() {
        let mut table = MacroTable::new();
        table.define("Bold", "*{0}*").unwrap();
        assert!(!table.contains("bold"));
    }

    #[test]
    fn styles_share_the_table() {
        let mut table = MacroTable::new();
        table.define("style-quote", "italic").unwrap();
        assert_eq!(table.style("quote"), Some("italic"));
        table.set_style("", "FT:Bold=false");
        assert_eq!(table.get("style-"), Some("FT:Bold=false"));
    }
}
