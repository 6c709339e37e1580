//! Named style cascade.
//!
//! A style is a comma-separated list of `key=value` directives stored in the
//! macro table under `style-<name>`. The default style (name `""`) is a
//! snapshot of the builder's formatting taken before anything is rendered;
//! every other style is written by the document author, for example
//! `%=style-headline1:bold,size=16,PF:SpaceAfter=6`.

pub mod property;

use mddoc::MacroTable;
use thiserror::Error;

use crate::formatting::{Alignment, Formatting, Underline};
use crate::style::property::{FONT_PREFIX, PARAGRAPH_PREFIX, PropertyError, PropertyRegistry};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DirectiveError {
    #[error("unknown style directive `{0}`")]
    UnknownKey(String),
    #[error("directive `{key}` needs a numeric value, got `{value}`")]
    NotANumber { key: String, value: String },
    #[error("directive `{0}` needs a value")]
    MissingValue(String),
    #[error(transparent)]
    Property(#[from] PropertyError),
}

/// One parsed `key=value` entry of a style.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive<'a> {
    Bold(bool),
    Italic(bool),
    Underline(bool),
    Size(f64),
    Font(&'a str),
    LeftIndent(f64),
    RightIndent(f64),
    SpaceBefore(f64),
    SpaceAfter(f64),
    FirstLineIndent(f64),
    Align(Alignment),
    /// `PF:Name=value` / `FT:Name=value`, resolved through the registry.
    Property { path: &'a str, value: &'a str },
}

impl<'a> Directive<'a> {
    pub fn parse(entry: &'a str) -> Result<Self, DirectiveError> {
        let (key, value) = match entry.split_once('=') {
            Some((key, value)) => (key.trim(), Some(value)),
            None => (entry.trim(), None),
        };

        let flag = || value.is_none_or(|v| !v.trim().eq_ignore_ascii_case("false"));
        let number = || -> Result<f64, DirectiveError> {
            let raw = value.ok_or_else(|| DirectiveError::MissingValue(key.to_string()))?;
            raw.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| DirectiveError::NotANumber {
                    key: key.to_string(),
                    value: raw.to_string(),
                })
        };

        Ok(match key {
            "bold" => Directive::Bold(flag()),
            "italic" => Directive::Italic(flag()),
            "underline" => Directive::Underline(flag()),
            "size" => Directive::Size(number()?),
            "font" => Directive::Font(
                value
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| DirectiveError::MissingValue(key.to_string()))?,
            ),
            "l-indent" => Directive::LeftIndent(number()?),
            "r-indent" => Directive::RightIndent(number()?),
            "before" => Directive::SpaceBefore(number()?),
            "after" => Directive::SpaceAfter(number()?),
            "indent" => Directive::FirstLineIndent(number()?),
            "left" => Directive::Align(Alignment::Left),
            "center" => Directive::Align(Alignment::Center),
            "right" => Directive::Align(Alignment::Right),
            "justified" => Directive::Align(Alignment::Justify),
            _ if key.starts_with(PARAGRAPH_PREFIX) || key.starts_with(FONT_PREFIX) => {
                Directive::Property {
                    path: key,
                    value: value.ok_or_else(|| DirectiveError::MissingValue(key.to_string()))?,
                }
            }
            _ => return Err(DirectiveError::UnknownKey(key.to_string())),
        })
    }

    pub fn apply(
        &self,
        formatting: &mut Formatting,
        properties: &PropertyRegistry,
    ) -> Result<(), DirectiveError> {
        let paragraph = &mut formatting.paragraph;
        match *self {
            Directive::Bold(on) => formatting.font.bold = on,
            Directive::Italic(on) => formatting.font.italic = on,
            Directive::Underline(on) => {
                formatting.font.underline = if on { Underline::Single } else { Underline::None }
            }
            Directive::Size(size) => formatting.font.size = size,
            Directive::Font(name) => formatting.font.name = name.to_string(),
            Directive::LeftIndent(v) => paragraph.left_indent = v,
            Directive::RightIndent(v) => paragraph.right_indent = v,
            Directive::SpaceBefore(v) => paragraph.space_before = v,
            Directive::SpaceAfter(v) => paragraph.space_after = v,
            Directive::FirstLineIndent(v) => paragraph.first_line_indent = v,
            Directive::Align(alignment) => paragraph.alignment = alignment,
            Directive::Property { path, value } => properties.set(path, value, formatting)?,
        }
        Ok(())
    }
}

/// Replay a directive list against `formatting`.
///
/// Malformed entries are skipped; the rest of the list still applies.
/// Returns the number of directives applied.
pub fn apply_directives(
    directives: &str,
    formatting: &mut Formatting,
    properties: &PropertyRegistry,
) -> usize {
    let mut applied = 0;
    for entry in split_directives(directives)
        .iter()
        .filter(|e| !e.trim().is_empty())
    {
        match Directive::parse(entry).and_then(|d| d.apply(formatting, properties)) {
            Ok(()) => applied += 1,
            Err(err) => log::debug!("skipping style directive `{}`: {}", entry, err),
        }
    }
    applied
}

/// Escape `,` and `\` so a value survives `split_directives`.
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Split a directive list on unescaped commas; `\x` stands for `x`.
fn split_directives(directives: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut current = String::new();
    let mut chars = directives.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            ',' => entries.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    entries.push(current);
    entries
}

/// Snapshot `formatting` as the directive list of style `name`.
pub fn capture(
    name: &str,
    formatting: &Formatting,
    properties: &PropertyRegistry,
    macros: &mut MacroTable,
) -> String {
    let snapshot = properties.capture(formatting);
    macros.set_style(name, snapshot.clone());
    snapshot
}

/// Apply style `name` if it is defined. Returns whether it was.
pub fn apply(
    name: &str,
    macros: &MacroTable,
    formatting: &mut Formatting,
    properties: &PropertyRegistry,
) -> bool {
    match macros.style(name) {
        Some(directives) => {
            apply_directives(directives, formatting, properties);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("bold", Directive::Bold(true))]
    #[case("bold=false", Directive::Bold(false))]
    #[case("size=16", Directive::Size(16.0))]
    #[case(" font = SimHei ", Directive::Font("SimHei"))]
    #[case("l-indent=20", Directive::LeftIndent(20.0))]
    #[case("justified", Directive::Align(Alignment::Justify))]
    #[case("left", Directive::Align(Alignment::Left))]
    #[case("PF:SpaceAfter=6", Directive::Property { path: "PF:SpaceAfter", value: "6" })]
    fn parses_directives(#[case] entry: &str, #[case] expected: Directive<'static>) {
        assert_eq!(Directive::parse(entry).unwrap(), expected);
    }

    #[rstest]
    #[case("size=big")]
    #[case("size")]
    #[case("sparkle")]
    #[case("PF:LeftIndent")]
    fn rejects_malformed(#[case] entry: &str) {
        assert!(Directive::parse(entry).is_err());
    }

    #[test]
    fn malformed_entries_do_not_abort_the_list() {
        let properties = PropertyRegistry::standard();
        let mut formatting = Formatting::default();
        let applied = apply_directives(
            "bold,size=huge,PF:Nope=1,italic,,FT:Size=x,center",
            &mut formatting,
            &properties,
        );
        assert_eq!(applied, 3);
        assert!(formatting.font.bold);
        assert!(formatting.font.italic);
        assert_eq!(formatting.font.size, 12.0);
        assert_eq!(formatting.paragraph.alignment, Alignment::Center);
    }

    #[test]
    fn default_snapshot_resets_formatting() {
        let properties = PropertyRegistry::standard();
        let mut macros = MacroTable::new();
        let mut formatting = Formatting::default();
        formatting.font.name_far_east = "SimSun".into();
        capture("", &formatting, &properties, &mut macros);

        let captured = formatting.clone();
        formatting.font.bold = true;
        formatting.paragraph.left_indent = 40.0;
        formatting.font.name_far_east.clear();

        assert!(apply("", &macros, &mut formatting, &properties));
        assert_eq!(formatting, captured);
    }

    #[test]
    fn snapshot_keeps_commas_in_text_values() {
        let properties = PropertyRegistry::standard();
        let mut macros = MacroTable::new();
        let mut formatting = Formatting::default();
        formatting.font.name = "Noto Serif, Bold".into();
        formatting.font.name_far_east = r"C:\fonts\simsun".into();
        capture("", &formatting, &properties, &mut macros);

        let captured = formatting.clone();
        formatting.font.name = "Arial".into();
        formatting.font.name_far_east.clear();

        assert!(apply("", &macros, &mut formatting, &properties));
        assert_eq!(formatting, captured);
    }

    #[rstest]
    #[case("bold,italic", vec!["bold", "italic"])]
    #[case(r"font=A\, B,bold", vec!["font=A, B", "bold"])]
    #[case(r"FT:Name=x\\y", vec![r"FT:Name=x\y"])]
    #[case("", vec![""])]
    fn splits_on_unescaped_commas(#[case] list: &str, #[case] expected: Vec<&str>) {
        assert_eq!(split_directives(list), expected);
    }

    #[test]
    fn named_style_from_table() {
        let properties = PropertyRegistry::standard();
        let mut macros = MacroTable::new();
        macros
            .define("style-blockquote", "italic,l-indent=30,FT:Color=#555555")
            .unwrap();
        let mut formatting = Formatting::default();

        assert!(apply("blockquote", &macros, &mut formatting, &properties));
        assert!(formatting.font.italic);
        assert_eq!(formatting.paragraph.left_indent, 30.0);
        assert_eq!(formatting.font.color, "#555555");
        assert!(!apply("missing", &macros, &mut formatting, &properties));
    }
}
