//! Statically declared formatting properties addressable from style
//! directives as `PF:<Name>` (paragraph) or `FT:<Name>` (font).

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::formatting::{Alignment, Formatting, NamedVariant, Underline};
use crate::style::escape_value;

pub const PARAGRAPH_PREFIX: &str = "PF:";
pub const FONT_PREFIX: &str = "FT:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Boolean,
    Integer,
    Real,
    Enumerated(&'static [&'static str]),
    Text,
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKind::Boolean => write!(f, "boolean"),
            PropertyKind::Integer => write!(f, "integer"),
            PropertyKind::Real => write!(f, "real"),
            PropertyKind::Enumerated(names) => write!(f, "one of {}", names.join("|")),
            PropertyKind::Text => write!(f, "text"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Enumerated(String),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropertyError {
    #[error("unknown property `{0}`")]
    UnknownProperty(String),
    #[error("`{value}` is not a valid {expected} value")]
    InvalidValue { value: String, expected: PropertyKind },
    #[error("value {0} out of range")]
    OutOfRange(i64),
}

impl PropertyKind {
    /// Type-directed parse of a raw directive value.
    pub fn parse(self, raw: &str) -> Result<PropertyValue, PropertyError> {
        let invalid = || PropertyError::InvalidValue {
            value: raw.to_string(),
            expected: self,
        };
        let trimmed = raw.trim();
        match self {
            PropertyKind::Boolean => {
                if trimmed.eq_ignore_ascii_case("true") {
                    Ok(PropertyValue::Boolean(true))
                } else if trimmed.eq_ignore_ascii_case("false") {
                    Ok(PropertyValue::Boolean(false))
                } else {
                    Err(invalid())
                }
            }
            PropertyKind::Integer => trimmed
                .parse()
                .map(PropertyValue::Integer)
                .map_err(|_| invalid()),
            PropertyKind::Real => trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(PropertyValue::Real)
                .ok_or_else(invalid),
            PropertyKind::Enumerated(names) => names
                .iter()
                .find(|name| name.eq_ignore_ascii_case(trimmed))
                .map(|name| PropertyValue::Enumerated(name.to_string()))
                .ok_or_else(invalid),
            PropertyKind::Text => Ok(PropertyValue::Text(raw.to_string())),
        }
    }
}

impl PropertyValue {
    fn into_bool(self) -> bool {
        matches!(self, PropertyValue::Boolean(true))
    }

    fn into_real(self) -> f64 {
        match self {
            PropertyValue::Real(v) => v,
            PropertyValue::Integer(v) => v as f64,
            _ => 0.0,
        }
    }

    fn into_text(self) -> String {
        match self {
            PropertyValue::Text(s) | PropertyValue::Enumerated(s) => s,
            PropertyValue::Boolean(b) => b.to_string(),
            PropertyValue::Integer(v) => v.to_string(),
            PropertyValue::Real(v) => v.to_string(),
        }
    }

    fn into_variant<T: NamedVariant + std::str::FromStr>(self) -> Result<T, PropertyError> {
        let name = self.into_text();
        name.parse().map_err(|_| PropertyError::InvalidValue {
            value: name,
            expected: PropertyKind::Enumerated(T::NAMES),
        })
    }
}

type Getter = fn(&Formatting) -> String;
type Setter = fn(&mut Formatting, PropertyValue) -> Result<(), PropertyError>;

/// A typed getter/setter pair for one formatting property.
#[derive(Clone, Copy)]
pub struct PropertyEntry {
    pub path: &'static str,
    pub kind: PropertyKind,
    get: Getter,
    set: Setter,
}

impl fmt::Debug for PropertyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyEntry")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .finish()
    }
}

macro_rules! property {
    (bool $path:literal => $($field:ident).+) => {
        PropertyEntry {
            path: $path,
            kind: PropertyKind::Boolean,
            get: |f| f.$($field).+.to_string(),
            set: |f, v| {
                f.$($field).+ = v.into_bool();
                Ok(())
            },
        }
    };
    (real $path:literal => $($field:ident).+) => {
        PropertyEntry {
            path: $path,
            kind: PropertyKind::Real,
            get: |f| f.$($field).+.to_string(),
            set: |f, v| {
                f.$($field).+ = v.into_real();
                Ok(())
            },
        }
    };
    (text $path:literal => $($field:ident).+) => {
        PropertyEntry {
            path: $path,
            kind: PropertyKind::Text,
            get: |f| f.$($field).+.clone(),
            set: |f, v| {
                f.$($field).+ = v.into_text();
                Ok(())
            },
        }
    };
    (enum $path:literal, $names:expr => $($field:ident).+) => {
        PropertyEntry {
            path: $path,
            kind: PropertyKind::Enumerated($names),
            get: |f| f.$($field).+.to_string(),
            set: |f, v| {
                f.$($field).+ = v.into_variant()?;
                Ok(())
            },
        }
    };
}

/// Registry mapping property paths to typed accessors on [`Formatting`].
///
/// Populated once per conversion run; lookups are by exact path.
#[derive(Debug, Clone)]
pub struct PropertyRegistry {
    entries: Vec<PropertyEntry>,
    index: HashMap<&'static str, usize>,
}

impl PropertyRegistry {
    pub fn from_entries(entries: Vec<PropertyEntry>) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.path, i))
            .collect();
        PropertyRegistry { entries, index }
    }

    /// Every paragraph and font property the builder understands.
    pub fn standard() -> Self {
        Self::from_entries(vec![
            property!(enum "PF:Alignment", Alignment::NAMES => paragraph.alignment),
            property!(real "PF:LeftIndent" => paragraph.left_indent),
            property!(real "PF:RightIndent" => paragraph.right_indent),
            property!(real "PF:FirstLineIndent" => paragraph.first_line_indent),
            property!(real "PF:SpaceBefore" => paragraph.space_before),
            property!(real "PF:SpaceAfter" => paragraph.space_after),
            property!(real "PF:LineSpacing" => paragraph.line_spacing),
            PropertyEntry {
                path: "PF:OutlineLevel",
                kind: PropertyKind::Integer,
                get: |f| f.paragraph.outline_level.to_string(),
                set: |f, v| {
                    let level = match v {
                        PropertyValue::Integer(level) => level,
                        _ => 0,
                    };
                    f.paragraph.outline_level = u8::try_from(level)
                        .ok()
                        .filter(|l| *l <= 9)
                        .ok_or(PropertyError::OutOfRange(level))?;
                    Ok(())
                },
            },
            property!(bool "PF:KeepWithNext" => paragraph.keep_with_next),
            property!(bool "PF:PageBreakBefore" => paragraph.page_break_before),
            property!(text "FT:Name" => font.name),
            property!(text "FT:NameFarEast" => font.name_far_east),
            property!(real "FT:Size" => font.size),
            property!(bool "FT:Bold" => font.bold),
            property!(bool "FT:Italic" => font.italic),
            property!(enum "FT:Underline", Underline::NAMES => font.underline),
            property!(bool "FT:StrikeThrough" => font.strike_through),
            property!(bool "FT:Superscript" => font.superscript),
            property!(bool "FT:Subscript" => font.subscript),
            property!(text "FT:Color" => font.color),
        ])
    }

    pub fn get(&self, path: &str) -> Option<&PropertyEntry> {
        self.index.get(path).map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[PropertyEntry] {
        &self.entries
    }

    /// Parse `raw` according to the property's kind and store it.
    pub fn set(
        &self,
        path: &str,
        raw: &str,
        formatting: &mut Formatting,
    ) -> Result<(), PropertyError> {
        let entry = self
            .get(path)
            .ok_or_else(|| PropertyError::UnknownProperty(path.to_string()))?;
        let value = entry.kind.parse(raw)?;
        (entry.set)(formatting, value)
    }

    pub fn value(&self, path: &str, formatting: &Formatting) -> Option<String> {
        self.get(path).map(|entry| (entry.get)(formatting))
    }

    /// Snapshot every property as a `path=value` directive list.
    pub fn capture(&self, formatting: &Formatting) -> String {
        self.entries
            .iter()
            .map(|entry| format!("{}={}", entry.path, escape_value(&(entry.get)(formatting))))
            .collect::<Vec<_>>()
            .join(",")
    }
}
