use std::fmt;
use std::str::FromStr;

/// An enumerated formatting value that can be named in a style directive.
pub trait NamedVariant: Sized + Copy + 'static {
    const VARIANTS: &'static [(&'static str, Self)];
    const NAMES: &'static [&'static str];

    fn name(self) -> &'static str;
}

/// Case-insensitive lookup of a variant by name.
fn parse_variant<T: NamedVariant>(s: &str) -> Option<T> {
    T::VARIANTS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(s.trim()))
        .map(|&(_, v)| v)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownVariant;

macro_rules! named_enum {
    ($(#[$meta:meta])* $ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub enum $ty {
            #[default]
            $($variant),+
        }

        impl NamedVariant for $ty {
            const VARIANTS: &'static [(&'static str, Self)] = &[$(($name, $ty::$variant)),+];
            const NAMES: &'static [&'static str] = &[$($name),+];

            fn name(self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_variant(s).ok_or(UnknownVariant)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

named_enum!(
    /// Paragraph alignment. The first variant is the default.
    Alignment {
        Left => "Left",
        Center => "Center",
        Right => "Right",
        Justify => "Justify",
    }
);

named_enum!(
    /// Run underline style. The first variant is the default.
    Underline {
        None => "None",
        Single => "Single",
        Double => "Double",
        Dotted => "Dotted",
        Words => "Words",
    }
);

/// Paragraph-level formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphFormat {
    pub alignment: Alignment,
    pub left_indent: f64,
    pub right_indent: f64,
    pub first_line_indent: f64,
    pub space_before: f64,
    pub space_after: f64,
    pub line_spacing: f64,
    /// 0 is body text, 1-9 are outline levels.
    pub outline_level: u8,
    pub keep_with_next: bool,
    pub page_break_before: bool,
}

impl Default for ParagraphFormat {
    fn default() -> Self {
        ParagraphFormat {
            alignment: Alignment::Left,
            left_indent: 0.0,
            right_indent: 0.0,
            first_line_indent: 0.0,
            space_before: 0.0,
            space_after: 0.0,
            line_spacing: 12.0,
            outline_level: 0,
            keep_with_next: false,
            page_break_before: false,
        }
    }
}

/// Run-level formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub name: String,
    pub name_far_east: String,
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
    pub underline: Underline,
    pub strike_through: bool,
    pub superscript: bool,
    pub subscript: bool,
    pub color: String,
}

impl Default for Font {
    fn default() -> Self {
        Font {
            name: "Times New Roman".to_string(),
            name_far_east: String::new(),
            size: 12.0,
            bold: false,
            italic: false,
            underline: Underline::None,
            strike_through: false,
            superscript: false,
            subscript: false,
            color: "auto".to_string(),
        }
    }
}

/// The formatting a builder applies to everything it writes next.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Formatting {
    pub paragraph: ParagraphFormat,
    pub font: Font,
}

impl Formatting {
    pub fn toggle_underline(&mut self) {
        self.font.underline = if self.font.underline == Underline::None {
            Underline::Single
        } else {
            Underline::None
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_parse_case_insensitively() {
        assert_eq!("center".parse::<Alignment>(), Ok(Alignment::Center));
        assert_eq!(" Justify ".parse::<Alignment>(), Ok(Alignment::Justify));
        assert_eq!("WORDS".parse::<Underline>(), Ok(Underline::Words));
        assert_eq!("diagonal".parse::<Alignment>(), Err(UnknownVariant));
    }

    #[test]
    fn display_round_trips_names() {
        for &(name, variant) in Alignment::VARIANTS {
            assert_eq!(variant.to_string(), name);
        }
        assert_eq!(Underline::default(), Underline::None);
    }

    #[test]
    fn underline_toggles() {
        let mut formatting = Formatting::default();
        formatting.toggle_underline();
        assert_eq!(formatting.font.underline, Underline::Single);
        formatting.font.underline = Underline::Double;
        formatting.toggle_underline();
        assert_eq!(formatting.font.underline, Underline::None);
    }
}
