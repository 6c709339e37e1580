use serde::Deserialize;

use crate::formatting::Formatting;

/// What a line break inside a paragraph turns into when rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoftBreak {
    /// Join the lines directly, as East-Asian text expects.
    #[default]
    Drop,
    Space,
}

/// Run-wide rendering knobs, typically read from `mddoc.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    pub soft_break: SoftBreak,
    pub font: String,
    pub east_asian_font: Option<String>,
    pub font_size: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            soft_break: SoftBreak::Drop,
            font: "Times New Roman".to_string(),
            east_asian_font: None,
            font_size: 12.0,
        }
    }
}

impl RenderOptions {
    /// Seed the builder's formatting before the default style is captured.
    pub fn apply_to(&self, formatting: &mut Formatting) {
        formatting.font.name = self.font.clone();
        if let Some(font) = &self.east_asian_font {
            formatting.font.name_far_east = font.clone();
        }
        formatting.font.size = self.font_size;
    }
}
