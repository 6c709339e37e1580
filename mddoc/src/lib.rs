pub mod element;
pub mod macros;
pub mod parser;

pub use element::{BlockElement, ElementKind};
pub use macros::MacroTable;
pub use parser::{Parser, Warning};

/// A segmented, macro-expanded document ready for rendering.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Committed block elements in source order.
    pub elements: Vec<BlockElement>,
    /// Author-defined commands and named styles.
    pub macros: MacroTable,
}
