//! The document-production collaborator the dispatcher drives.

pub mod recording;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::formatting::Formatting;

pub use recording::{BuildOp, RecordingBuilder};

/// Page header and footer regions a builder can redirect writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    HeaderFirst,
    HeaderEven,
    HeaderPrimary,
    FooterFirst,
    FooterEven,
    FooterPrimary,
}

impl Region {
    pub const HEADERS: [Region; 3] = [Region::HeaderFirst, Region::HeaderEven, Region::HeaderPrimary];
    pub const FOOTERS: [Region; 3] = [Region::FooterFirst, Region::FooterEven, Region::FooterPrimary];
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Region::HeaderFirst => "header (first page)",
            Region::HeaderEven => "header (even pages)",
            Region::HeaderPrimary => "header",
            Region::FooterFirst => "footer (first page)",
            Region::FooterEven => "footer (even pages)",
            Region::FooterPrimary => "footer",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Numbered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    Footnote,
    Endnote,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to write `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("image `{0}` not found")]
    MissingImage(PathBuf),
    #[error("{0}")]
    InvalidState(String),
}

/// Operations a concrete document backend provides.
///
/// Text is written with whatever [`Formatting`] is current at the time of
/// the call; callers mutate it through [`DocumentBuilder::formatting_mut`].
pub trait DocumentBuilder {
    fn formatting(&self) -> &Formatting;
    fn formatting_mut(&mut self) -> &mut Formatting;

    /// Write a run of text into the current paragraph.
    fn write(&mut self, text: &str) -> Result<(), BuildError>;
    /// Close the current paragraph and start a new one.
    fn insert_paragraph(&mut self) -> Result<(), BuildError>;
    /// Insert an image at its natural size.
    fn insert_image(&mut self, path: &Path) -> Result<(), BuildError>;

    fn start_list(&mut self, kind: ListKind) -> Result<(), BuildError>;
    fn end_list(&mut self) -> Result<(), BuildError>;

    fn start_table(&mut self) -> Result<(), BuildError>;
    fn insert_cell(&mut self) -> Result<(), BuildError>;
    fn end_row(&mut self) -> Result<(), BuildError>;
    fn end_table(&mut self) -> Result<(), BuildError>;

    /// Insert a field such as `PAGE`, or a generic field with an argument.
    fn insert_field(&mut self, code: &str, argument: Option<&str>) -> Result<(), BuildError>;
    fn insert_note(&mut self, kind: NoteKind, body: &str) -> Result<(), BuildError>;

    /// Redirect subsequent writes into a header or footer region.
    fn move_to_region(&mut self, region: Region) -> Result<(), BuildError>;
    /// Restore writes to the main body.
    fn move_to_body(&mut self) -> Result<(), BuildError>;

    fn save(&self, path: &Path) -> Result<(), BuildError>;
}
