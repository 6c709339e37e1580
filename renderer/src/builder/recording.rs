use std::fs;
use std::path::{Path, PathBuf};

use crate::builder::{BuildError, DocumentBuilder, ListKind, NoteKind, Region};
use crate::formatting::{Formatting, ParagraphFormat};

/// One builder call as recorded by [`RecordingBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub enum BuildOp {
    Write { text: String, formatting: Formatting },
    Paragraph(ParagraphFormat),
    Image(PathBuf),
    StartList(ListKind),
    EndList,
    StartTable,
    Cell,
    EndRow,
    EndTable,
    Field { code: String, argument: Option<String> },
    Note { kind: NoteKind, body: String },
}

/// A builder that records every call and renders a plain-text view of the
/// result. Serves as the reference backend for tests and for the CLI's text
/// output.
#[derive(Debug, Default)]
pub struct RecordingBuilder {
    formatting: Formatting,
    ops: Vec<(Option<Region>, BuildOp)>,
    region: Option<Region>,
    image_root: Option<PathBuf>,
    list_depth: usize,
    table_depth: usize,
}

impl RecordingBuilder {
    pub fn new() -> Self {
        RecordingBuilder::default()
    }

    /// Fail `insert_image` for paths that do not exist under `root`.
    pub fn verify_images_in(mut self, root: impl Into<PathBuf>) -> Self {
        self.image_root = Some(root.into());
        self
    }

    pub fn ops(&self) -> &[(Option<Region>, BuildOp)] {
        &self.ops
    }

    /// Every text run written to the main body, in order.
    pub fn writes(&self) -> impl Iterator<Item = (&str, &Formatting)> {
        self.ops.iter().filter_map(|(region, op)| match (region, op) {
            (None, BuildOp::Write { text, formatting }) => Some((text.as_str(), formatting)),
            _ => None,
        })
    }

    /// Plain-text rendition of the main body.
    pub fn body_text(&self) -> String {
        self.render_text(None)
    }

    /// Plain-text rendition of one header/footer region.
    pub fn region_text(&self, region: Region) -> String {
        self.render_text(Some(region))
    }

    fn record(&mut self, op: BuildOp) {
        self.ops.push((self.region, op));
    }

    fn render_text(&self, region: Option<Region>) -> String {
        let mut text = TextRendition::default();
        for (_, op) in self.ops.iter().filter(|(r, _)| *r == region) {
            text.apply(op);
        }
        text.finish()
    }
}

#[derive(Default)]
struct TextRendition {
    lines: Vec<String>,
    paragraph: String,
    list: Option<(ListKind, usize)>,
    row: Option<Vec<String>>,
}

impl TextRendition {
    fn push(&mut self, s: &str) {
        match self.row.as_mut().and_then(|row| row.last_mut()) {
            Some(cell) => cell.push_str(s),
            None => self.paragraph.push_str(s),
        }
    }

    fn flush(&mut self) {
        if self.paragraph.is_empty() {
            return;
        }
        let paragraph = std::mem::take(&mut self.paragraph);
        let line = match self.list.as_mut() {
            Some((ListKind::Bullet, _)) => format!("- {}", paragraph),
            Some((ListKind::Numbered, n)) => {
                *n += 1;
                format!("{}. {}", n, paragraph)
            }
            None => paragraph,
        };
        self.lines.push(line);
    }

    fn apply(&mut self, op: &BuildOp) {
        match op {
            BuildOp::Write { text, .. } => self.push(text),
            BuildOp::Paragraph(_) => {
                if self.row.is_none() {
                    self.flush();
                }
            }
            BuildOp::Image(path) => self.push(&format!("[image: {}]", path.display())),
            BuildOp::StartList(kind) => {
                self.flush();
                self.list = Some((*kind, 0));
            }
            BuildOp::EndList => {
                self.flush();
                self.list = None;
            }
            BuildOp::StartTable => {
                self.flush();
                self.row = Some(Vec::new());
            }
            BuildOp::Cell => {
                if let Some(row) = self.row.as_mut() {
                    row.push(String::new());
                }
            }
            BuildOp::EndRow => {
                if let Some(row) = self.row.as_mut() {
                    let cells = std::mem::take(row);
                    self.lines.push(cells.join(" | "));
                }
            }
            BuildOp::EndTable => {
                if let Some(cells) = self.row.take().filter(|cells| !cells.is_empty()) {
                    self.lines.push(cells.join(" | "));
                }
            }
            BuildOp::Field { code, argument } => match argument {
                Some(arg) => self.push(&format!("{{{} {}}}", code, arg)),
                None => self.push(&format!("{{{}}}", code)),
            },
            BuildOp::Note { kind, body } => {
                let tag = match kind {
                    NoteKind::Footnote => "footnote",
                    NoteKind::Endnote => "endnote",
                };
                self.push(&format!("[{}: {}]", tag, body));
            }
        }
    }

    fn finish(mut self) -> String {
        self.flush();
        self.lines.join("\n")
    }
}

impl DocumentBuilder for RecordingBuilder {
    fn formatting(&self) -> &Formatting {
        &self.formatting
    }

    fn formatting_mut(&mut self) -> &mut Formatting {
        &mut self.formatting
    }

    fn write(&mut self, text: &str) -> Result<(), BuildError> {
        if !text.is_empty() {
            let formatting = self.formatting.clone();
            self.record(BuildOp::Write {
                text: text.to_string(),
                formatting,
            });
        }
        Ok(())
    }

    fn insert_paragraph(&mut self) -> Result<(), BuildError> {
        let format = self.formatting.paragraph.clone();
        self.record(BuildOp::Paragraph(format));
        Ok(())
    }

    fn insert_image(&mut self, path: &Path) -> Result<(), BuildError> {
        if let Some(root) = &self.image_root {
            if !root.join(path).is_file() {
                return Err(BuildError::MissingImage(path.to_path_buf()));
            }
        }
        self.record(BuildOp::Image(path.to_path_buf()));
        Ok(())
    }

    fn start_list(&mut self, kind: ListKind) -> Result<(), BuildError> {
        self.list_depth += 1;
        self.record(BuildOp::StartList(kind));
        Ok(())
    }

    fn end_list(&mut self) -> Result<(), BuildError> {
        if self.list_depth == 0 {
            return Err(BuildError::InvalidState("no open list to end".into()));
        }
        self.list_depth -= 1;
        self.record(BuildOp::EndList);
        Ok(())
    }

    fn start_table(&mut self) -> Result<(), BuildError> {
        self.table_depth += 1;
        self.record(BuildOp::StartTable);
        Ok(())
    }

    fn insert_cell(&mut self) -> Result<(), BuildError> {
        if self.table_depth == 0 {
            return Err(BuildError::InvalidState("cell outside of a table".into()));
        }
        self.record(BuildOp::Cell);
        Ok(())
    }

    fn end_row(&mut self) -> Result<(), BuildError> {
        if self.table_depth == 0 {
            return Err(BuildError::InvalidState("row end outside of a table".into()));
        }
        self.record(BuildOp::EndRow);
        Ok(())
    }

    fn end_table(&mut self) -> Result<(), BuildError> {
        if self.table_depth == 0 {
            return Err(BuildError::InvalidState("no open table to end".into()));
        }
        self.table_depth -= 1;
        self.record(BuildOp::EndTable);
        Ok(())
    }

    fn insert_field(&mut self, code: &str, argument: Option<&str>) -> Result<(), BuildError> {
        self.record(BuildOp::Field {
            code: code.to_string(),
            argument: argument.map(str::to_string),
        });
        Ok(())
    }

    fn insert_note(&mut self, kind: NoteKind, body: &str) -> Result<(), BuildError> {
        self.record(BuildOp::Note {
            kind,
            body: body.to_string(),
        });
        Ok(())
    }

    fn move_to_region(&mut self, region: Region) -> Result<(), BuildError> {
        self.region = Some(region);
        Ok(())
    }

    fn move_to_body(&mut self) -> Result<(), BuildError> {
        self.region = None;
        Ok(())
    }

    fn save(&self, path: &Path) -> Result<(), BuildError> {
        let mut text = self.body_text();
        text.push('\n');
        fs::write(path, text).map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn paragraphs_and_lists() {
        let mut b = RecordingBuilder::new();
        b.write("Intro").unwrap();
        b.insert_paragraph().unwrap();
        b.start_list(ListKind::Numbered).unwrap();
        for item in ["one", "two"] {
            b.write(item).unwrap();
            b.insert_paragraph().unwrap();
        }
        b.end_list().unwrap();
        b.insert_paragraph().unwrap();
        b.write("Outro").unwrap();

        assert_eq!(b.body_text(), "Intro\n1. one\n2. two\nOutro");
    }

    #[test]
    fn tables_render_rows() {
        let mut b = RecordingBuilder::new();
        b.start_table().unwrap();
        for row in [["a", "b"], ["c", "d"]] {
            for cell in row {
                b.insert_cell().unwrap();
                b.write(cell).unwrap();
            }
            b.end_row().unwrap();
        }
        b.end_table().unwrap();
        b.insert_paragraph().unwrap();

        assert_eq!(b.body_text(), "a | b\nc | d");
    }

    #[test]
    fn regions_are_kept_apart() {
        let mut b = RecordingBuilder::new();
        b.write("body ").unwrap();
        b.move_to_region(Region::HeaderPrimary).unwrap();
        b.write("Page ").unwrap();
        b.insert_field("PAGE", None).unwrap();
        b.move_to_body().unwrap();
        b.write("continues").unwrap();

        assert_eq!(b.body_text(), "body continues");
        assert_eq!(b.region_text(Region::HeaderPrimary), "Page {PAGE}");
        assert_eq!(b.region_text(Region::FooterEven), "");
    }

    #[test]
    fn unbalanced_structure_is_rejected() {
        let mut b = RecordingBuilder::new();
        assert!(matches!(b.end_list(), Err(BuildError::InvalidState(_))));
        assert!(matches!(b.insert_cell(), Err(BuildError::InvalidState(_))));
        assert!(matches!(b.end_table(), Err(BuildError::InvalidState(_))));
    }

    #[test]
    fn missing_images_fail_when_verified() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("present.png"), b"png").unwrap();
        let mut b = RecordingBuilder::new().verify_images_in(dir.path());

        b.insert_image(Path::new("present.png")).unwrap();
        assert!(matches!(
            b.insert_image(Path::new("absent.png")),
            Err(BuildError::MissingImage(_))
        ));
        assert_eq!(b.body_text(), "[image: present.png]");
    }

    #[test]
    fn save_writes_body_text() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let mut b = RecordingBuilder::new();
        b.write("Hello").unwrap();
        b.insert_note(NoteKind::Footnote, "a note").unwrap();
        b.save(&out).unwrap();

        assert_eq!(fs::read_to_string(&out).unwrap(), "Hello[footnote: a note]\n");
    }
}
