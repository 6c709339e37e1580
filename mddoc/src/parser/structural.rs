use std::sync::LazyLock;

use regex::Regex;

use crate::element::{BlockElement, ElementKind, SUBTITLE_LEVEL, TITLE_LEVEL};
use crate::macros::MacroTable;
use crate::parser::error::{Warning, warn};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Split source text on whichever line terminator it uses.
pub fn split_lines(source: &str) -> Vec<&str> {
    if source.contains("\r\n") {
        source.split("\r\n").collect()
    } else if source.contains('\r') {
        source.split('\r').collect()
    } else {
        source.split('\n').collect()
    }
}

/// Segment source text into block elements and collect macro definitions.
pub fn segment(
    source: &str,
    diagnostics: &mut Vec<Warning>,
) -> (Vec<BlockElement>, MacroTable) {
    let mut state = SegmentState::new(diagnostics);
    for (index, line) in split_lines(source).into_iter().enumerate() {
        state.process_line(line.trim(), index + 1);
    }
    state.finalize()
}

// ---------------------------------------------------------------------------
// Segment state
// ---------------------------------------------------------------------------

static BANG_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^!\[(\w*)\]\((.*?)\)").expect("invalid image/table directive regex")
});

struct SegmentState<'a> {
    /// Element currently accumulating lines.
    current: BlockElement,
    /// Committed elements, in source order.
    elements: Vec<BlockElement>,
    macros: MacroTable,
    diagnostics: &'a mut Vec<Warning>,
}

impl<'a> SegmentState<'a> {
    fn new(diagnostics: &'a mut Vec<Warning>) -> Self {
        SegmentState {
            current: BlockElement::new(1),
            elements: Vec::new(),
            macros: MacroTable::new(),
            diagnostics,
        }
    }

    fn process_line(&mut self, line: &str, line_no: usize) {
        if line.is_empty() {
            self.commit(line_no + 1);
            return;
        }

        if line.chars().count() == 1 {
            self.current.push_text(line);
            return;
        }

        match line.chars().next() {
            Some('#') => self.headline(line, line_no),
            Some('-') if line.chars().all(|c| c == '-') => {
                self.current.kind = ElementKind::Headline;
                self.current.args = vec![SUBTITLE_LEVEL.to_string()];
                self.commit(line_no + 1);
            }
            Some('-') => self.list_item(ElementKind::UnorderedList, &line[1..], line_no),
            // Labels the pending element only; the next blank line or block
            // transition commits it.
            Some('=') if line.chars().all(|c| c == '=') => {
                self.current.kind = ElementKind::Headline;
                self.current.args = vec![TITLE_LEVEL.to_string()];
            }
            Some('>') => {
                if self.current.kind != ElementKind::BlockQuote {
                    self.transition(line_no);
                }
                self.current.kind = ElementKind::BlockQuote;
                self.append_line(line[1..].trim());
            }
            Some('!') => self.bang_directive(line, line_no),
            _ if line.starts_with("%=") || line.starts_with("%%") => {
                self.definition(line, line_no)
            }
            _ if line.starts_with("1.") => {
                self.list_item(ElementKind::OrderedList, &line[2..], line_no)
            }
            _ => self.plain_text(line, line_no),
        }
    }

    /// Move the current element to the output if it has any text, and start a
    /// fresh one bound to `next_line`.
    fn commit(&mut self, next_line: usize) {
        let element = std::mem::replace(&mut self.current, BlockElement::new(next_line));
        if element.text.is_some() {
            self.elements.push(element);
        }
    }

    /// Finish the pending element so a different block can start on `line_no`.
    fn transition(&mut self, line_no: usize) {
        if self.current.text.is_some() {
            self.commit(line_no);
        } else {
            self.current = BlockElement::new(line_no);
        }
    }

    /// Append a line, separating it from earlier content with a newline.
    fn append_line(&mut self, line: &str) {
        let text = self.current.text.get_or_insert_with(String::new);
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(line);
    }

    fn headline(&mut self, line: &str, line_no: usize) {
        let level = line.chars().take_while(|&c| c == '#').count();
        let mut text = line[level..].trim();
        if text.ends_with('#') {
            text = text.trim_end_matches('#').trim_end();
        }

        self.transition(line_no);
        self.current.kind = ElementKind::Headline;
        self.current.args = vec![level.to_string()];
        self.current.text = Some(text.to_string());
        self.commit(line_no + 1);
    }

    fn list_item(&mut self, kind: ElementKind, item: &str, line_no: usize) {
        if self.current.kind != kind {
            self.transition(line_no);
        }
        self.current.kind = kind;
        self.current.push_text(item.trim());
        self.current.push_text("\n");
    }

    fn bang_directive(&mut self, line: &str, line_no: usize) {
        let Some(caps) = BANG_DIRECTIVE.captures(line) else {
            warn(self.diagnostics, line_no, "wrong arguments for `!` directive");
            return;
        };
        let label = caps.get(1).map_or("", |m| m.as_str());
        let raw_args = caps.get(2).map_or("", |m| m.as_str());
        if raw_args.is_empty() {
            warn(self.diagnostics, line_no, "wrong arguments for `!` directive");
            return;
        }

        self.transition(line_no);
        self.current.label = label.to_string();
        self.current.text = Some(String::new());

        if raw_args.starts_with(' ') {
            // An empty first argument marks a table; its rows follow.
            self.current.kind = ElementKind::Table;
            self.current.args = std::iter::once(String::new())
                .chain(raw_args.split_whitespace().map(str::to_string))
                .collect();
        } else {
            self.current.kind = ElementKind::Image;
            self.current.args = raw_args.split_whitespace().map(str::to_string).collect();
            self.commit(line_no + 1);
        }
    }

    fn definition(&mut self, line: &str, line_no: usize) {
        let overwrite = line.starts_with("%%");
        let Some((name, template)) = line[2..].split_once(':') else {
            warn(
                self.diagnostics,
                line_no,
                "insufficient arguments for command definition",
            );
            return;
        };
        if name.is_empty() {
            warn(
                self.diagnostics,
                line_no,
                "insufficient arguments for command definition",
            );
            return;
        }

        if overwrite {
            self.macros.define_or_overwrite(name, template);
        } else if let Err(err) = self.macros.define(name, template) {
            warn(self.diagnostics, line_no, err.to_string());
        }
    }

    fn plain_text(&mut self, line: &str, line_no: usize) {
        match self.current.kind {
            ElementKind::Table => {
                self.current.push_text(line);
                self.current.push_text("\n");
                return;
            }
            ElementKind::Headline | ElementKind::UnorderedList | ElementKind::OrderedList => {
                self.transition(line_no);
            }
            _ => {}
        }
        self.append_line(line);
    }

    fn finalize(mut self) -> (Vec<BlockElement>, MacroTable) {
        let next = self.current.line;
        self.commit(next);
        (self.elements, self.macros)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(source: &str) -> (Vec<BlockElement>, MacroTable, Vec<Warning>) {
        let mut diagnostics = Vec::new();
        let (elements, macros) = segment(source, &mut diagnostics);
        (elements, macros, diagnostics)
    }

    fn kinds(elements: &[BlockElement]) -> Vec<ElementKind> {
        elements.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn detects_line_terminators() {
        assert_eq!(split_lines("a\r\nb\rc"), vec!["a", "b\rc"]);
        assert_eq!(split_lines("a\rb"), vec!["a", "b"]);
        assert_eq!(split_lines("a\nb\n"), vec!["a", "b", ""]);
    }

    #[test]
    fn heading_and_paragraph() {
        let (elements, _, diagnostics) = run("# Title\n\nHello %b{World}");
        assert!(diagnostics.is_empty());
        assert_eq!(kinds(&elements), vec![ElementKind::Headline, ElementKind::PlainText]);
        assert_eq!(elements[0].text(), "Title");
        assert_eq!(elements[0].heading_level(), Some(1));
        assert_eq!(elements[1].text(), "Hello %b{World}");
        assert_eq!(elements[1].line, 3);
    }

    #[test]
    fn heading_level_and_closing_hashes() {
        let (elements, _, _) = run("### Deep ###");
        assert_eq!(elements[0].heading_level(), Some(3));
        assert_eq!(elements[0].text(), "Deep");
    }

    #[test]
    fn dashes_mark_a_subtitle_and_commit() {
        let (elements, _, _) = run("Sub title\n---\nbody");
        assert_eq!(kinds(&elements), vec![ElementKind::Headline, ElementKind::PlainText]);
        assert_eq!(elements[0].heading_level(), Some(-1));
        assert_eq!(elements[0].text(), "Sub title");
        assert_eq!(elements[1].line, 3);
    }

    #[test]
    fn equals_marks_a_title_without_committing() {
        let (elements, _, _) = run("Big Title\n===\n\nbody");
        assert_eq!(kinds(&elements), vec![ElementKind::Headline, ElementKind::PlainText]);
        assert_eq!(elements[0].heading_level(), Some(0));
        assert_eq!(elements[0].text(), "Big Title");
    }

    #[test]
    fn pending_title_is_committed_by_the_next_block() {
        let (elements, _, _) = run("Big Title\n===\n- item");
        assert_eq!(
            kinds(&elements),
            vec![ElementKind::Headline, ElementKind::UnorderedList]
        );
        assert_eq!(elements[1].line, 3);
    }

    #[test]
    fn unordered_list_body_is_newline_terminated() {
        let (elements, _, _) = run("- one\n- two\n-  three ");
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].kind, ElementKind::UnorderedList);
        assert_eq!(elements[0].text(), "one\ntwo\nthree\n");
        assert_eq!(elements[0].text().split('\n').count(), 4);
    }

    #[test]
    fn ordered_list() {
        let (elements, _, _) = run("1. first\n1. second");
        assert_eq!(elements[0].kind, ElementKind::OrderedList);
        assert_eq!(elements[0].items(), vec!["first", "second"]);
    }

    #[test]
    fn paragraph_lines_join_with_newlines() {
        let (elements, _, _) = run("one\ntwo\n\nthree");
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].text(), "one\ntwo");
        assert_eq!(elements[1].line, 4);
    }

    #[test]
    fn single_character_line_is_appended_verbatim() {
        let (elements, _, _) = run("abc\nx\nyz");
        assert_eq!(elements[0].text(), "abcx\nyz");
    }

    #[test]
    fn blockquote_lines() {
        let (elements, _, _) = run("> quoted\n> more");
        assert_eq!(elements[0].kind, ElementKind::BlockQuote);
        assert_eq!(elements[0].text(), "quoted\nmore");
    }

    #[test]
    fn image_without_counter() {
        let (elements, _, diagnostics) = run("![](path.png left)");
        assert!(diagnostics.is_empty());
        assert_eq!(elements[0].kind, ElementKind::Image);
        assert_eq!(elements[0].args, vec!["path.png", "left"]);
        assert_eq!(elements[0].label, "");
    }

    #[test]
    fn image_commits_immediately() {
        let (elements, _, _) = run("intro\n![fig1](a.png Figure A cat)\nafter");
        assert_eq!(
            kinds(&elements),
            vec![ElementKind::PlainText, ElementKind::Image, ElementKind::PlainText]
        );
        assert_eq!(elements[1].label, "fig1");
        assert_eq!(elements[1].args, vec!["a.png", "Figure", "A", "cat"]);
        assert_eq!(elements[2].line, 3);
    }

    #[test]
    fn table_collects_rows() {
        let (elements, _, _) = run("![t1]( Table Scores)\n+--+\na\tb\n+--+\n\nafter");
        assert_eq!(kinds(&elements), vec![ElementKind::Table, ElementKind::PlainText]);
        let table = &elements[0];
        assert_eq!(table.label, "t1");
        assert_eq!(table.args, vec!["", "Table", "Scores"]);
        assert_eq!(table.items(), vec!["+--+", "a\tb", "+--+"]);
    }

    #[test]
    fn malformed_bang_is_skipped_with_warning() {
        let (elements, _, diagnostics) = run("!oops\n![x]()\ntext");
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].text(), "text");
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].line, 1);
        assert_eq!(diagnostics[1].line, 2);
    }

    #[test]
    fn definitions_do_not_create_elements() {
        let (elements, macros, diagnostics) = run("%=b:**{0}**\n%=b:other\n%%i:_{0}_");
        assert!(elements.is_empty());
        assert_eq!(macros.get("b"), Some("**{0}**"));
        assert_eq!(macros.get("i"), Some("_{0}_"));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].to_string(), "line 2: command `b` already defined");
    }

    #[test]
    fn overwrite_after_define() {
        let (_, macros, diagnostics) = run("%=x:A\n%%x:B");
        assert_eq!(macros.get("x"), Some("B"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn template_keeps_later_colons() {
        let (_, macros, _) = run("%=time:{0}:{1}");
        assert_eq!(macros.get("time"), Some("{0}:{1}"));
    }

    #[test]
    fn definition_without_colon_warns() {
        let (_, macros, diagnostics) = run("%=broken");
        assert!(macros.is_empty());
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn source_lines_are_monotonic() {
        let source = "# A\ntext\n\n- x\n- y\n> q\n\n![](i.png)\n1. o\nend";
        let (elements, _, _) = run(source);
        let lines: Vec<usize> = elements.iter().map(|e| e.line).collect();
        let mut sorted = lines.clone();
        sorted.sort();
        assert_eq!(lines, sorted);
        assert_eq!(lines.first(), Some(&1));
    }
}
