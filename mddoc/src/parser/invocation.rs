use std::ops::Range;

/// Command name implied by the `@{...}` shorthand.
pub const FOOTNOTE: &str = "footnote";
/// Command name implied by the `^{...}` shorthand.
pub const ENDNOTE: &str = "endnote";

/// One inline command occurrence located in a text run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub name: String,
    pub args: Vec<String>,
    /// Byte span of the whole invocation in the scanned text.
    pub span: Range<usize>,
}

#[derive(Default)]
struct Scanner {
    current: Option<Invocation>,
    arg: String,
    balance: usize,
    found: Vec<Invocation>,
}

impl Scanner {
    fn open(&mut self, name: &str, start: usize) {
        self.current = Some(Invocation {
            name: name.to_string(),
            args: Vec::new(),
            span: start..start,
        });
        self.arg.clear();
        self.balance = 0;
    }

    /// A name was read but no `{` has followed yet.
    fn awaiting_brace(&self) -> bool {
        self.current.is_some() && self.balance == 0
    }

    fn end_arg(&mut self) {
        if self.arg.is_empty() {
            return;
        }
        let arg = std::mem::take(&mut self.arg);
        if let Some(current) = self.current.as_mut() {
            current.args.push(arg);
        }
    }

    fn close(&mut self, end: usize) {
        self.end_arg();
        if let Some(mut invocation) = self.current.take() {
            invocation.span.end = end;
            self.found.push(invocation);
        }
        self.balance = 0;
    }
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Locate every top-level invocation in `text`, in order.
///
/// Recognised forms are `%name{arg arg}`, `%name` (no arguments),
/// `@{...}` and `^{...}`. Braces nested inside an argument are kept
/// verbatim in that argument rather than parsed; the caller decides
/// whether to scan arguments again. A backslash escapes the next
/// character. An invocation left open at the end of the text is still
/// reported, its span ending at the end of the text.
pub fn find_invocations(text: &str) -> Vec<Invocation> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut scanner = Scanner::default();
    let mut i = 0;

    while i < chars.len() {
        let (pos, c) = chars[i];

        if scanner.awaiting_brace() && c != '{' {
            scanner.close(pos);
        }

        match c {
            '\\' => {
                if scanner.balance > 0 {
                    scanner.arg.push(c);
                    if let Some(&(_, escaped)) = chars.get(i + 1) {
                        scanner.arg.push(escaped);
                    }
                }
                i += 2;
                continue;
            }
            '%' if scanner.balance == 0 => {
                let name: String = chars[i + 1..]
                    .iter()
                    .map(|&(_, c)| c)
                    .take_while(|&c| is_word(c))
                    .collect();
                if !name.is_empty() {
                    scanner.open(&name, pos);
                    i += 1 + name.chars().count();
                    continue;
                }
            }
            '@' | '^' if scanner.balance == 0 => {
                if matches!(chars.get(i + 1), Some(&(_, '{'))) {
                    scanner.open(if c == '@' { FOOTNOTE } else { ENDNOTE }, pos);
                }
            }
            '{' => {
                if scanner.current.is_some() {
                    scanner.balance += 1;
                    if scanner.balance > 1 {
                        scanner.arg.push(c);
                    }
                }
            }
            '}' if scanner.balance > 0 => {
                scanner.balance -= 1;
                if scanner.balance == 0 {
                    scanner.close(pos + c.len_utf8());
                } else {
                    scanner.arg.push(c);
                }
            }
            c if c.is_whitespace() && scanner.balance == 1 => scanner.end_arg(),
            c => {
                if scanner.balance > 0 {
                    scanner.arg.push(c);
                }
            }
        }
        i += 1;
    }

    if scanner.current.is_some() {
        scanner.close(text.len());
    }
    scanner.found
}
