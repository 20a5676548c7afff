use crate::delimiter::{Delimiter, Delimiters};

/// Byte used in place of masked text.
pub const FILLER: char = ' ';

/// Produces the search view of a sequence of lines.
///
/// Every byte inside a comment or string (delimiters included) becomes
/// [`FILLER`], so the masked line has the same byte length as the raw one and
/// any offset found in it is a valid char boundary in the raw line.
#[derive(Debug, Clone, Default)]
pub struct Masker {
    delimiters: Delimiters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State<'d> {
    Code,
    Block { close: &'d str },
}

impl Masker {
    pub fn new(delimiters: Delimiters) -> Self {
        Self { delimiters }
    }

    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    /// Mask a whole file. Block comments carry over from one line to the next.
    pub fn mask_lines<S: AsRef<str>>(&self, lines: &[S]) -> Vec<String> {
        let mut state = State::Code;
        lines
            .iter()
            .map(|l| {
                let (masked, next) = self.mask_with_state(l.as_ref(), state);
                state = next;
                masked
            })
            .collect()
    }

    /// Mask one line in isolation, starting outside any comment.
    pub fn mask_line(&self, line: &str) -> String {
        self.mask_with_state(line, State::Code).0
    }

    fn mask_with_state<'d>(&'d self, line: &str, mut state: State<'d>) -> (String, State<'d>) {
        let mut out = String::with_capacity(line.len());
        let mut i = 0usize;
        while i < line.len() {
            let rest = &line[i..];
            match state {
                State::Block { close } => {
                    let end = match rest.find(close) {
                        Some(rel) => {
                            state = State::Code;
                            i + rel + close.len()
                        }
                        None => line.len(),
                    };
                    blank(&mut out, &line[i..end]);
                    i = end;
                }
                State::Code => match self.opener_at(rest) {
                    Some(Delimiter::Line(_)) => {
                        blank(&mut out, rest);
                        i = line.len();
                    }
                    Some(Delimiter::Block { open, close }) => {
                        blank(&mut out, open);
                        i += open.len();
                        state = State::Block {
                            close: close.as_str(),
                        };
                    }
                    Some(Delimiter::Quote(q)) => {
                        let end = i + quoted_len(rest, *q);
                        blank(&mut out, &line[i..end]);
                        i = end;
                    }
                    None => {
                        // `rest` is non-empty here.
                        let c = rest.chars().next().unwrap_or(FILLER);
                        out.push(c);
                        i += c.len_utf8();
                    }
                },
            }
        }
        (out, state)
    }

    /// The delimiter whose opener starts `rest`, longest opener first.
    fn opener_at(&self, rest: &str) -> Option<&Delimiter> {
        self.delimiters
            .iter()
            .filter(|d| rest.starts_with(d.opener().as_str()))
            .max_by_key(|d| d.opener().len())
    }
}

/// Byte length of the quoted literal at the start of `s`, closing quote
/// included. An unterminated literal runs to the end of the line.
fn quoted_len(s: &str, quote: char) -> usize {
    let mut chars = s.char_indices().skip(1);
    while let Some((idx, c)) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == quote {
            return idx + c.len_utf8();
        }
    }
    s.len()
}

fn blank(out: &mut String, span: &str) {
    out.extend(std::iter::repeat(FILLER).take(span.len()));
}
