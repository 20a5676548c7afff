use std::str::FromStr;

use crate::MaskError;

/// One kind of span whose contents are hidden from search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delimiter {
    /// Masks from the marker to the end of the line, e.g. `//` or `#`.
    Line(String),
    /// Masks from `open` through `close`, possibly across lines.
    Block { open: String, close: String },
    /// A quoted literal; `\` escapes the next character.
    Quote(char),
}

impl Delimiter {
    /// The text that starts this span.
    pub fn opener(&self) -> String {
        match self {
            Delimiter::Line(m) => m.clone(),
            Delimiter::Block { open, .. } => open.clone(),
            Delimiter::Quote(q) => q.to_string(),
        }
    }
}

/// A validated set of delimiters.
///
/// The default set recognises `//` line comments, `/* */` block comments and
/// `"` strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    items: Vec<Delimiter>,
}

impl Delimiters {
    /// Validate and build a delimiter set. An empty set masks nothing.
    pub fn new(items: Vec<Delimiter>) -> Result<Self, MaskError> {
        let mut openers: Vec<String> = Vec::with_capacity(items.len());
        for d in &items {
            match d {
                Delimiter::Line(m) if m.is_empty() => return Err(MaskError::EmptyMarker),
                Delimiter::Block { open, close } if open.is_empty() || close.is_empty() => {
                    return Err(MaskError::IncompleteBlock(format!("{open} {close}")))
                }
                Delimiter::Quote(q) if q.is_whitespace() => return Err(MaskError::WhitespaceQuote),
                _ => {}
            }
            let opener = d.opener();
            if openers.contains(&opener) {
                return Err(MaskError::DuplicateOpener(opener));
            }
            openers.push(opener);
        }
        Ok(Self { items })
    }

    /// No masking at all; the search view equals the raw text.
    pub fn none() -> Self {
        Self { items: Vec::new() }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Delimiter> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            items: vec![
                Delimiter::Line("//".to_string()),
                Delimiter::Block {
                    open: "/*".to_string(),
                    close: "*/".to_string(),
                },
                Delimiter::Quote('"'),
            ],
        }
    }
}

/// Parse the comma-separated text form, e.g. `//,/* */,"`.
///
/// An item holding a single space is a block pair, a lone `"`, `'` or `` ` ``
/// is a quote and anything else is a line comment marker.
impl FromStr for Delimiters {
    type Err = MaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::none());
        }
        let mut items = Vec::new();
        for raw in s.split(',') {
            let item = raw.trim();
            if item.is_empty() {
                return Err(MaskError::EmptyMarker);
            }
            let parts: Vec<&str> = item.split_whitespace().collect();
            let d = match parts.as_slice() {
                [open, close] => Delimiter::Block {
                    open: open.to_string(),
                    close: close.to_string(),
                },
                [single] => match single.chars().collect::<Vec<_>>().as_slice() {
                    [q @ ('"' | '\'' | '`')] => Delimiter::Quote(*q),
                    _ => Delimiter::Line(single.to_string()),
                },
                _ => return Err(MaskError::IncompleteBlock(item.to_string())),
            };
            items.push(d);
        }
        Self::new(items)
    }
}
