use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use codecursor_mask::Masker;
use regex::Regex;
use tracing::{debug, trace};

use crate::config::EditorConfig;
use crate::EditError;

#[cfg(windows)]
const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
const LINE_ENDING: &str = "\n";

/// Outcome of a line search.
///
/// On `NotFound` the cursor is left just outside the buffer: at `len` after a
/// forward search, at `-1` after a backward one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Search {
    Found(usize),
    NotFound,
}

impl Search {
    pub fn is_found(self) -> bool {
        matches!(self, Search::Found(_))
    }

    pub fn index(self) -> Option<usize> {
        match self {
            Search::Found(i) => Some(i),
            Search::NotFound => None,
        }
    }
}

/// Where an inserted line takes its leading whitespace from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndentRule {
    /// Copy from the line after the cursor instead of the cursor line.
    pub from_following: bool,
    /// Characters removed from the end of the copied indent.
    pub back: usize,
}

impl IndentRule {
    pub fn previous() -> Self {
        Self::default()
    }

    pub fn following() -> Self {
        Self {
            from_following: true,
            back: 0,
        }
    }

    pub fn back(mut self, chars: usize) -> Self {
        self.back = chars;
        self
    }
}

/// One line in both views. Keeping them in one record means an insert can
/// never touch one view without the other.
#[derive(Debug, Clone)]
struct Line {
    raw: String,
    search: String,
    modified: bool,
}

/// A source file held as lines, with a cursor and a masked search view.
///
/// Searches look at the search view, where comments and string literals are
/// blanked (see [`Masker`]); edits go to both views at once.
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: Option<PathBuf>,
    lines: Vec<Line>,
    position: isize,
    member_markers: Vec<String>,
}

impl SourceFile {
    fn build(path: Option<PathBuf>, raw: Vec<String>, config: &EditorConfig) -> Self {
        let search = Masker::new(config.delimiters.clone()).mask_lines(&raw);
        let lines = raw
            .into_iter()
            .zip(search)
            .map(|(raw, search)| Line {
                raw,
                search,
                modified: false,
            })
            .collect();
        Self {
            path,
            lines,
            position: 0,
            member_markers: config.member_markers.clone(),
        }
    }

    /// Load the file at `path` with the default configuration.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EditError> {
        Self::load(path, &EditorConfig::default())
    }

    pub fn load(path: impl AsRef<Path>, config: &EditorConfig) -> Result<Self, EditError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| EditError::io(path, e))?;
        let text = String::from_utf8(bytes).map_err(|_| EditError::NonUtf8 {
            path: path.to_path_buf(),
        })?;
        let raw: Vec<String> = text.lines().map(str::to_string).collect();
        debug!(path = %path.display(), lines = raw.len(), "loaded source file");
        Ok(Self::build(Some(path.to_path_buf()), raw, config))
    }

    /// Start an empty buffer that [`write`](Self::write) will save to `path`.
    pub fn create(path: impl AsRef<Path>, config: &EditorConfig) -> Self {
        Self::build(Some(path.as_ref().to_path_buf()), Vec::new(), config)
    }

    /// Build from lines already in memory. Such a file has no path to write to.
    pub fn from_lines(lines: Vec<String>, config: &EditorConfig) -> Self {
        Self::build(None, lines, config)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Save the raw lines back to the path this file was opened or created with.
    pub fn write(&self) -> Result<(), EditError> {
        let path = self.path.as_deref().ok_or(EditError::NoPath)?;
        self.write_to(path)
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), EditError> {
        let path = path.as_ref();
        let mut content = String::with_capacity(self.lines.iter().map(|l| l.raw.len() + 2).sum());
        for l in &self.lines {
            content.push_str(&l.raw);
            content.push_str(LINE_ENDING);
        }
        write_atomic(path, &content).map_err(|e| EditError::io(path, e))?;
        debug!(path = %path.display(), lines = self.lines.len(), "wrote source file");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The cursor. May be `-1` or `len()` after a failed search.
    pub fn position(&self) -> isize {
        self.position
    }

    fn last_index(&self) -> isize {
        self.lines.len() as isize - 1
    }

    fn current_index(&self) -> Option<usize> {
        usize::try_from(self.position)
            .ok()
            .filter(|&i| i < self.lines.len())
    }

    pub fn to_top(&mut self) {
        self.position = 0;
    }

    pub fn to_bottom(&mut self) {
        self.position = self.last_index().max(0);
    }

    /// Move the cursor by `offset`. Returns false when the move had to be
    /// clamped to the first or last line.
    pub fn jump(&mut self, offset: isize) -> bool {
        let target = self.position.saturating_add(offset);
        if target > self.last_index() {
            self.position = self.last_index().max(0);
            false
        } else if target < 0 {
            self.position = 0;
            false
        } else {
            self.position = target;
            true
        }
    }

    fn seek_forward(&mut self, mut pred: impl FnMut(&str) -> bool) -> Search {
        let start = usize::try_from(self.position).unwrap_or(0);
        let found = self
            .lines
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, l)| pred(&l.search))
            .map(|(i, _)| i);
        let outcome = match found {
            Some(i) => {
                self.position = i as isize;
                Search::Found(i)
            }
            None => {
                self.position = self.lines.len() as isize;
                Search::NotFound
            }
        };
        trace!(?outcome, start, "forward search");
        outcome
    }

    fn seek_backward(&mut self, mut pred: impl FnMut(&str) -> bool) -> Search {
        // A cursor parked past the end starts from the last line.
        let start = match (usize::try_from(self.position), self.lines.len().checked_sub(1)) {
            (Ok(p), Some(last)) => Some(p.min(last)),
            _ => None,
        };
        let found = start.and_then(|s| (0..=s).rev().find(|&i| pred(&self.lines[i].search)));
        let outcome = match found {
            Some(i) => {
                self.position = i as isize;
                Search::Found(i)
            }
            None => {
                self.position = -1;
                Search::NotFound
            }
        };
        trace!(?outcome, ?start, "backward search");
        outcome
    }

    /// First line at or after the cursor whose search view contains `needle`.
    pub fn find_line_contains(&mut self, needle: &str) -> Search {
        self.seek_forward(|l| l.contains(needle))
    }

    /// Last line at or before the cursor whose search view contains `needle`.
    pub fn find_prev_line_contains(&mut self, needle: &str) -> Search {
        self.seek_backward(|l| l.contains(needle))
    }

    /// First line at or after the cursor that is exactly `text` once trimmed.
    pub fn find_line_is(&mut self, text: &str) -> Search {
        self.seek_forward(|l| l.trim() == text)
    }

    pub fn find_prev_line_is(&mut self, text: &str) -> Search {
        self.seek_backward(|l| l.trim() == text)
    }

    /// First line at or after the cursor containing any of `candidates`.
    ///
    /// Returns the first candidate, in the order given, that the line contains.
    pub fn find_line_contains_any<'c, S: AsRef<str>>(
        &mut self,
        candidates: &'c [S],
    ) -> Option<&'c str> {
        let idx = self
            .seek_forward(|l| candidates.iter().any(|c| l.contains(c.as_ref())))
            .index()?;
        let line = &self.lines[idx].search;
        candidates.iter().map(|c| c.as_ref()).find(|c| line.contains(c))
    }

    pub fn find_line_matching(&mut self, re: &Regex) -> Search {
        self.seek_forward(|l| re.is_match(l))
    }

    /// Heuristic: put the cursor on the last line of the member the cursor is in.
    ///
    /// Looks ahead for the next line holding a member marker (`public`,
    /// `private`, ... by default) and backs up to the `}` before it. With no
    /// later member it walks back from the end of the file over three lone `}`
    /// lines, taken to close a namespace, a type and the member. Assumes braces
    /// sit alone on their own lines. On success the cursor is on the line just
    /// above the member's closing brace.
    pub fn find_end_of_member(&mut self) -> bool {
        self.jump(1);
        let markers = self.member_markers.clone();
        if self.find_line_contains_any(markers.as_slice()).is_some() {
            if !self.find_prev_line_is("}").is_found() {
                return false;
            }
            self.jump(-1);
            return true;
        }
        self.to_bottom();
        // namespace, type, member
        for _ in 0..3 {
            if !self.find_prev_line_is("}").is_found() {
                return false;
            }
            self.jump(-1);
        }
        true
    }

    /// Search view of the cursor line.
    pub fn current_line(&self) -> Option<&str> {
        self.current_index().map(|i| self.lines[i].search.as_str())
    }

    pub fn current_raw_line(&self) -> Option<&str> {
        self.current_index().map(|i| self.lines[i].raw.as_str())
    }

    pub fn line_contains(&self, needle: &str) -> bool {
        self.current_line().is_some_and(|l| l.contains(needle))
    }

    /// Insert `text` after the cursor line, indented like a neighbouring line,
    /// and move the cursor onto it. Returns the new line's index.
    pub fn insert_line_with_indent(&mut self, text: &str, rule: IndentRule) -> usize {
        let at = usize::try_from(self.position.saturating_add(1))
            .unwrap_or(0)
            .min(self.lines.len());
        let source = if rule.from_following {
            Some(at)
        } else {
            at.checked_sub(1)
        };
        let indent = source
            .and_then(|i| self.lines.get(i))
            .map_or("", |l| leading_whitespace(&l.raw));
        let text = format!("{}{}", trim_back(indent, rule.back), text);
        self.lines.insert(
            at,
            Line {
                raw: text.clone(),
                search: text,
                modified: true,
            },
        );
        self.position = at as isize;
        debug!(line = at, "inserted line");
        at
    }

    /// As [`insert_line_with_indent`](Self::insert_line_with_indent), unless some
    /// raw line already contains `text`.
    pub fn insert_unique_line_with_indent(&mut self, text: &str, rule: IndentRule) -> bool {
        if self.lines.iter().any(|l| l.raw.contains(text)) {
            trace!(text, "line already present");
            return false;
        }
        self.insert_line_with_indent(text, rule);
        true
    }

    /// Insert after the `)` matching the `(` that ends `match_text`.
    pub fn insert_text_after_matching_bracket(
        &mut self,
        match_text: &str,
        insertion: &str,
    ) -> Result<bool, EditError> {
        self.insert_text_after_matching_bracket_with(match_text, insertion, '(', ')')
    }

    /// Find the first `match_text` on the cursor line, then the `close` that
    /// balances its trailing `open`, possibly on a later line, and insert
    /// `insertion` right after it. The cursor moves to that line.
    ///
    /// `match_text` not ending in `open` is a caller bug and returns an error.
    /// `Ok(false)` means nothing was changed: no match, no balancing bracket
    /// before end of file, or a comment or string before the insertion point on
    /// its line.
    pub fn insert_text_after_matching_bracket_with(
        &mut self,
        match_text: &str,
        insertion: &str,
        open: char,
        close: char,
    ) -> Result<bool, EditError> {
        if !match_text.ends_with(open) {
            return Err(EditError::BracketMatch {
                match_text: match_text.to_string(),
                open,
            });
        }
        let Some(first) = self.current_index() else {
            return Ok(false);
        };
        let Some(found) = self.lines[first].search.find(match_text) else {
            return Ok(false);
        };
        let Some((idx, offset)) = self.matching_close(first, found + match_text.len(), open, close)
        else {
            trace!(match_text, "no balancing bracket");
            return Ok(false);
        };

        let line = &mut self.lines[idx];
        match (line.raw.get(..offset), line.search.get(..offset)) {
            (Some(raw), Some(search)) if raw == search => {}
            _ => {
                debug!(line = idx, "raw and search views differ before insertion point");
                return Ok(false);
            }
        }
        line.raw.insert_str(offset, insertion);
        line.search.insert_str(offset, insertion);
        line.modified = true;
        self.position = idx as isize;
        debug!(line = idx, offset, "inserted after bracket");
        Ok(true)
    }

    /// Line and byte offset just past the `close` that brings the depth from 1 to 0.
    fn matching_close(
        &self,
        line: usize,
        from: usize,
        open: char,
        close: char,
    ) -> Option<(usize, usize)> {
        let mut depth = 1usize;
        let mut from = from;
        for (idx, l) in self.lines.iter().enumerate().skip(line) {
            for (off, c) in l.search[from..].char_indices() {
                if c == open {
                    depth += 1;
                } else if c == close {
                    depth -= 1;
                    if depth == 0 {
                        return Some((idx, from + off + c.len_utf8()));
                    }
                }
            }
            from = 0;
        }
        None
    }

    /// Replace every `old` with `new` on the cursor line, if the search view has it.
    pub fn replace_text(&mut self, old: &str, new: &str) -> bool {
        if old.is_empty() {
            return false;
        }
        let Some(i) = self.current_index() else {
            return false;
        };
        let line = &mut self.lines[i];
        if !line.search.contains(old) {
            return false;
        }
        line.raw = line.raw.replace(old, new);
        line.search = line.search.replace(old, new);
        line.modified = true;
        debug!(line = i, "replaced text");
        true
    }

    pub fn append_text(&mut self, text: &str) -> bool {
        let Some(i) = self.current_index() else {
            return false;
        };
        let line = &mut self.lines[i];
        line.raw.push_str(text);
        line.search.push_str(text);
        line.modified = true;
        true
    }

    /// Copy of the raw lines.
    pub fn lines(&self) -> Vec<String> {
        self.lines.iter().map(|l| l.raw.clone()).collect()
    }

    /// Copy of the search view.
    pub fn search_lines(&self) -> Vec<String> {
        self.lines.iter().map(|l| l.search.clone()).collect()
    }

    /// 0-based indices of lines inserted or changed since load.
    pub fn modified_lines(&self) -> Vec<usize> {
        self.lines
            .iter()
            .enumerate()
            .filter_map(|(i, l)| if l.modified { Some(i) } else { None })
            .collect()
    }
}

fn leading_whitespace(s: &str) -> &str {
    &s[..s.len() - s.trim_start().len()]
}

fn trim_back(indent: &str, chars: usize) -> &str {
    let keep = indent.chars().count().saturating_sub(chars);
    let end = indent.char_indices().nth(keep).map_or(indent.len(), |(i, _)| i);
    &indent[..end]
}

/// Write via a sibling temp file and rename, keeping the target's permissions.
fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "source".to_string());

    let perms = fs::metadata(path).map(|m| m.permissions()).ok();

    let pid = process::id();
    let mut attempt: u64 = 0;
    let (tmp_path, mut file) = loop {
        let candidate = dir.join(format!(".{file_name}.codecursor.tmp.{pid}.{attempt}"));
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(f) => break (candidate, f),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e),
        }
    };

    let written = file.write_all(content.as_bytes()).and_then(|()| file.sync_all());
    drop(file);
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    if let Some(p) = perms {
        let _ = fs::set_permissions(&tmp_path, p);
    }
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        e
    })
}
