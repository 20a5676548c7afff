//! Edit scripts: one cursor command per line, run in order against a [`SourceFile`].
//!
//! ```text
//! find class Program
//! end
//! insert+ Log("done");
//! ?replace/Old/New/
//! ```
//!
//! A leading `?` marks a command whose failure is ignored. Lines that are blank
//! or start with `#` are skipped in scripts.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::source::{IndentRule, SourceFile};
use crate::EditError;

/// One parsed command and the text it came from.
#[derive(Debug, Clone)]
pub struct Command {
    pub op: Op,
    pub optional: bool,
    pub source: String,
}

/// A cursor or edit operation.
#[derive(Debug, Clone)]
pub enum Op {
    Top,
    Bottom,
    Jump(isize),
    Find(String),
    FindPrev(String),
    LineIs(String),
    PrevLineIs(String),
    FindAny(Vec<String>),
    FindRegex(Regex),
    EndOfMember,
    Insert { text: String, rule: IndentRule },
    /// Inserting nothing because the text is already present still succeeds.
    InsertUnique { text: String, rule: IndentRule },
    Replace { old: String, new: String },
    Bracket {
        match_text: String,
        insertion: String,
        open: char,
        close: char,
    },
    Append(String),
}

/// Parse a script, one command per line.
pub fn parse_script(script: &str) -> Result<Vec<Command>, EditError> {
    let mut out = Vec::new();
    for (n, line) in script.split('\n').enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let cmd = parse_command(line).map_err(|e| EditError::parse(format!("line {}: {e}", n + 1)))?;
        out.push(cmd);
    }
    Ok(out)
}

/// Parse commands given one per element (e.g. CLI arguments). Blank elements are skipped.
pub fn parse_commands<S: AsRef<str>>(cmds: &[S]) -> Result<Vec<Command>, EditError> {
    cmds.iter()
        .map(|c| c.as_ref())
        .filter(|c| !c.trim().is_empty())
        .map(parse_command)
        .collect()
}

fn head_re() -> &'static Regex {
    static HEAD: OnceLock<Regex> = OnceLock::new();
    HEAD.get_or_init(|| {
        Regex::new(r"^(\?)?([a-z]+)(\+)?(?:<(\d+))?").expect("command head pattern is valid")
    })
}

fn parse_command(line: &str) -> Result<Command, EditError> {
    let line = line.trim_start();
    let caps = head_re()
        .captures(line)
        .ok_or_else(|| EditError::parse(format!("missing command in {line:?}")))?;
    let optional = caps.get(1).is_some();
    let name = &caps[2];
    let from_following = caps.get(3).is_some();
    let back = match caps.get(4) {
        Some(m) => m
            .as_str()
            .parse::<usize>()
            .map_err(|_| EditError::parse(format!("invalid back-indent: {:?}", m.as_str())))?,
        None => 0,
    };
    let has_modifiers = from_following || caps.get(4).is_some();
    if has_modifiers && name != "insert" && name != "unique" {
        return Err(EditError::parse(format!(
            "indent modifiers only apply to insert and unique, not {name}"
        )));
    }
    let rest = &line[caps[0].len()..];
    let rule = IndentRule {
        from_following,
        back,
    };

    let op = match name {
        "top" => no_args(rest, Op::Top)?,
        "bottom" => no_args(rest, Op::Bottom)?,
        "end" => no_args(rest, Op::EndOfMember)?,
        "jump" => {
            let n = rest.trim();
            Op::Jump(
                n.parse::<isize>()
                    .map_err(|_| EditError::parse(format!("invalid jump offset: {n:?}")))?,
            )
        }
        "find" => Op::Find(required_text(name, rest)?),
        "rfind" => Op::FindPrev(required_text(name, rest)?),
        "line" => Op::LineIs(text_arg(rest)?.trim().to_string()),
        "rline" => Op::PrevLineIs(text_arg(rest)?.trim().to_string()),
        "any" => {
            let text = required_text(name, rest)?;
            let candidates: Vec<String> = text.split('|').map(|c| c.trim().to_string()).collect();
            if candidates.iter().any(String::is_empty) {
                return Err(EditError::parse("any: empty candidate"));
            }
            Op::FindAny(candidates)
        }
        "regex" => {
            let pattern = required_text(name, rest)?;
            Op::FindRegex(
                Regex::new(&pattern).map_err(|e| EditError::parse(format!("invalid regex: {e}")))?,
            )
        }
        "insert" => Op::Insert {
            text: text_arg(rest)?,
            rule,
        },
        "unique" => Op::InsertUnique {
            text: text_arg(rest)?,
            rule,
        },
        "append" => Op::Append(required_text(name, rest)?),
        "replace" => {
            let (old, new) = parse_pair(name, rest)?;
            if old.is_empty() {
                return Err(EditError::parse("replace: text to replace may not be empty"));
            }
            Op::Replace { old, new }
        }
        "bracket" => {
            let (match_text, insertion) = parse_pair(name, rest)?;
            let open = match_text.chars().last().unwrap_or(' ');
            let close = closing_bracket(open).ok_or_else(|| {
                EditError::parse(format!(
                    "bracket: {match_text:?} must end with one of ( [ {{ <"
                ))
            })?;
            Op::Bracket {
                match_text,
                insertion,
                open,
                close,
            }
        }
        _ => return Err(EditError::parse(format!("unknown command: {name}"))),
    };

    Ok(Command {
        op,
        optional,
        source: line.to_string(),
    })
}

fn no_args(rest: &str, op: Op) -> Result<Op, EditError> {
    if !rest.trim().is_empty() {
        return Err(EditError::parse(format!(
            "unexpected trailing characters: {rest:?}"
        )));
    }
    Ok(op)
}

/// Everything after the single space that separates it from the command name.
fn text_arg(rest: &str) -> Result<String, EditError> {
    let mut chars = rest.chars();
    match chars.next() {
        None => Ok(String::new()),
        Some(c) if c.is_whitespace() => Ok(chars.as_str().to_string()),
        Some(_) => Err(EditError::parse(format!(
            "expected a space before {rest:?}"
        ))),
    }
}

fn required_text(name: &str, rest: &str) -> Result<String, EditError> {
    let text = text_arg(rest)?;
    if text.is_empty() {
        return Err(EditError::parse(format!("{name}: missing text")));
    }
    Ok(text)
}

/// Parse `/first/second/`, where `/` is whatever character follows the name.
fn parse_pair(name: &str, rest: &str) -> Result<(String, String), EditError> {
    let rest = rest.trim_start();
    let delim = rest
        .chars()
        .next()
        .filter(|c| !c.is_alphanumeric() && *c != '\\')
        .ok_or_else(|| EditError::parse(format!("{name} requires /first/second/")))?;
    let (first, after_first) = parse_delimited(rest, delim)?;
    let (second, trailing) = scan_to_delim(after_first, delim);
    if !trailing.trim().is_empty() {
        return Err(EditError::parse(format!(
            "unexpected trailing characters: {trailing:?}"
        )));
    }
    Ok((first, second))
}

fn closing_bracket(open: char) -> Option<char> {
    match open {
        '(' => Some(')'),
        '[' => Some(']'),
        '{' => Some('}'),
        '<' => Some('>'),
        _ => None,
    }
}

/// Parse a `/.../` delimited string from the start of `input`.
///
/// Returns (decoded, rest_after_closing_delim).
fn parse_delimited(input: &str, delim: char) -> Result<(String, &str), EditError> {
    let mut chars = input.chars();
    if chars.next() != Some(delim) {
        return Err(EditError::parse("missing delimiter"));
    }

    let mut out = String::new();
    let mut escaped = false;
    let mut consumed = delim.len_utf8();

    for ch in chars {
        consumed += ch.len_utf8();
        if escaped {
            out.push(ch);
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            continue;
        }
        if ch == delim {
            return Ok((out, &input[consumed..]));
        }
        out.push(ch);
    }

    Err(EditError::parse("unterminated delimited string"))
}

/// Scan for the next unescaped `delim`, returning (content, rest_after_delim).
/// A missing closing delimiter takes the rest of the input.
fn scan_to_delim(input: &str, delim: char) -> (String, &str) {
    let mut out = String::new();
    let mut escaped = false;
    let mut consumed = 0;
    for ch in input.chars() {
        consumed += ch.len_utf8();
        if escaped {
            out.push(ch);
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            continue;
        }
        if ch == delim {
            return (out, &input[consumed..]);
        }
        out.push(ch);
    }
    (out, "")
}

/// Run `commands` in order. Stops at the first non-optional command that fails.
pub fn run(file: &mut SourceFile, commands: &[Command]) -> Result<(), EditError> {
    for (i, cmd) in commands.iter().enumerate() {
        let ok = apply(file, &cmd.op)?;
        debug!(command = %cmd.source, ok, position = file.position(), "ran command");
        if !ok && !cmd.optional {
            return Err(EditError::CommandFailed {
                index: i + 1,
                command: cmd.source.clone(),
            });
        }
    }
    Ok(())
}

fn apply(file: &mut SourceFile, op: &Op) -> Result<bool, EditError> {
    let ok = match op {
        Op::Top => {
            file.to_top();
            true
        }
        Op::Bottom => {
            file.to_bottom();
            true
        }
        Op::Jump(n) => file.jump(*n),
        Op::Find(t) => file.find_line_contains(t).is_found(),
        Op::FindPrev(t) => file.find_prev_line_contains(t).is_found(),
        Op::LineIs(t) => file.find_line_is(t).is_found(),
        Op::PrevLineIs(t) => file.find_prev_line_is(t).is_found(),
        Op::FindAny(c) => file.find_line_contains_any(c.as_slice()).is_some(),
        Op::FindRegex(re) => file.find_line_matching(re).is_found(),
        Op::EndOfMember => file.find_end_of_member(),
        Op::Insert { text, rule } => {
            file.insert_line_with_indent(text, *rule);
            true
        }
        Op::InsertUnique { text, rule } => {
            file.insert_unique_line_with_indent(text, *rule);
            true
        }
        Op::Replace { old, new } => file.replace_text(old, new),
        Op::Bracket {
            match_text,
            insertion,
            open,
            close,
        } => file.insert_text_after_matching_bracket_with(match_text, insertion, *open, *close)?,
        Op::Append(t) => file.append_text(t),
    };
    Ok(ok)
}
