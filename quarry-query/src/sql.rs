//! SQL text utilities: identifier quoting and template filling.

use crate::error::{QueryError, QueryResult};

/// Slot marker used by clause and operator templates.
pub const SLOT: &str = "%s";

/// Quote a single identifier segment.
///
/// Close-quote characters inside the name are doubled. A segment that is
/// already a well-formed quoted identifier is returned as is, so the
/// operation is idempotent. `*` is never quoted.
pub fn quote_segment(segment: &str, open: char, close: char) -> String {
    let trimmed = segment.trim();
    let name = match unquote(trimmed, open, close) {
        Some(name) => name,
        None => trimmed.to_string(),
    };
    if name == "*" {
        return name;
    }
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push(open);
    for c in name.chars() {
        if c == close {
            quoted.push(close);
        }
        quoted.push(c);
    }
    quoted.push(close);
    quoted
}

/// The raw name inside a well-formed quoted segment, with doubled close
/// quotes collapsed. `None` if the segment is not quoted that way.
fn unquote(segment: &str, open: char, close: char) -> Option<String> {
    let inner = segment.strip_prefix(open)?.strip_suffix(close)?;
    let mut name = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == close && chars.next() != Some(close) {
            return None;
        }
        name.push(c);
    }
    Some(name)
}

/// Quote a possibly dotted identifier (`table.column`), segment by segment.
///
/// ```rust
/// use quarry_query::sql::quote_identifier;
///
/// assert_eq!(quote_identifier("users.id", '"', '"'), "\"users\".\"id\"");
/// let once = quote_identifier("users", '`', '`');
/// assert_eq!(quote_identifier(&once, '`', '`'), once);
/// assert_eq!(quote_identifier("a`b", '`', '`'), "`a``b`");
/// ```
pub fn quote_identifier(name: &str, open: char, close: char) -> String {
    split_identifier(name, open, close)
        .iter()
        .map(|segment| quote_segment(segment, open, close))
        .collect::<Vec<_>>()
        .join(".")
}

/// Split a dotted identifier on dots that sit outside quotes. A doubled
/// close quote inside a quoted part does not end it.
fn split_identifier(name: &str, open: char, close: char) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    let mut chars = name.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if quoted && c == close {
            if chars.peek().is_some_and(|&(_, next)| next == close) {
                chars.next();
            } else {
                quoted = false;
            }
        } else if !quoted && c == open {
            quoted = true;
        } else if !quoted && c == '.' {
            segments.push(&name[start..i]);
            start = i + 1;
        }
    }
    segments.push(&name[start..]);
    segments
}

/// Count the `%s` slots in a template.
pub fn slot_count(template: &str) -> usize {
    template.matches(SLOT).count()
}

/// Fill a `%s` template with arguments, left to right.
///
/// The argument count must match the slot count exactly.
pub fn fill(template: &str, args: &[&str]) -> QueryResult<String> {
    let found = slot_count(template);
    if found != args.len() {
        return Err(QueryError::invalid_template(template, args.len(), found));
    }

    let mut out = String::with_capacity(template.len() + args.iter().map(|a| a.len()).sum::<usize>());
    let mut rest = template;
    for arg in args {
        // slot count was checked above
        let pos = rest.find(SLOT).unwrap_or(rest.len());
        out.push_str(&rest[..pos]);
        out.push_str(arg);
        rest = &rest[(pos + SLOT.len()).min(rest.len())..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Names of the `{slot}`s in a statement template, in order.
pub fn statement_slots(template: &str) -> Vec<&str> {
    let mut slots = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                slots.push(&after[..close]);
                rest = &after[close + 1..];
            }
            None => break,
        }
    }
    slots
}
