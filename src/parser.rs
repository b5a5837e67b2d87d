//! Core annotation parsing: segmenting a documentation block into
//! `@name value` entries and normalizing their values.
//!
//! Parsing is total. Any input string produces a map (possibly empty);
//! there is no error path and no panic path.

use crate::annotation::AnnotationMap;

/// Parse every annotation out of a raw documentation comment.
///
/// The text may include the outer comment delimiters (`/** ... */`); one
/// leading and one trailing `/` are stripped if present. Each `@`
/// occurrence starts an entry whose value runs up to the next entry or the
/// end of the block, with continuation lines folded into a single
/// whitespace-normalized string.
///
/// Duplicate names resolve last-write-wins.
pub fn parse_comment(comment: &str) -> AnnotationMap {
    let comment = strip_delimiters(comment);
    let mut annotations = AnnotationMap::new();
    for chunk in segment(comment) {
        let (name, value) = parse_entry(chunk);
        annotations.insert(name, value);
    }
    annotations
}

/// Strip one leading and one trailing `/`, each independently of the other.
fn strip_delimiters(mut comment: &str) -> &str {
    if let Some(rest) = comment.strip_prefix('/') {
        comment = rest;
    }
    if let Some(rest) = comment.strip_suffix('/') {
        comment = rest;
    }
    comment
}

/// Split the comment into one chunk per `@` occurrence.
///
/// A chunk runs from its marker to the first `@` found at or after the
/// next newline; annotation values may therefore span multiple lines. A
/// chunk with no such terminator extends to the end of the text and ends
/// the scan. Markers in the middle of a line start chunks of their own.
fn segment(comment: &str) -> Vec<&str> {
    // '@' and '\n' are ASCII, so the byte offsets from `find` always sit
    // on char boundaries and slicing cannot split a multi-byte char.
    let mut chunks = Vec::new();
    let mut offset = 0;
    while let Some(found) = comment[offset..].find('@') {
        let start = offset + found;
        let next = comment[start..]
            .find('\n')
            .map(|n| start + n)
            .and_then(|nl| comment[nl..].find('@').map(|n| nl + n));
        match next {
            Some(end) => {
                chunks.push(&comment[start..end]);
                offset = start + 1;
            }
            None => {
                // The rest of the text belongs to this trailing entry.
                chunks.push(&comment[start..]);
                break;
            }
        }
    }
    chunks
}

/// Split one chunk (starting with `@`) into its name and cleaned value.
///
/// The name is everything between the marker and the first space; with no
/// space in the chunk the whole remainder is the name and the value is
/// empty.
fn parse_entry(chunk: &str) -> (String, String) {
    match chunk.find(' ') {
        Some(space) => {
            let name = chunk[1..space].trim().to_string();
            let value = chunk[space..].trim();
            (name, clean_value(value))
        }
        None => (chunk[1..].trim().to_string(), String::new()),
    }
}

/// Flatten a raw multi-line value into a single normalized string.
///
/// Per line: trim, then repeatedly strip a leading `*` (the doc-block
/// continuation marker) and re-trim. The lines are joined with spaces and
/// any remaining whitespace run collapses to a single space.
fn clean_value(raw: &str) -> String {
    let mut joined = String::with_capacity(raw.len());
    for line in raw.split('\n') {
        let mut line = line.trim();
        while let Some(rest) = line.strip_prefix('*') {
            line = rest.trim();
        }
        joined.push(' ');
        joined.push_str(line);
    }
    collapse_whitespace(&joined)
}

/// Collapse every run of space, tab, CR or LF into one space and trim.
fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut gap = false;
    for ch in s.trim().chars() {
        if matches!(ch, ' ' | '\t' | '\n' | '\r') {
            gap = true;
        } else {
            if gap {
                out.push(' ');
                gap = false;
            }
            out.push(ch);
        }
    }
    out
}
