//! Canonicalization of typographic punctuation to plain ASCII.
//!
//! The same mapping is applied to whole passages when they are loaded and to
//! single characters on every keystroke comparison, so a straight `'` typed
//! by the user matches a curly `’` in the source text and vice versa.

/// Map a typographic variant to its ASCII equivalent. Any other character
/// passes through unchanged.
pub fn normalize_char(c: char) -> char {
    match c {
        '\u{201C}' | '\u{201D}' => '"',
        '\u{2018}' | '\u{2019}' => '\'',
        '\u{2014}' | '\u{2013}' => '-',
        '\u{2026}' => '.',
        other => other,
    }
}

fn is_kept(c: char) -> bool {
    matches!(c, '\x20'..='\x7E' | '\n' | '\r')
}

/// Normalize a whole passage: typographic punctuation becomes ASCII, the
/// non-breaking space becomes a space, and everything outside printable
/// ASCII (newlines excepted) is dropped.
pub fn normalize_passage(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{00A0}' => ' ',
            c => normalize_char(c),
        })
        .filter(|&c| is_kept(c))
        .collect()
}

/// Collapse every run of whitespace into a single space. Leading and trailing
/// runs are collapsed too, not trimmed.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}
