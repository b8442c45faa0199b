//! Variable references inside expression text.
//!
//! Two forms are replaced by the variable's display text: `&name&`, and a
//! bare word equal to a variable name. Words are maximal runs of letters,
//! digits and underscores, so `x` never matches inside `x2` or `2x`. A
//! word followed by `(` is a function call and is left alone.
//! Double-quoted regions are copied through untouched.

use crate::variables::VariableStore;

/// Separates independently resolved parts of a `write` argument.
pub const CONCAT_MARKER: &str = "&conc&";

pub fn substitute(text: &str, store: &VariableStore) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_quotes = false;
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if c == '"' {
            in_quotes = !in_quotes;
        }
        if in_quotes || c == '"' {
            out.push(c);
            rest = &rest[c.len_utf8()..];
            continue;
        }

        if c == '&' {
            if let Some((name, after)) = rest[1..].split_once('&') {
                if let Some(value) = store.read(name) {
                    out.push_str(&value.to_string());
                    rest = after;
                    continue;
                }
            }
            out.push(c);
            rest = &rest[1..];
            continue;
        }

        if is_word_char(c) {
            let end = rest.find(|ch: char| !is_word_char(ch)).unwrap_or(rest.len());
            let word = &rest[..end];
            let is_call = rest[end..].trim_start().starts_with('(');
            match store.read(word) {
                Some(value) if !is_call => out.push_str(&value.to_string()),
                _ => out.push_str(word),
            }
            rest = &rest[end..];
            continue;
        }

        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
