//! Fast-path classification of raw selector strings.
//!
//! A zero-allocation scan runs before any tokenization and buckets the
//! selector into one of a handful of high-frequency shapes. The dispatcher
//! on the DOM side uses the bucket to pick a specialized routine; the
//! bucket never changes which elements match, only how they are found.

/// Shape of a raw selector string, borrowed from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastPath<'a> {
    /// `#name` - identity-index lookup.
    Id(&'a str),
    /// `.name` - element scan with a class check.
    Class(&'a str),
    /// `name` - element scan with a tag check.
    Tag(&'a str),
    /// Contains an id selector but is not pure-id; the search root can be
    /// narrowed to the identified element's subtree.
    ScopedId,
    /// Everything else: full tokenize/parse/match.
    Generic,
}

/// Classify a raw selector string.
///
/// Pure shapes are only reported when the string is exactly one simple
/// name with no escapes, so the pure paths can skip parsing entirely and
/// still agree with the generic path.
pub fn classify(selector: &str) -> FastPath<'_> {
    let trimmed = selector.trim_matches(|c: char| c.is_ascii_whitespace());
    if let Some(name) = trimmed.strip_prefix('#') {
        if is_simple_name(name) {
            return FastPath::Id(name);
        }
    } else if let Some(name) = trimmed.strip_prefix('.') {
        if is_simple_name(name) {
            return FastPath::Class(name);
        }
    } else if is_simple_name(trimmed) && !trimmed.is_empty() {
        let starts_ok = trimmed
            .as_bytes()
            .first()
            .is_some_and(|&b| b.is_ascii_alphabetic() || b == b'_');
        if starts_ok {
            return FastPath::Tag(trimmed);
        }
    }
    if has_plain_hash(trimmed) {
        return FastPath::ScopedId;
    }
    FastPath::Generic
}

/// An unescaped ASCII name: safe to compare without going through the
/// tokenizer's escape decoding.
fn is_simple_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Whether the selector contains a `#` outside quotes and brackets.
fn has_plain_hash(selector: &str) -> bool {
    let mut in_quote: Option<u8> = None;
    let mut in_bracket = false;
    let mut escaped = false;
    for b in selector.bytes() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' => escaped = true,
            b'"' | b'\'' => match in_quote {
                Some(q) if q == b => in_quote = None,
                Some(_) => {}
                None => in_quote = Some(b),
            },
            b'[' if in_quote.is_none() => in_bracket = true,
            b']' if in_quote.is_none() => in_bracket = false,
            b'#' if in_quote.is_none() && !in_bracket => return true,
            _ => {}
        }
    }
    false
}
