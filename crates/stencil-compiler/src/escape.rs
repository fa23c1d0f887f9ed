//! Escaping functions shared by the interpreter and the print directives.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left as-is by URI escaping: ASCII alphanumerics and `-_.*`.
const URI_ESCAPE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'*');

/// Percent-escape `s` for use inside a URI. Spaces become `%20`.
pub fn escape_uri(s: &str) -> String {
    utf8_percent_encode(s, URI_ESCAPE_SET).to_string()
}

/// Escape the HTML special characters `& < > " '`.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Escape `s` for inclusion inside a JavaScript string literal of either
/// quote style.
pub fn escape_js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '<' => out.push_str("\\x3c"),
            '>' => out.push_str("\\x3e"),
            '&' => out.push_str("\\x26"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            other => out.push(other),
        }
    }
    out
}

/// Replace each newline sequence with `<br>`.
pub fn change_newline_to_br(s: &str) -> String {
    s.replace("\r\n", "<br>").replace(['\r', '\n'], "<br>")
}

/// Cut `s` to at most `max_len` characters, optionally ending in `...`.
///
/// A cut that would fall inside an HTML character reference such as `&lt;`
/// moves back to before its `&`.
pub fn truncate(s: &str, max_len: usize, add_ellipsis: bool) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let ellipsis = add_ellipsis && max_len > 3;
    let keep = if ellipsis { max_len - 3 } else { max_len };
    let end = s.char_indices().nth(keep).map_or(s.len(), |(i, _)| i);
    let end = reference_start(s, end).unwrap_or(end);

    let mut out = s[..end].to_string();
    if ellipsis {
        out.push_str("...");
    }
    out
}

/// Byte offset of the `&` of a character reference that spans `end`, if any.
fn reference_start(s: &str, end: usize) -> Option<usize> {
    let amp = s[..end].rfind('&')?;
    let name = &s[amp + 1..end];
    if !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'#') {
        return None;
    }
    let rest = &s[end..];
    let tail = rest
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'#')
        .count();
    (name.len() + tail > 0 && rest.as_bytes().get(tail) == Some(&b';')).then_some(amp)
}
