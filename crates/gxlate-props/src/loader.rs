//! Decoding of property values the way `java.util.Properties::load` reads them.

use std::collections::HashMap;

use crate::lines::is_continued;

fn trim_leading(s: &str) -> &str {
    s.trim_start_matches([' ', '\t', '\x0c'])
}

/// Decode physical lines into a key/value map. On a malformed `\uXXXX`
/// escape, returns the 1-based number of the line that starts the entry.
pub(crate) fn load(raw: &[&str]) -> Result<HashMap<String, String>, usize> {
    let mut out = HashMap::new();
    let mut i = 0;
    while i < raw.len() {
        let start = i;
        let first = trim_leading(raw[i]);
        i += 1;
        if first.is_empty() || first.starts_with('#') || first.starts_with('!') {
            continue;
        }
        let mut logical = String::new();
        let mut seg = first;
        loop {
            if !is_continued(seg) {
                logical.push_str(seg);
                break;
            }
            logical.push_str(&seg[..seg.len() - 1]);
            if i >= raw.len() {
                break;
            }
            seg = trim_leading(raw[i]);
            i += 1;
        }
        let (key, value) = split_key_value(&logical);
        let key = unescape(key).ok_or(start + 1)?;
        let value = unescape(value).ok_or(start + 1)?;
        out.insert(key, value);
    }
    Ok(out)
}

/// Split on the first unescaped `=`, `:` or whitespace, then skip the separator run.
fn split_key_value(line: &str) -> (&str, &str) {
    let b = line.as_bytes();
    let is_ws = |c: u8| c == b' ' || c == b'\t' || c == 0x0c;
    let mut key_len = 0;
    let mut value_start = b.len();
    let mut has_sep = false;
    let mut escaped = false;
    while key_len < b.len() {
        let c = b[key_len];
        if !escaped && (c == b'=' || c == b':') {
            value_start = key_len + 1;
            has_sep = true;
            break;
        }
        if !escaped && is_ws(c) {
            value_start = key_len + 1;
            break;
        }
        escaped = c == b'\\' && !escaped;
        key_len += 1;
    }
    while value_start < b.len() {
        let c = b[value_start];
        if !is_ws(c) {
            if !has_sep && (c == b'=' || c == b':') {
                has_sep = true;
            } else {
                break;
            }
        }
        value_start += 1;
    }
    (&line[..key_len], &line[value_start..])
}

/// Resolve backslash escapes. Returns `None` for a malformed `\u` escape.
pub(crate) fn unescape(s: &str) -> Option<String> {
    let mut units: Vec<u16> = Vec::with_capacity(s.len());
    let mut buf = [0u16; 2];
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            units.extend_from_slice(c.encode_utf16(&mut buf));
            continue;
        }
        let decoded = match chars.next() {
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                if hex.len() != 4 || !hex.chars().all(|h| h.is_ascii_hexdigit()) {
                    return None;
                }
                units.push(u16::from_str_radix(&hex, 16).ok()?);
                continue;
            }
            Some('t') => '\t',
            Some('r') => '\r',
            Some('n') => '\n',
            Some('f') => '\x0c',
            Some(other) => other,
            None => break,
        };
        units.extend_from_slice(decoded.encode_utf16(&mut buf));
    }
    Some(String::from_utf16_lossy(&units))
}
