//! Escaping and soft wrapping of property values on output.

pub const INDENT: &str = "  ";
pub const SOFT_MAX_COLS: usize = 95;
pub const TOLERANCE: usize = 25;

fn is_special(c: char) -> bool {
    matches!(c, '\t' | '\r' | '\x0c' | '\n' | '\\') || (c as u32) <= 0x19 || (c as u32) >= 0x7f
}

/// Lay out `id = value` as one or more physical lines (without line terminators).
pub fn format_property(id: &str, value: &str) -> Vec<String> {
    let mut out = Wrapper {
        lines: vec![format!("{id} = ")],
    };
    let mut plain = String::new();
    let mut units = [0u16; 2];
    for c in value.chars() {
        if !is_special(c) {
            plain.push(c);
            continue;
        }
        out.append(&plain);
        plain.clear();
        match c {
            '\t' => out.append("\\t"),
            '\r' => out.append("\\r"),
            '\x0c' => out.append("\\f"),
            '\n' => out.append("\\n"),
            '\\' => out.append("\\\\"),
            '\u{a0}' => out.append(" "),
            _ => {
                for unit in c.encode_utf16(&mut units) {
                    out.append(&format!("\\u{:04x}", unit));
                }
            }
        }
    }
    out.append(&plain);
    out.lines
}

/// All text appended here is ASCII, so byte offsets are column offsets.
struct Wrapper {
    lines: Vec<String>,
}

fn leading_spaces(s: &str) -> usize {
    s.len() - s.trim_start_matches(' ').len()
}

fn ends_with_encoded_newline(line: &str) -> bool {
    match line.strip_suffix('n') {
        Some(head) => head.bytes().rev().take_while(|&b| b == b'\\').count() % 2 == 1,
        None => false,
    }
}

impl Wrapper {
    fn new_line(&mut self) {
        if let Some(last) = self.lines.last_mut() {
            last.push('\\');
        }
        self.lines.push(INDENT.to_string());
    }

    fn append(&mut self, chunk: &str) {
        let mut rest = chunk;
        while !rest.is_empty() {
            let Some(last) = self.lines.last_mut() else {
                return;
            };

            if ends_with_encoded_newline(last) {
                let n = leading_spaces(rest);
                last.push_str(&rest[..n]);
                rest = &rest[n..];
                if !rest.is_empty() {
                    self.new_line();
                }
                continue;
            }

            if last.len() + rest.len() <= SOFT_MAX_COLS || rest.len() < TOLERANCE {
                last.push_str(rest);
                return;
            }

            let reach = (SOFT_MAX_COLS as isize - last.len() as isize).min(rest.len() as isize - 1);
            let space = if reach < 0 {
                None
            } else {
                rest.as_bytes()[..=reach as usize]
                    .iter()
                    .rposition(|&b| b == b' ')
            };

            match space {
                None if last.as_str() == INDENT => {
                    last.push_str(rest);
                    return;
                }
                None => {
                    let n = leading_spaces(rest);
                    last.push_str(&rest[..n]);
                    rest = &rest[n..];
                    self.new_line();
                }
                Some(mut at) => {
                    while at < rest.len() && rest.as_bytes()[at] == b' ' {
                        at += 1;
                    }
                    last.push_str(&rest[..at]);
                    rest = &rest[at..];
                    if !rest.is_empty() {
                        self.new_line();
                    }
                }
            }
        }
    }
}
