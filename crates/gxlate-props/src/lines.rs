use std::sync::OnceLock;

use regex::Regex;

/// What a physical line of a bundle is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Comment,
    Banner,
    IdKeyword,
    Prop,
    Continuation,
    Parent,
    Blank,
}

#[derive(Debug, Clone)]
pub struct Line {
    /// 1-based line number.
    pub num: usize,
    pub kind: LineKind,
    pub content: String,
    /// Property id, good-comment text or `$Id` prefix, depending on `kind`.
    pub group: Option<String>,
    /// Nearest good-comment text seen at or above this line.
    pub comment: Option<String>,
    /// Whether the next line continues this one.
    pub continued: bool,
}

type Patterns = Vec<(Regex, LineKind)>;

fn start_patterns() -> Result<&'static Patterns, regex::Error> {
    static START: OnceLock<Patterns> = OnceLock::new();
    if let Some(p) = START.get() {
        return Ok(p);
    }
    let table = [
        (r"\s*#\.+\s*", LineKind::Banner),
        (r"(\s*#\s+\$Id).*\$", LineKind::IdKeyword),
        (r"\s*# (\S.*)", LineKind::Comment),
        (r"\s*#.*", LineKind::Comment),
        (r"\s*__.*", LineKind::Parent),
        (r"\s*", LineKind::Blank),
        (r"\s*([A-Za-z][-._A-Za-z0-9]+)\s*=\s*.*", LineKind::Prop),
    ];
    let mut built = Vec::with_capacity(table.len());
    for (pat, kind) in table {
        built.push((Regex::new(&format!("^(?:{pat})$"))?, kind));
    }
    Ok(START.get_or_init(|| built))
}

/// True when `s` ends in an odd run of backslashes, i.e. the line break is escaped.
pub(crate) fn is_continued(s: &str) -> bool {
    s.bytes().rev().take_while(|&b| b == b'\\').count() % 2 == 1
}

/// Split text into physical lines on `\n`, `\r\n` or `\r`.
pub(crate) fn split_lines(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let bytes = text.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                out.push(&text[start..i]);
                start = i + 1;
            }
            b'\r' => {
                out.push(&text[start..i]);
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < bytes.len() {
        out.push(&text[start..]);
    }
    out
}

pub(crate) enum ClassifyError {
    Pattern(regex::Error),
    Unmatched { line: usize, content: String },
}

pub(crate) fn classify(raw: &[&str]) -> Result<Vec<Line>, ClassifyError> {
    let patterns = start_patterns().map_err(ClassifyError::Pattern)?;
    let mut lines: Vec<Line> = Vec::with_capacity(raw.len());
    for (idx, content) in raw.iter().enumerate() {
        let prev = lines.last();
        let prev_comment = prev.and_then(|p| p.comment.clone());
        if prev.is_some_and(|p| p.continued) {
            lines.push(Line {
                num: idx + 1,
                kind: LineKind::Continuation,
                content: content.to_string(),
                group: None,
                comment: prev_comment,
                continued: is_continued(content),
            });
            continue;
        }

        let hit = patterns.iter().find_map(|(re, kind)| {
            re.captures(content)
                .map(|caps| (*kind, caps.get(1).map(|m| m.as_str().to_string())))
        });
        let Some((kind, group)) = hit else {
            return Err(ClassifyError::Unmatched {
                line: idx + 1,
                content: content.to_string(),
            });
        };
        let comment = match (&kind, &group) {
            (LineKind::Comment, Some(text)) => Some(text.clone()),
            _ => prev_comment,
        };
        lines.push(Line {
            num: idx + 1,
            kind,
            content: content.to_string(),
            continued: kind == LineKind::Prop && is_continued(content),
            group,
            comment,
        });
    }
    Ok(lines)
}
