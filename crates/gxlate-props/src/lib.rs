//! Reading and writing `.properties` message bundles.
//!
//! A [`PropsFile`] keeps every physical line of the source so that writing it
//! back through a [`Translator`] reproduces comments, banners, blank lines and
//! ordering; only property values change.

pub mod bundle;
mod lines;
mod loader;
mod writer;

use std::collections::HashMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use lines::{Line, LineKind};
pub use writer::{format_property, INDENT, SOFT_MAX_COLS, TOLERANCE};

#[derive(Debug, Error)]
pub enum PropsError {
    #[error("{file}:{line}: line did not match any pattern: \"{content}\"")]
    Unmatched {
        file: String,
        line: usize,
        content: String,
    },
    #[error("Duplicate property {id} in file {file}, on lines {first} and {second}")]
    DuplicateId {
        id: String,
        file: String,
        first: usize,
        second: usize,
    },
    #[error("{file}:{line}: malformed \\uxxxx encoding")]
    Malformed { file: String, line: usize },
    #[error("{file}:{line}: property {id} has no loadable value")]
    MissingValue {
        id: String,
        file: String,
        line: usize,
    },
    #[error("line pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Supplies the output value for each property written.
///
/// Returning `None` leaves the property out of the output.
pub trait Translator {
    fn translate(&mut self, id: &str, source: &str) -> Option<String>;
}

impl<F> Translator for F
where
    F: FnMut(&str, &str) -> Option<String>,
{
    fn translate(&mut self, id: &str, source: &str) -> Option<String> {
        self(id, source)
    }
}

/// A property as seen by rules and translators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<'a> {
    pub id: &'a str,
    /// Decoded value.
    pub value: &'a str,
    /// Nearest good comment above the property; empty if none.
    pub comment: &'a str,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct PropsFile {
    path: PathBuf,
    lines: Vec<Line>,
    values: HashMap<String, String>,
}

/// UTF-8 when valid, ISO-8859-1 otherwise. A leading BOM is dropped.
fn decode_text(bytes: Vec<u8>) -> String {
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    };
    match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

impl PropsFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PropsError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| PropsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(path, &decode_text(bytes))
    }

    pub fn parse(path: impl Into<PathBuf>, text: &str) -> Result<Self, PropsError> {
        let path = path.into();
        let file = path.display().to_string();
        let raw = lines::split_lines(text);

        let lines = lines::classify(&raw).map_err(|e| match e {
            lines::ClassifyError::Pattern(e) => PropsError::Pattern(e),
            lines::ClassifyError::Unmatched { line, content } => PropsError::Unmatched {
                file: file.clone(),
                line,
                content,
            },
        })?;

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for line in lines.iter().filter(|l| l.kind == LineKind::Prop) {
            let Some(id) = line.group.as_deref() else {
                continue;
            };
            if let Some(first) = seen.insert(id, line.num) {
                return Err(PropsError::DuplicateId {
                    id: id.to_string(),
                    file,
                    first,
                    second: line.num,
                });
            }
        }

        let values = loader::load(&raw).map_err(|line| PropsError::Malformed {
            file: file.clone(),
            line,
        })?;

        for line in lines.iter().filter(|l| l.kind == LineKind::Prop) {
            let id = line.group.as_deref().unwrap_or_default();
            if !values.contains_key(id) {
                return Err(PropsError::MissingValue {
                    id: id.to_string(),
                    file,
                    line: line.num,
                });
            }
        }

        tracing::trace!(event = "props_parsed", file = %file, lines = lines.len());
        Ok(Self {
            path,
            lines,
            values,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Properties in file order.
    pub fn entries(&self) -> impl Iterator<Item = Entry<'_>> {
        self.lines
            .iter()
            .filter(|l| l.kind == LineKind::Prop)
            .filter_map(|l| {
                let id = l.group.as_deref()?;
                Some(Entry {
                    id,
                    value: self.values.get(id)?.as_str(),
                    comment: l.comment.as_deref().unwrap_or_default(),
                    line: l.num,
                })
            })
    }

    pub fn value(&self, id: &str) -> Option<&str> {
        self.values.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// Produce the output text, one `\n` after every line.
    pub fn render<T: Translator + ?Sized>(&self, translator: &mut T) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line.kind {
                LineKind::Comment | LineKind::Blank | LineKind::Banner | LineKind::Parent => {
                    out.push_str(&line.content);
                    out.push('\n');
                }
                LineKind::IdKeyword => {
                    out.push_str(line.group.as_deref().unwrap_or_default());
                    out.push_str("$\n");
                }
                LineKind::Prop => {
                    let Some(id) = line.group.as_deref() else {
                        continue;
                    };
                    let source = self.value(id).unwrap_or_default();
                    if let Some(value) = translator.translate(id, source) {
                        for physical in format_property(id, &value) {
                            out.push_str(&physical);
                            out.push('\n');
                        }
                    }
                }
                LineKind::Continuation => {}
            }
        }
        out
    }

    pub fn write_to<W: Write, T: Translator + ?Sized>(
        &self,
        out: &mut W,
        translator: &mut T,
    ) -> std::io::Result<()> {
        out.write_all(self.render(translator).as_bytes())
    }

    /// Write the translated bundle to `dest`, creating parent directories.
    pub fn write<T: Translator + ?Sized>(
        &self,
        dest: &Path,
        translator: &mut T,
    ) -> Result<(), PropsError> {
        let io_err = |source| PropsError::Io {
            path: dest.display().to_string(),
            source,
        };
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = fs::File::create(dest).map_err(io_err)?;
        let mut w = BufWriter::new(file);
        self.write_to(&mut w, translator).map_err(io_err)?;
        w.flush().map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
#........................................
# $Id: chat.properties 4471 2014-02-11 22:12:01Z ray $
#........................................

__parent = global

# Chat commands
c.tell = /tell
c.emote = /emote

# Slots
m.slot_format = Slot {0} of {1}
m.long = This message is long enough that it was wrapped by an earlier run of the \\
  internationalization toolchain.
# Error messages
e.unknown = Unknown command: '{0}'\\ttab
";

    fn identity(_: &str, s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn round_trip_is_exact_except_id_keyword() {
        let props = PropsFile::parse("chat.properties", SAMPLE).unwrap();
        let out = props.render(&mut identity);
        let expected = SAMPLE.replace(
            "# $Id: chat.properties 4471 2014-02-11 22:12:01Z ray $",
            "# $Id$",
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn entries_carry_comments_and_decoded_values() {
        let props = PropsFile::parse("chat.properties", SAMPLE).unwrap();
        let entries: Vec<_> = props.entries().collect();
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0].id, "c.tell");
        assert_eq!(entries[0].comment, "Chat commands");
        assert_eq!(entries[2].comment, "Slots");
        assert_eq!(
            entries[3].value,
            "This message is long enough that it was wrapped by an earlier run of the internationalization toolchain."
        );
        assert_eq!(entries[4].value, "Unknown command: '{0}'\ttab");
        assert_eq!(entries[4].comment, "Error messages");
        assert_eq!(entries[4].line, 16);
    }

    #[test]
    fn translator_can_omit_and_replace() {
        let props = PropsFile::parse("x.properties", "# Top\na.one = One\na.two = Two\n").unwrap();
        let out = props.render(&mut |id: &str, s: &str| {
            (id != "a.two").then(|| format!("[fr] {s}"))
        });
        assert_eq!(out, "# Top\na.one = [fr] One\n");
    }

    #[test]
    fn duplicate_ids_name_both_lines() {
        let err = PropsFile::parse("dup.properties", "m.a = 1\n\nm.a = 2\n").unwrap_err();
        match err {
            PropsError::DuplicateId {
                id, first, second, ..
            } => {
                assert_eq!((id.as_str(), first, second), ("m.a", 1, 3));
            }
            other => panic!("unexpected error {other}"),
        }
        let msg = PropsFile::parse("dup.properties", "m.a = 1\nm.a = 2\n")
            .unwrap_err()
            .to_string();
        assert_eq!(msg, "Duplicate property m.a in file dup.properties, on lines 1 and 2");
    }

    #[test]
    fn unmatched_line_is_fatal() {
        let err = PropsFile::parse("bad.properties", "m.ok = 1\n= nothing\n").unwrap_err();
        assert!(matches!(err, PropsError::Unmatched { line: 2, .. }));
    }

    #[test]
    fn escape_fidelity() {
        let samples = [
            "tab\there",
            "cr\rhere",
            "lf\nhere",
            "ff\x0chere",
            "back\\slash",
            "nb\u{a0}sp",
            "caf\u{e9} \u{4e2d}\u{6587} \u{ffff}",
            "trailing newline\n",
        ];
        for v in samples {
            let text = format_property("m.v", v).join("\n") + "\n";
            let props = PropsFile::parse("e.properties", &text).unwrap();
            let expected = v.replace('\u{a0}', " ");
            assert_eq!(props.value("m.v"), Some(expected.as_str()), "value {v:?}");
        }
    }

    #[test]
    fn wrapped_output_parses_back() {
        let long = "word ".repeat(80) + "end";
        let text = format_property("m.w", &long).join("\n") + "\n";
        let props = PropsFile::parse("w.properties", &text).unwrap();
        assert_eq!(props.value("m.w"), Some(long.as_str()));
        assert!(props
            .lines()
            .iter()
            .skip(1)
            .all(|l| l.kind == LineKind::Continuation && l.content.starts_with(INDENT)));
    }

    #[test]
    fn load_and_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("m.properties");
        fs::write(&src, b"# Caf\xe9\nm.hi = Hi\r\n").unwrap();
        let props = PropsFile::load(&src).unwrap();
        assert_eq!(props.file_name(), "m.properties");
        assert_eq!(props.entries().next().map(|e| e.comment), Some("Café"));

        let dest = dir.path().join("out").join("m_fr.properties");
        props
            .write(&dest, &mut |_: &str, _: &str| Some("Salut".to_string()))
            .unwrap();
        assert_eq!(fs::read_to_string(dest).unwrap(), "# Café\nm.hi = Salut\n");
    }
}
