//! Bundle file names: `<base>[_<lang>].properties[.in]`.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use gxlate_core::Language;
use regex::{Captures, Regex};

fn parts(name: &str) -> Option<Captures<'_>> {
    static PROPS: OnceLock<Option<Regex>> = OnceLock::new();
    PROPS
        .get_or_init(|| Regex::new(r"^(.*?)(_(..))?(\.properties(\.in)?)$").ok())
        .as_ref()?
        .captures(name)
}

pub fn is_props(name: &str) -> bool {
    parts(name).is_some()
}

/// A source bundle has no language infix, or the `en` one.
pub fn is_english(name: &str) -> bool {
    match parts(name) {
        Some(c) => c
            .get(3)
            .map_or(true, |lang| lang.as_str().eq_ignore_ascii_case("en")),
        None => false,
    }
}

pub fn base_name(name: &str) -> Option<&str> {
    parts(name).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// `.properties` or `.properties.in`.
pub fn extension(name: &str) -> Option<&str> {
    parts(name).and_then(|c| c.get(4)).map(|m| m.as_str())
}

pub fn language_code(name: &str) -> Option<&str> {
    parts(name).and_then(|c| c.get(3)).map(|m| m.as_str())
}

/// `foo.properties` -> `foo_fr.properties`, `foo_en.properties.in` -> `foo_fr.properties.in`.
pub fn set_language(name: &str, lang: &Language) -> Option<String> {
    let c = parts(name)?;
    Some(format!("{}_{}{}", c.get(1)?.as_str(), lang.code(), c.get(4)?.as_str()))
}

/// Sibling path of `source` for `lang`.
pub fn language_path(source: &Path, lang: &Language) -> Option<PathBuf> {
    let name = source.file_name()?.to_str()?;
    Some(source.with_file_name(set_language(name, lang)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_detection() {
        assert!(is_english("chat.properties"));
        assert!(is_english("story.properties.in"));
        assert!(is_english("chat_en.properties"));
        assert!(!is_english("chat_fr.properties"));
        assert!(!is_english("chat.txt"));
    }

    #[test]
    fn name_parts() {
        assert_eq!(base_name("dungeon-names_de.properties"), Some("dungeon-names"));
        assert_eq!(base_name("my_file.properties"), Some("my_file"));
        assert_eq!(extension("story.properties.in"), Some(".properties.in"));
        assert_eq!(language_code("chat_fr.properties"), Some("fr"));
        assert_eq!(language_code("chat.properties"), None);
    }

    #[test]
    fn language_variants() {
        let fr = Language::new("fr").unwrap();
        assert_eq!(
            set_language("story.properties.in", &fr).as_deref(),
            Some("story_fr.properties.in")
        );
        assert_eq!(
            set_language("chat_en.properties", &fr).as_deref(),
            Some("chat_fr.properties")
        );
        assert_eq!(
            language_path(Path::new("/tmp/x/chat.properties"), &fr),
            Some(PathBuf::from("/tmp/x/chat_fr.properties"))
        );
        assert_eq!(set_language("readme.md", &fr), None);
    }
}
