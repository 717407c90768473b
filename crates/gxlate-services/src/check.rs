use std::path::Path;

use gxlate_core::Language;
use gxlate_domain::{CheckReport, SCHEMA_VERSION};
use gxlate_props::{bundle, PropsFile};

use crate::discover::{find_all_props, relative_name};
use crate::{record, Result};

/// Parse every English bundle under `path` and each existing variant in `languages`.
pub fn check_props(path: &Path, languages: &[Language]) -> Result<CheckReport> {
    let mut report = CheckReport {
        schema_version: SCHEMA_VERSION,
        ..CheckReport::default()
    };
    for source in find_all_props(path)? {
        let variants = languages
            .iter()
            .filter_map(|lang| bundle::language_path(&source, lang))
            .filter(|p| p.is_file());
        for file in std::iter::once(source.clone()).chain(variants) {
            let name = relative_name(path, &file);
            match PropsFile::load(&file) {
                Ok(props) => {
                    tracing::debug!(event = "props_loaded", file = %name, entries = props.len());
                    report.loaded += 1;
                    report.files.push(name);
                }
                Err(e) => record(&mut report.failures, &name, None, e.to_string()),
            }
        }
    }
    if report.failures.is_empty() {
        tracing::info!(event = "check_done", loaded = report.loaded, "All props files loaded successfully: {}", report.loaded);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn loads_sources_and_variants() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("ui")).unwrap();
        fs::write(root.join("ui/chat.properties"), "m.hi = Hi\n").unwrap();
        fs::write(root.join("ui/chat_fr.properties"), "m.hi = Salut\n").unwrap();
        fs::write(root.join("ui/chat_de.properties"), "m.hi = Hallo\n").unwrap();
        fs::write(root.join("broken.properties"), "m.a = 1\nm.a = 2\n").unwrap();

        let fr = Language::new("fr").unwrap();
        let report = check_props(root, &[fr]).unwrap();
        assert_eq!(report.loaded, 2);
        assert_eq!(report.files, vec!["ui/chat.properties", "ui/chat_fr.properties"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].scope, "broken.properties");
        assert!(report.failures[0].message.contains("Duplicate property m.a"));
    }
}
