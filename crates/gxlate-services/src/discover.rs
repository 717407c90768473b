use std::path::{Path, PathBuf};

use gxlate_props::bundle;
use walkdir::WalkDir;

use crate::{Result, ServiceError};

/// English bundles under `path`, sorted. A file path is returned as is.
pub fn find_all_props(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(ServiceError::MissingProps(path.to_path_buf()).into());
    }
    tracing::info!(event = "find_props", root = %path.display(), "Finding English properties files");
    let mut out = Vec::new();
    for entry in WalkDir::new(path) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if bundle::is_english(&name) {
            out.push(entry.into_path());
        }
    }
    out.sort();
    tracing::debug!(event = "props_found", count = out.len());
    Ok(out)
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `path` relative to `root` with `/` separators; the file name when unrelated.
pub(crate) fn relative_name(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        _ => display_name(path),
    }
}
