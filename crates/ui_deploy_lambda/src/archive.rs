use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use ui_deploy_core::storage_keys::deploy_path;
use zip::result::ZipError;
use zip::ZipArchive;

/// A regular file extracted from a UI build archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    pub entry_name: String,
    pub deploy_path: String,
    pub contents: Vec<u8>,
}

/// Decompresses every non-directory entry, keyed by its deploy path.
///
/// Directory entries produce nothing. If two entries map to the same deploy
/// path (`dist/a.js` and `a.js`), the later entry wins. Results are sorted by
/// deploy path.
pub fn extract_archive(bytes: &[u8]) -> Result<Vec<ArchiveFile>, ZipError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut files = BTreeMap::new();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }

        let entry_name = entry.name().to_string();
        let path = deploy_path(&entry_name).to_string();
        if path.is_empty() {
            continue;
        }

        let mut contents = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        entry.read_to_end(&mut contents)?;
        files.insert(
            path.clone(),
            ArchiveFile {
                entry_name,
                deploy_path: path,
                contents,
            },
        );
    }

    Ok(files.into_values().collect())
}
