//! Fixtures for exercising the deploy flow without AWS.

use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// One entry of a fixture archive. `contents == None` marks a directory.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveEntry<'a> {
    pub name: &'a str,
    pub contents: Option<&'a [u8]>,
}

impl<'a> ArchiveEntry<'a> {
    pub fn file(name: &'a str, contents: &'a [u8]) -> Self {
        Self {
            name,
            contents: Some(contents),
        }
    }

    pub fn directory(name: &'a str) -> Self {
        Self {
            name,
            contents: None,
        }
    }
}

/// Build a deflated zip archive in memory.
///
/// # Panics
///
/// Panics if the zip writer rejects an entry (should never happen for
/// in-memory buffers).
pub fn build_zip_archive(entries: &[ArchiveEntry<'_>]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in entries {
        match entry.contents {
            Some(contents) => {
                zip.start_file(entry.name, options)
                    .expect("failed to start fixture entry");
                zip.write_all(contents)
                    .expect("failed to write fixture entry");
            }
            None => {
                zip.add_directory(entry.name, options)
                    .expect("failed to add fixture directory");
            }
        }
    }

    zip.finish()
        .expect("failed to finish fixture archive")
        .into_inner()
}

/// The archive from the canonical deploy scenario: two files and an empty
/// directory entry under `dist/`.
pub fn sample_site_archive() -> Vec<u8> {
    build_zip_archive(&[
        ArchiveEntry::file("dist/index.html", b"<!doctype html><title>ui</title>"),
        ArchiveEntry::directory("dist/assets/"),
        ArchiveEntry::file("dist/assets/app.js", b"console.log('ui');"),
    ])
}
