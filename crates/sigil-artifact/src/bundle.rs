//! Export bundles: the files of one export, fully computed in memory.
//!
//! A bundle is only constructed after every file exists, and
//! [`ExportBundle::write_to`] commits the whole set or nothing: files are
//! written under `.partial` names and renamed once all writes succeeded.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use sigil_core::SigilError;

const PARTIAL_SUFFIX: &str = ".partial";

/// How an export is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Packaging {
    /// One `.zip` archive.
    #[default]
    Zip,
    /// Two or three separate files.
    Separate,
}

/// One named file of a bundle.
#[derive(Clone, PartialEq, Eq)]
pub struct BundleFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for BundleFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// The deliverable files of one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBundle {
    files: Vec<BundleFile>,
}

impl ExportBundle {
    /// Package `members` as requested. `filename_base` names the archive.
    pub fn package(
        filename_base: &str,
        members: Vec<BundleFile>,
        packaging: Packaging,
    ) -> Result<Self, SigilError> {
        let files = match packaging {
            Packaging::Separate => members,
            Packaging::Zip => vec![BundleFile {
                name: format!("{filename_base}.zip"),
                bytes: zip_members(&members)?,
            }],
        };
        Ok(Self { files })
    }

    pub fn files(&self) -> &[BundleFile] {
        &self.files
    }

    pub fn file(&self, name: &str) -> Option<&BundleFile> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Write every file into `dir`, all or nothing.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>, SigilError> {
        std::fs::create_dir_all(dir)?;
        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(self.files.len());
        for file in &self.files {
            let target = dir.join(&file.name);
            let partial = dir.join(format!("{}{PARTIAL_SUFFIX}", file.name));
            if let Err(e) = std::fs::write(&partial, &file.bytes) {
                remove_all(staged.iter().map(|(p, _)| p).chain(std::iter::once(&partial)));
                return Err(e.into());
            }
            staged.push((partial, target));
        }
        for (i, (partial, target)) in staged.iter().enumerate() {
            if let Err(e) = std::fs::rename(partial, target) {
                remove_all(staged[i..].iter().map(|(p, _)| p));
                remove_all(staged[..i].iter().map(|(_, t)| t));
                return Err(e.into());
            }
        }
        Ok(staged.into_iter().map(|(_, target)| target).collect())
    }
}

fn zip_members(members: &[BundleFile]) -> Result<Vec<u8>, SigilError> {
    let packaging = |e: zip::result::ZipError| SigilError::Packaging(e.to_string());
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for member in members {
        writer.start_file(member.name.as_str(), options).map_err(packaging)?;
        writer.write_all(&member.bytes)?;
    }
    Ok(writer.finish().map_err(packaging)?.into_inner())
}

fn remove_all<'a>(paths: impl Iterator<Item = &'a PathBuf>) {
    for path in paths {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "could not remove partial export file");
        }
    }
}
