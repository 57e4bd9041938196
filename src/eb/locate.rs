//! Case-insensitive discovery of book directories and files.
//!
//! Discs mastered on different systems disagree on the case of file names,
//! so every lookup compares names ignoring ASCII case. A data file may also
//! appear with an `.org` suffix (uncompressed copy) or an `.ebz` suffix
//! (EBZip-compressed copy).

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use log::debug;

use crate::eb::types::error::{EbError, Result};
use crate::eb::types::models::FileFormat;

/// A data file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedFile {
    pub path: PathBuf,
    /// File name as stored on disk, without an `.org`/`.ebz` suffix.
    pub name: String,
    /// Format implied by the suffix, or the caller's default.
    pub format: FileFormat,
}

/// Finds the subdirectory `name` of `parent`, ignoring case.
///
/// # Errors
/// Returns `NotFound` if no such directory exists, or `PermissionDenied`
/// if it cannot be listed.
pub fn find_directory(parent: impl AsRef<Path>, name: &str) -> Result<PathBuf> {
    let parent = parent.as_ref();
    for entry in fs::read_dir(parent).map_err(|e| EbError::from_open(parent, e))? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if entry.file_name().to_string_lossy().eq_ignore_ascii_case(name) {
            let dir = entry.path();
            fs::read_dir(&dir).map_err(|e| EbError::from_open(&dir, e))?;
            debug!("Found directory {}", dir.display());
            return Ok(dir);
        }
    }
    Err(EbError::NotFound { path: parent.join(name) })
}

/// Finds the data file `name` in `dir`, ignoring case.
///
/// `name` itself is opened as `default_format`; `name.org` is plain and
/// `name.ebz` is EBZip. The first match in directory order wins.
///
/// # Errors
/// Returns `NotFound` if none of the candidates exists, or
/// `PermissionDenied` if the match cannot be read.
pub fn locate_file(dir: impl AsRef<Path>, name: &str, default_format: FileFormat) -> Result<LocatedFile> {
    let dir = dir.as_ref();
    let org = format!("{}.org", name);
    let ebz = format!("{}.ebz", name);

    for entry in fs::read_dir(dir).map_err(|e| EbError::from_open(dir, e))? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        let (format, stem_len) = if file_name.eq_ignore_ascii_case(name) {
            (default_format, file_name.len())
        } else if file_name.eq_ignore_ascii_case(&org) {
            (FileFormat::Plain, file_name.len() - 4)
        } else if file_name.eq_ignore_ascii_case(&ebz) {
            (FileFormat::Ebzip, file_name.len() - 4)
        } else {
            continue;
        };

        let path = entry.path();
        File::open(&path).map_err(|e| EbError::from_open(&path, e))?;
        debug!("Located {} as {:?}", path.display(), format);
        return Ok(LocatedFile {
            name: file_name[..stem_len].to_string(),
            path,
            format,
        });
    }
    Err(EbError::NotFound { path: dir.join(name) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_directories_ignoring_case() {
        let root = tempfile::tempdir().expect("tempdir");
        fs::create_dir(root.path().join("Data")).unwrap();
        fs::write(root.path().join("data.txt"), b"x").unwrap();

        let dir = find_directory(root.path(), "DATA").unwrap();
        assert_eq!(dir, root.path().join("Data"));
        assert!(matches!(find_directory(root.path(), "gaiji"), Err(EbError::NotFound { .. })));
    }

    #[test]
    fn suffix_selects_format() {
        let root = tempfile::tempdir().expect("tempdir");
        fs::write(root.path().join("HONMON.EBZ"), b"x").unwrap();
        let found = locate_file(root.path(), "honmon", FileFormat::Epwing).unwrap();
        assert_eq!(found.format, FileFormat::Ebzip);
        assert_eq!(found.name, "HONMON");

        fs::write(root.path().join("start.org"), b"x").unwrap();
        let found = locate_file(root.path(), "START", FileFormat::Epwing).unwrap();
        assert_eq!(found.format, FileFormat::Plain);
        assert_eq!(found.name, "start");

        fs::write(root.path().join("Honmon2"), b"x").unwrap();
        let found = locate_file(root.path(), "HONMON2", FileFormat::Epwing6).unwrap();
        assert_eq!(found.format, FileFormat::Epwing6);
        assert_eq!(found.path, root.path().join("Honmon2"));
    }

    #[test]
    fn missing_file_is_not_found() {
        let root = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            locate_file(root.path(), "honmon", FileFormat::Plain),
            Err(EbError::NotFound { .. })
        ));
        assert!(matches!(
            locate_file(root.path().join("absent"), "honmon", FileFormat::Plain),
            Err(EbError::NotFound { .. })
        ));
    }
}
