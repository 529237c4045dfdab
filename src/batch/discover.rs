//! Enumeration of input part files.

use crate::config::ProcessOptions;
use crate::error::BatchError;
use std::path::{Path, PathBuf};

/// List the part files directly inside `directory`, sorted by path.
///
/// Files match on `options.part_extension`, case-insensitively.
///
/// Fails before anything else happens when the directory is missing or holds
/// no matching files.
pub fn find_part_files(directory: &Path, options: &ProcessOptions) -> Result<Vec<PathBuf>, BatchError> {
    if !directory.is_dir() {
        return Err(BatchError::DirectoryNotFound {
            path: directory.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let path = entry?.path();
        if options.matches_extension(&path) && path.is_file() {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(BatchError::NoPartFiles {
            path: directory.to_path_buf(),
            extension: options.part_extension.trim_start_matches('.').to_string(),
        });
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tempfile::TempDir;

    fn options(extension: &str) -> ProcessOptions {
        ProcessOptions {
            part_extension: extension.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        let err = find_part_files(&dir.path().join("nope"), &options("sldprt")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::DirectoryNotFound);
    }

    #[test]
    fn test_no_matching_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("assembly.sldasm"), "{}").unwrap();
        let err = find_part_files(dir.path(), &options("sldprt")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoPartFiles);
    }

    #[test]
    fn test_sorted_non_recursive() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.sldprt"), "{}").unwrap();
        std::fs::write(dir.path().join("A.SLDPRT"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("c.sldprt"), "{}").unwrap();
        std::fs::create_dir(dir.path().join("folder.sldprt")).unwrap();

        let files = find_part_files(dir.path(), &options(".sldprt")).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["A.SLDPRT", "b.sldprt"]);
    }
}
