use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::PrepError;

/// ENOSPC on Unix
const DISK_FULL_OS_ERROR: i32 = 28;

#[inline]
fn is_disk_full(e: &io::Error) -> bool {
    e.raw_os_error() == Some(DISK_FULL_OS_ERROR)
}

/// Create a directory and all of its parents
pub fn create_dir(path: &Path) -> Result<(), PrepError> {
    fs::create_dir_all(path).map_err(|e| {
        if is_disk_full(&e) {
            return PrepError::DiskFull {
                path: path.to_path_buf(),
            };
        }
        PrepError::CreateDirFailed {
            path: path.to_path_buf(),
            source: e,
        }
    })
}

/// Copy a single file from src to dst
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64, PrepError> {
    // Create parent directory if needed
    if let Some(parent) = dst.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            create_dir(parent)?;
        }
    }

    fs::copy(src, dst).map_err(|e| {
        if is_disk_full(&e) {
            return PrepError::DiskFull {
                path: dst.to_path_buf(),
            };
        }
        PrepError::CopyFailed {
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
            source: e,
        }
    })
}

/// Remove a directory tree if it exists. Returns whether anything was removed.
pub fn remove_directory(path: &Path) -> Result<bool, PrepError> {
    if !path.is_dir() {
        return Ok(false);
    }

    fs::remove_dir_all(path).map_err(|e| PrepError::RemoveDirFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(true)
}

/// Copy directory recursively, including empty directories.
/// Returns (files_copied, bytes_copied)
pub fn copy_directory(src: &Path, dst: &Path) -> Result<(u64, u64), PrepError> {
    if !src.is_dir() {
        return Err(PrepError::SourceNotFound {
            path: src.to_path_buf(),
        });
    }

    let mut files_copied = 0u64;
    let mut bytes_copied = 0u64;

    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(|e| PrepError::WalkFailed {
            path: src.to_path_buf(),
            source: e,
        })?;

        let src_path = entry.path();
        let relative = src_path.strip_prefix(src).unwrap_or(src_path);
        let dst_path = dst.join(relative);

        if entry.file_type().is_dir() {
            create_dir(&dst_path)?;
            continue;
        }

        bytes_copied += copy_file(src_path, &dst_path)?;
        files_copied += 1;
    }

    Ok((files_copied, bytes_copied))
}

/// Replace dst with a fresh copy of src. Never merges into an existing dst.
pub fn replace_directory(src: &Path, dst: &Path) -> Result<(u64, u64), PrepError> {
    if !src.is_dir() {
        return Err(PrepError::SourceNotFound {
            path: src.to_path_buf(),
        });
    }

    if remove_directory(dst)? {
        debug!(path = %dst.display(), "removed previous copy");
    }

    let (files, bytes) = copy_directory(src, dst)?;
    debug!(
        src = %src.display(),
        dst = %dst.display(),
        files,
        bytes,
        "copied directory"
    );
    Ok((files, bytes))
}
