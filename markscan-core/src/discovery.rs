//! File discovery module for finding video files to scan.
//!
//! Only the top level of the given directory is searched. Matching uses
//! [`crate::utils::VIDEO_EXTENSIONS`], case-insensitively.

use crate::error::{CoreError, CoreResult};
use crate::utils::is_valid_video_file;

use std::path::{Path, PathBuf};

/// Finds video files in `input_dir`, sorted by path.
///
/// # Returns
///
/// * `Ok(Vec<PathBuf>)` - The discovered files
/// * `Err(CoreError::Io)` - If the directory cannot be read
/// * `Err(CoreError::NoFilesFound)` - If no video files are present
pub fn find_video_files(input_dir: &Path) -> CoreResult<Vec<PathBuf>> {
    let read_dir = std::fs::read_dir(input_dir)?;
    let mut files: Vec<PathBuf> = read_dir
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            is_valid_video_file(&path).then_some(path)
        })
        .collect();

    if files.is_empty() {
        return Err(CoreError::NoFilesFound);
    }
    files.sort();
    Ok(files)
}

/// Expands `input` into the videos to process: a file is returned as-is,
/// a directory is searched with [`find_video_files`].
pub fn resolve_inputs(input: &Path) -> CoreResult<Vec<PathBuf>> {
    if input.is_dir() {
        find_video_files(input)
    } else if input.is_file() {
        Ok(vec![input.to_path_buf()])
    } else {
        Err(CoreError::PathError(format!(
            "Input path does not exist: {}",
            input.display()
        )))
    }
}
