// markscan-core/tests/discovery_tests.rs

use markscan_core::error::CoreError;
use markscan_core::{find_video_files, resolve_inputs};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_find_video_files_filters_and_sorts() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    for name in ["b.mkv", "a.MP4", "c.webm", "notes.txt", "thumb.jpg", "d.mov", "e.avi"] {
        fs::write(dir.path().join(name), b"")?;
    }
    fs::create_dir(dir.path().join("nested.mp4"))?;
    fs::create_dir(dir.path().join("sub"))?;
    fs::write(dir.path().join("sub").join("deeper.mp4"), b"")?;

    let files = find_video_files(dir.path())?;
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.MP4", "b.mkv", "c.webm", "d.mov", "e.avi"]);
    Ok(())
}

#[test]
fn test_find_video_files_empty_directory() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("readme.md"), b"").unwrap();
    assert!(matches!(find_video_files(dir.path()), Err(CoreError::NoFilesFound)));
}

#[test]
fn test_resolve_inputs_file_and_missing() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let video = dir.path().join("clip.mp4");
    fs::write(&video, b"")?;

    assert_eq!(resolve_inputs(&video)?, vec![video.clone()]);
    assert_eq!(resolve_inputs(dir.path())?, vec![video]);
    assert!(matches!(
        resolve_inputs(&dir.path().join("missing.mp4")),
        Err(CoreError::PathError(_))
    ));
    Ok(())
}
