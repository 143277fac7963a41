//! Listing of the videos a user can pick from. Only the top level of the
//! media directory is scanned.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, VoiceoverError};

pub const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "avi", "mov", "mkv"];

pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// File names of the videos in `dir`, sorted
pub fn list_videos(dir: &Path) -> Result<Vec<String>> {
    let mut videos = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        // follows symlinks
        if !path.is_file() || !is_video_file(&path) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            videos.push(name.to_string());
        }
    }
    videos.sort();
    Ok(videos)
}

/// Map a selected file name back to its path; it must be part of the listing.
pub fn resolve_video(dir: &Path, name: &str) -> Result<PathBuf> {
    let videos = list_videos(dir)?;
    if videos.iter().any(|v| v == name) {
        Ok(dir.join(name))
    } else {
        Err(VoiceoverError::Validation(format!(
            "Video file not found: {}",
            name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.mp4", "a.MOV", "c.mkv", "d.avi", "notes.txt", "clip.mp4.part"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested.mp4")).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("deep.mp4"), b"x").unwrap();
        dir
    }

    #[test]
    fn test_list_videos() {
        let dir = media_dir();
        assert_eq!(
            list_videos(dir.path()).unwrap(),
            vec!["a.MOV", "b.mp4", "c.mkv", "d.avi"]
        );
    }

    #[test]
    fn test_resolve_video() {
        let dir = media_dir();
        assert_eq!(resolve_video(dir.path(), "b.mp4").unwrap(), dir.path().join("b.mp4"));

        for name in ["notes.txt", "deep.mp4", "sub/deep.mp4", "../b.mp4", "missing.mp4"] {
            let err = resolve_video(dir.path(), name).unwrap_err();
            assert!(err.is_validation(), "{} should be rejected", name);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_videos_are_listed() {
        use std::os::unix::fs::symlink;

        let dir = media_dir();
        let elsewhere = tempfile::tempdir().unwrap();
        let target = elsewhere.path().join("recording.mp4");
        fs::write(&target, b"x").unwrap();
        symlink(&target, dir.path().join("linked.mp4")).unwrap();
        symlink(elsewhere.path().join("gone.mp4"), dir.path().join("dangling.mp4")).unwrap();

        let videos = list_videos(dir.path()).unwrap();
        assert_eq!(videos, vec!["a.MOV", "b.mp4", "c.mkv", "d.avi", "linked.mp4"]);
        assert_eq!(
            resolve_video(dir.path(), "linked.mp4").unwrap(),
            dir.path().join("linked.mp4")
        );
    }
}
