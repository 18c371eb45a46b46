use std::fs;
use std::path::Path;

/// Extensions treated as video files (matched case-insensitively).
pub const VIDEO_EXTENSIONS: [&str; 8] = ["mp4", "avi", "mov", "mkv", "wmv", "flv", "webm", "m4v"];

pub fn is_video(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            VIDEO_EXTENSIONS.iter().any(|v| *v == ext)
        })
        .unwrap_or(false)
}

/// List video filenames (base names only) in `dir`, sorted.
///
/// Unreadable entries are skipped rather than failing the scan; a missing or
/// unreadable directory yields an empty list. The caller decides whether an
/// absent directory is fatal.
pub fn video_files(dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut out = Vec::new();
    for entry in entries.flatten() {
        if !entry.path().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if is_video(&name) {
            out.push(name);
        }
    }
    out.sort();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn filters_by_extension_case_insensitively() {
        let tmp = TempDir::new().expect("tempdir");
        for name in ["a.mp4", "B.MKV", "clip.webm", "notes.txt", "tool.exe"] {
            std::fs::write(tmp.path().join(name), b"x").expect("write");
        }

        let found = video_files(tmp.path());
        assert_eq!(found, vec!["B.MKV", "a.mp4", "clip.webm"]);
    }

    #[test]
    fn missing_directory_yields_empty_listing() {
        let tmp = TempDir::new().expect("tempdir");
        let gone = tmp.path().join("nope");
        assert!(video_files(&gone).is_empty());
    }

    #[test]
    fn directories_are_not_videos_even_with_video_suffix() {
        let tmp = TempDir::new().expect("tempdir");
        std::fs::create_dir(tmp.path().join("folder.mp4")).expect("mkdir");
        std::fs::write(tmp.path().join("real.mov"), b"x").expect("write");

        assert_eq!(video_files(tmp.path()), vec!["real.mov"]);
    }

    #[test]
    fn names_without_extension_are_skipped() {
        assert!(!is_video("README"));
        assert!(is_video("holiday.M4V"));
        assert!(!is_video("archive.tar.gz"));
    }
}
