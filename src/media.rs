use anyhow::{bail, Context, Result};
use filetime::FileTime;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io::{self, IsTerminal, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};

const COPY_CHUNK: usize = 8 * 1024 * 1024;

/// Preview players in priority order: headless-autoexit first, then the
/// quieter general players. A player that is not installed is skipped.
const PLAYERS: [(&str, &[&str]); 3] = [
    ("ffplay", &["-autoexit"]),
    ("mpv", &["--really-quiet"]),
    ("vlc", &["--play-and-exit"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageMethod {
    Remuxed,
    Copied,
    FallbackCopied,
}

/// Stage `source` into `working_dir`: `.mkv` sources are remuxed into an
/// `.mp4` container (stream copy, no re-encode), everything else is byte
/// copied. A failed remux falls back to a plain copy of the original file.
pub fn stage(source: &Path, working_dir: &Path) -> Result<StageMethod> {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .with_context(|| format!("{} has no file name", source.display()))?;

    let is_mkv = source
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase() == "mkv")
        .unwrap_or(false);

    if is_mkv {
        let remux_dest = working_dir.join(Path::new(&name).with_extension("mp4"));
        match remux_to_mp4(source, &remux_dest) {
            Ok(()) => return Ok(StageMethod::Remuxed),
            Err(err) => {
                println!("Remux failed ({err:#}); falling back to a plain copy.");
                if remux_dest.exists() {
                    let _ = fs::remove_file(&remux_dest);
                }
                copy_with_metadata(source, &working_dir.join(&name))?;
                return Ok(StageMethod::FallbackCopied);
            }
        }
    }

    copy_with_metadata(source, &working_dir.join(&name))?;
    Ok(StageMethod::Copied)
}

// Stream copy into mp4; faststart moves the moov atom to the front so the
// staged file starts playing before it is fully read.
fn remux_to_mp4(source: &Path, dest: &Path) -> Result<()> {
    let status = Command::new("ffmpeg")
        .arg("-y")
        .args(["-loglevel", "error"])
        .arg("-i")
        .arg(source)
        .args(["-c", "copy", "-movflags", "+faststart"])
        .arg(dest)
        .stdin(Stdio::null())
        .status()
        .context("failed to run ffmpeg")?;
    if !status.success() {
        bail!("ffmpeg exited with {status}");
    }
    Ok(())
}

fn copy_with_metadata(source: &Path, dest: &Path) -> Result<()> {
    let meta = fs::metadata(source)
        .with_context(|| format!("failed to stat {}", source.display()))?;
    let mut reader =
        File::open(source).with_context(|| format!("failed to open {}", source.display()))?;
    let mut writer =
        File::create(dest).with_context(|| format!("failed to create {}", dest.display()))?;

    let pb = copy_bar(meta.len());
    let mut buf = vec![0u8; COPY_CHUNK];
    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("failed to read {}", source.display()))?;
        if n == 0 {
            break;
        }
        writer
            .write_all(&buf[..n])
            .with_context(|| format!("failed to write {}", dest.display()))?;
        pb.inc(n as u64);
    }
    writer.flush()?;
    pb.finish_and_clear();

    let mtime = FileTime::from_last_modification_time(&meta);
    let _ = filetime::set_file_mtime(dest, mtime);
    Ok(())
}

fn copy_bar(total_bytes: u64) -> ProgressBar {
    if !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total_bytes);
    pb.set_style(
        ProgressStyle::with_template("{wide_bar} {bytes}/{total_bytes} ({bytes_per_sec})")
            .unwrap(),
    );
    pb
}

/// Play `name` from `source_dir` with the first available player, falling
/// back to the OS default opener. Never touches the ledger.
pub fn preview(source_dir: &Path, name: &str) -> Result<()> {
    let path = source_dir.join(name);
    for (player, args) in PLAYERS {
        match Command::new(player).args(args).arg(&path).status() {
            Ok(status) if status.success() => return Ok(()),
            Ok(status) => bail!("{player} exited with {status}"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(err) => {
                return Err(err).with_context(|| format!("failed to run {player}"));
            }
        }
    }
    open_with_default(&path)
}

fn open_with_default(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    let mut cmd = Command::new("open");
    #[cfg(target_os = "windows")]
    let mut cmd = {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]);
        cmd
    };
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut cmd = Command::new("xdg-open");

    let status = cmd
        .arg(path)
        .status()
        .context("no preview method available")?;
    if !status.success() {
        bail!("default opener exited with {status}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn non_mkv_source_is_plain_copied() {
        let tmp = TempDir::new().expect("tempdir");
        let working = tmp.path().join("working");
        fs::create_dir_all(&working).expect("mkdir");

        let source = tmp.path().join("clip.mp4");
        fs::write(&source, b"mp4 payload").expect("write");

        let method = stage(&source, &working).expect("stage");
        assert_eq!(method, StageMethod::Copied);
        assert_eq!(fs::read(working.join("clip.mp4")).expect("read"), b"mp4 payload");
    }

    #[test]
    fn plain_copy_preserves_source_mtime() {
        let tmp = TempDir::new().expect("tempdir");
        let working = tmp.path().join("working");
        fs::create_dir_all(&working).expect("mkdir");

        let source = tmp.path().join("clip.webm");
        fs::write(&source, b"payload").expect("write");
        let stamp = FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(&source, stamp).expect("set mtime");

        stage(&source, &working).expect("stage");

        let copied = fs::metadata(working.join("clip.webm")).expect("stat");
        assert_eq!(FileTime::from_last_modification_time(&copied), stamp);
    }

    // An mkv full of garbage can never be remuxed: ffmpeg either is missing
    // (spawn fails) or rejects the input. Both paths must end in a byte copy.
    #[test]
    fn failed_remux_falls_back_to_plain_copy() {
        let tmp = TempDir::new().expect("tempdir");
        let working = tmp.path().join("working");
        fs::create_dir_all(&working).expect("mkdir");

        let source = tmp.path().join("broken.mkv");
        fs::write(&source, b"definitely not matroska").expect("write");

        let method = stage(&source, &working).expect("stage");
        assert_eq!(method, StageMethod::FallbackCopied);
        assert_eq!(
            fs::read(working.join("broken.mkv")).expect("read"),
            b"definitely not matroska"
        );
        assert!(
            !working.join("broken.mp4").exists(),
            "partial remux output should have been removed"
        );
    }
}
