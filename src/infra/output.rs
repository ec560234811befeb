use std::{
    fs, io,
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::debug;

use super::error::InfraError;

/// Mode requested for new files; the process umask is applied on top, as with a plain write.
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o666;
const MAX_LINK_HOPS: usize = 40;

/// Write `bytes` to `path`, replacing any existing file.
///
/// The bytes go to a temporary file in the destination directory first and are
/// renamed over the target once fully written, so a failure never leaves a
/// truncated file behind. Symlinks are followed, and an existing target keeps
/// its permissions.
pub async fn write_output(path: &Path, bytes: &[u8]) -> Result<(), InfraError> {
    let target = path.to_path_buf();
    let bytes = bytes.to_vec();
    tokio::task::spawn_blocking(move || write_atomic(&target, &bytes))
        .await
        .map_err(|err| InfraError::output(path, io::Error::other(err)))?
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), InfraError> {
    let target = resolve_links(path).map_err(|err| InfraError::output(path, err))?;
    let existing = fs::metadata(&target).ok().map(|meta| meta.permissions());

    let dir = parent_dir(&target);
    let mut builder = tempfile::Builder::new();
    builder.prefix(".highchart-export");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(NEW_FILE_MODE));
    }
    let mut file = builder
        .tempfile_in(&dir)
        .map_err(|err| InfraError::output(path, err))?;

    if let Some(permissions) = existing {
        file.as_file()
            .set_permissions(permissions)
            .map_err(|err| InfraError::output(path, err))?;
    }
    write_all(&mut file, bytes).map_err(|err| InfraError::output(path, err))?;
    file.persist(&target)
        .map_err(|err| InfraError::output(path, err.error))?;

    debug!(
        target = "infra::output",
        op = "output::write",
        path = %path.display(),
        resolved = %target.display(),
        bytes = bytes.len(),
        "Output file written"
    );
    Ok(())
}

fn write_all(file: &mut NamedTempFile, bytes: &[u8]) -> io::Result<()> {
    file.write_all(bytes)?;
    file.flush()?;
    file.as_file().sync_all()
}

/// Follow symlinks at `path` to the file that should receive the bytes. A
/// dangling link resolves to the path it points at.
fn resolve_links(path: &Path) -> io::Result<PathBuf> {
    let mut current = path.to_path_buf();
    for _ in 0..MAX_LINK_HOPS {
        match fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => {
                let link = fs::read_link(&current)?;
                current = match current.parent() {
                    Some(parent) => parent.join(link),
                    None => link,
                };
            }
            Ok(_) => return Ok(current),
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(current),
            Err(err) => return Err(err),
        }
    }
    Err(io::Error::other("too many levels of symbolic links"))
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn writes_bytes_to_target() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("chart.png");

        write_output(&path, b"image-bytes").await.expect("write");

        assert_eq!(fs::read(&path).expect("read"), b"image-bytes");
        let entries = fs::read_dir(dir.path()).expect("read dir").count();
        assert_eq!(entries, 1, "temporary file should be renamed away");
    }

    #[tokio::test]
    async fn overwrites_existing_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("chart.svg");
        fs::write(&path, b"a much longer previous export").expect("seed");

        write_output(&path, b"<svg/>").await.expect("write");

        assert_eq!(fs::read(&path).expect("read"), b"<svg/>");
    }

    #[tokio::test]
    async fn missing_directory_reports_target_path() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("missing").join("chart.png");

        let err = write_output(&path, b"bytes").await.expect_err("no dir");

        match err {
            InfraError::Output { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!path.exists());
    }

    #[test]
    fn bare_file_name_writes_to_current_dir() {
        assert_eq!(parent_dir(Path::new("chart.png")), PathBuf::from("."));
        assert_eq!(
            parent_dir(Path::new("out/chart.png")),
            PathBuf::from("out")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn new_file_mode_matches_plain_write() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("temp dir");
        let exported = dir.path().join("chart.png");
        let plain = dir.path().join("plain.png");

        write_output(&exported, b"x").await.expect("write");
        fs::write(&plain, b"x").expect("plain write");

        let mode = |path: &Path| fs::metadata(path).expect("metadata").permissions().mode() & 0o777;
        assert_eq!(mode(&exported), mode(&plain));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn overwrite_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("chart.png");
        fs::write(&path, b"old").expect("seed");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).expect("chmod");

        write_output(&path, b"new").await.expect("write");

        let mode = fs::metadata(&path).expect("metadata").permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
        assert_eq!(fs::read(&path).expect("read"), b"new");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn writes_through_symlink() {
        let dir = TempDir::new().expect("temp dir");
        let real = dir.path().join("real.png");
        let link = dir.path().join("latest.png");
        fs::write(&real, b"old").expect("seed");
        std::os::unix::fs::symlink("real.png", &link).expect("symlink");

        write_output(&link, b"new").await.expect("write");

        assert!(fs::symlink_metadata(&link).expect("link").file_type().is_symlink());
        assert_eq!(fs::read(&real).expect("read"), b"new");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn dangling_symlink_creates_its_target() {
        let dir = TempDir::new().expect("temp dir");
        let link = dir.path().join("latest.png");
        std::os::unix::fs::symlink("fresh.png", &link).expect("symlink");

        write_output(&link, b"bytes").await.expect("write");

        assert_eq!(fs::read(dir.path().join("fresh.png")).expect("read"), b"bytes");
        assert!(fs::symlink_metadata(&link).expect("link").file_type().is_symlink());
    }
}
