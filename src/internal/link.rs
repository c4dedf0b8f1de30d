//! Link status queries and length-checked link reads.

use crate::Error;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io::ErrorKind;
use tracing::debug;

/// Suffix appended to a link path to build its temporary sibling
pub(crate) const TEMP_SUFFIX: &str = ".tmp";

/// Temporary sibling of `path`, in the same directory so rename stays atomic
pub(crate) fn temp_sibling(path: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{path}{TEMP_SUFFIX}"))
}

/// What lstat found at a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinkStatus {
    Missing,
    /// A symlink whose stored target is this many bytes long
    Symlink(u64),
    Other,
}

/// Query the status of `path` without following it
pub(crate) fn status(path: &Utf8Path) -> Result<LinkStatus, Error> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => Ok(LinkStatus::Symlink(meta.len())),
        Ok(_) => Ok(LinkStatus::Other),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(LinkStatus::Missing),
        Err(e) => Err(Error::io("lstat", path, e)),
    }
}

/// Read the full target of the symlink at `path`.
///
/// Fails with `NotFound` or `NotASymlink` before touching the link, and with
/// `LinkChanged` when the target read back is not the length lstat reported.
pub(crate) fn read_target(path: &Utf8Path) -> Result<String, Error> {
    let expected = match status(path)? {
        LinkStatus::Symlink(len) => len,
        LinkStatus::Missing => return Err(Error::NotFound(path.to_owned())),
        LinkStatus::Other => return Err(Error::NotASymlink(path.to_owned())),
    };

    let target = fs::read_link(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::NotFound(path.to_owned()),
        // EINVAL: replaced by something that is not a link since lstat
        ErrorKind::InvalidInput => Error::NotASymlink(path.to_owned()),
        _ => Error::io("readlink", path, e),
    })?;

    check_len(path, expected, target.as_os_str().len() as u64)?;

    let target =
        Utf8PathBuf::try_from(target).map_err(|_| Error::InvalidTargetUtf8(path.to_owned()))?;

    debug!("{} -> {}", path, target);

    Ok(target.into_string())
}

/// The target read back must be as long as lstat said it was
fn check_len(path: &Utf8Path, expected: u64, actual: u64) -> Result<(), Error> {
    if actual != expected {
        return Err(Error::LinkChanged {
            path: path.to_owned(),
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use tempfile::tempdir;

    fn utf8(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_temp_sibling_appends_suffix() {
        assert_eq!(
            temp_sibling(Utf8Path::new("/srv/current")),
            Utf8PathBuf::from("/srv/current.tmp")
        );
        assert_eq!(temp_sibling(Utf8Path::new("rel")), Utf8PathBuf::from("rel.tmp"));
    }

    #[test]
    fn test_status_kinds() {
        let dir = tempdir().unwrap();
        let root = utf8(&dir);
        let file = root.join("file");
        let link = root.join("link");
        fs::write(&file, "data").unwrap();
        symlink("somewhere/else", &link).unwrap();

        assert_eq!(status(&root.join("missing")).unwrap(), LinkStatus::Missing);
        assert_eq!(status(&file).unwrap(), LinkStatus::Other);
        assert_eq!(status(&root).unwrap(), LinkStatus::Other);
        assert_eq!(
            status(&link).unwrap(),
            LinkStatus::Symlink("somewhere/else".len() as u64)
        );
    }

    #[test]
    fn test_read_target_dangling_link() {
        let dir = tempdir().unwrap();
        let link = utf8(&dir).join("dangling");
        symlink("/does/not/exist", &link).unwrap();

        assert_eq!(read_target(&link).unwrap(), "/does/not/exist");
    }

    #[test]
    fn test_read_target_rejects_regular_file() {
        let dir = tempdir().unwrap();
        let file = utf8(&dir).join("plain");
        fs::write(&file, "x").unwrap();

        assert!(matches!(read_target(&file), Err(Error::NotASymlink(p)) if p == file));
    }

    #[test]
    fn test_read_target_rejects_non_utf8_target() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        let link = utf8(&dir).join("binary");
        symlink(OsStr::from_bytes(b"/x/\xff"), &link).unwrap();

        assert!(matches!(read_target(&link), Err(Error::InvalidTargetUtf8(p)) if p == link));
    }

    #[test]
    fn test_length_change_is_reported() {
        let path = Utf8Path::new("/srv/current");

        assert!(check_len(path, 12, 12).is_ok());
        assert!(matches!(
            check_len(path, 12, 9),
            Err(Error::LinkChanged {
                expected: 12,
                actual: 9,
                ..
            })
        ));
    }

    #[test]
    fn test_read_target_missing() {
        let dir = tempdir().unwrap();
        let missing = utf8(&dir).join("missing");

        assert!(matches!(read_target(&missing), Err(Error::NotFound(p)) if p == missing));
    }
}
