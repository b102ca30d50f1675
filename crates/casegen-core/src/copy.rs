//! Reference case duplication

use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Copy the reference tree to `dest`, keeping symlinks as symlinks.
///
/// If `dest` exists it is removed first when `overwrite` is set, otherwise
/// the copy fails with [`Error::DestinationAlreadyExists`].
pub fn copy_reference_case(reference: &Path, dest: &Path, overwrite: bool) -> Result<()> {
    if fs::symlink_metadata(dest).is_ok() {
        if !overwrite {
            return Err(Error::DestinationAlreadyExists(dest.to_path_buf()));
        }
        remove_existing(dest)?;
    }

    copy_tree(reference, dest)
}

/// Remove a file, symlink or directory tree
fn remove_existing(path: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(())
}

fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry?;
        // Every entry of the walk lives under its root
        let rel = entry.path().strip_prefix(from).unwrap_or(entry.path());
        let target = to.join(rel);
        let file_type = entry.file_type();

        let copied = if file_type.is_symlink() {
            fs::read_link(entry.path()).and_then(|link| copy_symlink(&link, entry.path(), &target))
        } else if file_type.is_dir() {
            fs::create_dir_all(&target)
        } else {
            fs::copy(entry.path(), &target).map(|_| ())
        };

        copied.map_err(|e| Error::CopyFailed {
            from: entry.path().to_path_buf(),
            to: target.clone(),
            source: e,
        })?;
    }

    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, _source: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(link, target)
}

#[cfg(windows)]
fn copy_symlink(link: &Path, source: &Path, target: &Path) -> io::Result<()> {
    // Windows needs to know what the link points at
    if fs::metadata(source).map(|m| m.is_dir()).unwrap_or(false) {
        std::os::windows::fs::symlink_dir(link, target)
    } else {
        std::os::windows::fs::symlink_file(link, target)
    }
}

#[cfg(not(any(unix, windows)))]
fn copy_symlink(_link: &Path, _source: &Path, _target: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symlinks are unsupported on this platform",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_reference(root: &Path) {
        fs::create_dir_all(root.join("system")).unwrap();
        fs::create_dir_all(root.join("constant/polyMesh")).unwrap();
        fs::write(root.join("system/controlDict"), "endTime 10;\n").unwrap();
        fs::write(root.join("constant/polyMesh/points"), "()\n").unwrap();
    }

    #[test]
    fn test_copy_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let reference = tmp.path().join("ref");
        make_reference(&reference);

        let dest = tmp.path().join("out/caseA");
        copy_reference_case(&reference, &dest, false).unwrap();

        assert_eq!(
            fs::read_to_string(dest.join("system/controlDict")).unwrap(),
            "endTime 10;\n"
        );
        assert!(dest.join("constant/polyMesh/points").is_file());
    }

    #[test]
    fn test_existing_destination_without_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let reference = tmp.path().join("ref");
        make_reference(&reference);
        let dest = tmp.path().join("caseA");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("marker"), "keep").unwrap();

        let err = copy_reference_case(&reference, &dest, false).unwrap_err();
        assert!(matches!(err, Error::DestinationAlreadyExists(_)));
        assert!(dest.join("marker").exists());
    }

    #[test]
    fn test_existing_destination_with_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let reference = tmp.path().join("ref");
        make_reference(&reference);
        let dest = tmp.path().join("caseA");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("marker"), "stale").unwrap();

        copy_reference_case(&reference, &dest, true).unwrap();
        assert!(!dest.join("marker").exists());
        assert!(dest.join("system/controlDict").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_preserved() {
        let tmp = tempfile::tempdir().unwrap();
        let reference = tmp.path().join("ref");
        make_reference(&reference);
        std::os::unix::fs::symlink("constant/polyMesh", reference.join("mesh")).unwrap();

        let dest = tmp.path().join("caseA");
        copy_reference_case(&reference, &dest, false).unwrap();

        let meta = fs::symlink_metadata(dest.join("mesh")).unwrap();
        assert!(meta.file_type().is_symlink());
        assert_eq!(
            fs::read_link(dest.join("mesh")).unwrap(),
            Path::new("constant/polyMesh")
        );
    }
}
