use crate::error::{Error, Result};
use glob::Pattern;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// What to do with files or directories the current user cannot read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionPolicy {
    /// Leave them out of the result.
    #[default]
    Skip,
    /// Abort the scan with [`Error::PermissionDenied`].
    Fail,
}

/// Knobs for [`scan_files`]. The default walks every subdirectory, does not
/// follow symbolic links and skips unreadable entries.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub follow_links: bool,
    pub skip_hidden: bool,
    pub exclude: Vec<String>,
    pub permissions: PermissionPolicy,
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(Error::not_found(path)),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(Error::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => Err(Error::not_found(path)),
    }
}

pub fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

pub fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).map_err(Error::from))
        .collect()
}

// A pattern excludes an entry if it matches either the relative path or the
// bare name, so `__pycache__` and `*.pyc` work at any depth.
fn is_excluded(patterns: &[Pattern], rel: &Path, entry: &DirEntry) -> bool {
    if patterns.is_empty() {
        return false;
    }
    let rel = crate::stringutil::to_posix_path(rel);
    let name = entry.file_name().to_string_lossy();
    patterns
        .iter()
        .any(|p| p.matches(&rel) || p.matches(&name))
}

fn is_permission_denied(err: &walkdir::Error) -> bool {
    err.io_error()
        .map(|e| e.kind() == std::io::ErrorKind::PermissionDenied)
        .unwrap_or(false)
}

// With `follow_links`, a link whose target is gone surfaces as NotFound on
// the link itself, while the link entry is still there.
fn is_dangling_link(err: &walkdir::Error) -> bool {
    let missing = err
        .io_error()
        .map(|e| e.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false);
    missing
        && err
            .path()
            .and_then(|p| fs::symlink_metadata(p).ok())
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
}

/// Recursively list the regular files under `root`, as paths relative to it.
///
/// The walk visits entries sorted by file name so that repeated scans of an
/// unchanged tree return the same list. `root` must be an existing directory.
/// Files whose relative path is not valid UTF-8 cannot be written to a
/// manifest without altering them, so they are left out with a warning.
pub fn scan_files(root: &Path, options: &ScanOptions) -> Result<Vec<PathBuf>> {
    ensure_dir(root)?;
    let patterns = compile_patterns(&options.exclude)?;

    let walker = WalkDir::new(root)
        .follow_links(options.follow_links)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            // never prune the root itself, it may well be "."
            if e.depth() == 0 {
                return true;
            }
            if options.skip_hidden && is_hidden(e) {
                return false;
            }
            let rel = e.path().strip_prefix(root).unwrap_or(e.path());
            !is_excluded(&patterns, rel, e)
        });

    let mut files = Vec::new();
    for item in walker {
        let entry = match item {
            Ok(entry) => entry,
            Err(err) if err.loop_ancestor().is_some() => {
                tracing::warn!("Skipping symbolic link loop: {}", err);
                continue;
            }
            Err(err) if is_dangling_link(&err) => {
                tracing::warn!("Skipping dangling symbolic link: {}", err);
                continue;
            }
            Err(err) if is_permission_denied(&err) => {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                match options.permissions {
                    PermissionPolicy::Fail => return Err(Error::PermissionDenied { path }),
                    PermissionPolicy::Skip => {
                        tracing::debug!("Skipping unreadable directory {:?}", path);
                        continue;
                    }
                }
            }
            Err(err) => return Err(err.into()),
        };

        if !entry.file_type().is_file() {
            continue;
        }

        if let Err(e) = fs::File::open(entry.path()) {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                match options.permissions {
                    PermissionPolicy::Fail => {
                        return Err(Error::PermissionDenied {
                            path: entry.path().to_path_buf(),
                        })
                    }
                    PermissionPolicy::Skip => {
                        tracing::debug!("Skipping unreadable file {:?}", entry.path());
                        continue;
                    }
                }
            }
            return Err(e.into());
        }

        let rel = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_path_buf();
        if rel.to_str().is_none() {
            tracing::warn!("Skipping file with non UTF-8 path: {:?}", entry.path());
            continue;
        }
        files.push(rel);
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_ensure_dir() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "file.txt");

        assert!(ensure_dir(temp.path()).is_ok());
        assert!(matches!(
            ensure_dir(&temp.path().join("file.txt")),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            ensure_dir(&temp.path().join("missing")),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_scan_files_sorted_and_relative() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "b.txt");
        touch(temp.path(), "a/z.txt");
        touch(temp.path(), "a/y.txt");

        let files = scan_files(temp.path(), &ScanOptions::default()).unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("a/y.txt"),
                PathBuf::from("a/z.txt"),
                PathBuf::from("b.txt"),
            ]
        );
    }

    #[test]
    fn test_scan_files_exclude_prunes_directories() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "keep.py");
        touch(temp.path(), "drop.pyc");
        touch(temp.path(), "sub/__pycache__/mod.cpython.pyc");
        touch(temp.path(), "sub/__pycache__/data.txt");

        let options = ScanOptions {
            exclude: vec!["*.pyc".to_string(), "__pycache__".to_string()],
            ..Default::default()
        };
        let files = scan_files(temp.path(), &options).unwrap();
        assert_eq!(files, vec![PathBuf::from("keep.py")]);
    }

    // macOS filesystems refuse such names outright
    #[cfg(target_os = "linux")]
    #[test]
    fn test_scan_files_skips_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp = TempDir::new().unwrap();
        touch(temp.path(), "ok.txt");
        fs::write(temp.path().join(OsStr::from_bytes(b"a\xff.txt")), b"x").unwrap();
        fs::write(temp.path().join(OsStr::from_bytes(b"a\xfe.txt")), b"x").unwrap();

        let files = scan_files(temp.path(), &ScanOptions::default()).unwrap();
        assert_eq!(files, vec![PathBuf::from("ok.txt")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_files_skips_dangling_links() {
        use std::os::unix::fs::symlink;

        let temp = TempDir::new().unwrap();
        touch(temp.path(), "ok.txt");
        symlink(temp.path().join("gone"), temp.path().join("broken")).unwrap();

        let options = ScanOptions {
            follow_links: true,
            ..Default::default()
        };
        let files = scan_files(temp.path(), &options).unwrap();
        assert_eq!(files, vec![PathBuf::from("ok.txt")]);
    }

    #[test]
    fn test_scan_files_bad_pattern() {
        let temp = TempDir::new().unwrap();
        let options = ScanOptions {
            exclude: vec!["[".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            scan_files(temp.path(), &options),
            Err(Error::Glob(_))
        ));
    }
}
