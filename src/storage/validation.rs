//! Path validation
//!
//! Normalizes untrusted path strings and resolves them beneath the data root.
//! Cleaning alone is not a security boundary: `resolve_existing` is what keeps
//! symlinked entries from escaping the root.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// A normalized path relative to the data root.
///
/// Never contains `.`, `..`, empty segments or backslashes. The empty
/// sequence is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CleanPath {
    segments: Vec<String>,
}

/// Normalizes a user-supplied path.
///
/// Splits on `/`, drops empty, `.` and `..` segments and rejects any input
/// containing a backslash.
pub fn clean(raw: &str) -> Result<CleanPath, StorageError> {
    if raw.contains('\\') {
        return Err(StorageError::InvalidPath(raw.to_string()));
    }

    let segments = raw
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .map(str::to_string)
        .collect();

    Ok(CleanPath { segments })
}

/// Checks that `name` can be used as a single entry name.
pub fn validate_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
    {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

impl CleanPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment, empty for the root
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// Parent path; the root is its own parent
    pub fn parent(&self) -> CleanPath {
        let mut segments = self.segments.clone();
        segments.pop();
        CleanPath { segments }
    }

    /// Appends a single validated entry name
    pub fn join(&self, name: &str) -> Result<CleanPath, StorageError> {
        validate_name(name)?;
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(CleanPath { segments })
    }

    /// Segments joined with `/`, no leading or trailing slash
    pub fn as_relative(&self) -> String {
        self.segments.join("/")
    }

    /// Form used for folders and listings: `/a/b/`, or `/` for the root
    pub fn folder_string(&self) -> String {
        if self.is_root() {
            "/".to_string()
        } else {
            format!("/{}/", self.as_relative())
        }
    }

    /// Form used for files: `/a/b.jpg`
    pub fn file_string(&self) -> String {
        format!("/{}", self.as_relative())
    }

    /// Location of this path under `root`, without touching the filesystem
    pub fn to_real_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for segment in &self.segments {
            path.push(segment);
        }
        path
    }
}

impl fmt::Display for CleanPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_relative())
    }
}

/// Resolves an existing entry strictly beneath `root`.
///
/// Fails with `NotFound` when the entry is missing or when its canonical
/// location escapes the root.
pub fn resolve_existing(root: &Path, path: &CleanPath) -> Result<PathBuf, StorageError> {
    let root_canonical = root
        .canonicalize()
        .map_err(|e| StorageError::from_io(e, "/"))?;

    let canonical = path
        .to_real_path(&root_canonical)
        .canonicalize()
        .map_err(|e| StorageError::from_io(e, &path.file_string()))?;

    if !canonical.starts_with(&root_canonical) {
        return Err(StorageError::NotFound(path.file_string()));
    }

    Ok(canonical)
}

/// Whether `real_path` resolves to a location beneath the canonical `root`.
///
/// Dangling links resolve nowhere and are never contained.
pub fn is_contained(root: &Path, real_path: &Path) -> bool {
    real_path
        .canonicalize()
        .is_ok_and(|canonical| canonical.starts_with(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn cleaned(raw: &str) -> String {
        clean(raw).unwrap().as_relative()
    }

    #[test]
    fn test_clean() {
        assert_eq!(cleaned(""), "");
        assert_eq!(cleaned("."), "");
        assert_eq!(cleaned(".."), "");
        assert_eq!(cleaned("/"), "");
        assert_eq!(cleaned("/foo"), "foo");
        assert_eq!(cleaned("/foo/"), "foo");
        assert_eq!(cleaned("/foo/bar"), "foo/bar");
        assert_eq!(cleaned("/foo/bar/"), "foo/bar");
        assert_eq!(cleaned("foo//./../bar"), "foo/bar");
    }

    #[test]
    fn test_clean_bad() {
        assert!(matches!(clean("\\"), Err(StorageError::InvalidPath(_))));
        assert!(matches!(clean("\\foo"), Err(StorageError::InvalidPath(_))));
        assert!(matches!(clean("foo/b\\ar"), Err(StorageError::InvalidPath(_))));
    }

    #[test]
    fn test_clean_idempotent() {
        for raw in ["", "/a/./b/", "../../etc/passwd", "x//y/..", "New folder/"] {
            let once = clean(raw).unwrap();
            let twice = clean(&once.as_relative()).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_string_forms() {
        let root = CleanPath::root();
        assert_eq!(root.name(), "");
        assert_eq!(root.folder_string(), "/");

        let path = clean("Foo/test.jpg").unwrap();
        assert_eq!(path.name(), "test.jpg");
        assert_eq!(path.file_string(), "/Foo/test.jpg");
        assert_eq!(path.parent().folder_string(), "/Foo/");
        assert_eq!(root.parent(), root);
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("New folder").is_ok());
        for bad in ["", ".", "..", "a/b", "a\\b"] {
            assert!(matches!(validate_name(bad), Err(StorageError::InvalidName(_))));
        }
    }

    #[test]
    fn test_resolve_missing() {
        let dir = TempDir::new().unwrap();
        let path = clean("missing.jpg").unwrap();
        assert!(matches!(
            resolve_existing(dir.path(), &path),
            Err(StorageError::NotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_rejects_escaping_symlink() {
        let outside = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        fs::write(outside.path().join("secret.txt"), b"secret").unwrap();
        std::os::unix::fs::symlink(outside.path(), root.path().join("link")).unwrap();

        let path = clean("link/secret.txt").unwrap();
        assert!(matches!(
            resolve_existing(root.path(), &path),
            Err(StorageError::NotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_is_contained_follows_links() {
        let outside = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        let root_canonical = root.path().canonicalize().unwrap();
        fs::write(outside.path().join("victim.txt"), b"original").unwrap();
        fs::write(root.path().join("real.txt"), b"x").unwrap();
        std::os::unix::fs::symlink(outside.path().join("victim.txt"), root.path().join("evil.txt"))
            .unwrap();
        std::os::unix::fs::symlink(root.path().join("real.txt"), root.path().join("alias.txt"))
            .unwrap();

        assert!(is_contained(&root_canonical, &root.path().join("real.txt")));
        assert!(is_contained(&root_canonical, &root.path().join("alias.txt")));
        assert!(!is_contained(&root_canonical, &root.path().join("evil.txt")));
        assert!(!is_contained(&root_canonical, &root.path().join("missing.txt")));
    }

    #[test]
    fn test_resolve_inside_root() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("Foo")).unwrap();
        let resolved = resolve_existing(root.path(), &clean("/Foo/").unwrap()).unwrap();
        assert!(resolved.is_dir());
    }
}
