//! Normalized path handling for registry keys

use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

/// A path normalized to use forward slashes internally.
///
/// Registry keys are stored in this form so a registry written on one
/// platform reads back identically on another. Conversion to a native
/// `PathBuf` happens only at I/O boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        Self {
            inner: path_str.replace('\\', "/"),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// File name without its final extension (`notes.draft.md` -> `notes.draft`).
    pub fn file_stem(&self) -> Option<&str> {
        let name = self
            .inner
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())?;
        match name.rfind('.') {
            Some(idx) if idx > 0 => Some(&name[..idx]),
            _ => Some(name),
        }
    }
}

/// Compute the registry key of `file` relative to the project `root`.
///
/// Both paths are normalized lexically (`.` and `..` are folded) so the file
/// does not need to exist. Relative inputs are taken relative to `root`.
///
/// # Errors
///
/// Returns [`Error::InvalidPath`] if the file lies outside the root or
/// names the root itself.
pub fn relative_key(root: &Path, file: &Path) -> Result<String> {
    let root = lexical_normalize(root);
    let absolute = if file.is_absolute() {
        lexical_normalize(file)
    } else {
        lexical_normalize(&root.join(file))
    };

    let relative = absolute.strip_prefix(&root).map_err(|_| Error::InvalidPath {
        path: file.to_path_buf(),
        reason: format!("not inside project root {}", root.display()),
    })?;

    let key = NormalizedPath::new(relative).as_str().to_string();
    if key.is_empty() {
        return Err(Error::InvalidPath {
            path: file.to_path_buf(),
            reason: "path names the project root".to_string(),
        });
    }
    Ok(key)
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn new_converts_backslashes() {
        let path = NormalizedPath::new("docs\\guide\\intro.md");
        assert_eq!(path.as_str(), "docs/guide/intro.md");
    }

    #[rstest]
    #[case("docs/intro.md", Some("intro"))]
    #[case("notes.draft.md", Some("notes.draft"))]
    #[case("README", Some("README"))]
    #[case(".hidden", Some(".hidden"))]
    fn file_stem_cases(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(NormalizedPath::new(input).file_stem(), expected);
    }

    #[test]
    fn relative_key_inside_root() {
        let key = relative_key(Path::new("/project"), Path::new("/project/docs/./a.md")).unwrap();
        assert_eq!(key, "docs/a.md");
    }

    #[test]
    fn relative_key_accepts_relative_input() {
        let key = relative_key(Path::new("/project"), Path::new("docs/../b.md")).unwrap();
        assert_eq!(key, "b.md");
    }

    #[test]
    fn relative_key_rejects_escape() {
        let err = relative_key(Path::new("/project"), Path::new("/elsewhere/a.md")).unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));

        let err = relative_key(Path::new("/project"), Path::new("../a.md")).unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));
    }

    #[test]
    fn relative_key_rejects_root_itself() {
        assert!(relative_key(Path::new("/project"), Path::new("/project")).is_err());
    }
}
