//! Path grammar: splitting a raw path string into a root (if any) and a
//! sequence of name components, generic over the host-style being emulated.
//!
//! The lookup algorithm (`crate::lookup`) never inspects separator
//! characters itself; it only consumes the [`ParsedPath`] a [`PathType`]
//! produces. This mirrors the way the teacher keeps protocol parsing
//! (`src/ll/request.rs`) separate from dispatch (`src/request.rs`).

use crate::error::{FsErrorKind, FsResult};

/// A path broken into an optional root string and its remaining components,
/// in the order they should be walked.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParsedPath {
    /// The root component (e.g. `"/"`, `"C:\\"`), if the path was absolute.
    pub root: Option<String>,
    /// The remaining `/`- or `\`-separated components, raw (not yet name-normalized).
    pub components: Vec<String>,
}

impl ParsedPath {
    /// Whether this path has a root component (i.e. is absolute).
    pub fn is_absolute(&self) -> bool {
        self.root.is_some()
    }
}

/// A path grammar: defines what characters are legal, how roots are spelled,
/// and how a raw path string is split into components.
///
/// Implementations are injected into [`crate::config::Configuration`]; the
/// lookup algorithm is written once, against this trait.
pub trait PathType: Send + Sync + std::fmt::Debug {
    /// The roots configured for this filesystem (e.g. `["/"]` for Unix,
    /// `["C:\\", "D:\\"]` for a multi-root Windows configuration).
    fn roots(&self) -> &[String];

    /// Parse a raw path string into a [`ParsedPath`].
    ///
    /// Fails with [`FsErrorKind::InvalidPath`] for disallowed characters or a
    /// root string not present in [`PathType::roots`].
    fn parse(&self, raw: &str) -> FsResult<ParsedPath>;

    /// Render a root plus a sequence of display names back into the path
    /// string form a caller would recognize (used by symlink target display
    /// and diagnostics).
    fn render(&self, root: Option<&str>, components: &[&str]) -> String;
}

/// The Unix path grammar: single root `/`, separator `/`, NUL disallowed.
#[derive(Clone, Debug)]
pub struct UnixPathType {
    root: String,
}

impl Default for UnixPathType {
    fn default() -> Self {
        UnixPathType { root: "/".to_string() }
    }
}

impl UnixPathType {
    /// Construct the standard single-root (`/`) Unix path type.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PathType for UnixPathType {
    fn roots(&self) -> &[String] {
        std::slice::from_ref(&self.root)
    }

    fn parse(&self, raw: &str) -> FsResult<ParsedPath> {
        if raw.is_empty() {
            return Err(FsErrorKind::InvalidPath.into());
        }
        if raw.contains('\0') {
            return Err(FsErrorKind::InvalidPath.into());
        }
        let (root, rest) = if let Some(rest) = raw.strip_prefix('/') {
            (Some(self.root.clone()), rest)
        } else {
            (None, raw)
        };
        let components = rest
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();
        Ok(ParsedPath { root, components })
    }

    fn render(&self, root: Option<&str>, components: &[&str]) -> String {
        let mut s = root.unwrap_or("").to_string();
        s.push_str(&components.join("/"));
        s
    }
}

/// The Windows path grammar: separators `\` and `/`, drive-letter roots
/// (`C:\`) and UNC roots (`\\server\share\`), a fixed set of reserved
/// characters disallowed in names.
#[derive(Clone, Debug)]
pub struct WindowsPathType {
    roots: Vec<String>,
}

/// Characters the Win32 API disallows in a path component.
const WINDOWS_RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

impl WindowsPathType {
    /// Construct a Windows path type with the given drive-letter/UNC roots
    /// (e.g. `["C:\\"]`). At least one root is required.
    pub fn new(roots: Vec<String>) -> FsResult<Self> {
        if roots.is_empty() {
            return Err(FsErrorKind::InvalidPath.into());
        }
        Ok(WindowsPathType { roots })
    }

    fn find_root<'a>(&'a self, raw: &str) -> Option<&'a str> {
        self.roots
            .iter()
            .map(String::as_str)
            .find(|root| raw.len() >= root.len() && raw[..root.len()].eq_ignore_ascii_case(root))
    }
}

impl PathType for WindowsPathType {
    fn roots(&self) -> &[String] {
        &self.roots
    }

    fn parse(&self, raw: &str) -> FsResult<ParsedPath> {
        if raw.is_empty() || raw.contains('\0') {
            return Err(FsErrorKind::InvalidPath.into());
        }
        let (root, rest) = match self.find_root(raw) {
            Some(root) => (Some(root.to_string()), &raw[root.len()..]),
            None => (None, raw),
        };
        let components: Vec<String> = rest
            .split(['\\', '/'])
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();
        for component in &components {
            if component.chars().any(|c| WINDOWS_RESERVED_CHARS.contains(&c)) {
                return Err(FsErrorKind::InvalidPath.into());
            }
        }
        Ok(ParsedPath { root, components })
    }

    fn render(&self, root: Option<&str>, components: &[&str]) -> String {
        let mut s = root.unwrap_or("").to_string();
        s.push_str(&components.join("\\"));
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_parses_absolute_path() {
        let pt = UnixPathType::new();
        let parsed = pt.parse("/foo/bar").unwrap();
        assert_eq!(parsed.root.as_deref(), Some("/"));
        assert_eq!(parsed.components, vec!["foo", "bar"]);
    }

    #[test]
    fn unix_parses_relative_path() {
        let pt = UnixPathType::new();
        let parsed = pt.parse("foo/bar").unwrap();
        assert!(!parsed.is_absolute());
        assert_eq!(parsed.components, vec!["foo", "bar"]);
    }

    #[test]
    fn unix_rejects_nul() {
        let pt = UnixPathType::new();
        assert_eq!(pt.parse("foo\0bar").unwrap_err().kind(), FsErrorKind::InvalidPath);
    }

    #[test]
    fn unix_collapses_repeated_separators() {
        let pt = UnixPathType::new();
        let parsed = pt.parse("/foo//bar/").unwrap();
        assert_eq!(parsed.components, vec!["foo", "bar"]);
    }

    #[test]
    fn windows_parses_drive_root() {
        let pt = WindowsPathType::new(vec!["C:\\".to_string()]).unwrap();
        let parsed = pt.parse("C:\\foo\\bar").unwrap();
        assert_eq!(parsed.root.as_deref(), Some("C:\\"));
        assert_eq!(parsed.components, vec!["foo", "bar"]);
    }

    #[test]
    fn windows_accepts_forward_slash_too() {
        let pt = WindowsPathType::new(vec!["C:\\".to_string()]).unwrap();
        let parsed = pt.parse("C:/foo/bar").unwrap();
        assert_eq!(parsed.components, vec!["foo", "bar"]);
    }

    #[test]
    fn windows_rejects_reserved_chars() {
        let pt = WindowsPathType::new(vec!["C:\\".to_string()]).unwrap();
        assert!(pt.parse("C:\\foo*bar").is_err());
    }
}
