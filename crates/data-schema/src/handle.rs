//! Dataset handles: `author/name@version`.
//!
//! Handles are case-insensitive and normalized to lowercase. A handle without
//! a version refers to `latest`.

use std::sync::LazyLock;

use regex::Regex;

use crate::SchemaError;

/// Version alias for the most recently published version.
pub const LATEST: &str = "latest";

static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_-]+$").expect("static regex"));

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)*$").expect("static regex"));

/// Returns true if `s` is a valid author or dataset name.
pub fn is_ident(s: &str) -> bool {
    IDENT_RE.is_match(s)
}

/// Returns true if `s` is `latest` or a dotted numeric tag like `1.0.2`.
pub fn is_version(s: &str) -> bool {
    s == LATEST || VERSION_RE.is_match(s)
}

/// Sanitize arbitrary text (e.g. a directory name) into an identifier.
///
/// Lowercases, replaces every run of characters outside `[a-z0-9_-]` with a
/// single `-`, and trims leading and trailing dashes.
pub fn ident_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

/// Parsed dataset identifier.
///
/// # Example
///
/// ```
/// use data_schema::Handle;
///
/// let h = Handle::parse("Jbenet/Foo@1.0").unwrap();
/// assert_eq!(h.author, "jbenet");
/// assert_eq!(h.name, "foo");
/// assert_eq!(h.version, "1.0");
/// assert_eq!(h.to_string(), "jbenet/foo@1.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Handle {
    pub author: String,
    pub name: String,
    pub version: String,
}

impl Handle {
    /// Build a handle from its parts, lowercasing each.
    pub fn new(
        author: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        let version = version.into().trim().to_lowercase();
        Self {
            author: author.into().trim().to_lowercase(),
            name: name.into().trim().to_lowercase(),
            version: if version.is_empty() {
                LATEST.to_string()
            } else {
                version
            },
        }
    }

    /// Split a dataset string into a handle without validating it.
    ///
    /// Missing parts stay empty, a missing version becomes `latest`. Used
    /// while a descriptor is still being filled out.
    pub fn split(s: &str) -> Self {
        let s = s.trim();
        let (path, version) = s.split_once('@').unwrap_or((s, ""));
        let (author, name) = path.split_once('/').unwrap_or((path, ""));
        Self::new(author, name, version)
    }

    /// Parse and validate a dataset string.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidHandle`] if the author, name, or version
    /// is malformed.
    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        let handle = Self::split(s);
        if !handle.is_valid() {
            return Err(SchemaError::InvalidHandle(s.to_string()));
        }
        Ok(handle)
    }

    /// True when author, name, and version are present and well-formed.
    pub fn is_valid(&self) -> bool {
        is_ident(&self.author) && is_ident(&self.name) && is_version(&self.version)
    }

    /// `author/name`, the path used against the ref index.
    pub fn path(&self) -> String {
        format!("{}/{}", self.author, self.name)
    }

    /// Canonical `author/name@version`.
    pub fn dataset(&self) -> String {
        self.to_string()
    }
}

impl std::str::FromStr for Handle {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}@{}", self.author, self.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_lowercases() {
        let h = Handle::parse("Jbenet/Foo@1.0").unwrap();
        assert_eq!(h, Handle::new("jbenet", "foo", "1.0"));
        assert_eq!(h.dataset(), "jbenet/foo@1.0");
        assert_eq!(h.path(), "jbenet/foo");
    }

    #[test]
    fn missing_version_is_latest() {
        let h = Handle::parse("jbenet/foo").unwrap();
        assert_eq!(h.version, LATEST);
        assert_eq!(h.to_string(), "jbenet/foo@latest");
    }

    #[test]
    fn rejects_malformed_handles() {
        for bad in [
            "",
            "jbenet",
            "jbenet/",
            "/foo",
            "jbenet/foo@v1",
            "jbenet/foo@1.",
            "jb net/foo",
            "jbenet/foo/bar",
            "jbenet/foo.bar@1.0",
        ] {
            assert!(Handle::parse(bad).is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn empty_version_means_latest() {
        assert_eq!(Handle::parse("jbenet/foo@").unwrap().version, LATEST);
    }

    #[test]
    fn split_keeps_partial_handles() {
        let h = Handle::split("jbenet");
        assert_eq!(h.author, "jbenet");
        assert!(h.name.is_empty());
        assert!(!h.is_valid());
    }

    #[test]
    fn versions() {
        assert!(is_version("latest"));
        assert!(is_version("1"));
        assert!(is_version("1.0.12"));
        assert!(!is_version("1.0-beta"));
        assert!(!is_version(""));
    }

    #[test]
    fn sanitizes_idents() {
        assert_eq!(ident_string("My Dataset (v2)"), "my-dataset-v2");
        assert_eq!(ident_string("__ok-name"), "__ok-name");
        assert_eq!(ident_string("..."), "");
    }
}
