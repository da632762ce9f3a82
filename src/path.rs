//! JSON Pointer cursor for locating values in nested structures.
//!
//! This module provides [`JsonPointer`] and [`PathSegment`]. A pointer is a
//! mutable cursor (see [RFC 6901](https://tools.ietf.org/html/rfc6901)) that
//! validation code pushes fragments onto while descending into an object and
//! pops while coming back up.

use std::borrow::Cow;
use std::fmt::{self, Display};

use crate::error::ConfigError;

/// A segment that can be pushed onto a [`JsonPointer`].
///
/// Field names are escaped when pushed; indices are rendered in decimal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A property access (e.g., `user`, `email`)
    Field(String),
    /// An array index access (e.g., `0`, `42`)
    Index(usize),
}

impl PathSegment {
    /// Creates a new field segment.
    pub fn field(name: impl Into<String>) -> Self {
        PathSegment::Field(name.into())
    }

    /// Creates a new index segment.
    pub fn index(idx: usize) -> Self {
        PathSegment::Index(idx)
    }
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        PathSegment::Field(name.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(name: String) -> Self {
        PathSegment::Field(name)
    }
}

impl From<usize> for PathSegment {
    fn from(idx: usize) -> Self {
        PathSegment::Index(idx)
    }
}

/// A JSON Pointer identifying a value within a JSON document.
///
/// The pointer stores its fragments in escaped form, so rendering is a plain
/// join and [`JsonPointer::push_many`] can take an already-escaped string
/// verbatim. All mutators return the pointer for chaining.
///
/// # Example
///
/// ```rust
/// use pinpoint::JsonPointer;
///
/// let mut pointer = JsonPointer::root();
/// assert_eq!(pointer.to_string(), "");
///
/// pointer.push("name");
/// assert_eq!(pointer.to_string(), "/name");
/// pointer.pop();
///
/// pointer.push("children").push(0);
/// assert_eq!(pointer.to_string(), "/children/0");
/// pointer.pop().push(1);
/// assert_eq!(pointer.to_string(), "/children/1");
///
/// pointer.reset();
/// assert!(pointer.is_root());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct JsonPointer {
    fragments: Vec<String>,
}

impl JsonPointer {
    /// Creates a pointer to the root of the document.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses an escaped pointer string such as `/person/children/0`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MalformedLocation`] if the string contains a `~`
    /// that does not start a `~0` or `~1` escape.
    pub fn parse(path: &str) -> Result<Self, ConfigError> {
        let mut pointer = Self::root();
        pointer.push_many(path)?;
        Ok(pointer)
    }

    /// Appends one fragment, escaping `~` and `/` in field names.
    pub fn push(&mut self, segment: impl Into<PathSegment>) -> &mut Self {
        let fragment = match segment.into() {
            PathSegment::Field(name) => escape(&name).into_owned(),
            PathSegment::Index(idx) => idx.to_string(),
        };
        self.fragments.push(fragment);
        self
    }

    /// Appends the fragments of an already-escaped pointer string and returns
    /// how many were added.
    ///
    /// A single leading `/` is optional, so `"/foo/bar"` and `"foo/bar"` both
    /// add `foo` and `bar`. The empty string adds nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MalformedLocation`] on an invalid escape. The
    /// pointer is left untouched in that case.
    pub fn push_many(&mut self, path: &str) -> Result<usize, ConfigError> {
        if path.is_empty() {
            return Ok(0);
        }

        let path_without_slash = path.strip_prefix('/').unwrap_or(path);
        let fragments: Vec<&str> = path_without_slash.split('/').collect();
        for fragment in &fragments {
            check_escapes(path, fragment)?;
        }

        let n = fragments.len();
        self.fragments
            .extend(fragments.into_iter().map(str::to_string));
        Ok(n)
    }

    /// Removes the last fragment. Does nothing at the root.
    pub fn pop(&mut self) -> &mut Self {
        self.fragments.pop();
        self
    }

    /// Removes the last `n` fragments, stopping at the root.
    pub fn pop_n(&mut self, n: usize) -> &mut Self {
        let keep = self.fragments.len().saturating_sub(n);
        self.fragments.truncate(keep);
        self
    }

    /// Removes the first fragment. Does nothing at the root.
    ///
    /// Used to unwrap envelope objects whose first fragment is the root key.
    pub fn pop_first(&mut self) -> &mut Self {
        if !self.fragments.is_empty() {
            self.fragments.remove(0);
        }
        self
    }

    /// Removes every fragment so the pointer targets the document root.
    pub fn reset(&mut self) -> &mut Self {
        self.fragments.clear();
        self
    }

    /// Returns true if this pointer targets the document root.
    pub fn is_root(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Returns the number of fragments.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Returns true if this pointer has no fragments.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Returns the escaped fragment at `index` (zero-based).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FragmentOutOfRange`] if `index` is not below
    /// [`JsonPointer::len`].
    pub fn fragment_at(&self, index: usize) -> Result<&str, ConfigError> {
        self.fragments
            .get(index)
            .map(String::as_str)
            .ok_or(ConfigError::FragmentOutOfRange {
                index,
                len: self.fragments.len(),
            })
    }

    /// Returns an iterator over the escaped fragments.
    pub fn fragments(&self) -> impl Iterator<Item = &str> {
        self.fragments.iter().map(String::as_str)
    }

    /// Returns the last escaped fragment, or None at the root.
    pub fn last(&self) -> Option<&str> {
        self.fragments.last().map(String::as_str)
    }
}

impl Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for fragment in &self.fragments {
            write!(f, "/{}", fragment)?;
        }
        Ok(())
    }
}

/// Escapes the reserved characters of a raw fragment (`~` then `/`).
pub fn escape(fragment: &str) -> Cow<'_, str> {
    if fragment.contains(['~', '/']) {
        Cow::Owned(fragment.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(fragment)
    }
}

/// Reverses [`escape`], turning `~1` into `/` and then `~0` into `~`.
pub fn unescape(fragment: &str) -> Cow<'_, str> {
    if fragment.contains('~') {
        Cow::Owned(fragment.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(fragment)
    }
}

fn check_escapes(path: &str, fragment: &str) -> Result<(), ConfigError> {
    let mut chars = fragment.chars();
    while let Some(ch) = chars.next() {
        if ch == '~' && !matches!(chars.next(), Some('0' | '1')) {
            return Err(ConfigError::MalformedLocation {
                location: path.to_string(),
                reason: "'~' must be followed by '0' or '1'",
            });
        }
    }
    Ok(())
}
