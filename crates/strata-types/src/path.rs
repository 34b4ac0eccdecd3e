//! Key paths: the addressing unit for get/set/lock/source operations.
//!
//! A path is stored as owned segments so prefix checks never confuse
//! `a.b` with `a.bc`. The textual form joins segments with a separator
//! chosen by the owning configuration.

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Separator used when none is configured.
pub const DEFAULT_SEPARATOR: char = '.';

/// An ordered sequence of key segments.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// The empty path, addressing the root branch.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from already-split segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a separator-joined path.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_types::KeyPath;
    ///
    /// let path = KeyPath::parse("group.two", '.').unwrap();
    /// assert_eq!(path.segments(), ["group", "two"]);
    /// assert!(KeyPath::parse("group..two", '.').is_err());
    /// ```
    pub fn parse(raw: &str, separator: char) -> Result<Self, TypeError> {
        if raw.is_empty() {
            return Err(TypeError::InvalidPath {
                path: raw.to_string(),
                reason: "path must not be empty".into(),
            });
        }
        let segments: Vec<String> = raw.split(separator).map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(TypeError::InvalidPath {
                path: raw.to_string(),
                reason: format!("empty segment between '{separator}' separators"),
            });
        }
        Ok(Self { segments })
    }

    /// A new path with `segment` appended.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// A new path with every segment of `relative` appended.
    pub fn join(&self, relative: &KeyPath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(relative.segments.iter().cloned());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The final segment, or `None` at the root.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if `prefix` equals this path or is one of its ancestors.
    pub fn starts_with(&self, prefix: &KeyPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// This path followed by each ancestor, longest first. The root is not
    /// included.
    pub fn ancestors(&self) -> impl Iterator<Item = KeyPath> + '_ {
        (1..=self.segments.len())
            .rev()
            .map(move |n| Self::from_segments(self.segments[..n].iter().cloned()))
    }

    /// Join the segments with `separator`. There is no `Display` impl:
    /// the separator belongs to the configuration that owns the path.
    pub fn render(&self, separator: char) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push(separator);
            }
            out.push_str(segment);
        }
        out
    }
}
