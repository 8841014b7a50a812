//! Fully-qualified type symbols
//!
//! Package segments are joined with `.` and nested types with `$`, so the
//! nested type `pkg.Outer$Inner` never collides with a member path such as
//! `pkg.Outer.inner`.
//!
//! `$` is also a legal identifier character (`com.acme.$Proxy`, package
//! `a$b`), so it only separates nested types inside the segment after the
//! last `.` and only between two non-empty names.

use std::borrow::Borrow;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const PACKAGE_SEPARATOR: char = '.';
pub const NESTED_SEPARATOR: char = '$';

static BINARY_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{L}_$][\p{L}\p{Nd}_$]*(?:\.[\p{L}_$][\p{L}\p{Nd}_$]*)*$")
        .expect("Invalid symbol pattern")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed symbol '{name}'")]
pub struct SymbolError {
    pub name: String,
}

/// A fully-qualified type name such as `com.acme.Widget` or `com.acme.Outer$Inner`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Validates `name` as a binary type name.
    pub fn parse(name: &str) -> Result<Self, SymbolError> {
        let trimmed = name.trim();
        if BINARY_NAME.is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(SymbolError {
                name: name.to_string(),
            })
        }
    }

    pub(crate) fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn top_level(package: Option<&str>, name: &str) -> Self {
        match package {
            Some(package) if !package.is_empty() => {
                Self(format!("{package}{PACKAGE_SEPARATOR}{name}"))
            }
            _ => Self(name.to_string()),
        }
    }

    /// Converts a dotted source name to a binary name by naming convention:
    /// the first segment starting with an uppercase letter is the outermost
    /// type and everything after it is nested.
    ///
    /// Only used when the declared-symbol inventory cannot settle the split.
    pub fn from_source_name(dotted: &str) -> Self {
        let segments: Vec<&str> = dotted.split(PACKAGE_SEPARATOR).collect();
        let type_start = segments
            .iter()
            .position(|s| s.chars().next().is_some_and(char::is_uppercase))
            .unwrap_or(segments.len().saturating_sub(1));

        let mut name = segments[..type_start].join(".");
        for (i, segment) in segments[type_start..].iter().enumerate() {
            if !name.is_empty() {
                name.push(if i == 0 {
                    PACKAGE_SEPARATOR
                } else {
                    NESTED_SEPARATOR
                });
            }
            name.push_str(segment);
        }
        Self(name)
    }

    pub fn nested(&self, name: &str) -> Self {
        Self(format!("{}{NESTED_SEPARATOR}{name}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn simple_name(&self) -> &str {
        let (_, name) = self.split_package();
        match last_nested_separator(name) {
            Some(at) => &name[at + 1..],
            None => name,
        }
    }

    pub fn is_nested(&self) -> bool {
        first_nested_separator(self.split_package().1).is_some()
    }

    /// The type directly enclosing a nested symbol.
    pub fn enclosing(&self) -> Option<Symbol> {
        let (package, name) = self.split_package();
        let offset = package.map_or(0, |p| p.len() + 1);
        last_nested_separator(name).map(|at| Self(self.0[..offset + at].to_string()))
    }

    /// The top-level type containing this symbol (itself when not nested).
    pub fn outermost(&self) -> Symbol {
        let (package, name) = self.split_package();
        let offset = package.map_or(0, |p| p.len() + 1);
        match first_nested_separator(name) {
            Some(at) => Self(self.0[..offset + at].to_string()),
            None => self.clone(),
        }
    }

    pub fn package(&self) -> Option<&str> {
        self.split_package().0
    }

    fn split_package(&self) -> (Option<&str>, &str) {
        match self.0.rsplit_once(PACKAGE_SEPARATOR) {
            Some((package, name)) => (Some(package), name),
            None => (None, &self.0),
        }
    }
}

/// Byte offsets of the `$` characters in `name` that separate two non-empty names.
fn nested_separators(name: &str) -> impl Iterator<Item = usize> + '_ {
    name.char_indices()
        .filter(move |&(at, c)| c == NESTED_SEPARATOR && at > 0 && at + 1 < name.len())
        .map(|(at, _)| at)
}

fn first_nested_separator(name: &str) -> Option<usize> {
    nested_separators(name).next()
}

fn last_nested_separator(name: &str) -> Option<usize> {
    nested_separators(name).last()
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
