//! Decoding of backend path strings and child-count encodings.
//!
//! Two path encodings are in use:
//! - slash: `A/B/C`
//! - bracket: `[A]/[B].[C]`, where dot-joined groups inside the deepest
//!   segment continue the path one level per group.
//!
//! Both decode to the same root-to-leaf list of node keys.

use smallvec::SmallVec;

use crate::error::{Error, Result};

/// Decoded path segments, borrowed from the input string.
pub type PathNodes<'a> = SmallVec<[&'a str; 8]>;

/// Path string encoding, chosen once per row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathEncoding {
    Slash,
    Bracket,
}

impl PathEncoding {
    /// Detects the encoding from the first non-blank character.
    pub fn detect(path: &str) -> Self {
        if path.trim_start().starts_with('[') {
            Self::Bracket
        } else {
            Self::Slash
        }
    }

    /// Splits `path` into node keys using this encoding.
    pub fn split(self, path: &str) -> Result<PathNodes<'_>> {
        let nodes = match self {
            Self::Slash => split_slash(path),
            Self::Bracket => split_bracket(path)?,
        };
        if nodes.is_empty() {
            return Err(Error::malformed("", format!("empty path {path:?}")));
        }
        Ok(nodes)
    }
}

/// Detects the encoding and splits `path` into root-to-leaf node keys.
pub fn split_path(path: &str) -> Result<PathNodes<'_>> {
    PathEncoding::detect(path).split(path)
}

fn split_slash(path: &str) -> PathNodes<'_> {
    path.split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}

fn split_bracket(path: &str) -> Result<PathNodes<'_>> {
    let mut nodes = PathNodes::new();
    let mut rest = path.trim();
    while !rest.is_empty() {
        let Some(body) = rest.strip_prefix('[') else {
            return Err(Error::malformed(
                "",
                format!("expected '[' at {rest:?} in {path:?}"),
            ));
        };
        let Some(close) = body.find(']') else {
            return Err(Error::malformed("", format!("unterminated group in {path:?}")));
        };
        let key = &body[..close];
        if key.is_empty() {
            return Err(Error::malformed("", format!("empty group in {path:?}")));
        }
        nodes.push(key);
        rest = &body[close + 1..];
        if let Some(next) = rest.strip_prefix('/').or_else(|| rest.strip_prefix('.')) {
            if next.is_empty() {
                return Err(Error::malformed("", format!("trailing separator in {path:?}")));
            }
            rest = next;
        } else if !rest.is_empty() {
            return Err(Error::malformed(
                "",
                format!("unexpected {rest:?} after group in {path:?}"),
            ));
        }
    }
    Ok(nodes)
}

/// Returns `true` if `path` is `prefix` itself or lies below it.
///
/// The match stops at a segment boundary, so `N1` does not cover `N10/...`.
/// Slash paths continue with `/`; bracket paths with `/` or `.`.
pub fn path_is_under(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    let Some(rest) = path.strip_prefix(prefix) else {
        return false;
    };
    match PathEncoding::detect(prefix) {
        PathEncoding::Slash => rest.is_empty() || rest.starts_with('/'),
        PathEncoding::Bracket => rest.is_empty() || rest.starts_with(['/', '.']),
    }
}

/// Number of children announced by a row's `CHILDREN` field.
///
/// The encoding is a list of bracket groups (`[a],[b]`); the count is the
/// number of top-level groups. A blank string announces no children.
pub fn child_count(encoded: &str) -> Result<usize> {
    let mut depth = 0usize;
    let mut groups = 0usize;
    for ch in encoded.chars() {
        match ch {
            '[' => {
                if depth == 0 {
                    groups += 1;
                }
                depth += 1;
            }
            ']' => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    Error::malformed("", format!("unbalanced ']' in {encoded:?}"))
                })?;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(Error::malformed("", format!("unbalanced '[' in {encoded:?}")));
    }
    Ok(groups)
}
