//! Materialized path encoding
//!
//! Every node stores the full chain of its ancestors as a string made of
//! fixed-width base-36 segments, one per level, root first. Because segments
//! are zero-padded, lexicographic order of paths equals structural order, and
//! "is an ancestor of" reduces to "is a strict string prefix of". Subtree reads
//! become sorted range scans over the path index.

use crate::error::{Result, TreeError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Alphabet used for path segments, in ascending order
pub const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Number of characters per tree level
pub const SEGMENT_WIDTH: usize = 4;

/// Largest ordinal that fits in one segment
pub const MAX_ORDINAL: u64 = 36u64.pow(SEGMENT_WIDTH as u32) - 1;

/// Encode a sibling ordinal as a fixed-width, order-preserving segment
pub fn encode_segment(ordinal: u64) -> Result<String> {
    if ordinal > MAX_ORDINAL {
        return Err(TreeError::PathOverflow(ordinal));
    }

    let mut buf = [b'0'; SEGMENT_WIDTH];
    let mut rest = ordinal;
    for slot in buf.iter_mut().rev() {
        *slot = ALPHABET[(rest % 36) as usize];
        rest /= 36;
    }

    Ok(buf.iter().map(|&b| b as char).collect())
}

/// Decode a single segment back into its ordinal
pub fn decode_segment(segment: &str) -> Result<u64> {
    if segment.len() != SEGMENT_WIDTH {
        return Err(TreeError::InvalidPath(format!(
            "segment '{}' is not {} characters wide",
            segment, SEGMENT_WIDTH
        )));
    }

    segment.bytes().try_fold(0u64, |acc, b| {
        let digit = ALPHABET.iter().position(|&a| a == b).ok_or_else(|| {
            TreeError::InvalidPath(format!("invalid character '{}' in segment", b as char))
        })?;
        Ok(acc * 36 + digit as u64)
    })
}

/// Ordered, fixed-width materialized path
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodePath(String);

impl NodePath {
    /// Parse and validate a path string
    pub fn parse(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        if s.is_empty() || s.len() % SEGMENT_WIDTH != 0 {
            return Err(TreeError::InvalidPath(format!(
                "'{}' is not a multiple of {} characters",
                s, SEGMENT_WIDTH
            )));
        }
        if let Some(c) = s.bytes().find(|b| !ALPHABET.contains(b)) {
            return Err(TreeError::InvalidPath(format!(
                "invalid character '{}' in '{}'",
                c as char, s
            )));
        }
        Ok(NodePath(s))
    }

    /// Path of a top-level node
    pub fn root(ordinal: u64) -> Result<Self> {
        Ok(NodePath(encode_segment(ordinal)?))
    }

    /// Path of the child with the given ordinal
    pub fn child(&self, ordinal: u64) -> Result<Self> {
        let mut path = String::with_capacity(self.0.len() + SEGMENT_WIDTH);
        path.push_str(&self.0);
        path.push_str(&encode_segment(ordinal)?);
        Ok(NodePath(path))
    }

    /// Number of levels in this path (1 = root)
    pub fn depth(&self) -> usize {
        self.0.len() / SEGMENT_WIDTH
    }

    /// Truncate to the ancestor at `target_depth` (itself at its own depth)
    pub fn ancestor_at_depth(&self, target_depth: usize) -> Result<NodePath> {
        let depth = self.depth();
        if target_depth < 1 || target_depth > depth {
            return Err(TreeError::InvalidDepth {
                depth,
                target: target_depth,
            });
        }
        Ok(NodePath(self.0[..target_depth * SEGMENT_WIDTH].to_string()))
    }

    /// Path of the immediate parent, `None` for roots
    pub fn parent(&self) -> Option<NodePath> {
        let depth = self.depth();
        if depth <= 1 {
            return None;
        }
        self.ancestor_at_depth(depth - 1).ok()
    }

    /// Path of the top-level ancestor
    pub fn root_path(&self) -> NodePath {
        NodePath(self.0[..SEGMENT_WIDTH].to_string())
    }

    /// Ordinal of the last segment
    pub fn last_ordinal(&self) -> Result<u64> {
        decode_segment(&self.0[self.0.len() - SEGMENT_WIDTH..])
    }

    /// Strict ancestry: `self` is a proper prefix of `other`
    pub fn is_ancestor_of(&self, other: &NodePath) -> bool {
        other.0.len() > self.0.len() && other.0.starts_with(&self.0)
    }

    /// Strict descent: `other` is a proper prefix of `self`
    pub fn is_descendant_of(&self, other: &NodePath) -> bool {
        other.is_ancestor_of(self)
    }

    /// Whether `other` is a direct child of `self`
    pub fn is_parent_of(&self, other: &NodePath) -> bool {
        self.is_ancestor_of(other) && other.depth() == self.depth() + 1
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for NodePath {
    type Error = TreeError;

    fn try_from(value: String) -> Result<Self> {
        NodePath::parse(value)
    }
}

impl From<NodePath> for String {
    fn from(path: NodePath) -> Self {
        path.0
    }
}

/// Concatenate a child segment onto a parent path
pub fn child_path(parent: &NodePath, ordinal: u64) -> Result<NodePath> {
    parent.child(ordinal)
}

/// Truncate a path to the ancestor at `target_depth`
pub fn ancestor_path_at_depth(path: &NodePath, target_depth: usize) -> Result<NodePath> {
    path.ancestor_at_depth(target_depth)
}
