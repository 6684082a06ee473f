#![forbid(unsafe_code)]

//! Structural view identity.
//!
//! An [`Identity`] is the path from the root of a view tree to one view,
//! one [`Segment`] per descent step. It is recomputed on every render pass
//! by walking the tree; it is never stored as state itself, only used as
//! the key under which state is stored.
//!
//! # Invariants
//!
//! - Same tree shape → same identities, pass after pass.
//! - A positional segment records the child's type token and its index
//!   among its siblings, so inserting a sibling in front of a view changes
//!   the identity of that view and of every following sibling.
//! - A keyed segment replaces the positional index with a caller-supplied
//!   key; the identity then follows the key instead of the position.
//! - Equal identities hash equally (the hash is derived from the segments).

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHasher;

/// One descent step in an [`Identity`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Child located by its position among siblings.
    Positional {
        /// Type token of the child view.
        type_token: &'static str,
        /// Index among the parent's children.
        index: u32,
    },
    /// Child located by an explicit key.
    Keyed {
        /// Type token of the child view.
        type_token: &'static str,
        /// Caller-supplied stable key.
        key: Arc<str>,
    },
}

impl Segment {
    /// The type token of the view this segment points at.
    pub fn type_token(&self) -> &'static str {
        match self {
            Self::Positional { type_token, .. } | Self::Keyed { type_token, .. } => type_token,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positional { type_token, index } => {
                write!(f, "{}[{index}]", short_type_name(type_token))
            }
            Self::Keyed { type_token, key } => {
                write!(f, "{}[#{key}]", short_type_name(type_token))
            }
        }
    }
}

/// Hierarchical, structural key for a view.
///
/// Cloning is cheap (the path is shared); deriving a child copies the path
/// once.
#[derive(Clone)]
pub struct Identity {
    segments: Arc<[Segment]>,
    hash: u64,
}

impl Identity {
    /// Identity of a root view of the given type.
    pub fn root(type_token: &'static str) -> Self {
        Self::from_segments(vec![Segment::Positional {
            type_token,
            index: 0,
        }])
    }

    /// Identity of the child of type `type_token` at position `index`.
    #[must_use]
    pub fn child(&self, type_token: &'static str, index: usize) -> Self {
        let index = u32::try_from(index).unwrap_or(u32::MAX);
        self.push(Segment::Positional { type_token, index })
    }

    /// Identity of the child of type `type_token` located by `key`.
    #[must_use]
    pub fn keyed_child(&self, type_token: &'static str, key: impl Into<Arc<str>>) -> Self {
        self.push(Segment::Keyed {
            type_token,
            key: key.into(),
        })
    }

    /// Path segments, root first.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments (the root has depth 1).
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// The last segment of the path.
    pub fn last(&self) -> &Segment {
        // An identity always has at least the root segment.
        &self.segments[self.segments.len() - 1]
    }

    /// Identity of the parent view, or `None` for a root.
    pub fn parent(&self) -> Option<Identity> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(Self::from_segments(
            self.segments[..self.segments.len() - 1].to_vec(),
        ))
    }

    /// Whether `self` is `ancestor` or lies beneath it.
    pub fn is_within(&self, ancestor: &Identity) -> bool {
        self.segments.len() >= ancestor.segments.len()
            && self.segments[..ancestor.segments.len()] == ancestor.segments[..]
    }

    fn push(&self, segment: Segment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self::from_segments(segments)
    }

    fn from_segments(segments: Vec<Segment>) -> Self {
        let mut hasher = FxHasher::default();
        segments.hash(&mut hasher);
        Self {
            segments: segments.into(),
            hash: hasher.finish(),
        }
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.segments == other.segments
    }
}

impl Eq for Identity {}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({self})")
    }
}

/// Strip module paths (and generic arguments) from a `type_name` string.
pub fn short_type_name(type_token: &str) -> &str {
    let base = type_token.split('<').next().unwrap_or(type_token);
    base.rsplit("::").next().unwrap_or(base)
}
