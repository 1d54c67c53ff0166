//! Call tags.
//!
//! A tag is the correlation key attached to a completion registration and
//! handed back unchanged when that completion fires. Tags are plain typed
//! integers; nothing is ever recovered from a tag by reinterpreting it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque correlation key for one outstanding call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallTag(u64);

impl CallTag {
    /// Tag used when a queue only ever carries a single outstanding call.
    pub const SOLO: CallTag = CallTag(1);

    /// Wrap a raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CallTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out fresh tags, one per issued call.
///
/// Tags are never reused for the lifetime of the generator, so two calls
/// issued through the same generator can never be outstanding under the same
/// tag.
#[derive(Debug)]
pub struct TagGenerator {
    next: AtomicU64,
}

impl TagGenerator {
    /// Generator starting at tag `#1`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Next unused tag.
    pub fn next_tag(&self) -> CallTag {
        CallTag(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Number of tags handed out so far.
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed) - 1
    }
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new()
    }
}
