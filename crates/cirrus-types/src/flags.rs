//! Builder flags selecting which optional build work is skipped.

use std::fmt;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

/// Bitset of build options, combined with `|`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuilderFlags(u8);

impl BuilderFlags {
    /// Build every property.
    pub const INDEX_EVERYTHING: BuilderFlags = BuilderFlags(0);
    /// Allow upserts even when the document skips some properties.
    pub const INDEX_ON_SKIP: BuilderFlags = BuilderFlags(1);
    /// Skip rendered-content extraction.
    pub const SKIP_PARSE: BuilderFlags = BuilderFlags(2);
    /// Skip redirect and incoming link extraction.
    pub const SKIP_LINKS: BuilderFlags = BuilderFlags(4);

    const KNOWN_BITS: u8 = 1 | 2 | 4;

    /// Raw bit value.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Build from raw bits, rejecting unknown bits.
    pub fn from_bits(bits: u8) -> Option<Self> {
        if bits & !Self::KNOWN_BITS == 0 {
            Some(BuilderFlags(bits))
        } else {
            None
        }
    }

    /// True when every bit of `other` is set in `self`.
    pub fn contains(self, other: BuilderFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Every valid flag combination, in ascending bit order.
    pub fn all_combinations() -> impl Iterator<Item = BuilderFlags> {
        (0..=Self::KNOWN_BITS).map(BuilderFlags)
    }
}

impl BitOr for BuilderFlags {
    type Output = BuilderFlags;

    fn bitor(self, rhs: BuilderFlags) -> BuilderFlags {
        BuilderFlags(self.0 | rhs.0)
    }
}

impl fmt::Display for BuilderFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return write!(f, "INDEX_EVERYTHING");
        }
        let mut names = Vec::new();
        if self.contains(Self::INDEX_ON_SKIP) {
            names.push("INDEX_ON_SKIP");
        }
        if self.contains(Self::SKIP_PARSE) {
            names.push("SKIP_PARSE");
        }
        if self.contains(Self::SKIP_LINKS) {
            names.push("SKIP_LINKS");
        }
        write!(f, "{}", names.join("|"))
    }
}
