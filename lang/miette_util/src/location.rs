use std::fmt;
use std::ops::Range;

use serde_derive::{Deserialize, Serialize};

/// The raw, untyped offset into a source file. We use a 32-bit integer here for space
/// efficiency, assuming we won't be working with sources larger than 4GB.
pub type RawOffset = u32;

/// A region of a source file, given by the offsets of its first and last byte.
///
/// Both ends are inclusive, so `Location::new(3, 3)` covers exactly one byte.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    first: RawOffset,
    last: RawOffset,
}

impl Location {
    /// Create a new location from the offsets of its first and last byte.
    pub fn new(first: RawOffset, last: RawOffset) -> Location {
        assert!(last >= first);

        Location { first, last }
    }

    /// The location used for compiler-generated nodes without a source counterpart.
    pub const fn initial() -> Location {
        Location { first: 0, last: 0 }
    }

    /// Combine two locations by taking the first byte of the earlier one
    /// and the last byte of the later one.
    ///
    /// ```rust
    /// use lasr_lang_miette_util::Location;
    ///
    /// let a = Location::new(0, 4);
    /// let b = Location::new(10, 16);
    ///
    /// assert_eq!(a.merge(b), Location::new(0, 16));
    /// ```
    pub fn merge(self, other: Location) -> Location {
        use std::cmp::{max, min};

        Location::new(min(self.first, other.first), max(self.last, other.last))
    }

    pub fn first(self) -> usize {
        self.first as usize
    }

    pub fn last(self) -> usize {
        self.last as usize
    }

    /// Number of bytes covered by this location.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(self) -> usize {
        (self.last - self.first) as usize + 1
    }
}

impl Default for Location {
    fn default() -> Location {
        Location::initial()
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Location({}:{})", self.first, self.last)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.first, self.last)
    }
}

impl From<Range<RawOffset>> for Location {
    fn from(range: Range<RawOffset>) -> Location {
        Location::new(range.start, range.end.max(range.start + 1) - 1)
    }
}

#[cfg(test)]
mod test {
    use super::Location;

    #[test]
    fn test_merge() {
        // overlap
        let a = Location::new(1, 5);
        let b = Location::new(3, 10);
        assert_eq!(a.merge(b), Location::new(1, 10));
        assert_eq!(b.merge(a), Location::new(1, 10));

        // disjoint
        let c = Location::new(20, 30);
        assert_eq!(a.merge(c), Location::new(1, 30));

        // identity
        assert_eq!(a.merge(a), a);
    }

    #[test]
    fn test_from_range() {
        assert_eq!(Location::from(2..6), Location::new(2, 5));
        assert_eq!(Location::from(4..4), Location::new(4, 4));
    }

    #[test]
    fn test_display() {
        assert_eq!(Location::new(7, 9).to_string(), "7:9");
    }
}
