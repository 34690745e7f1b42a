//! Prefix-set normalization.
//!
//! Turns an arbitrary multiset of prefixes (overlapping, duplicated, in any
//! order) into the unique minimal sorted list of CIDR blocks covering the
//! same addresses:
//!
//! 1. drop prefixes outside the requested [`AddressFamily`]
//! 2. map each prefix to a [`Range`]
//! 3. sort by start, then end
//! 4. merge overlapping or adjacent ranges
//! 5. decompose each merged range back into CIDR blocks
//!
//! # Example
//!
//! ```
//! use subnet_lists::{normalize, AddressFamily};
//!
//! let out = normalize(["10.0.0.0/24", "10.0.1.0/24", "bogus"], AddressFamily::Ipv4).unwrap();
//! assert_eq!(out.set.to_lines().collect::<Vec<_>>(), ["10.0.0.0/23"]);
//! assert_eq!(out.errors.len(), 1);
//! ```

use ipnet::IpNet;
use serde::Serialize;
use std::net::Ipv4Addr;

use crate::error::PrefixParseError;
use crate::prefix::{parse_prefix, AddressFamily, Prefix};
use crate::range::Range;
use crate::Result;

/// Minimal, sorted, non-overlapping list of prefixes.
///
/// Only [`PrefixSetBuilder`] and [`normalize`] construct one, so the list is
/// always in canonical form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PrefixSet {
    prefixes: Vec<Prefix>,
}

impl PrefixSet {
    /// The empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decompose already merged ranges (ascending, non-touching).
    fn from_merged(ranges: &[Range]) -> Result<Self> {
        let mut prefixes = Vec::with_capacity(ranges.len());
        for range in ranges {
            range.decompose_into(&mut prefixes)?;
        }
        Ok(Self { prefixes })
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Prefix> {
        self.prefixes.iter()
    }

    pub fn as_slice(&self) -> &[Prefix] {
        &self.prefixes
    }

    pub fn into_vec(self) -> Vec<Prefix> {
        self.prefixes
    }

    /// Check whether `addr` is covered by the set.
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        let key = u32::from(addr);
        // Last prefix starting at or before addr is the only candidate.
        let idx = self
            .prefixes
            .partition_point(|p| u32::from(p.network()) <= key);
        idx > 0 && self.prefixes[idx - 1].contains(addr)
    }

    /// Total number of addresses covered.
    pub fn address_count(&self) -> u64 {
        self.prefixes.iter().map(Prefix::size).sum()
    }

    /// Maximal disjoint ranges covered by the set, ascending.
    ///
    /// Consecutive ranges are separated by at least one uncovered address.
    pub fn ranges(&self) -> Vec<Range> {
        merge_ranges(self.prefixes.iter().map(Range::from_prefix).collect())
    }

    /// Canonical text of every prefix, in order.
    pub fn to_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.prefixes.iter().map(Prefix::to_string)
    }
}

impl<'a> IntoIterator for &'a PrefixSet {
    type Item = &'a Prefix;
    type IntoIter = std::slice::Iter<'a, Prefix>;

    fn into_iter(self) -> Self::IntoIter {
        self.prefixes.iter()
    }
}

/// Sort ranges and merge every overlapping or adjacent pair.
///
/// The result is ascending and no two entries touch.
pub fn merge_ranges(mut ranges: Vec<Range>) -> Vec<Range> {
    ranges.sort_unstable();

    let mut merged: Vec<Range> = Vec::with_capacity(ranges.len());
    let mut iter = ranges.into_iter();
    let Some(mut current) = iter.next() else {
        return merged;
    };

    for next in iter {
        if current.touches(&next) {
            current.extend_to(next.end());
        } else {
            merged.push(current);
            current = next;
        }
    }
    merged.push(current);

    merged
}

/// Canonical set plus the lines that could not be parsed.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub set: PrefixSet,
    pub errors: Vec<PrefixParseError>,
}

/// Accumulates prefixes and builds the canonical [`PrefixSet`].
///
/// # Examples
/// ```
/// use subnet_lists::PrefixSetBuilder;
///
/// let mut builder = PrefixSetBuilder::new();
/// builder.add_line("192.168.1.0/24");
/// builder.add_line("192.168.1.128/25");
/// let out = builder.build().unwrap();
/// assert_eq!(out.set.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PrefixSetBuilder {
    family: AddressFamily,
    ranges: Vec<Range>,
    errors: Vec<PrefixParseError>,
    filtered: usize,
}

impl PrefixSetBuilder {
    /// Create a builder for IPv4.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for the given family.
    pub fn with_family(family: AddressFamily) -> Self {
        Self {
            family,
            ..Self::default()
        }
    }

    /// Add a prefix that is already parsed.
    pub fn add_prefix(&mut self, prefix: Prefix) {
        self.ranges.push(Range::from_prefix(&prefix));
    }

    /// Add a network of any family; other families are dropped silently.
    ///
    /// Returns `true` if the network was kept.
    pub fn add_net(&mut self, net: IpNet) -> bool {
        match self.family.select(net) {
            Some(prefix) => {
                self.add_prefix(prefix);
                true
            }
            None => {
                self.filtered += 1;
                false
            }
        }
    }

    /// Parse and add one feed token.
    ///
    /// A token that does not parse is recorded as a diagnostic and
    /// otherwise ignored.
    pub fn add_line(&mut self, line: &str) {
        match parse_prefix(line) {
            Ok(net) => {
                self.add_net(net);
            }
            Err(e) => self.errors.push(e),
        }
    }

    /// Number of prefixes accepted so far.
    pub fn prefix_count(&self) -> usize {
        self.ranges.len()
    }

    /// Number of parse failures so far.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of networks dropped by the family filter.
    pub fn filtered_count(&self) -> usize {
        self.filtered
    }

    /// Merge, decompose and return the canonical set with diagnostics.
    ///
    /// Fails only with [`crate::Error::OverflowGuard`].
    pub fn build(self) -> Result<Normalized> {
        let input = self.ranges.len();
        let merged = merge_ranges(self.ranges);
        let set = PrefixSet::from_merged(&merged)?;

        log::debug!(
            "normalized {} prefixes into {} ranges / {} prefixes ({} filtered, {} invalid)",
            input,
            merged.len(),
            set.len(),
            self.filtered,
            self.errors.len()
        );

        Ok(Normalized {
            set,
            errors: self.errors,
        })
    }
}

impl Extend<Prefix> for PrefixSetBuilder {
    fn extend<T: IntoIterator<Item = Prefix>>(&mut self, iter: T) {
        self.ranges
            .extend(iter.into_iter().map(|p| Range::from_prefix(&p)));
    }
}

/// Normalize raw feed tokens into a canonical set.
///
/// Lines that fail to parse come back in [`Normalized::errors`]; the caller
/// logs them. Prefixes of other families are dropped without a diagnostic.
pub fn normalize<I, S>(lines: I, family: AddressFamily) -> Result<Normalized>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut builder = PrefixSetBuilder::with_family(family);
    for line in lines {
        builder.add_line(line.as_ref());
    }
    builder.build()
}

/// Normalize prefixes that are already parsed.
pub fn normalize_prefixes<I>(prefixes: I) -> Result<PrefixSet>
where
    I: IntoIterator<Item = Prefix>,
{
    let mut builder = PrefixSetBuilder::new();
    builder.extend(prefixes);
    Ok(builder.build()?.set)
}
