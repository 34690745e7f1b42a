//! Closed address intervals and their CIDR decomposition.

use std::fmt;
use std::net::Ipv4Addr;

use crate::prefix::{Prefix, V4_BITS};
use crate::{Error, Result};

/// Closed interval `[start, end]` over the IPv4 address space.
///
/// Field order matters: the derived `Ord` sorts by `start`, then `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Range {
    start: u32,
    end: u32,
}

impl Range {
    /// Create a range; returns `None` if `start > end`.
    pub fn new(start: u32, end: u32) -> Option<Self> {
        (start <= end).then_some(Range { start, end })
    }

    /// Range covered by a prefix.
    pub fn from_prefix(prefix: &Prefix) -> Self {
        let start = u32::from(prefix.network());
        let end = u32::from(prefix.broadcast());
        Range { start, end }
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// Number of addresses in the range (up to `2^32`).
    pub fn size(&self) -> u64 {
        u64::from(self.end) - u64::from(self.start) + 1
    }

    /// Check whether `addr` falls inside the range.
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        let addr = u32::from(addr);
        self.start <= addr && addr <= self.end
    }

    /// True when `next` overlaps this range or starts right after it.
    ///
    /// Assumes `next.start >= self.start`.
    pub fn touches(&self, next: &Range) -> bool {
        u64::from(next.start) <= u64::from(self.end) + 1
    }

    /// Grow the range so it ends at `end`, if that is further out.
    pub(crate) fn extend_to(&mut self, end: u32) {
        self.end = self.end.max(end);
    }

    /// Split the range into the minimal ascending list of CIDR blocks.
    ///
    /// # Examples
    /// ```
    /// use subnet_lists::Range;
    ///
    /// let r = Range::new(0x0A00_0001, 0x0A00_0006).unwrap(); // 10.0.0.1 - 10.0.0.6
    /// let text: Vec<String> = r.to_prefixes().unwrap().iter().map(|p| p.to_string()).collect();
    /// assert_eq!(text, ["10.0.0.1/32", "10.0.0.2/31", "10.0.0.4/31", "10.0.0.6/32"]);
    /// ```
    pub fn to_prefixes(&self) -> Result<Vec<Prefix>> {
        let mut out = Vec::new();
        self.decompose_into(&mut out)?;
        Ok(out)
    }

    /// Append the blocks of this range to `out`.
    ///
    /// Each step takes the largest block that is aligned at the cursor and
    /// still ends inside the range. Alignment wins over remaining length.
    /// Arithmetic runs in `u64` so a range ending at `255.255.255.255`
    /// advances the cursor to `2^32` without wrapping.
    pub fn decompose_into(&self, out: &mut Vec<Prefix>) -> Result<()> {
        let end = u64::from(self.end);
        let mut cursor = u64::from(self.start);

        while cursor <= end {
            let align_bits = cursor.trailing_zeros().min(u32::from(V4_BITS));
            let remaining = end - cursor + 1;
            let fit_bits = 63 - remaining.leading_zeros();
            let bits = align_bits.min(fit_bits);

            let guard = || Error::OverflowGuard { start: cursor, end };
            let network = u32::try_from(cursor).map_err(|_| guard())?;
            let prefix_len = V4_BITS - bits as u8;
            let prefix = Prefix::from_bits(network, prefix_len).ok_or_else(guard)?;

            out.push(prefix);
            cursor += 1u64 << bits;
        }

        Ok(())
    }
}

impl From<Prefix> for Range {
    fn from(prefix: Prefix) -> Self {
        Range::from_prefix(&prefix)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            Ipv4Addr::from(self.start),
            Ipv4Addr::from(self.end)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> u32 {
        u32::from(s.parse::<Ipv4Addr>().unwrap())
    }

    fn range(a: &str, b: &str) -> Range {
        Range::new(ip(a), ip(b)).unwrap()
    }

    fn texts(r: Range) -> Vec<String> {
        r.to_prefixes()
            .unwrap()
            .iter()
            .map(|p| p.to_string())
            .collect()
    }

    #[test]
    fn test_new_rejects_inverted() {
        assert!(Range::new(5, 4).is_none());
        assert!(Range::new(4, 4).is_some());
    }

    #[test]
    fn test_from_prefix() {
        let p: Prefix = "10.0.0.0/24".parse().unwrap();
        let r = Range::from_prefix(&p);
        assert_eq!(r.start(), ip("10.0.0.0"));
        assert_eq!(r.end(), ip("10.0.0.255"));
        assert_eq!(r.size(), 256);

        let host: Prefix = "1.2.3.4/32".parse().unwrap();
        let r = Range::from(host);
        assert_eq!(r.start(), r.end());
    }

    #[test]
    fn test_from_prefix_full_space() {
        let p: Prefix = "0.0.0.0/0".parse().unwrap();
        let r = Range::from_prefix(&p);
        assert_eq!(r.start(), 0);
        assert_eq!(r.end(), u32::MAX);
        assert_eq!(r.size(), 1u64 << 32);
    }

    #[test]
    fn test_decompose_single_block() {
        assert_eq!(texts(range("10.0.0.0", "10.0.1.255")), ["10.0.0.0/23"]);
        assert_eq!(texts(range("1.1.1.1", "1.1.1.1")), ["1.1.1.1/32"]);
    }

    #[test]
    fn test_decompose_unaligned_start() {
        assert_eq!(
            texts(range("1.1.1.1", "1.1.1.2")),
            ["1.1.1.1/32", "1.1.1.2/32"]
        );
        assert_eq!(
            texts(range("10.0.0.1", "10.0.0.255")),
            [
                "10.0.0.1/32",
                "10.0.0.2/31",
                "10.0.0.4/30",
                "10.0.0.8/29",
                "10.0.0.16/28",
                "10.0.0.32/27",
                "10.0.0.64/26",
                "10.0.0.128/25",
            ]
        );
    }

    #[test]
    fn test_decompose_alignment_beats_length() {
        // 10.0.0.128 - 10.0.1.255: aligned only to /25 at the start.
        assert_eq!(
            texts(range("10.0.0.128", "10.0.1.255")),
            ["10.0.0.128/25", "10.0.1.0/24"]
        );
    }

    #[test]
    fn test_decompose_top_of_space() {
        assert_eq!(
            texts(range("255.255.255.254", "255.255.255.255")),
            ["255.255.255.254/31"]
        );
        assert_eq!(
            texts(range("255.255.255.255", "255.255.255.255")),
            ["255.255.255.255/32"]
        );
        assert_eq!(
            texts(range("128.0.0.0", "255.255.255.255")),
            ["128.0.0.0/1"]
        );
        assert_eq!(
            texts(range("127.255.255.255", "255.255.255.255")),
            ["127.255.255.255/32", "128.0.0.0/1"]
        );
    }

    #[test]
    fn test_decompose_whole_space() {
        assert_eq!(texts(range("0.0.0.0", "255.255.255.255")), ["0.0.0.0/0"]);
        assert_eq!(
            texts(range("0.0.0.1", "255.255.255.255")).len(),
            32
        );
    }

    #[test]
    fn test_decompose_blocks_are_contiguous() {
        let r = range("3.7.11.13", "4.9.0.200");
        let blocks = r.to_prefixes().unwrap();
        let mut expected = u64::from(r.start());
        for p in &blocks {
            assert_eq!(u64::from(u32::from(p.network())), expected);
            expected += p.size();
        }
        assert_eq!(expected, u64::from(r.end()) + 1);
    }

    #[test]
    fn test_touches() {
        let a = range("10.0.0.0", "10.0.0.255");
        assert!(a.touches(&range("10.0.1.0", "10.0.1.255")));
        assert!(a.touches(&range("10.0.0.128", "10.0.2.0")));
        assert!(!a.touches(&range("10.0.1.1", "10.0.1.255")));

        let top = range("255.255.255.0", "255.255.255.255");
        assert!(top.touches(&range("255.255.255.255", "255.255.255.255")));
    }

    #[test]
    fn test_display() {
        assert_eq!(range("10.0.0.1", "10.0.0.6").to_string(), "10.0.0.1-10.0.0.6");
    }
}
