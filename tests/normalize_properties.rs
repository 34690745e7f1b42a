//! Property checks for prefix-set normalization.
//!
//! Inputs are random prefixes inside 10.0.0.0/20 so coverage can be checked
//! address by address.

use std::net::Ipv4Addr;
use subnet_lists::{normalize, AddressFamily, Prefix, PrefixSet};

const BASE: u32 = 0x0A00_0000; // 10.0.0.0
const WINDOW_BITS: u32 = 12;
const WINDOW: usize = 1 << WINDOW_BITS;

/// Small deterministic generator (xorshift64*).
struct Rng(u64);

impl Rng {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 >> 12;
        self.0 ^= self.0 << 25;
        self.0 ^= self.0 >> 27;
        self.0.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }

    fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.below(i as u64 + 1) as usize;
            items.swap(i, j);
        }
    }
}

fn random_prefixes(rng: &mut Rng, count: usize) -> Vec<String> {
    (0..count)
        .map(|_| {
            let len = 32 - rng.below(u64::from(WINDOW_BITS) + 1) as u32;
            let offset = rng.below(WINDOW as u64) as u32;
            // Host bits are left in on purpose; the parser masks them.
            format!("{}/{}", Ipv4Addr::from(BASE + offset), len)
        })
        .collect()
}

fn coverage_of_lines(lines: &[String]) -> Vec<bool> {
    let mut covered = vec![false; WINDOW];
    for line in lines {
        let p: Prefix = line.parse().unwrap();
        mark(&mut covered, &p);
    }
    covered
}

fn coverage_of_set(set: &PrefixSet) -> Vec<bool> {
    let mut covered = vec![false; WINDOW];
    for p in set {
        mark(&mut covered, p);
    }
    covered
}

fn mark(covered: &mut [bool], p: &Prefix) {
    let start = u32::from(p.network()) - BASE;
    for i in 0..p.size() as u32 {
        covered[(start + i) as usize] = true;
    }
}

fn norm(lines: &[String]) -> PrefixSet {
    let out = normalize(lines.iter(), AddressFamily::Ipv4).unwrap();
    assert!(out.errors.is_empty());
    out.set
}

#[test]
fn test_coverage_preserved() {
    let mut rng = Rng(0x9E37_79B9_7F4A_7C15);
    for round in 0..200 {
        let input = random_prefixes(&mut rng, 1 + round % 40);
        let set = norm(&input);
        assert_eq!(
            coverage_of_set(&set),
            coverage_of_lines(&input),
            "coverage differs for {:?}",
            input
        );
        assert_eq!(
            set.address_count(),
            coverage_of_lines(&input).iter().filter(|c| **c).count() as u64
        );
    }
}

#[test]
fn test_idempotent() {
    let mut rng = Rng(42);
    for _ in 0..100 {
        let input = random_prefixes(&mut rng, 25);
        let first = norm(&input);
        let text: Vec<String> = first.to_lines().collect();
        let second = norm(&text);
        assert_eq!(first, second);
    }
}

#[test]
fn test_order_invariant() {
    let mut rng = Rng(7);
    for _ in 0..100 {
        let mut input = random_prefixes(&mut rng, 30);
        // Duplicates must not matter either.
        let dup = input[0].clone();
        input.push(dup);

        let expected = norm(&input);
        rng.shuffle(&mut input);
        assert_eq!(norm(&input), expected);
        input.reverse();
        assert_eq!(norm(&input), expected);
    }
}

#[test]
fn test_output_sorted_disjoint_and_minimal() {
    let mut rng = Rng(1234);
    for _ in 0..200 {
        let input = random_prefixes(&mut rng, 20);
        let set = norm(&input);
        let prefixes = set.as_slice();

        for pair in prefixes.windows(2) {
            let end = u64::from(u32::from(pair[0].broadcast()));
            let next = u64::from(u32::from(pair[1].network()));
            assert!(end < next, "overlap or disorder: {} {}", pair[0], pair[1]);

            // Two sibling halves of one block would have been emitted as that block.
            let siblings = pair[0].prefix_len() == pair[1].prefix_len()
                && end + 1 == next
                && (u64::from(u32::from(pair[0].network())) % (2 * pair[0].size())) == 0;
            assert!(!siblings, "mergeable siblings: {} {}", pair[0], pair[1]);
        }

        for pair in set.ranges().windows(2) {
            assert!(u64::from(pair[0].end()) + 1 < u64::from(pair[1].start()));
        }
    }
}

#[test]
fn test_scenarios() {
    let cases: &[(&[&str], &[&str])] = &[
        (&["10.0.0.0/24", "10.0.1.0/24"], &["10.0.0.0/23"]),
        (&["192.168.1.0/24", "192.168.1.128/25"], &["192.168.1.0/24"]),
        (&["1.1.1.1/32", "1.1.1.2/32"], &["1.1.1.1/32", "1.1.1.2/32"]),
        (&[], &[]),
    ];
    for (input, expected) in cases {
        let out = normalize(input.iter(), AddressFamily::Ipv4).unwrap();
        let lines: Vec<String> = out.set.to_lines().collect();
        assert_eq!(&lines, expected, "input {:?}", input);
        assert!(out.errors.is_empty());
    }
}

#[test]
fn test_malformed_line_among_valid() {
    let out = normalize(
        ["10.0.0.0/24", "not-an-ip", "10.0.1.0/24"],
        AddressFamily::Ipv4,
    )
    .unwrap();
    assert_eq!(out.set.to_lines().collect::<Vec<_>>(), ["10.0.0.0/23"]);
    assert_eq!(out.errors.len(), 1);
    assert_eq!(out.errors[0].literal(), "not-an-ip");
}

#[test]
fn test_full_address_space_edges() {
    let out = normalize(
        ["0.0.0.0/1", "128.0.0.0/2", "192.0.0.0/2", "255.255.255.255"],
        AddressFamily::Ipv4,
    )
    .unwrap();
    assert_eq!(out.set.to_lines().collect::<Vec<_>>(), ["0.0.0.0/0"]);
    assert_eq!(out.set.address_count(), 1u64 << 32);
}
