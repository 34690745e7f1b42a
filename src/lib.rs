//! Subnet Lists - minimal IPv4 CIDR lists per AS number or service.
//!
//! This crate ingests address-prefix feeds (a global BGP table, ready-made
//! CIDR lists), reduces each group to the unique minimal set of CIDR blocks
//! covering the same addresses, and writes that set as plain lists and
//! MikroTik RouterOS scripts.
//!
//! # Features
//!
//! - **Normalization**: overlapping, duplicated and adjacent prefixes merged
//!   into the minimal sorted CIDR list
//! - **Exact decomposition**: greedy alignment-first range splitting, safe at
//!   the top of the address space
//! - **Per-line diagnostics**: bad input lines are reported, never fatal
//! - **Feeds**: BGP table filtered by origin AS, or plain CIDR lists
//! - **Outputs**: `.lst` files, legacy-named copies, RouterOS v6/v7 scripts
//!
//! # Quick Start
//!
//! ```
//! use subnet_lists::{normalize, AddressFamily};
//!
//! let out = normalize(
//!     ["10.0.0.0/24", "10.0.1.0/24", "10.0.0.128/25", "not-an-ip"],
//!     AddressFamily::Ipv4,
//! )
//! .unwrap();
//!
//! let lines: Vec<String> = out.set.to_lines().collect();
//! assert_eq!(lines, ["10.0.0.0/23"]);
//! assert_eq!(out.errors.len(), 1);
//! ```
//!
//! # Full Runs
//!
//! ```ignore
//! use subnet_lists::{Config, Generator, HttpFeed};
//!
//! let config = Config::load("config.yaml")?;
//! let feed = HttpFeed::from_config(&config)?;
//! let report = Generator::new(config, feed).run()?;
//! ```

mod error;
mod prefix;
mod range;

pub mod config;
pub mod feed;
pub mod normalize;
pub mod output;
pub mod pipeline;

// Re-export core types
pub use error::{Error, PrefixParseError, Result};
pub use normalize::{merge_ranges, normalize, normalize_prefixes, Normalized, PrefixSet, PrefixSetBuilder};
pub use prefix::{parse_prefix, to_canonical_text, AddressFamily, Prefix};
pub use range::Range;

// Re-export collaborators
pub use config::{Config, GroupKind, ResolvedNames};
pub use feed::{BgpTable, FeedSource, HttpFeed};
pub use output::RouterOsVersion;
pub use pipeline::{Generator, GroupReport, RunReport};
