//! Feed adapters: downloading and splitting upstream prefix sources.
//!
//! Two feed shapes exist:
//! - the BGP table, one `<prefix> <asn>` pair per line, filtered by AS
//!   before normalization
//! - ready-made CIDR lists, one prefix per line, passed through unfiltered

use std::time::Duration;

use crate::config::Config;
use crate::{Error, Result};

/// Source of feed text, keyed by URL.
pub trait FeedSource {
    /// Fetch the whole body behind `url`.
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Blocking HTTP feed source.
pub struct HttpFeed {
    client: reqwest::blocking::Client,
}

impl HttpFeed {
    /// Create a client with the given User-Agent and timeout.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Create a client from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.user_agent, Duration::from_secs(config.timeout_secs))
    }
}

impl FeedSource for HttpFeed {
    fn fetch(&self, url: &str) -> Result<String> {
        log::debug!("GET {}", url);
        let response = self.client.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text()?;
        log::info!("Downloaded {} ({} bytes)", url, body.len());
        Ok(body)
    }
}

/// One row of the BGP table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BgpEntry {
    pub prefix: String,
    pub asn: String,
}

/// Parsed BGP table: prefix tokens with their origin AS.
#[derive(Debug, Clone, Default)]
pub struct BgpTable {
    entries: Vec<BgpEntry>,
}

impl BgpTable {
    /// Split table text into entries.
    ///
    /// Lines with fewer than two whitespace-separated fields are ignored;
    /// extra fields are ignored too. Prefix tokens are not validated here.
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .filter_map(|line| {
                let mut fields = line.split_whitespace();
                let prefix = fields.next()?;
                let asn = fields.next()?;
                Some(BgpEntry {
                    prefix: prefix.to_string(),
                    asn: asn.to_string(),
                })
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[BgpEntry] {
        &self.entries
    }

    /// Prefix tokens originated by `asn` (exact match on the AS field).
    pub fn prefixes_for<'a>(&'a self, asn: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.asn == asn)
            .map(|e| e.prefix.as_str())
    }
}

/// Candidate prefix lines of a ready-made CIDR list.
///
/// Lines are trimmed; blank lines and `#` comments are skipped.
pub fn cidr_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}
