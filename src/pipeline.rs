//! End-to-end generation: feeds -> normalization -> writers.

use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use crate::config::{Config, GroupKind};
use crate::feed::{cidr_lines, BgpTable, FeedSource};
use crate::normalize::{normalize, Normalized};
use crate::output::{legacy_copy, write_prefix_list, write_routeros_script, RouterOsVersion};
use crate::prefix::AddressFamily;
use crate::Result;

/// Outcome for one AS number or service.
#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    pub key: String,
    pub kind: GroupKind,
    pub list_name: String,
    pub prefixes: usize,
    pub parse_errors: usize,
    pub files: Vec<PathBuf>,
    pub error: Option<String>,
}

impl GroupReport {
    fn new(key: &str, kind: GroupKind, list_name: &str) -> Self {
        Self {
            key: key.to_string(),
            kind,
            list_name: list_name.to_string(),
            prefixes: 0,
            parse_errors: 0,
            files: Vec::new(),
            error: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of one [`Generator::run`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Set when the BGP table could not be fetched
    pub bgp_table_error: Option<String>,
    pub groups: Vec<GroupReport>,
}

impl RunReport {
    /// Number of groups that failed.
    pub fn failed(&self) -> usize {
        self.groups.iter().filter(|g| !g.is_ok()).count()
    }

    pub fn group(&self, key: &str) -> Option<&GroupReport> {
        self.groups.iter().find(|g| g.key == key)
    }

    /// Write the report as pretty JSON.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Drives a full run for one configuration.
///
/// # Example
///
/// ```ignore
/// use subnet_lists::{Config, Generator, HttpFeed};
///
/// let config = Config::load("config.yaml")?;
/// let feed = HttpFeed::from_config(&config)?;
/// let report = Generator::new(config, feed).run()?;
/// println!("{} groups failed", report.failed());
/// ```
pub struct Generator<F: FeedSource> {
    config: Config,
    feed: F,
}

impl<F: FeedSource> Generator<F> {
    pub fn new(config: Config, feed: F) -> Self {
        Self { config, feed }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn versions(&self) -> Vec<RouterOsVersion> {
        let mut versions = Vec::with_capacity(2);
        if self.config.generate_v6 {
            versions.push(RouterOsVersion::V6);
        }
        if self.config.generate_v7 {
            versions.push(RouterOsVersion::V7);
        }
        versions
    }

    /// Process every configured group.
    ///
    /// Only failing to create the output directories aborts the run; any
    /// per-group failure is logged and recorded in the report.
    pub fn run(&self) -> Result<RunReport> {
        log::info!(
            "Starting run: {} AS numbers, {} services",
            self.config.as_numbers.len(),
            self.config.services.len()
        );

        fs::create_dir_all(&self.config.ipv4_dir)?;
        fs::create_dir_all(&self.config.routeros_dir)?;

        let mut report = RunReport::default();

        if !self.config.as_numbers.is_empty() {
            match self.fetch_bgp_table() {
                Ok(table) => {
                    for asn in self.config.as_numbers.keys() {
                        let lines = table.prefixes_for(asn);
                        report
                            .groups
                            .push(self.process_group(asn, GroupKind::AsNumber, lines));
                    }
                }
                Err(e) => {
                    log::error!("Failed to download BGP table: {}", e);
                    report.bgp_table_error = Some(e.to_string());
                }
            }
        }

        for (key, service) in &self.config.services {
            let group = match self.feed.fetch(&service.url) {
                Ok(text) => self.process_group(key, GroupKind::Service, cidr_lines(&text)),
                Err(e) => {
                    log::warn!("Failed to download {} subnets: {}", key, e);
                    let names = self.config.resolve_names(key, GroupKind::Service);
                    let mut group = GroupReport::new(key, GroupKind::Service, &names.list_name);
                    group.error = Some(e.to_string());
                    group
                }
            };
            report.groups.push(group);
        }

        log::info!(
            "Done: {} groups, {} failed",
            report.groups.len(),
            report.failed()
        );
        Ok(report)
    }

    fn fetch_bgp_table(&self) -> Result<BgpTable> {
        // Presence is checked when the config is loaded.
        let url = self.config.bgp_tools_url.as_deref().unwrap_or_default();
        let table = BgpTable::parse(&self.feed.fetch(url)?);
        log::info!("BGP table has {} entries", table.len());
        Ok(table)
    }

    fn process_group<'a, I>(&self, key: &str, kind: GroupKind, lines: I) -> GroupReport
    where
        I: IntoIterator<Item = &'a str>,
    {
        let names = self.config.resolve_names(key, kind);
        let mut group = GroupReport::new(key, kind, &names.list_name);

        let Normalized { set, errors } = match normalize(lines, AddressFamily::Ipv4) {
            Ok(n) => n,
            Err(e) => {
                log::error!("Normalization failed for {}: {}", key, e);
                group.error = Some(e.to_string());
                return group;
            }
        };

        for e in &errors {
            log::warn!("Invalid subnet for {}: {}", key, e);
        }
        group.prefixes = set.len();
        group.parse_errors = errors.len();
        log::debug!("{} -> {} prefixes", key, set.len());

        let list_path = self.config.ipv4_dir.join(&names.file);
        if let Err(e) = write_prefix_list(&set, &list_path) {
            log::warn!("Error writing {:?}: {}", list_path, e);
            group.error = Some(e.to_string());
            return group;
        }
        group.files.push(list_path.clone());

        for version in self.versions() {
            match write_routeros_script(
                &set,
                &names.list_name,
                &names.comment,
                &self.config.gateway,
                &self.config.routeros_dir,
                version,
            ) {
                Ok(Some(path)) => group.files.push(path),
                Ok(None) => {}
                Err(e) => {
                    log::warn!(
                        "Error generating RouterOS {} config for {}: {}",
                        version,
                        names.list_name,
                        e
                    );
                    group.error.get_or_insert_with(|| e.to_string());
                }
            }
        }

        if self.config.legacy_copy(key, kind) {
            match legacy_copy(&list_path) {
                Ok(path) if path != list_path => group.files.push(path),
                Ok(_) => {}
                Err(e) => {
                    log::warn!("Error creating legacy copy for {:?}: {}", list_path, e);
                    group.error.get_or_insert_with(|| e.to_string());
                }
            }
        }

        group
    }
}
