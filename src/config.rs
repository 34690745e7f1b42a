//! YAML configuration.
//!
//! A [`Config`] is loaded once and handed to the [`crate::Generator`]; nothing
//! reads configuration from global state.
//!
//! ```yaml
//! bgp_tools_url: https://bgp.tools/table.txt
//! user_agent: "my-lists bgp.tools contact@example.com"
//! ipv4_dir: Subnets/IPv4
//! routeros_dir: RouterOS
//! gateway: 192.168.1.1
//! as_numbers:
//!   "32934": { name: meta }
//!   "13414": { file: twitter.lst }
//! services:
//!   discord:
//!     url: https://example.com/discord/ipv4.txt
//!     legacy_copy: true
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

fn default_ipv4_dir() -> PathBuf {
    PathBuf::from("Subnets/IPv4")
}

fn default_routeros_dir() -> PathBuf {
    PathBuf::from("RouterOS")
}

fn default_gateway() -> String {
    "192.168.1.1".to_string()
}

fn default_user_agent() -> String {
    concat!("subnet-lists/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// BGP table feed (`<prefix> <asn>` per line)
    #[serde(default)]
    pub bgp_tools_url: Option<String>,
    /// User-Agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Directory for plain `.lst` files
    #[serde(default = "default_ipv4_dir")]
    pub ipv4_dir: PathBuf,
    /// Directory for RouterOS scripts (`v6/` and `v7/` below it)
    #[serde(default = "default_routeros_dir")]
    pub routeros_dir: PathBuf,
    /// Gateway for generated routes
    #[serde(default = "default_gateway")]
    pub gateway: String,
    #[serde(default)]
    pub generate_v6: bool,
    #[serde(default)]
    pub generate_v7: bool,
    /// HTTP timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub name_templates: NameTemplates,
    /// AS number -> group
    #[serde(default)]
    pub as_numbers: BTreeMap<String, GroupConfig>,
    /// Service key -> group fed by a ready-made CIDR list
    #[serde(default)]
    pub services: BTreeMap<String, ServiceConfig>,
}

/// Naming options shared by AS groups and services.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupConfig {
    /// Base name fed to the templates
    #[serde(default)]
    pub name: Option<String>,
    /// Output file name inside `ipv4_dir`
    #[serde(default)]
    pub file: Option<String>,
    /// RouterOS address-list name
    #[serde(default)]
    pub list_name: Option<String>,
    /// RouterOS comment
    #[serde(default)]
    pub comment: Option<String>,
    /// Also write a capitalized copy of the list file
    #[serde(default = "default_true")]
    pub legacy_copy: bool,
}

/// A service fed by a ready-made CIDR list.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub list_name: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub legacy_copy: bool,
}

impl ServiceConfig {
    fn naming(&self) -> GroupConfig {
        GroupConfig {
            name: self.name.clone(),
            file: self.file.clone(),
            list_name: self.list_name.clone(),
            comment: self.comment.clone(),
            legacy_copy: self.legacy_copy,
        }
    }
}

/// Templates with `{name}`, `{name_upper}` and `{name_title}` placeholders.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NameTemplates {
    pub file: String,
    pub list_name: String,
    pub comment: String,
}

impl Default for NameTemplates {
    fn default() -> Self {
        Self {
            file: "{name}.lst".to_string(),
            list_name: "{name_upper}".to_string(),
            comment: "{name_title} networks".to_string(),
        }
    }
}

impl NameTemplates {
    /// Substitute the placeholders in `template`.
    pub fn render(template: &str, name: &str) -> String {
        template
            .replace("{name_upper}", &name.to_uppercase())
            .replace("{name_title}", &title_case(name))
            .replace("{name}", name)
    }
}

/// First character upper-cased, the rest lower-cased.
pub(crate) fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Which kind of feed a group comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    /// Prefixes originated by an AS in the BGP table
    AsNumber,
    /// Ready-made CIDR list
    Service,
}

/// Final names used by the writers for one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNames {
    pub file: String,
    pub list_name: String,
    pub comment: String,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut config: Config = serde_yaml::from_str(content)?;

        // Neither dialect requested means both.
        if !config.generate_v6 && !config.generate_v7 {
            config.generate_v6 = true;
            config.generate_v7 = true;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.as_numbers.is_empty()
            && self.bgp_tools_url.as_deref().map_or(true, |u| u.trim().is_empty())
        {
            return Err(Error::Config(
                "bgp_tools_url is required when as_numbers is set".to_string(),
            ));
        }

        for (key, service) in &self.services {
            if service.url.trim().is_empty() {
                return Err(Error::Config(format!("service {} has an empty url", key)));
            }
        }

        for (key, kind) in self.group_keys() {
            let names = self.resolve_names(key, kind);
            if names.file.is_empty() || names.file.contains(|c: char| c == '/' || c == '\\') {
                return Err(Error::Config(format!(
                    "invalid file name for {}: {:?}",
                    key, names.file
                )));
            }
            if names.list_name.is_empty() {
                return Err(Error::Config(format!("empty list name for {}", key)));
            }
        }

        Ok(())
    }

    fn group_keys(&self) -> impl Iterator<Item = (&str, GroupKind)> {
        self.as_numbers
            .keys()
            .map(|k| (k.as_str(), GroupKind::AsNumber))
            .chain(self.services.keys().map(|k| (k.as_str(), GroupKind::Service)))
    }

    fn naming(&self, key: &str, kind: GroupKind) -> GroupConfig {
        match kind {
            GroupKind::AsNumber => self.as_numbers.get(key).cloned().unwrap_or_default(),
            GroupKind::Service => self
                .services
                .get(key)
                .map(ServiceConfig::naming)
                .unwrap_or_default(),
        }
    }

    /// Whether a capitalized copy of the list should be written.
    pub fn legacy_copy(&self, key: &str, kind: GroupKind) -> bool {
        self.naming(key, kind).legacy_copy
    }

    /// Resolve file, list and comment names for a group.
    ///
    /// Explicit values win, then templates applied to `name`, then
    /// fallbacks derived from the key.
    pub fn resolve_names(&self, key: &str, kind: GroupKind) -> ResolvedNames {
        let group = self.naming(key, kind);
        let templates = &self.name_templates;
        let name = group.name.as_deref().filter(|n| !n.is_empty());

        let file = group
            .file
            .clone()
            .or_else(|| name.map(|n| NameTemplates::render(&templates.file, n)))
            .unwrap_or_else(|| format!("{}.lst", key));

        let list_name = group
            .list_name
            .clone()
            .or_else(|| name.map(|n| NameTemplates::render(&templates.list_name, n)))
            .unwrap_or_else(|| file.strip_suffix(".lst").unwrap_or(&file).to_string());

        let comment = group
            .comment
            .clone()
            .or_else(|| name.map(|n| NameTemplates::render(&templates.comment, n)))
            .unwrap_or_else(|| match kind {
                GroupKind::AsNumber => key.to_string(),
                GroupKind::Service => key.to_uppercase(),
            });

        ResolvedNames {
            file,
            list_name,
            comment,
        }
    }
}
