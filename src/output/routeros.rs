//! MikroTik RouterOS script generation.

use std::fmt;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::normalize::PrefixSet;
use crate::prefix::to_canonical_text;
use crate::Result;

/// RouterOS command dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouterOsVersion {
    /// Space-separated menu paths
    V6,
    /// Slash-separated menu paths
    V7,
}

impl RouterOsVersion {
    /// Directory name for this dialect.
    pub fn as_str(&self) -> &'static str {
        match self {
            RouterOsVersion::V6 => "v6",
            RouterOsVersion::V7 => "v7",
        }
    }

    fn address_list_path(&self) -> &'static str {
        match self {
            RouterOsVersion::V6 => "/ip firewall address-list",
            RouterOsVersion::V7 => "/ip/firewall/address-list",
        }
    }

    fn mangle_path(&self) -> &'static str {
        match self {
            RouterOsVersion::V6 => "/ip firewall mangle",
            RouterOsVersion::V7 => "/ip/firewall/mangle",
        }
    }

    fn route_path(&self) -> &'static str {
        match self {
            RouterOsVersion::V6 => "/ip route",
            RouterOsVersion::V7 => "/ip/route",
        }
    }

    /// Route attribute selecting the routing table.
    fn route_table_attr(&self) -> &'static str {
        match self {
            RouterOsVersion::V6 => "routing-mark",
            RouterOsVersion::V7 => "routing-table",
        }
    }
}

impl fmt::Display for RouterOsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Render the full script for one address list.
///
/// One guarded `add` per prefix, then a block that creates the mark-routing
/// mangle rule and the gateway route for `R_<list>` unless they exist.
pub fn render_routeros_script(
    set: &PrefixSet,
    list_name: &str,
    comment: &str,
    gateway: &str,
    version: RouterOsVersion,
) -> String {
    let mut script = String::new();
    let comment = quote(comment);
    let mark = quote(&format!("R_{}", list_name));

    for prefix in set {
        // Writing to a String cannot fail.
        let _ = writeln!(
            script,
            "do {{{} add address={} comment={} list={} }} on-error={{}}",
            version.address_list_path(),
            to_canonical_text(prefix),
            comment,
            list_name
        );
    }

    let mangle = version.mangle_path();
    let route = version.route_path();
    let table = version.route_table_attr();
    let _ = write!(
        script,
        r#"
{{
    :local rrule [ {mangle} find dst-address-list="{list}" ]
    :if ([:len $rrule ] = 0) do={{
        :do {{
            {mangle} add action=mark-routing chain=prerouting connection-mark=no-mark dst-address-list={list} new-routing-mark={mark} passthrough=no
        }} on-error={{}}
    }}
    :local rroute [ {route} find {table}={mark} gateway={gateway} ]
    :if ([:len $rroute ] = 0) do={{
        :do {{ {route} add comment={list} distance=1 gateway={gateway} {table}={mark} }} on-error={{}}
    }}
}}
"#,
        mangle = mangle,
        route = route,
        table = table,
        list = list_name,
        mark = mark,
        gateway = gateway,
    );

    script
}

/// Write `<dir>/<version>/<list_name>.rsc` and return its path.
///
/// Returns `Ok(None)` for an empty set; no script is written for it.
pub fn write_routeros_script(
    set: &PrefixSet,
    list_name: &str,
    comment: &str,
    gateway: &str,
    dir: &Path,
    version: RouterOsVersion,
) -> Result<Option<PathBuf>> {
    if set.is_empty() {
        log::debug!("No prefixes for {}, skipping RouterOS {} script", list_name, version);
        return Ok(None);
    }

    let out_dir = dir.join(version.as_str());
    fs::create_dir_all(&out_dir)?;

    let path = out_dir.join(format!("{}.rsc", list_name));
    let script = render_routeros_script(set, list_name, comment, gateway, version);
    fs::write(&path, script)?;

    log::info!("Wrote RouterOS {} script {:?}", version, path);
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{normalize, AddressFamily};

    fn sample_set() -> PrefixSet {
        normalize(["10.0.0.0/24", "10.0.1.0/24", "192.0.2.1"], AddressFamily::Ipv4)
            .unwrap()
            .set
    }

    #[test]
    fn test_render_v6_address_list() {
        let script = render_routeros_script(&sample_set(), "META", "Meta networks", "192.168.1.1", RouterOsVersion::V6);
        let lines: Vec<&str> = script.lines().take(2).collect();
        assert_eq!(
            lines,
            [
                r#"do {/ip firewall address-list add address=10.0.0.0/23 comment="Meta networks" list=META } on-error={}"#,
                r#"do {/ip firewall address-list add address=192.0.2.1/32 comment="Meta networks" list=META } on-error={}"#,
            ]
        );
        assert!(script.contains("/ip firewall mangle add action=mark-routing"));
        assert!(script.contains(r#"/ip route add comment=META distance=1 gateway=192.168.1.1 routing-mark="R_META""#));
    }

    #[test]
    fn test_render_v7_paths() {
        let script = render_routeros_script(&sample_set(), "META", "x", "10.0.0.1", RouterOsVersion::V7);
        assert!(script.starts_with("do {/ip/firewall/address-list add address=10.0.0.0/23"));
        assert!(script.contains("/ip/firewall/mangle find dst-address-list=\"META\""));
        assert!(script.contains(r#"/ip/route add comment=META distance=1 gateway=10.0.0.1 routing-table="R_META""#));
        assert!(!script.contains("/ip firewall"));
    }

    #[test]
    fn test_render_braces_balanced() {
        let script = render_routeros_script(&sample_set(), "L", "c", "1.1.1.1", RouterOsVersion::V7);
        let open = script.matches('{').count();
        let close = script.matches('}').count();
        assert_eq!(open, close);
    }

    #[test]
    fn test_comment_quoting() {
        let script = render_routeros_script(&sample_set(), "L", "say \"hi\"", "1.1.1.1", RouterOsVersion::V6);
        assert!(script.contains(r#"comment="say \"hi\"""#));
    }

    #[test]
    fn test_write_script() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_routeros_script(&sample_set(), "META", "m", "1.1.1.1", dir.path(), RouterOsVersion::V7)
            .unwrap()
            .unwrap();
        assert_eq!(path, dir.path().join("v7").join("META.rsc"));
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().filter(|l| l.starts_with("do {")).count(), 2);
    }

    #[test]
    fn test_write_script_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_routeros_script(&PrefixSet::new(), "META", "m", "1.1.1.1", dir.path(), RouterOsVersion::V6).unwrap();
        assert!(written.is_none());
        assert!(!dir.path().join("v6").exists());
    }
}
