//! Plain prefix lists and their legacy-named copies.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::title_case;
use crate::normalize::PrefixSet;
use crate::prefix::to_canonical_text;
use crate::Result;

/// Write one canonical prefix per line to `path`.
///
/// An empty set leaves an empty file.
pub fn write_prefix_list(set: &PrefixSet, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for prefix in set {
        writeln!(writer, "{}", to_canonical_text(prefix))?;
    }
    writer.flush()?;

    log::info!("Wrote {} prefixes to {:?}", set.len(), path);
    Ok(())
}

/// Capitalized sibling of `path` (`discord.lst` -> `Discord.lst`).
///
/// Returns `None` when `path` has no UTF-8 file name.
pub fn legacy_name(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    Some(path.with_file_name(title_case(name)))
}

/// Copy `path` to its legacy name and return the copy's path.
///
/// When the legacy name equals the source name nothing is copied.
pub fn legacy_copy(path: &Path) -> Result<PathBuf> {
    let dest = legacy_name(path).ok_or_else(|| {
        crate::Error::Config(format!("cannot derive legacy name for {:?}", path))
    })?;
    if dest != path {
        fs::copy(path, &dest)?;
        log::debug!("Copied {:?} -> {:?}", path, dest);
    }
    Ok(dest)
}
