//! Output writers for canonical prefix sets.
//!
//! Every writer formats prefixes with [`crate::to_canonical_text`], so all
//! outputs describe the same address space.

mod list;
mod routeros;

pub use list::{legacy_copy, legacy_name, write_prefix_list};
pub use routeros::{render_routeros_script, write_routeros_script, RouterOsVersion};
