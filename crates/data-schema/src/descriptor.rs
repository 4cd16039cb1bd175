use serde::{Deserialize, Serialize};

use crate::handle::{Handle, LATEST};

/// Human-written metadata identifying a dataset (the `Datafile`).
///
/// `dataset` is authoritative; [`Descriptor::handle`] is a parsed view of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    /// Canonical `author/name@version`.
    #[serde(default)]
    pub dataset: String,

    /// One-line summary.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tagline: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub license: String,

    /// Dataset web page.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub website: String,

    /// Other datasets this one depends on, as `author/name[@version]` strings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

impl Descriptor {
    /// Parsed (unvalidated) view of `dataset`.
    pub fn handle(&self) -> Handle {
        Handle::split(&self.dataset)
    }

    /// Replace `dataset` with the canonical form of `handle`.
    pub fn set_handle(&mut self, handle: &Handle) {
        self.dataset = handle.dataset();
    }

    /// A descriptor is publishable when its handle is well-formed and names a
    /// concrete version.
    pub fn is_valid(&self) -> bool {
        let h = self.handle();
        h.is_valid() && h.version != LATEST
    }

    /// Dependencies that parse as valid handles, in declaration order.
    pub fn dependency_handles(&self) -> Vec<Handle> {
        self.dependencies
            .iter()
            .filter_map(|d| Handle::parse(d).ok())
            .collect()
    }
}
