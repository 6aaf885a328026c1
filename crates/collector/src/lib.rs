//! Client-side reconstruction of provenance from a parsed document.
//!
//! [`collect`] rebuilds the frame table and mapping list from the markers a
//! recorder left in the document. The resulting [`SourceMap`] answers
//! "which mapping produced this node" and can grow with mappings for nodes
//! inserted after load.

mod collect;
mod live;
mod source_map;

use marker::MarkerConfig;

pub use crate::collect::collect;
pub use crate::live::{OBSERVE_EXEMPT_ATTRIBUTE, is_exempt};
pub use crate::source_map::{CollectedMapping, Encoding, MarkerSite, SourceMap};

/// Largest marker index accepted by default.
pub const DEFAULT_MAX_INDEX: usize = 1_000_000;

#[derive(Clone, Debug)]
pub struct CollectorConfig {
    /// Prefix and source tag the markers were written with.
    pub marker: MarkerConfig,
    /// Markers declaring a larger index are treated as malformed, so a hostile
    /// document cannot force huge table allocations.
    pub max_index: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            marker: MarkerConfig::default(),
            max_index: DEFAULT_MAX_INDEX,
        }
    }
}
