//! Marker protocol shared by the recorder and the collector.
//!
//! A marker is one line of text carried either as the body of an HTML comment
//! or as the value of a `data-<prefix>*` attribute:
//!
//! ```text
//! hm frame: 0 {"file":"view.rs","line":12,"function":"say_hi"}
//! hm mapping: 3 {"source":"rust","callStack":[0,2]}
//! hm mapping end: 3
//! ```
//!
//! Invariants:
//! - Payloads are JSON with `<`, `>` and `&` written as `\u003c`, `\u003e`
//!   and `\u0026`. A payload can never terminate the comment that carries it,
//!   and never contains a literal `&quot;`.
//! - Parsing tolerates `&quot;` in place of `"` (attribute re-serialization).
//! - Dispatch is a literal prefix match on the kind (`frame:`, `mapping:`,
//!   `mapping end:`); there is no general grammar.

mod encode;
mod parse;

use core_types::SERVER_SOURCE;

pub use crate::encode::{
    attribute, comment, end_attribute_name, frame_attribute_name, frame_payload,
    mapping_end_payload, mapping_payload, start_attribute_name,
};
pub use crate::parse::{Marker, MarkerError, is_marker_attribute, parse_marker};

/// Conventional marker prefix.
pub const DEFAULT_PREFIX: &str = "hm";

#[derive(Clone, Debug)]
pub struct MarkerConfig {
    /// Leading word of every marker and the `data-<prefix>` attribute family.
    pub prefix: String,
    /// Source tag stamped on mappings written with this config.
    pub source: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            source: SERVER_SOURCE.to_string(),
        }
    }
}
