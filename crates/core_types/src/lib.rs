//! Data model shared by the recording and collecting halves.
//!
//! Both halves agree on these shapes only through the rendered document: the
//! recorder serializes them into markers and the collector parses them back.

use serde::{Deserialize, Serialize};

mod forest;

pub use crate::forest::{MappingTree, NestEvent, build_forest};

/// Dense, insertion-ordered frame index.
pub type FrameId = usize;
/// Dense, insertion-ordered mapping index.
pub type MappingId = usize;

/// Source tag written by the server-side recorder.
pub const SERVER_SOURCE: &str = "rust";
/// Source tag for mappings created client-side after load.
pub const CLIENT_SOURCE: &str = "js";

/// One call site.
///
/// Identity is `(file, line)`: function and class text are informational and
/// never participate in deduplication.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Frame {
    pub file: String,
    pub line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

impl Frame {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
            function: None,
            class: None,
        }
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn key(&self) -> FrameKey {
        FrameKey {
            file: self.file.clone(),
            line: self.line,
        }
    }
}

/// Deduplication key of a [`Frame`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameKey {
    pub file: String,
    pub line: u32,
}

/// One recorded output event.
///
/// `call_stack` is ordered caller-nearest first, so `call_stack[0]` is the
/// leaf frame and manually pushed frames sit at the end.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub source: String,
    #[serde(rename = "callStack", default)]
    pub call_stack: Vec<FrameId>,
    /// Byte length of the joined text, when the extent is tracked explicitly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub len: Option<usize>,
}

impl Mapping {
    pub fn new(source: impl Into<String>, call_stack: Vec<FrameId>) -> Self {
        Self {
            source: source.into(),
            call_stack,
            len: None,
        }
    }

    pub fn leaf(&self) -> Option<FrameId> {
        self.call_stack.first().copied()
    }
}
