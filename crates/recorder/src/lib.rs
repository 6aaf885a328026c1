//! Server-side provenance recording.
//!
//! A [`Recorder`] is created per render. Every marked piece of output gets a
//! mapping whose call stack points into a deduplicated frame table, and the
//! markers describing both are written into the document next to the text.

mod recorder;
mod registry;
mod source;

pub use crate::recorder::{AttributeMark, FrameScope, Mark, MarkError, Recorder, RecorderData};
pub use crate::registry::{FrameRegistry, Interned};
pub use crate::source::{BacktraceSource, CallSite, CallStackSource, FixedStack};
