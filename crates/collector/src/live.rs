//! Mappings for nodes inserted after load.
//!
//! Each insertion appends to the same tables [`crate::collect`] fills and
//! writes the same markers into the document, so collecting the mutated
//! document again yields the same mappings.

use crate::CollectorConfig;
use crate::source_map::{Encoding, MarkerSite, SourceMap};
use core_types::{CLIENT_SOURCE, Frame, FrameId, Mapping, MappingId};
use html::{Dom, NodeId};
use marker::{frame_payload, mapping_end_payload, mapping_payload};
use tools::stack_trace::parse_v8_stack;

/// Elements carrying this attribute, and everything inside them, are never
/// mapped client-side. The debug overlay marks itself with it.
pub const OBSERVE_EXEMPT_ATTRIBUTE: &str = "data-html-source-map-observe-exempt";

/// Whether `node` should be ignored by live insertion mapping: comments
/// (markers included) and anything inside an exempt element.
pub fn is_exempt(dom: &Dom, node: NodeId) -> bool {
    dom.is_comment(node)
        || dom
            .ancestors(node)
            .any(|n| dom.has_attribute(n, OBSERVE_EXEMPT_ATTRIBUTE))
}

impl SourceMap {
    fn intern_client_frame(&mut self, frame: &Frame) -> (FrameId, bool) {
        if let Some(&id) = self.frame_index.get(&frame.key()) {
            return (id, false);
        }
        let id = self.frames.len();
        self.set_frame(id, frame.clone());
        (id, true)
    }

    /// Record a client-side mapping for `node`, which was inserted after the
    /// document was collected.
    ///
    /// Frames are interned by `(file, line)` into the collected frame table.
    /// Marker comments for new frames, the mapping start, and the end are
    /// inserted around `node`. Returns `None` for exempt or detached nodes.
    pub fn add_mapping(
        &mut self,
        dom: &mut Dom,
        node: NodeId,
        frames: &[Frame],
        config: &CollectorConfig,
    ) -> Option<MappingId> {
        if is_exempt(dom, node) {
            log::trace!(target: "hsm.collector", "not mapping exempt node {node}");
            return None;
        }
        let parent = dom.parent(node)?;
        let prefix = config.marker.prefix.as_str();

        let mut records = Vec::new();
        let mut call_stack = Vec::with_capacity(frames.len());
        for frame in frames {
            let (id, new) = self.intern_client_frame(frame);
            if new {
                records.push(frame_payload(prefix, id, frame));
            }
            call_stack.push(id);
        }

        let id = self.mappings.len();
        let mapping = Mapping::new(CLIENT_SOURCE, call_stack);
        records.push(mapping_payload(prefix, id, &mapping));

        let mut start = None;
        for record in records {
            let comment = dom.create_comment(format!(" {record}"));
            if let Err(err) = dom.insert_before(parent, comment, node) {
                log::warn!(target: "hsm.collector", "could not insert marker before {node}: {err}");
                return None;
            }
            start = Some(comment);
        }
        let start = start?;
        let end = dom.create_comment(format!(" {}", mapping_end_payload(prefix, id)));
        if let Err(err) = dom.insert_after(node, end) {
            log::warn!(target: "hsm.collector", "could not insert end marker after {node}: {err}");
            return None;
        }

        let position = |target: NodeId| {
            dom.descendants(dom.root())
                .position(|n| n == target)
                .unwrap_or(usize::MAX)
        };
        let start_site = MarkerSite {
            node: start,
            encoding: Encoding::Comment,
            position: position(start),
        };
        let end_site = MarkerSite {
            node: end,
            encoding: Encoding::Comment,
            position: position(end),
        };
        self.start_mapping(id, mapping, start_site);
        self.end_mapping(id, end_site);
        log::debug!(target: "hsm.collector", "mapped inserted node {node} as {id}");
        Some(id)
    }

    /// [`SourceMap::add_mapping`] with the call stack taken from a V8-style
    /// stack trace captured where the node was inserted. Trace lines without
    /// a file and line are dropped.
    pub fn add_mapping_from_trace(
        &mut self,
        dom: &mut Dom,
        node: NodeId,
        trace: &str,
        config: &CollectorConfig,
    ) -> Option<MappingId> {
        let frames: Vec<Frame> = parse_v8_stack(trace)
            .into_iter()
            .filter_map(|raw| raw.into_frame())
            .collect();
        self.add_mapping(dom, node, &frames, config)
    }
}
