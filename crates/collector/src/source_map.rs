use core_types::{
    Frame, FrameId, FrameKey, Mapping, MappingId, MappingTree, NestEvent, build_forest,
};
use html::{Dom, NodeId};
use std::collections::HashMap;

/// How a marker was carried in the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    Comment,
    Attribute,
}

/// Where a mapping boundary marker was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarkerSite {
    /// The comment node, or the element carrying the attribute.
    pub node: NodeId,
    pub encoding: Encoding,
    /// Pre-order index of `node` when the document was collected.
    pub position: usize,
}

/// A mapping plus the markers that bound its extent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectedMapping {
    pub mapping: Mapping,
    pub start: Option<MarkerSite>,
    /// Unset when the end marker is missing or could not be matched.
    pub end: Option<MarkerSite>,
}

/// Frames and mappings reconstructed from one document.
///
/// Both tables are indexed by the ids declared in the markers. Ids can arrive
/// out of order or with gaps, so slots are optional.
#[derive(Debug, Default)]
pub struct SourceMap {
    pub(crate) frames: Vec<Option<Frame>>,
    pub(crate) mappings: Vec<Option<CollectedMapping>>,
    // First id seen per (file, line), for interning client-side frames.
    pub(crate) frame_index: HashMap<FrameKey, FrameId>,
    // Comment nodes holding a mapping start.
    pub(crate) start_comments: HashMap<NodeId, MappingId>,
}

fn store<T>(slots: &mut Vec<Option<T>>, index: usize, value: T) -> Option<T> {
    if slots.len() <= index {
        slots.resize_with(index + 1, || None);
    }
    slots[index].replace(value)
}

impl SourceMap {
    pub(crate) fn set_frame(&mut self, index: FrameId, frame: Frame) {
        self.frame_index.entry(frame.key()).or_insert(index);
        if store(&mut self.frames, index, frame).is_some() {
            log::debug!(
                target: "hsm.collector",
                "frame {index} declared twice; keeping the later record"
            );
        }
    }

    pub(crate) fn start_mapping(&mut self, index: MappingId, mapping: Mapping, site: MarkerSite) {
        if site.encoding == Encoding::Comment {
            self.start_comments.insert(site.node, index);
        }
        let collected = CollectedMapping {
            mapping,
            start: Some(site),
            end: None,
        };
        if let Some(previous) = store(&mut self.mappings, index, collected) {
            log::debug!(
                target: "hsm.collector",
                "mapping {index} declared twice; keeping the later record"
            );
            if let Some(start) = previous.start {
                self.start_comments.remove(&start.node);
            }
        }
    }

    pub(crate) fn end_mapping(&mut self, index: MappingId, site: MarkerSite) {
        match self.mappings.get_mut(index).and_then(Option::as_mut) {
            Some(collected) if collected.end.is_none() => collected.end = Some(site),
            Some(_) => {
                log::debug!(
                    target: "hsm.collector",
                    "mapping {index} ended twice; keeping the first end"
                )
            }
            None => log::debug!(target: "hsm.collector", "end marker for unknown mapping {index}"),
        }
    }

    pub fn frame(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(id)?.as_ref()
    }

    pub fn mapping(&self, id: MappingId) -> Option<&CollectedMapping> {
        self.mappings.get(id)?.as_ref()
    }

    /// Frames of a mapping's call stack, caller-nearest first. Ids with no
    /// collected frame record are skipped.
    pub fn call_stack(&self, id: MappingId) -> Vec<&Frame> {
        let Some(collected) = self.mapping(id) else {
            return Vec::new();
        };
        collected
            .mapping
            .call_stack
            .iter()
            .filter_map(|&frame| self.frame(frame))
            .collect()
    }

    /// Number of frame records present.
    pub fn frame_count(&self) -> usize {
        self.frames.iter().flatten().count()
    }

    /// Number of mapping records present.
    pub fn mapping_count(&self) -> usize {
        self.mappings.iter().flatten().count()
    }

    pub fn frames(&self) -> impl Iterator<Item = (FrameId, &Frame)> {
        self.frames
            .iter()
            .enumerate()
            .filter_map(|(id, f)| f.as_ref().map(|f| (id, f)))
    }

    pub fn mappings(&self) -> impl Iterator<Item = (MappingId, &CollectedMapping)> {
        self.mappings
            .iter()
            .enumerate()
            .filter_map(|(id, m)| m.as_ref().map(|m| (id, m)))
    }

    /// Mapping whose start marker precedes `node` most closely.
    ///
    /// Walks previous siblings looking for a mapping-start comment, then
    /// continues from the parent. Stops at the document root. Comments that
    /// were not collected as mapping starts, and the subtrees of previous
    /// siblings, are passed over.
    pub fn nearest_mapping(&self, dom: &Dom, node: NodeId) -> Option<MappingId> {
        let mut current = node;
        loop {
            match dom.previous_sibling(current) {
                Some(prev) => {
                    if let Some(&id) = self.start_comments.get(&prev) {
                        return Some(id);
                    }
                    current = prev;
                }
                None => current = dom.parent(current)?,
            }
        }
    }

    /// Nesting of every mapping with a start marker, by current document order.
    ///
    /// A mapping whose start and end sit on the same node, or whose end was
    /// never found, is a leaf. Ends that would overlap are ignored.
    pub fn forest(&self, dom: &Dom) -> Vec<MappingTree> {
        let order: HashMap<NodeId, usize> = dom
            .descendants(dom.root())
            .enumerate()
            .map(|(position, node)| (node, position))
            .collect();
        let at = |site: &MarkerSite| order.get(&site.node).copied();

        let mut events: Vec<(usize, NestEvent)> = Vec::new();
        for (id, collected) in self.mappings() {
            let Some(start) = collected.start.as_ref().and_then(|s| at(s).map(|p| (s, p))) else {
                continue;
            };
            let end = collected.end.as_ref().and_then(|s| at(s).map(|p| (s, p)));
            match end {
                Some((end_site, end_pos)) if end_site.node != start.0.node && end_pos > start.1 => {
                    events.push((start.1, NestEvent::Open(id)));
                    events.push((end_pos, NestEvent::Close(id)));
                }
                _ => events.push((start.1, NestEvent::Leaf(id))),
            }
        }
        events.sort_by_key(|(position, _)| *position);
        build_forest(events.into_iter().map(|(_, event)| event))
    }
}
