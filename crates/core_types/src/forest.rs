use crate::MappingId;
use serde::Serialize;

/// One mapping and the mappings whose extents it fully contains.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MappingTree {
    pub id: MappingId,
    pub children: Vec<MappingTree>,
}

impl MappingTree {
    pub fn leaf(id: MappingId) -> Self {
        Self {
            id,
            children: Vec::new(),
        }
    }

    /// Number of mappings in this subtree, including the root.
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

/// Boundary events in output order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NestEvent {
    Open(MappingId),
    Close(MappingId),
    /// A mapping with no resolvable extent of its own.
    Leaf(MappingId),
}

/// Fold boundary events into a forest.
///
/// A `Close` that does not match the innermost open mapping is ignored, and
/// mappings still open at the end are closed where they stand, so any event
/// sequence yields a forest.
pub fn build_forest(events: impl IntoIterator<Item = NestEvent>) -> Vec<MappingTree> {
    let mut roots: Vec<MappingTree> = Vec::new();
    let mut open: Vec<MappingTree> = Vec::new();

    fn attach(node: MappingTree, open: &mut [MappingTree], roots: &mut Vec<MappingTree>) {
        match open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => roots.push(node),
        }
    }

    for event in events {
        match event {
            NestEvent::Open(id) => open.push(MappingTree::leaf(id)),
            NestEvent::Leaf(id) => attach(MappingTree::leaf(id), &mut open, &mut roots),
            NestEvent::Close(id) => {
                if open.last().is_some_and(|top| top.id == id) {
                    if let Some(node) = open.pop() {
                        attach(node, &mut open, &mut roots);
                    }
                } else {
                    log::debug!(target: "hsm.forest", "ignoring close of {id}: not innermost");
                }
            }
        }
    }
    while let Some(node) = open.pop() {
        attach(node, &mut open, &mut roots);
    }
    roots
}
