use crate::color::ColorCache;
use collector::{Encoding, SourceMap};
use core_types::MappingId;
use html::{Dom, NodeId};

pub const HIGHLIGHT_CLASS: &str = "hm-mapping-highlight";

/// `class` and `data-mapping` of a highlight wrapper.
pub(crate) fn wrapper_attributes(
    id: MappingId,
    style: Option<String>,
) -> Vec<(String, Option<String>)> {
    let mut attributes = vec![
        ("class".to_string(), Some(HIGHLIGHT_CLASS.to_string())),
        ("data-mapping".to_string(), Some(id.to_string())),
    ];
    if let Some(style) = style {
        attributes.push(("style".to_string(), Some(style)));
    }
    attributes
}

fn is_wrapper_for(dom: &Dom, node: NodeId, id: MappingId) -> bool {
    dom.attribute(node, "class") == Some(HIGHLIGHT_CLASS)
        && dom.attribute(node, "data-mapping") == Some(id.to_string().as_str())
}

/// Nodes strictly between two siblings, or `None` if `end` does not follow
/// `start`.
fn between(dom: &Dom, start: NodeId, end: NodeId) -> Option<Vec<NodeId>> {
    let mut nodes = Vec::new();
    let mut current = dom.next_sibling(start)?;
    while current != end {
        nodes.push(current);
        current = dom.next_sibling(current)?;
    }
    Some(nodes)
}

/// Wrap every mapping extent in a colored `<span>`.
///
/// Only comment-delimited extents whose start and end markers are siblings
/// can be wrapped; the markers stay outside the wrapper so nearest-mapping
/// lookups keep working. Extents that are already wrapped, empty, or
/// unresolved are left alone. Returns how many wrappers were added.
pub fn highlight(dom: &mut Dom, map: &SourceMap, colors: &mut ColorCache) -> usize {
    let mut wrapped = 0;
    for (id, collected) in map.mappings() {
        let (Some(start), Some(end)) = (collected.start, collected.end) else {
            log::trace!(target: "hsm.visualizer", "mapping {id} has no resolved extent");
            continue;
        };
        if start.encoding != Encoding::Comment || end.encoding != Encoding::Comment {
            continue;
        }
        let Some(parent) = dom.parent(start.node) else {
            continue;
        };
        if dom.parent(end.node) != Some(parent) {
            log::debug!(
                target: "hsm.visualizer",
                "mapping {id} crosses element boundaries; not wrapping"
            );
            continue;
        }
        let Some(nodes) = between(dom, start.node, end.node) else {
            log::debug!(
                target: "hsm.visualizer",
                "mapping {id} ends before it starts; not wrapping"
            );
            continue;
        };
        match nodes.as_slice() {
            [] => continue,
            [only] if is_wrapper_for(dom, *only, id) => continue,
            _ => {}
        }

        let style = colors.background_style(collected.mapping.leaf());
        let span = dom.create_element("span", wrapper_attributes(id, style));
        if let Err(err) = dom.insert_before(parent, span, end.node) {
            log::warn!(target: "hsm.visualizer", "could not place wrapper for mapping {id}: {err}");
            continue;
        }
        for node in nodes {
            if let Err(err) = dom.append_child(span, node) {
                log::warn!(
                    target: "hsm.visualizer",
                    "could not move {node} into wrapper {id}: {err}"
                );
            }
        }
        wrapped += 1;
    }
    log::debug!(target: "hsm.visualizer", "wrapped {wrapped} mapping extents");
    wrapped
}
