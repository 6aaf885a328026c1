use crate::color::ColorCache;
use crate::fragments::render_fragments;
use collector::OBSERVE_EXEMPT_ATTRIBUTE;
use html::{Dom, NodeId, inner_html};

pub const OVERLAY_CLASS: &str = "hm-debug";
pub const TOOLTIP_CLASS: &str = "hm-tooltip";
pub const SELECTED_MAPPING_CLASS: &str = "hm-selected-mapping";

const OVERLAY_TITLE: &str = "Source Map Visualization";
const SELECTED_MAPPING_STYLE: &str = "display: block; background-color: rgba(255, 255, 255, 0.95); \
     margin: 10px; border: black solid 1px; padding: 2px; font-size: 18px; \
     white-space: pre-wrap; min-width: 400px";

/// Node handles of a rendered debug overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Overlay {
    pub root: NodeId,
    /// The source-view panel.
    pub fragments: NodeId,
    pub tooltip: NodeId,
    /// `<code>` inside the tooltip that shows the selected mapping.
    pub selected: NodeId,
}

fn class(name: &str) -> Vec<(String, Option<String>)> {
    vec![("class".to_string(), Some(name.to_string()))]
}

fn append(dom: &mut Dom, parent: NodeId, child: NodeId) {
    if let Err(err) = dom.append_child(parent, child) {
        log::warn!(target: "hsm.visualizer", "overlay: {err}");
    }
}

/// Remove every attached overlay. Returns how many were removed.
pub fn remove_overlays(dom: &mut Dom) -> usize {
    let existing: Vec<NodeId> = dom
        .descendants(dom.root())
        .filter(|&n| dom.attribute(n, "class") == Some(OVERLAY_CLASS))
        .collect();
    let mut removed = 0;
    for node in existing {
        // An overlay nested in one detached earlier is already gone.
        if dom.is_connected(node) && dom.detach(node).is_ok() {
            removed += 1;
        }
    }
    removed
}

/// Render the debug overlay into `dom`, replacing any previous one.
///
/// The overlay holds a heading, the source view of the document as it stood
/// before this call, and a hidden tooltip for the inspector. It is exempt
/// from live mapping and goes at the end of `<body>`, or of the document
/// when there is no body.
pub fn debug_render(dom: &mut Dom, colors: &mut ColorCache) -> Overlay {
    let removed = remove_overlays(dom);
    if removed > 0 {
        log::debug!(target: "hsm.visualizer", "replacing {removed} existing overlay(s)");
    }

    let markup = inner_html(dom, dom.root());
    let fragments = render_fragments(dom, &markup, colors);

    let mut attributes = class(OVERLAY_CLASS);
    attributes.push((OBSERVE_EXEMPT_ATTRIBUTE.to_string(), Some("true".to_string())));
    let root = dom.create_element("div", attributes);

    let heading = dom.create_element("h2", Vec::new());
    let title = dom.create_text(OVERLAY_TITLE);
    append(dom, heading, title);

    let tooltip = dom.create_element("div", class(TOOLTIP_CLASS));
    let mut selected_attributes = class(SELECTED_MAPPING_CLASS);
    selected_attributes.push(("style".to_string(), Some(SELECTED_MAPPING_STYLE.to_string())));
    let selected = dom.create_element("code", selected_attributes);
    append(dom, tooltip, selected);

    append(dom, root, heading);
    append(dom, root, fragments);
    append(dom, root, tooltip);

    let host = dom
        .descendants(dom.root())
        .find(|&n| dom.element_name(n) == Some("body"))
        .unwrap_or(dom.root());
    append(dom, host, root);

    log::debug!(
        target: "hsm.visualizer",
        "rendered overlay from {} bytes of markup",
        markup.len()
    );
    Overlay {
        root,
        fragments,
        tooltip,
        selected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use html::{outer_html, parse_document, to_html};

    const PAGE: &str = concat!(
        "<html><body>",
        r#"<!-- hm mapping: 0 {"source":"rust","callStack":[]}-->"#,
        "<p>hi</p>",
        "<!-- hm mapping end: 0-->",
        "</body></html>",
    );

    #[test]
    fn overlay_lands_at_end_of_body() {
        let mut dom = parse_document(PAGE);
        let overlay = debug_render(&mut dom, &mut ColorCache::default());
        let body = dom.parent(overlay.root).unwrap();
        assert_eq!(dom.element_name(body), Some("body"));
        assert_eq!(dom.last_child(body), Some(overlay.root));
        assert_eq!(
            dom.attribute(overlay.root, OBSERVE_EXEMPT_ATTRIBUTE),
            Some("true")
        );
        assert_eq!(dom.text_content(dom.first_child(overlay.root).unwrap()), OVERLAY_TITLE);
        assert_eq!(dom.parent(overlay.selected), Some(overlay.tooltip));
        let panel = outer_html(&dom, overlay.fragments);
        assert!(panel.contains(r#"data-mapping="0">&lt;p&gt;hi&lt;/p&gt;</span>"#), "{panel}");
    }

    #[test]
    fn rendering_twice_replaces_the_overlay() {
        let mut dom = parse_document(PAGE);
        let mut colors = ColorCache::default();
        let first = debug_render(&mut dom, &mut colors);
        let once = to_html(&dom);
        let second = debug_render(&mut dom, &mut colors);

        assert_ne!(first.root, second.root);
        assert!(!dom.is_connected(first.root));
        assert_eq!(to_html(&dom), once);
        let overlays = dom
            .descendants(dom.root())
            .filter(|&n| dom.attribute(n, "class") == Some(OVERLAY_CLASS))
            .count();
        assert_eq!(overlays, 1);
    }

    #[test]
    fn bodyless_documents_get_the_overlay_at_the_root() {
        let mut dom = parse_document("<p>x</p>");
        let overlay = debug_render(&mut dom, &mut ColorCache::default());
        assert_eq!(dom.parent(overlay.root), Some(dom.root()));
    }
}
