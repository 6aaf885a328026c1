use crate::overlay::Overlay;
use collector::SourceMap;
use core_types::{Frame, MappingId};
use html::{Dom, NodeId};
use serde::Serialize;

/// What the tooltip shows for one mapping.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InspectorView {
    pub source: String,
    /// Innermost first.
    #[serde(rename = "callStack")]
    pub call_stack: Vec<Frame>,
}

impl InspectorView {
    pub fn for_mapping(map: &SourceMap, id: MappingId) -> Option<Self> {
        let collected = map.mapping(id)?;
        Some(Self {
            source: collected.mapping.source.clone(),
            call_stack: map.call_stack(id).into_iter().cloned().collect(),
        })
    }
}

/// Pointer handling for a rendered overlay.
#[derive(Clone, Copy, Debug)]
pub struct Inspector {
    overlay: Overlay,
}

impl Inspector {
    pub fn new(overlay: Overlay) -> Self {
        Self { overlay }
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    /// Mapping under `target`.
    ///
    /// In the source view that is the innermost highlight span's
    /// `data-mapping`; elsewhere in the overlay there is none; in the page it
    /// is the nearest mapping.
    pub fn mapping_at(&self, dom: &Dom, map: &SourceMap, target: NodeId) -> Option<MappingId> {
        if dom.contains(self.overlay.fragments, target) {
            return dom
                .ancestors(target)
                .take_while(|&n| n != self.overlay.fragments)
                .find_map(|n| dom.attribute(n, "data-mapping")?.parse().ok());
        }
        if dom.contains(self.overlay.root, target) {
            return None;
        }
        map.nearest_mapping(dom, target)
    }

    /// Update the tooltip for a pointer over `target`.
    ///
    /// Shows the mapping's source and call stack as pretty JSON, or hides the
    /// tooltip when nothing is mapped there. Safe to call on every move.
    pub fn pointer_moved(
        &self,
        dom: &mut Dom,
        map: &SourceMap,
        target: NodeId,
    ) -> Option<InspectorView> {
        let view = self
            .mapping_at(dom, map, target)
            .and_then(|id| InspectorView::for_mapping(map, id));
        let text = view.as_ref().and_then(|view| match serde_json::to_string_pretty(view) {
            Ok(text) => Some(text),
            Err(err) => {
                log::warn!(target: "hsm.visualizer", "could not render inspector view: {err}");
                None
            }
        });

        let Some(text) = text else {
            self.set_tooltip_display(dom, "none");
            return None;
        };
        self.replace_selected_text(dom, text);
        self.set_tooltip_display(dom, "block");
        view
    }

    fn replace_selected_text(&self, dom: &mut Dom, text: String) {
        let selected = self.overlay.selected;
        let old: Vec<NodeId> = dom.children(selected).collect();
        for child in old {
            if let Err(err) = dom.detach(child) {
                log::warn!(target: "hsm.visualizer", "inspector: {err}");
            }
        }
        let node = dom.create_text(text);
        if let Err(err) = dom.append_child(selected, node) {
            log::warn!(target: "hsm.visualizer", "inspector: {err}");
        }
    }

    fn set_tooltip_display(&self, dom: &mut Dom, display: &str) {
        let style = format!("display: {display}");
        if let Err(err) = dom.set_attribute(self.overlay.tooltip, "style", Some(style)) {
            log::warn!(target: "hsm.visualizer", "inspector: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColorCache, debug_render};
    use collector::{CollectorConfig, collect};
    use html::parse_document;

    const PAGE: &str = concat!(
        "<body>",
        r#"<!-- hm frame: 0 {"file":"views/page.rs","line":4,"function":"page"}-->"#,
        r#"<!-- hm frame: 1 {"file":"views/item.rs","line":9}-->"#,
        r#"<!-- hm mapping: 0 {"source":"rust","callStack":[1,0]}-->"#,
        "<em>hello</em>",
        "<!-- hm mapping end: 0-->",
        "<i>after</i>",
        "</body>",
    );

    fn setup() -> (Dom, SourceMap, Inspector) {
        let mut dom = parse_document(PAGE);
        let map = collect(&dom, &CollectorConfig::default());
        let overlay = debug_render(&mut dom, &mut ColorCache::default());
        (dom, map, Inspector::new(overlay))
    }

    fn element(dom: &Dom, name: &str) -> NodeId {
        dom.descendants(dom.root())
            .find(|&n| dom.element_name(n) == Some(name))
            .unwrap()
    }

    #[test]
    fn page_node_shows_its_call_stack() {
        let (mut dom, map, inspector) = setup();
        let em = element(&dom, "em");
        let view = inspector.pointer_moved(&mut dom, &map, em).unwrap();
        assert_eq!(view.source, "rust");
        assert_eq!(view.call_stack[0], Frame::new("views/item.rs", 9));
        assert_eq!(view.call_stack.len(), 2);

        let overlay = inspector.overlay();
        assert_eq!(dom.attribute(overlay.tooltip, "style"), Some("display: block"));
        let shown = dom.text_content(overlay.selected);
        assert!(shown.starts_with("{\n  \"source\": \"rust\",\n  \"callStack\": ["), "{shown}");
        assert!(shown.contains("\"function\": \"page\""), "{shown}");
    }

    #[test]
    fn source_view_span_uses_data_mapping() {
        let (mut dom, map, inspector) = setup();
        let span = dom
            .descendants(inspector.overlay().fragments)
            .find(|&n| dom.attribute(n, "data-mapping") == Some("0"))
            .unwrap();
        let text = dom.first_child(span).unwrap();
        assert_eq!(inspector.mapping_at(&dom, &map, text), Some(0));
        assert!(inspector.pointer_moved(&mut dom, &map, text).is_some());
    }

    #[test]
    fn tooltip_hides_over_unmapped_and_overlay_nodes() {
        let (mut dom, map, inspector) = setup();
        let em = element(&dom, "em");
        inspector.pointer_moved(&mut dom, &map, em);

        let heading = element(&dom, "h2");
        assert_eq!(inspector.pointer_moved(&mut dom, &map, heading), None);
        let tooltip = inspector.overlay().tooltip;
        assert_eq!(dom.attribute(tooltip, "style"), Some("display: none"));

        let body = element(&dom, "body");
        assert_eq!(inspector.pointer_moved(&mut dom, &map, body), None);
    }

    #[test]
    fn repeated_moves_do_not_accumulate_text() {
        let (mut dom, map, inspector) = setup();
        let em = element(&dom, "em");
        inspector.pointer_moved(&mut dom, &map, em);
        inspector.pointer_moved(&mut dom, &map, em);
        let selected = inspector.overlay().selected;
        assert_eq!(dom.children(selected).count(), 1);
    }
}
