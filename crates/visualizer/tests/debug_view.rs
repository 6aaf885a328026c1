use collector::{CollectorConfig, collect};
use core_types::Frame;
use html::{Dom, NodeId, parse_document, to_html};
use recorder::{FixedStack, Recorder};
use visualizer::{
    ColorCache, HIGHLIGHT_CLASS, Inspector, debug_render, deterministic_color, highlight,
};

fn render_page() -> String {
    let mut rec = Recorder::new().with_source(FixedStack(vec![Frame::new("views/page.rs", 3)]));
    rec.write("<!doctype html><html><body>");
    let list = rec.begin_mark(None, &["<ul>"]);
    rec.write(&list.text);
    for (line, item) in [(10, "one"), (11, "two")] {
        rec.mark_chunk(&[Frame::new("views/item.rs", line)], &format!("<li>{item}</li>"));
    }
    rec.write("</ul>");
    rec.end_mark(list.id).unwrap();
    rec.write("</body></html>");
    rec.finish()
}

fn find_text(dom: &Dom, text: &str) -> NodeId {
    dom.descendants(dom.root())
        .find(|&n| dom.text_content(n) == text && dom.first_child(n).is_none())
        .unwrap()
}

#[test]
fn page_is_highlighted_and_inspectable() {
    let mut dom = parse_document(&render_page());
    let map = collect(&dom, &CollectorConfig::default());
    let mut colors = ColorCache::default();

    assert_eq!(highlight(&mut dom, &map, &mut colors), 3);
    let overlay = debug_render(&mut dom, &mut colors);
    let rendered = to_html(&dom);
    let inspector = Inspector::new(overlay);

    let two = find_text(&dom, "two");
    let wrapper = dom.parent(dom.parent(two).unwrap()).unwrap();
    assert_eq!(dom.attribute(wrapper, "class"), Some(HIGHLIGHT_CLASS));
    let expected_style = format!(
        "background-color: {}",
        deterministic_color(2, colors.config())
    );
    assert_eq!(dom.attribute(wrapper, "style"), Some(expected_style.as_str()));

    let view = inspector.pointer_moved(&mut dom, &map, two).unwrap();
    assert_eq!(view.call_stack, vec![Frame::new("views/item.rs", 11)]);

    // Highlighting again and re-rendering resets to the first render.
    assert_eq!(highlight(&mut dom, &map, &mut colors), 0);
    debug_render(&mut dom, &mut colors);
    assert_eq!(to_html(&dom), rendered);
}

#[test]
fn highlighted_document_collects_the_same_mappings() {
    let document = render_page();
    let mut dom = parse_document(&document);
    let map = collect(&dom, &CollectorConfig::default());
    highlight(&mut dom, &map, &mut ColorCache::default());

    let again = collect(&parse_document(&to_html(&dom)), &CollectorConfig::default());
    assert_eq!(again.mapping_count(), map.mapping_count());
    for (id, collected) in map.mappings() {
        assert_eq!(again.mapping(id).map(|m| &m.mapping), Some(&collected.mapping), "mapping {id}");
    }
}
