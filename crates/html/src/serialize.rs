use crate::dom::{Dom, NodeId, NodeKind};
use crate::tokenizer::{is_rawtext_element, is_void_element};
use tools::escape::{escape_attr, escape_text};

enum Step {
    Enter(NodeId),
    Exit(NodeId),
}

/// Serialize the whole document.
pub fn to_html(dom: &Dom) -> String {
    outer_html(dom, dom.root())
}

/// Markup for `node` and its subtree. For the document node this is its
/// doctype followed by its children.
pub fn outer_html(dom: &Dom, node: NodeId) -> String {
    let mut out = String::new();
    write_node(dom, node, &mut out);
    out
}

/// Markup for the children of `node`.
pub fn inner_html(dom: &Dom, node: NodeId) -> String {
    let mut out = String::new();
    for child in dom.children(node) {
        write_node(dom, child, &mut out);
    }
    out
}

fn write_node(dom: &Dom, node: NodeId, out: &mut String) {
    let mut stack = vec![Step::Enter(node)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(id) => {
                let Some(kind) = dom.kind(id) else {
                    continue;
                };
                match kind {
                    NodeKind::Document { doctype } => {
                        if let Some(doctype) = doctype {
                            out.push_str("<!");
                            out.push_str(doctype);
                            out.push('>');
                        }
                    }
                    NodeKind::Element { name, attributes } => {
                        out.push('<');
                        out.push_str(name);
                        for (k, v) in attributes {
                            out.push(' ');
                            out.push_str(k);
                            if let Some(v) = v {
                                out.push_str("=\"");
                                out.push_str(&escape_attr(v));
                                out.push('"');
                            }
                        }
                        out.push('>');
                        if is_void_element(name) {
                            continue;
                        }
                    }
                    NodeKind::Text(text) => {
                        let raw = dom
                            .parent(id)
                            .and_then(|p| dom.element_name(p))
                            .is_some_and(is_rawtext_element);
                        if raw {
                            out.push_str(text);
                        } else {
                            out.push_str(&escape_text(text));
                        }
                        continue;
                    }
                    NodeKind::Comment(text) => {
                        out.push_str("<!--");
                        out.push_str(text);
                        out.push_str("-->");
                        continue;
                    }
                }
                stack.push(Step::Exit(id));
                // Children are pushed last-first so they pop in document order.
                let children: Vec<NodeId> = dom.children(id).collect();
                stack.extend(children.into_iter().rev().map(Step::Enter));
            }
            Step::Exit(id) => {
                if let Some(name) = dom.element_name(id) {
                    out.push_str("</");
                    out.push_str(name);
                    out.push('>');
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_document;

    #[test]
    fn round_trips_normalized_markup() {
        let input = concat!(
            r#"<!DOCTYPE html><div class="a"><!-- hm mapping end: 0-->"#,
            "<br><p hidden>x &amp; y</p></div>",
        );
        assert_eq!(to_html(&parse_document(input)), input);
    }

    #[test]
    fn attribute_values_are_requoted_and_escaped() {
        let dom = parse_document(r#"<a title='say "hi"' href=/x>t</a>"#);
        assert_eq!(to_html(&dom), r#"<a title="say &quot;hi&quot;" href="/x">t</a>"#);
    }

    #[test]
    fn rawtext_is_not_escaped() {
        let input = "<script>if (a < b && c) {}</script><p>a &lt; b</p>";
        assert_eq!(to_html(&parse_document(input)), input);
    }

    #[test]
    fn inner_and_outer_html() {
        let dom = parse_document("<ul><li>1</li><li>2</li></ul>");
        let ul = dom.first_child(dom.root()).unwrap();
        assert_eq!(inner_html(&dom, ul), "<li>1</li><li>2</li>");
        assert_eq!(outer_html(&dom, ul), "<ul><li>1</li><li>2</li></ul>");
    }

    #[test]
    fn deep_nesting_does_not_recurse() {
        let depth = 20_000;
        let input = format!("{}x{}", "<b>".repeat(depth), "</b>".repeat(depth));
        assert_eq!(to_html(&parse_document(&input)), input);
    }
}
