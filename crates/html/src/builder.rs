use crate::dom::{Dom, NodeId};
use crate::tokenizer::{Token, Tokenizer};

/// Parse markup into a fresh [`Dom`].
///
/// Tree construction is deliberately simple: an open-element stack, void and
/// self-closing tags never open, and an end tag pops back to the nearest open
/// element of the same name. End tags with no open match are dropped rather
/// than closing everything, so stray `</p>`s in template output do not
/// reparent the rest of the page.
pub fn parse_document(input: &str) -> Dom {
    let mut dom = Dom::new();
    let root = dom.root();
    let mut open: Vec<(NodeId, String)> = Vec::new();

    for token in Tokenizer::new(input) {
        let parent = open.last().map_or(root, |(id, _)| *id);
        match token {
            Token::Doctype(doctype) => dom.set_doctype(doctype),
            Token::Comment(text) => {
                let node = dom.create_comment(text);
                attach(&mut dom, parent, node);
            }
            Token::Text(text) => {
                if text.is_empty() {
                    continue;
                }
                let node = dom.create_text(text);
                attach(&mut dom, parent, node);
            }
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                let node = dom.create_element(&name, attributes);
                attach(&mut dom, parent, node);
                if !self_closing {
                    open.push((node, name));
                }
            }
            Token::EndTag(name) => match open.iter().rposition(|(_, n)| *n == name) {
                Some(depth) => open.truncate(depth),
                None => log::debug!(target: "html.builder", "dropping unmatched end tag </{name}>"),
            },
        }
    }
    log::trace!(target: "html.builder", "built {} nodes from {} bytes", dom.len(), input.len());
    dom
}

fn attach(dom: &mut Dom, parent: NodeId, node: NodeId) {
    // Parents come from the open-element stack and nodes are fresh, so this
    // cannot fail; a failure would leave the node detached, not corrupt the tree.
    if let Err(err) = dom.append_child(parent, node) {
        log::warn!(target: "html.builder", "failed to attach {node} under {parent}: {err}");
    }
}
