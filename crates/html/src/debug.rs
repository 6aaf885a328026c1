use crate::dom::{Dom, NodeId, NodeKind};

const INDENT_STEP: &str = "  ";
const PREVIEW_CHARS: usize = 40;

fn push_preview(out: &mut String, s: &str) {
    for (i, ch) in s.chars().enumerate() {
        if i == PREVIEW_CHARS {
            out.push('…');
            return;
        }
        out.push(if ch == '\n' { ' ' } else { ch });
    }
}

/// One line per node, indented by depth, at most `cap` lines.
///
/// Elements show `id`, `class` and `data-mapping`; whitespace-only text is
/// skipped and long text/comments are truncated. Meant for test failure
/// messages and the demo binary, not for round-tripping.
pub fn outline(dom: &Dom, node: NodeId, cap: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack = vec![(node, 0usize)];
    while let Some((id, depth)) = stack.pop() {
        if out.len() == cap {
            break;
        }
        let Some(kind) = dom.kind(id) else {
            continue;
        };
        let mut line = INDENT_STEP.repeat(depth);
        match kind {
            NodeKind::Document { doctype } => match doctype {
                Some(dt) => {
                    line.push_str("<!");
                    line.push_str(dt);
                    line.push('>');
                }
                None => line.push_str("#document"),
            },
            NodeKind::Element { name, .. } => {
                line.push('<');
                line.push_str(name);
                for attr in ["id", "class", "data-mapping"] {
                    if let Some(value) = dom.attribute(id, attr).filter(|v| !v.is_empty()) {
                        line.push_str(&format!(r#" {attr}="{value}""#));
                    }
                }
                line.push('>');
            }
            NodeKind::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    continue;
                }
                line.push('"');
                push_preview(&mut line, trimmed);
                line.push('"');
            }
            NodeKind::Comment(text) => {
                line.push_str("<!--");
                push_preview(&mut line, text);
                line.push_str("-->");
            }
        }
        out.push(line);
        let children: Vec<NodeId> = dom.children(id).collect();
        stack.extend(children.into_iter().rev().map(|c| (c, depth + 1)));
    }
    out
}
