use core_types::{Frame, FrameId, Mapping, MappingId, MappingTree};
use std::fmt::Write;

/// One line per frame and mapping, in id order, for diffing two models.
pub fn describe_model<'a>(
    frames: impl IntoIterator<Item = (FrameId, &'a Frame)>,
    mappings: impl IntoIterator<Item = (MappingId, &'a Mapping)>,
) -> Vec<String> {
    let mut lines: Vec<String> = frames
        .into_iter()
        .map(|(id, frame)| format!("frame {id} {}", json(frame)))
        .collect();
    lines.extend(
        mappings
            .into_iter()
            .map(|(id, mapping)| format!("mapping {id} {}", json(mapping))),
    );
    lines
}

fn json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|err| format!("<unserializable: {err}>"))
}

/// `0(1 2) 3`: ids in order, children in parentheses.
pub fn render_forest(forest: &[MappingTree]) -> String {
    fn walk(tree: &MappingTree, out: &mut String) {
        let _ = write!(out, "{}", tree.id);
        if tree.children.is_empty() {
            return;
        }
        out.push('(');
        for (i, child) in tree.children.iter().enumerate() {
            if i != 0 {
                out.push(' ');
            }
            walk(child, out);
        }
        out.push(')');
    }
    let mut out = String::new();
    for (i, tree) in forest.iter().enumerate() {
        if i != 0 {
            out.push(' ');
        }
        walk(tree, &mut out);
    }
    out
}

pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    let max = expected.len().max(actual.len());
    fn line(lines: &[String], i: usize) -> &str {
        lines.get(i).map(String::as_str).unwrap_or("<missing>")
    }
    let mut out = String::new();

    let mismatch = (0..max).find(|&i| line(expected, i) != line(actual, i));
    if let Some(i) = mismatch {
        let start = i.saturating_sub(2);
        let end = (i + 3).min(max);
        let _ = writeln!(
            out,
            "first mismatch at line {} (showing {}..={}):",
            i + 1,
            start + 1,
            end
        );
        for idx in start..end {
            let marker = if idx == i { ">" } else { " " };
            let _ = writeln!(out, "{marker} {:>4}  expected: {}", idx + 1, line(expected, idx));
            let _ = writeln!(out, "{marker} {:>4}    actual: {}", idx + 1, line(actual, idx));
        }
    }
    let _ = writeln!(out, "expected {} lines, actual {} lines", expected.len(), actual.len());
    out
}
