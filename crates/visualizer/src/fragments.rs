//! The source view: rendered markup shown as text, with every marked
//! region nested in a highlight span.

use crate::color::ColorCache;
use crate::highlight::wrapper_attributes;
use html::{Dom, NodeId};
use marker::{Marker, MarkerConfig, parse_marker};

pub const FRAGMENTS_CLASS: &str = "hm-fragments";

struct PanelBuilder<'a> {
    dom: &'a mut Dom,
    panel: NodeId,
    current: NodeId,
    text: String,
}

impl PanelBuilder<'_> {
    fn append(&mut self, node: NodeId) {
        if let Err(err) = self.dom.append_child(self.current, node) {
            log::warn!(target: "hsm.visualizer", "source view: {err}");
        }
    }

    fn flush(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let text = self.dom.create_text(std::mem::take(&mut self.text));
        self.append(text);
    }

    fn line_break(&mut self) {
        self.flush();
        let br = self.dom.create_element("br", Vec::new());
        self.append(br);
    }

    fn marker(&mut self, marker: Marker, colors: &mut ColorCache) {
        match marker {
            Marker::MappingStart { index, mapping } => {
                self.flush();
                let style = colors.background_style(mapping.leaf());
                let span = self.dom.create_element("span", wrapper_attributes(index, style));
                self.append(span);
                self.current = span;
            }
            Marker::MappingEnd { index } => {
                self.flush();
                if self.current == self.panel {
                    log::debug!(
                        target: "hsm.visualizer",
                        "source view: end of mapping {index} with nothing open"
                    );
                    return;
                }
                self.current = self.dom.parent(self.current).unwrap_or(self.panel);
            }
            Marker::Frame { .. } => {}
        }
    }
}

/// Byte length of a `data-<prefix>…="…"` attribute at the start of `rest`,
/// and its value.
fn marker_attribute<'a>(rest: &'a str, attr_prefix: &str) -> Option<(usize, &'a str)> {
    if !rest.starts_with(attr_prefix) {
        return None;
    }
    let name_end = rest.find(|c: char| c == '=' || c == '>' || c.is_whitespace())?;
    let after = rest[name_end..].strip_prefix("=\"")?;
    let value_len = after.find('"')?;
    Some((name_end + 2 + value_len + 1, &after[..value_len]))
}

fn read_marker(text: &str, config: &MarkerConfig) -> Option<Marker> {
    parse_marker(text, config).ok()
}

/// Build a detached `<div class="hm-fragments">` showing `markup` as text.
///
/// Markers in `markup` are consumed rather than shown: a mapping start opens
/// a highlight span carrying `data-mapping`, its end closes it. Other
/// comments are dropped too. Newlines become `<br>`.
pub fn render_fragments(dom: &mut Dom, markup: &str, colors: &mut ColorCache) -> NodeId {
    let marker_config = colors.config().marker.clone();
    let attr_prefix = format!("data-{}", marker_config.prefix);
    let panel = dom.create_element(
        "div",
        vec![("class".to_string(), Some(FRAGMENTS_CLASS.to_string()))],
    );
    let mut builder = PanelBuilder {
        dom,
        panel,
        current: panel,
        text: String::new(),
    };

    let mut i = 0;
    while i < markup.len() {
        let rest = &markup[i..];
        if let Some(body) = rest.strip_prefix("<!--") {
            let (text, consumed) = match body.find("-->") {
                Some(end) => (&body[..end], 4 + end + 3),
                None => (body, rest.len()),
            };
            if let Some(marker) = read_marker(text, &marker_config) {
                builder.marker(marker, colors);
            }
            i += consumed;
            continue;
        }
        if let Some((consumed, value)) = marker_attribute(rest, &attr_prefix) {
            if let Some(marker) = read_marker(value, &marker_config) {
                builder.marker(marker, colors);
            }
            i += consumed;
            continue;
        }
        let Some(ch) = rest.chars().next() else {
            break;
        };
        if ch == '\n' {
            builder.line_break();
        } else {
            builder.text.push(ch);
        }
        i += ch.len_utf8();
    }
    builder.flush();
    panel
}

#[cfg(test)]
mod tests {
    use super::*;
    use html::inner_html;

    fn render(markup: &str) -> String {
        let mut dom = Dom::new();
        let panel = render_fragments(&mut dom, markup, &mut ColorCache::default());
        inner_html(&dom, panel)
    }

    #[test]
    fn markers_become_nested_spans() {
        let markup = concat!(
            r#"<!-- hm frame: 0 {"file":"a.rs","line":1}-->"#,
            r#"<!-- hm mapping: 0 {"source":"rust","callStack":[0]}-->"#,
            "<ul>\n",
            r#"<!-- hm mapping: 1 {"source":"rust","callStack":[]}-->"#,
            "<li>x</li>",
            "<!-- hm mapping end: 1-->",
            "</ul><!-- note -->",
            "<!-- hm mapping end: 0-->",
        );
        assert_eq!(
            render(markup),
            concat!(
                r#"<span class="hm-mapping-highlight" data-mapping="0" style="background-color: hsla(264, 56%, 56%, 0.46)">"#,
                "&lt;ul&gt;<br>",
                r#"<span class="hm-mapping-highlight" data-mapping="1">&lt;li&gt;x&lt;/li&gt;</span>"#,
                "&lt;/ul&gt;</span>",
            )
        );
    }

    #[test]
    fn attribute_markers_are_consumed() {
        let markup = concat!(
            r#"<a href="/" data-hm-href="hm mapping: 0 {&quot;source&quot;:&quot;rust&quot;,&quot;callStack&quot;:[]}" "#,
            r#"data-hm-end-href="hm mapping end: 0">go</a>"#,
        );
        assert_eq!(
            render(markup),
            concat!(
                r#"&lt;a href="/" <span class="hm-mapping-highlight" data-mapping="0"> </span>&gt;go&lt;/a&gt;"#,
            )
        );
    }

    #[test]
    fn stray_ends_and_unterminated_comments_are_tolerated() {
        assert_eq!(render("a<!-- hm mapping end: 4-->b"), "ab");
        assert_eq!(render("a<!-- hm mapping: 0 {}"), "a");
        assert_eq!(render("plain data-hm words"), "plain data-hm words");
    }
}
