use core_types::{Frame, FrameId, Mapping, MappingId};
use serde::Serialize;
use tools::escape::escape_attr;

fn payload_json<T: Serialize>(value: &T) -> String {
    // Serializing plain structs of strings and integers cannot fail; an empty
    // object keeps the marker well-formed if it ever does.
    let json = serde_json::to_string(value).unwrap_or_else(|err| {
        log::warn!(target: "hsm.marker", "payload serialization failed: {err}");
        "{}".to_string()
    });
    if !json.contains(['<', '>', '&']) {
        return json;
    }
    json.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

pub fn frame_payload(prefix: &str, id: FrameId, frame: &Frame) -> String {
    format!("{prefix} frame: {id} {}", payload_json(frame))
}

pub fn mapping_payload(prefix: &str, id: MappingId, mapping: &Mapping) -> String {
    format!("{prefix} mapping: {id} {}", payload_json(mapping))
}

pub fn mapping_end_payload(prefix: &str, id: MappingId) -> String {
    format!("{prefix} mapping end: {id}")
}

/// Wrap a payload as comment markup. The leading space mirrors what template
/// authors write by hand; the collector trims it.
pub fn comment(payload: &str) -> String {
    format!("<!-- {payload}-->")
}

/// `data-<prefix>-<name>`, carrying a mapping start.
pub fn start_attribute_name(prefix: &str, name: &str) -> String {
    format!("data-{prefix}-{name}")
}

/// `data-<prefix>-end-<name>`, carrying the matching mapping end.
pub fn end_attribute_name(prefix: &str, name: &str) -> String {
    format!("data-{prefix}-end-{name}")
}

/// `data-<prefix>-frame-<id>`, carrying a frame record first interned inside a tag.
pub fn frame_attribute_name(prefix: &str, id: FrameId) -> String {
    format!("data-{prefix}-frame-{id}")
}

/// Render ` name="value"` with the value attribute-escaped.
pub fn attribute(name: &str, value: &str) -> String {
    format!(" {name}=\"{}\"", escape_attr(value))
}
