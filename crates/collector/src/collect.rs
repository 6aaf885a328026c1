use crate::CollectorConfig;
use crate::source_map::{Encoding, MarkerSite, SourceMap};
use html::{Dom, NodeKind};
use marker::{Marker, MarkerError, is_marker_attribute, parse_marker};

/// Rebuild frames and mappings from the markers in `dom`.
///
/// Two sweeps in document order: every comment first, then every marker
/// attribute. A mapping must therefore start and end in the same encoding.
/// Malformed markers are skipped; collection itself never fails.
pub fn collect(dom: &Dom, config: &CollectorConfig) -> SourceMap {
    let mut map = SourceMap::default();

    for (position, node) in dom.descendants(dom.root()).enumerate() {
        if let Some(NodeKind::Comment(text)) = dom.kind(node) {
            let site = MarkerSite {
                node,
                encoding: Encoding::Comment,
                position,
            };
            read(&mut map, text, site, config);
        }
    }

    for (position, node) in dom.descendants(dom.root()).enumerate() {
        if let Some(NodeKind::Element { attributes, .. }) = dom.kind(node) {
            let markers = attributes
                .iter()
                .filter(|(name, _)| is_marker_attribute(name, &config.marker.prefix));
            for (_, value) in markers {
                let site = MarkerSite {
                    node,
                    encoding: Encoding::Attribute,
                    position,
                };
                read(&mut map, value.as_deref().unwrap_or(""), site, config);
            }
        }
    }

    log::debug!(
        target: "hsm.collector",
        "collected {} frames and {} mappings from {} nodes",
        map.frame_count(),
        map.mapping_count(),
        dom.len()
    );
    map
}

fn read(map: &mut SourceMap, text: &str, site: MarkerSite, config: &CollectorConfig) {
    let marker = match parse_marker(text, &config.marker) {
        Ok(marker) => marker,
        Err(MarkerError::NotAMarker) => return,
        Err(err) => {
            log::debug!(
                target: "hsm.collector",
                "skipping malformed marker at node {}: {err}",
                site.node
            );
            return;
        }
    };
    if marker.index() > config.max_index {
        log::debug!(
            target: "hsm.collector",
            "skipping marker index {} above limit {}",
            marker.index(),
            config.max_index
        );
        return;
    }
    match marker {
        Marker::Frame { index, frame } => map.set_frame(index, frame),
        Marker::MappingStart { index, mapping } => map.start_mapping(index, mapping, site),
        Marker::MappingEnd { index } => map.end_mapping(index, site),
    }
}
