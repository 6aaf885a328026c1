#![no_main]

use libfuzzer_sys::fuzz_target;
use marker::{
    Marker, MarkerConfig, comment, frame_payload, mapping_end_payload, mapping_payload,
    parse_marker,
};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let config = MarkerConfig::default();
    let Ok(marker) = parse_marker(&text, &config) else {
        return;
    };

    // Anything that parses must re-encode into a comment that cannot end early
    // and parses back to the same marker.
    let payload = match &marker {
        Marker::Frame { index, frame } => frame_payload(&config.prefix, *index, frame),
        Marker::MappingStart { index, mapping } => mapping_payload(&config.prefix, *index, mapping),
        Marker::MappingEnd { index } => mapping_end_payload(&config.prefix, *index),
    };
    let encoded = comment(&payload);
    assert_eq!(encoded.matches("-->").count(), 1, "{encoded}");
    let reparsed = parse_marker(&payload, &config).expect("re-encoded marker parses");
    assert_eq!(reparsed, marker);
});
