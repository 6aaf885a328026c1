#![no_main]

use collector::{CollectorConfig, collect};
use html::parse_document;
use libfuzzer_sys::fuzz_target;
use visualizer::{ColorCache, Inspector, debug_render, highlight};

const MAX_LEN: usize = 64 * 1024;

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(&data[..data.len().min(MAX_LEN)]);
    let mut dom = parse_document(&input);
    let config = CollectorConfig {
        max_index: 4096,
        ..CollectorConfig::default()
    };
    let map = collect(&dom, &config);

    for node in dom.descendants(dom.root()).collect::<Vec<_>>() {
        let _ = map.nearest_mapping(&dom, node);
    }
    let _ = map.forest(&dom);

    let mut colors = ColorCache::default();
    highlight(&mut dom, &map, &mut colors);
    assert_eq!(highlight(&mut dom, &map, &mut colors), 0, "highlight is idempotent");

    let inspector = Inspector::new(debug_render(&mut dom, &mut colors));
    let fragments = inspector.overlay().fragments;
    for node in dom.descendants(fragments).collect::<Vec<_>>() {
        let _ = inspector.pointer_moved(&mut dom, &map, node);
    }
});
