//! Renders a sample page through the recorder, reparses it the way a browser
//! would, and writes it back out with highlights and the debug overlay.
//!
//! Usage: `html-source-maps [OUT.html]` (stdout when no path is given).

use collector::{CollectorConfig, collect};
use core_types::Frame;
use html::{parse_document, to_html};
use std::io::{self, Write};
use visualizer::{ColorCache, VisualizerConfig, debug_render, highlight};

mod view;

use crate::view::View;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn header() -> &'static str {
    "HTML Source Map example"
}

fn render() -> String {
    let mut view = View::new();
    view.recorder.write("<!doctype html><html><head><title>html-source-maps</title></head><body>");
    view.print(&["<h1>", header(), "</h1>"]);
    view.say_hi();
    view.print(&["<br>"]);
    for i in 0..10 {
        view.mingle(i);
        view.print(&["<br>"]);
    }
    view.say_bye();
    view.print(&["<br>"]);
    view.inline_block(Frame::new(file!(), line!()).with_function("render"));
    view.recorder.write("</body></html>");
    view.recorder.finish()
}

fn main() -> io::Result<()> {
    let document = render();

    let mut dom = parse_document(&document);
    let map = collect(&dom, &CollectorConfig::default());
    let mut colors = ColorCache::new(VisualizerConfig::default());
    highlight(&mut dom, &map, &mut colors);
    debug_render(&mut dom, &mut colors);
    let out = to_html(&dom);

    match std::env::args().nth(1) {
        Some(path) => std::fs::write(&path, out)?,
        None => io::stdout().lock().write_all(out.as_bytes())?,
    }
    eprintln!(
        "{} frames, {} mappings, {} colors",
        map.frame_count(),
        map.mapping_count(),
        colors.len()
    );
    Ok(())
}
