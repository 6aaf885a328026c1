//! Debug rendering over a collected source map.
//!
//! Colors are derived from frame ids alone, so the same frame gets the same
//! color in every render and in the browser-side overlay.

mod color;
mod fragments;
mod highlight;
mod inspector;
mod overlay;

pub use crate::color::{
    ColorCache, Hsla, Rng, VisualizerConfig, deterministic_color, deterministic_hue,
};
pub use crate::fragments::{FRAGMENTS_CLASS, render_fragments};
pub use crate::highlight::{HIGHLIGHT_CLASS, highlight};
pub use crate::inspector::{Inspector, InspectorView};
pub use crate::overlay::{
    OVERLAY_CLASS, Overlay, SELECTED_MAPPING_CLASS, TOOLTIP_CLASS, debug_render, remove_overlays,
};
