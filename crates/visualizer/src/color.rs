use core_types::FrameId;
use std::collections::HashMap;
use std::fmt;

/// Multiply-with-carry generator with 32-bit signed state.
///
/// Arithmetic wraps exactly like the browser-side overlay this has to agree
/// with, so a frame gets the same hue in both.
#[derive(Clone, Copy, Debug)]
pub struct Rng {
    m_w: i32,
    m_z: i32,
}

impl Rng {
    pub fn seeded(seed: u64) -> Self {
        // Only the low 32 bits of the seed matter.
        let seed = seed as i32;
        Self {
            m_w: 123_456_789i32.wrapping_add(seed),
            m_z: 987_654_321i32.wrapping_sub(seed),
        }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.m_z = (36969 * i64::from(self.m_z & 0xffff) + i64::from(self.m_z >> 16)) as i32;
        self.m_w = (18000 * i64::from(self.m_w & 0xffff) + i64::from(self.m_w >> 16)) as i32;
        (i64::from(self.m_z.wrapping_shl(16)) + i64::from(self.m_w & 0xffff)) as u32
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }
}

/// Hue in `0..=360` for a frame id. Pure in `frame`.
pub fn deterministic_hue(frame: FrameId) -> u16 {
    let mut rng = Rng::seeded(frame as u64);
    (rng.next_f64() * 360.0 + 0.5).floor() as u16
}

#[derive(Clone, Debug)]
pub struct VisualizerConfig {
    /// Percent.
    pub saturation: u8,
    /// Percent.
    pub lightness: u8,
    pub alpha: f32,
    /// Prefix used to recognise markers in the source view.
    pub marker: marker::MarkerConfig,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            saturation: 56,
            lightness: 56,
            alpha: 0.46,
            marker: marker::MarkerConfig::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsla {
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
    pub alpha: f32,
}

impl fmt::Display for Hsla {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsla({}, {}%, {}%, {})",
            self.hue, self.saturation, self.lightness, self.alpha
        )
    }
}

pub fn deterministic_color(frame: FrameId, config: &VisualizerConfig) -> Hsla {
    Hsla {
        hue: deterministic_hue(frame),
        saturation: config.saturation,
        lightness: config.lightness,
        alpha: config.alpha,
    }
}

/// Per-render memo of frame colors, rendered as CSS.
#[derive(Debug, Default)]
pub struct ColorCache {
    config: VisualizerConfig,
    colors: HashMap<FrameId, String>,
}

impl ColorCache {
    pub fn new(config: VisualizerConfig) -> Self {
        Self {
            config,
            colors: HashMap::new(),
        }
    }

    pub fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    pub fn color(&mut self, frame: FrameId) -> &str {
        let config = &self.config;
        self.colors
            .entry(frame)
            .or_insert_with(|| deterministic_color(frame, config).to_string())
    }

    /// `background-color: …` for a mapping's leaf frame; `None` when the call
    /// stack is empty.
    pub fn background_style(&mut self, leaf: Option<FrameId>) -> Option<String> {
        leaf.map(|frame| format!("background-color: {}", self.color(frame)))
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hues_match_the_browser_overlay() {
        let expected = [(0, 264), (1, 61), (2, 217), (3, 14), (7, 282), (42, 14), (1000, 227)];
        for (frame, hue) in expected {
            assert_eq!(deterministic_hue(frame), hue, "frame {frame}");
        }
    }

    #[test]
    fn color_is_a_pure_function_of_the_id() {
        let config = VisualizerConfig::default();
        assert_eq!(deterministic_color(5, &config), deterministic_color(5, &config));
        assert_eq!(deterministic_color(0, &config).to_string(), "hsla(264, 56%, 56%, 0.46)");
    }

    #[test]
    fn cache_memoizes_per_frame() {
        let mut cache = ColorCache::default();
        let first = cache.color(1).to_string();
        assert_eq!(cache.color(1), first);
        cache.color(2);
        assert_eq!(cache.len(), 2);
        assert_eq!(
            cache.background_style(Some(1)).as_deref(),
            Some("background-color: hsla(61, 56%, 56%, 0.46)")
        );
        assert_eq!(cache.background_style(None), None);
    }

    #[test]
    fn large_seeds_wrap() {
        let mut a = Rng::seeded(1 << 32);
        let mut b = Rng::seeded(0);
        assert_eq!(a.next_u32(), b.next_u32());
    }
}
