//! Call-stack capture capabilities.
//!
//! The recorder never walks the stack itself; the host hands it a
//! [`CallStackSource`]. Every source returns frames caller-nearest first and
//! must already exclude the recorder's own entry points.

use core_types::Frame;
use std::backtrace::Backtrace;
use std::panic::Location;
use tools::stack_trace::{RawFrame, parse_rust_backtrace};

pub trait CallStackSource {
    /// `call_site` is the `#[track_caller]` location of the recorder entry
    /// point that triggered the capture.
    fn capture(&self, call_site: &'static Location<'static>) -> Vec<Frame>;
}

/// One frame: the location that called into the recorder.
#[derive(Clone, Copy, Debug, Default)]
pub struct CallSite;

impl CallStackSource for CallSite {
    fn capture(&self, call_site: &'static Location<'static>) -> Vec<Frame> {
        vec![Frame::new(call_site.file(), call_site.line())]
    }
}

/// A caller-supplied stack, returned verbatim for every capture.
#[derive(Clone, Debug, Default)]
pub struct FixedStack(pub Vec<Frame>);

impl CallStackSource for FixedStack {
    fn capture(&self, _call_site: &'static Location<'static>) -> Vec<Frame> {
        self.0.clone()
    }
}

/// Full symbolized stack from `std::backtrace`.
///
/// Everything up to and including the last frame whose symbol belongs to one
/// of `internal_prefixes` is dropped. So are runtime frames, matched by symbol
/// prefix or by a file under one of `runtime_paths`, and frames without a
/// file/line. Expensive; meant for debug renders.
#[derive(Clone, Debug)]
pub struct BacktraceSource {
    pub internal_prefixes: Vec<String>,
    pub runtime_prefixes: Vec<String>,
    pub runtime_paths: Vec<String>,
}

impl Default for BacktraceSource {
    fn default() -> Self {
        Self {
            internal_prefixes: vec!["recorder::".to_string(), "std::backtrace".to_string()],
            runtime_prefixes: ["std::", "core::", "alloc::", "test::", "__"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
            runtime_paths: vec!["/rustc/".to_string()],
        }
    }
}

fn symbol_has_prefix(symbol: &str, prefixes: &[String]) -> bool {
    let bare = symbol.strip_prefix('<').unwrap_or(symbol);
    prefixes.iter().any(|p| bare.starts_with(p.as_str()))
}

impl BacktraceSource {
    /// Also treat `prefix` as a recorder entry point, e.g. a host wrapper
    /// around [`Recorder::print`](crate::Recorder::print).
    pub fn with_internal_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.internal_prefixes.push(prefix.into());
        self
    }

    fn is_runtime(&self, frame: &RawFrame) -> bool {
        let by_symbol = frame
            .function
            .as_deref()
            .is_some_and(|s| symbol_has_prefix(s, &self.runtime_prefixes));
        let by_path = frame
            .file
            .as_deref()
            .is_some_and(|file| self.runtime_paths.iter().any(|p| file.starts_with(p.as_str())));
        by_symbol || by_path
    }

    /// Shape already-rendered backtrace text into frames.
    pub fn frames_from_text(&self, text: &str) -> Vec<Frame> {
        let raw = parse_rust_backtrace(text);
        let start = raw
            .iter()
            .rposition(|f| {
                f.function
                    .as_deref()
                    .is_some_and(|s| symbol_has_prefix(s, &self.internal_prefixes))
            })
            .map_or(0, |i| i + 1);
        raw.into_iter()
            .skip(start)
            .filter(|f| !self.is_runtime(f))
            .filter_map(|f| f.into_frame())
            .collect()
    }
}

impl CallStackSource for BacktraceSource {
    fn capture(&self, call_site: &'static Location<'static>) -> Vec<Frame> {
        let text = Backtrace::force_capture().to_string();
        let frames = self.frames_from_text(&text);
        if frames.is_empty() {
            log::trace!(
                target: "hsm.recorder",
                "backtrace unavailable, falling back to call site {}:{}",
                call_site.file(),
                call_site.line()
            );
            return CallSite.capture(call_site);
        }
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_site_reports_the_tracked_location() {
        #[track_caller]
        fn here() -> &'static Location<'static> {
            Location::caller()
        }
        let loc = here();
        let frames = CallSite.capture(loc);
        assert_eq!(frames, vec![Frame::new(file!(), loc.line())]);
    }

    #[test]
    fn backtrace_text_drops_recorder_and_runtime_frames() {
        let text = "   0: std::backtrace::Backtrace::force_capture
             at /rustc/x/library/std/src/backtrace.rs:312:13
   1: <recorder::source::BacktraceSource as recorder::source::CallStackSource>::capture
             at ./crates/recorder/src/source.rs:90:20
   2: recorder::recorder::Recorder::begin_mark
             at ./crates/recorder/src/recorder.rs:120:9
   3: demo::view::View::say_hi
             at ./src/view.rs:20:9
   4: demo::main
             at ./src/main.rs:7:5
   5: core::ops::function::FnOnce::call_once
             at /rustc/x/library/core/src/ops/function.rs:250:5
   6: <fn() -> core::result::Result<(), alloc::string::String> as core::ops::function::FnOnce<()>>::call_once
             at /rustc/x/library/core/src/ops/function.rs:250:5
   7: test::run_test::{{closure}}
             at /rustc/x/library/test/src/lib.rs:648:41
   8: main";
        let frames = BacktraceSource::default().frames_from_text(text);
        assert_eq!(
            frames,
            vec![
                Frame::new("./src/view.rs", 20).with_function("demo::view::View::say_hi"),
                Frame::new("./src/main.rs", 7).with_function("demo::main"),
            ]
        );
    }

    #[test]
    fn host_wrappers_can_be_marked_internal() {
        let text = "   0: recorder::recorder::Recorder::print
             at ./crates/recorder/src/recorder.rs:216:9
   1: demo::view::View::print
             at ./src/view.rs:19:9
   2: demo::view::View::say_hi
             at ./src/view.rs:23:9";
        let source = BacktraceSource::default().with_internal_prefix("demo::view::View::print");
        assert_eq!(
            source.frames_from_text(text),
            vec![Frame::new("./src/view.rs", 23).with_function("demo::view::View::say_hi")]
        );
    }
}
