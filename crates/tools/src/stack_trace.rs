//! Stack-trace text adapters.
//!
//! Both adapters are pure: text in, frames out, no state. Frames come back in
//! the order the trace prints them, innermost call first.

use core_types::Frame;
use regex::Regex;
use std::sync::OnceLock;

/// One parsed trace line before it is shaped into a [`Frame`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawFrame {
    pub function: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

impl RawFrame {
    /// Frames need a file and a line to be interned; anything else is dropped.
    pub fn into_frame(self) -> Option<Frame> {
        let file = self.file?;
        let line = self.line?;
        let mut frame = Frame::new(file, line);
        frame.function = self.function;
        Some(frame)
    }
}

/// Parse a V8-style trace (`    at fn (file:line:col)` per frame).
///
/// Lines that do not look like a frame (the error message, blank lines) are
/// skipped. `eval` wrappers are reduced to their outer location, and `eval` /
/// `<anonymous>` file names become `None`.
pub fn parse_v8_stack(text: &str) -> Vec<RawFrame> {
    let frame_line = v8_frame_line();
    text.lines()
        .filter(|line| frame_line.is_match(line))
        .map(parse_v8_line)
        .collect()
}

fn regex(pattern: &'static str, desc: &'static str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid {desc} regex: {err}"))
}

fn v8_frame_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r"^\s*at .*(\S+:\d+|\(native\))", "v8 frame line"))
}

fn eval_wrapper() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r"(\(eval at [^()]*)|(\),.*$)", "eval wrapper"))
}

fn location() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r"(.+?)(?::(\d+))?(?::(\d+))?$", "location"))
}

fn parse_v8_line(line: &str) -> RawFrame {
    let mut line = line.to_string();
    if line.contains("(eval ") {
        line = line.replace("eval code", "eval");
        line = eval_wrapper().replace_all(&line, "").into_owned();
    }
    let line = line.trim_start().replace("(eval code", "(");
    let mut tokens: Vec<&str> = line.split_whitespace().skip(1).collect();
    let Some(location) = tokens.pop() else {
        return RawFrame::default();
    };
    let (file, line_no, column) = extract_location(location);
    let function = if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" "))
    };
    let file = file.filter(|f| f != "eval" && f != "<anonymous>");
    RawFrame {
        function,
        file,
        line: line_no,
        column,
    }
}

/// Split `file:line:col` (either number optional). Parentheses are ignored;
/// text without any `:` is taken whole as the file.
fn extract_location(url_like: &str) -> (Option<String>, Option<u32>, Option<u32>) {
    if !url_like.contains(':') {
        return (Some(url_like.to_string()), None, None);
    }
    let cleaned: String = url_like.chars().filter(|c| *c != '(' && *c != ')').collect();
    let Some(caps) = location().captures(&cleaned) else {
        return (None, None, None);
    };
    let number = |idx: usize| caps.get(idx).and_then(|m| m.as_str().parse::<u32>().ok());
    let file = caps.get(1).map(|m| m.as_str().to_string());
    (file, number(2), number(3))
}

/// Parse the text form of `std::backtrace::Backtrace`.
///
/// ```text
///    3: my_crate::view::View::say_hi
///              at ./src/view.rs:20:9
/// ```
///
/// Symbols without an `at` line keep `file`/`line` unset.
pub fn parse_rust_backtrace(text: &str) -> Vec<RawFrame> {
    let mut frames: Vec<RawFrame> = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(location) = trimmed.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut()
                && frame.file.is_none()
            {
                let (file, line_no, column) = extract_location(location);
                frame.file = file;
                frame.line = line_no;
                frame.column = column;
            }
            continue;
        }
        let Some((index, symbol)) = trimmed.split_once(": ") else {
            continue;
        };
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        frames.push(RawFrame {
            function: Some(symbol.trim().to_string()),
            ..RawFrame::default()
        });
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_TRACE: &str = "Error: boom
    at View.sayHi (http://localhost/js/view.js:12:7)
    at render (http://localhost/js/app.js:40:3)
    at http://localhost/js/app.js:55:1
    at Array.forEach (<anonymous>)
    at Object.eval (eval at <anonymous> (http://localhost/app.js:3:1), <anonymous>:1:1)";

    #[test]
    fn parses_named_and_anonymous_frames() {
        let frames = parse_v8_stack(CHROME_TRACE);
        assert_eq!(frames.len(), 4, "got: {frames:?}");
        assert_eq!(
            frames[0],
            RawFrame {
                function: Some("View.sayHi".to_string()),
                file: Some("http://localhost/js/view.js".to_string()),
                line: Some(12),
                column: Some(7),
            }
        );
        assert_eq!(frames[1].function.as_deref(), Some("render"));
        assert_eq!(frames[2].function, None);
        assert_eq!(frames[2].line, Some(55));
    }

    #[test]
    fn eval_frames_resolve_to_the_outer_location() {
        let frames = parse_v8_stack(CHROME_TRACE);
        let eval = &frames[3];
        assert_eq!(eval.function.as_deref(), Some("Object.eval"));
        assert_eq!(eval.file.as_deref(), Some("http://localhost/app.js"), "got: {eval:?}");
        assert_eq!(eval.line, Some(3));
    }

    #[test]
    fn anonymous_files_are_dropped() {
        let frames = parse_v8_stack("    at <anonymous>:1:1");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].file, None);
        assert!(frames[0].clone().into_frame().is_none());
    }

    #[test]
    fn native_frames_keep_their_marker_as_file() {
        let frames = parse_v8_stack("    at Math.max (native)");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].file.as_deref(), Some("(native)"));
        assert_eq!(frames[0].line, None);
    }

    #[test]
    fn non_frame_lines_are_skipped() {
        assert!(parse_v8_stack("TypeError: x is undefined\n\n  at nothing here").is_empty());
    }

    #[test]
    fn raw_frame_shapes_into_frame() {
        let frame = parse_v8_stack("  at a (f.js:3:9)")
            .pop()
            .and_then(RawFrame::into_frame)
            .unwrap();
        assert_eq!(frame, Frame::new("f.js", 3).with_function("a"));
    }

    #[test]
    fn locations_take_up_to_two_trailing_numbers() {
        assert_eq!(
            extract_location("a:b:12"),
            (Some("a:b".to_string()), Some(12), None)
        );
        assert_eq!(
            extract_location("(file:12:34:56)"),
            (Some("file:12".to_string()), Some(34), Some(56))
        );
        assert_eq!(extract_location(":12"), (Some(":12".to_string()), None, None));
        assert_eq!(extract_location("(native)"), (Some("(native)".to_string()), None, None));
    }

    #[test]
    fn parses_rust_backtrace_text() {
        let text = "   0: std::backtrace::Backtrace::force_capture
             at /rustc/abc/library/std/src/backtrace.rs:312:13
   1: demo::view::View::say_hi
             at ./src/view.rs:20:9
   2: demo::main
             at ./src/main.rs:7:5
   3: __libc_start_main";
        let frames = parse_rust_backtrace(text);
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[1].function.as_deref(), Some("demo::view::View::say_hi"));
        assert_eq!(frames[1].file.as_deref(), Some("./src/view.rs"));
        assert_eq!(frames[1].line, Some(20));
        assert_eq!(frames[1].column, Some(9));
        assert_eq!(frames[3].file, None);
    }
}
