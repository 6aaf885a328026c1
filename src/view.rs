use core_types::Frame;
use recorder::{BacktraceSource, Recorder};

/// Sample page renderer. Every piece of output goes through the recorder, so
/// each one maps back to the full call stack that produced it.
pub struct View {
    pub recorder: Recorder,
}

impl View {
    /// Captures symbolized backtraces. Builds without debug symbols fall back
    /// to the `#[track_caller]` location of each print.
    pub fn new() -> Self {
        let source = BacktraceSource::default()
            .with_internal_prefix(concat!(module_path!(), "::View::print"));
        Self {
            recorder: Recorder::new().with_source(source),
        }
    }

    #[track_caller]
    pub fn print(&mut self, parts: &[&str]) {
        self.recorder.print(parts);
    }

    pub fn say_hi(&mut self) {
        self.print(&["<div>hello world</div>"]);
    }

    pub fn mingle(&mut self, i: usize) {
        self.print(&["blah blah", &i.to_string()]);
    }

    pub fn say_bye(&mut self) {
        self.mingle(100);
        self.print(&["<div>goodbye world</div>"]);
    }

    pub fn say_compliment(&mut self) {
        self.print(&["you're beautiful"]);
    }

    /// A hand-written block whose origin is known up front, with a nested
    /// recorded call inside it.
    pub fn inline_block(&mut self, origin: Frame) {
        self.recorder.push_frame(origin.clone());
        let block = self
            .recorder
            .begin_mark(Some(&[origin]), &["\n<p>sup</p><br>\n<p>hey there, "]);
        self.recorder.write(&block.text);
        self.say_compliment();
        self.recorder.write("!</p>\n");
        if let Err(err) = self.recorder.end_mark(block.id) {
            log::warn!(target: "hsm.recorder", "{err}");
        }
        self.recorder.pop_frame();
    }
}
