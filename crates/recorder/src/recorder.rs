use crate::registry::{FrameRegistry, Interned};
use crate::source::{CallSite, CallStackSource};
use core_types::{Frame, FrameId, Mapping, MappingId, MappingTree, NestEvent, build_forest};
use marker::{
    MarkerConfig, attribute, comment, end_attribute_name, frame_attribute_name, frame_payload,
    mapping_end_payload, mapping_payload, start_attribute_name,
};
use serde::Serialize;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::panic::Location;

/// Result of [`Recorder::begin_mark`]: the joined text the caller should emit
/// and the id to close with [`Recorder::end_mark`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mark {
    pub text: String,
    pub id: MappingId,
}

/// A mapping carried entirely in attributes of one element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeMark {
    pub id: MappingId,
    /// The joined attribute value the mapping describes (unescaped).
    pub value: String,
    /// Marker attributes for the enclosing element, in emission order:
    /// newly interned frames, then the start, then the end.
    pub attributes: Vec<(String, String)>,
}

impl AttributeMark {
    /// Marker attributes rendered as ` name="value"` pairs.
    pub fn markup(&self) -> String {
        self.attributes
            .iter()
            .map(|(name, value)| attribute(name, value))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkError {
    /// Unknown id, or a mapping that was already closed.
    NotOpen(MappingId),
    /// Closing would leave `expected` overlapping `got`.
    NotInnermost { expected: MappingId, got: MappingId },
}

impl fmt::Display for MarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkError::NotOpen(id) => write!(f, "mapping {id} is not open"),
            MarkError::NotInnermost { expected, got } => write!(
                f,
                "mapping {got} cannot close before the innermost open mapping {expected}"
            ),
        }
    }
}

impl std::error::Error for MarkError {}

/// Snapshot of everything a render recorded.
#[derive(Clone, Debug, Serialize)]
pub struct RecorderData {
    pub frames: Vec<Frame>,
    pub mappings: Vec<Mapping>,
    /// Concatenated text of every mark, without markers.
    pub output: String,
}

/// Records provenance for one render.
///
/// The recorder owns the document being produced. Marks write their markers
/// into it as they happen; text is written by the caller (usually through
/// [`Recorder::print`]) so it can also be placed elsewhere, such as inside an
/// attribute.
///
/// Invariants:
/// - Frame and mapping ids are dense and assigned in creation order.
/// - A frame record is written exactly once, when the frame is first interned.
/// - Mappings close innermost-first; overlapping closes are rejected.
pub struct Recorder {
    config: MarkerConfig,
    source: Box<dyn CallStackSource>,
    registry: FrameRegistry,
    mappings: Vec<Mapping>,
    closed: Vec<bool>,
    open: Vec<MappingId>,
    events: Vec<NestEvent>,
    frame_stack: Vec<Frame>,
    output: String,
    document: String,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Recorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recorder")
            .field("frames", &self.registry.len())
            .field("mappings", &self.mappings.len())
            .field("open", &self.open)
            .field("frame_stack", &self.frame_stack.len())
            .finish()
    }
}

impl Recorder {
    pub fn new() -> Self {
        Self::with_config(MarkerConfig::default())
    }

    pub fn with_config(config: MarkerConfig) -> Self {
        Self {
            config,
            source: Box::new(CallSite),
            registry: FrameRegistry::new(),
            mappings: Vec::new(),
            closed: Vec::new(),
            open: Vec::new(),
            events: Vec::new(),
            frame_stack: Vec::new(),
            output: String::new(),
            document: String::new(),
        }
    }

    pub fn with_source(mut self, source: impl CallStackSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    pub fn config(&self) -> &MarkerConfig {
        &self.config
    }

    /// Open a mapping for `parts` joined with single spaces.
    ///
    /// With `explicit` frames the call stack is exactly those frames;
    /// otherwise it is the captured stack followed by the manual frame stack.
    /// Never fails: a source that yields nothing produces an empty call stack.
    #[track_caller]
    pub fn begin_mark(&mut self, explicit: Option<&[Frame]>, parts: &[&str]) -> Mark {
        let call_site = Location::caller();
        let text = parts.join(" ");
        let stack = self.resolve_stack(explicit, call_site);

        let mut call_stack = Vec::with_capacity(stack.len());
        for frame in stack {
            match self.registry.intern(frame) {
                Interned::New(id) => {
                    let record = self.frame_record(id);
                    self.document.push_str(&comment(&record));
                    call_stack.push(id);
                }
                Interned::Existing(id) => call_stack.push(id),
            }
        }

        let id = self.push_mapping(call_stack, text.len());
        self.open.push(id);
        self.events.push(NestEvent::Open(id));
        let payload = mapping_payload(&self.config.prefix, id, &self.mappings[id]);
        self.document.push_str(&comment(&payload));
        self.output.push_str(&text);

        log::trace!(target: "hsm.recorder", "begin mapping {id} ({} bytes)", text.len());
        Mark { text, id }
    }

    /// Close a mapping opened with [`Recorder::begin_mark`].
    ///
    /// Only the innermost open mapping may close. On error nothing is
    /// written, so the document stays well-nested.
    pub fn end_mark(&mut self, id: MappingId) -> Result<(), MarkError> {
        if self.closed.get(id).is_none_or(|closed| *closed) {
            log::warn!(target: "hsm.recorder", "end for mapping {id} which is not open");
            return Err(MarkError::NotOpen(id));
        }
        match self.open.last() {
            Some(&top) if top == id => {}
            Some(&top) => {
                log::warn!(
                    target: "hsm.recorder",
                    "rejecting overlapping end: {id} closes before {top}"
                );
                return Err(MarkError::NotInnermost {
                    expected: top,
                    got: id,
                });
            }
            None => return Err(MarkError::NotOpen(id)),
        }
        self.open.pop();
        self.closed[id] = true;
        self.events.push(NestEvent::Close(id));
        self.document
            .push_str(&comment(&mapping_end_payload(&self.config.prefix, id)));
        Ok(())
    }

    /// Append raw markup to the document without recording anything.
    pub fn write(&mut self, markup: &str) {
        self.document.push_str(markup);
    }

    /// Record `parts`, write the joined text, and close the mapping.
    #[track_caller]
    pub fn print(&mut self, parts: &[&str]) -> MappingId {
        let Mark { text, id } = self.begin_mark(None, parts);
        self.document.push_str(&text);
        self.close_own(id);
        id
    }

    /// Record an already-rendered chunk against an explicit call stack.
    ///
    /// This covers markup produced outside the recorder (a captured template
    /// buffer, for instance) whose real origin is known to the caller.
    #[track_caller]
    pub fn mark_chunk(&mut self, frames: &[Frame], chunk: &str) -> MappingId {
        let Mark { text, id } = self.begin_mark(Some(frames), &[chunk]);
        self.document.push_str(&text);
        self.close_own(id);
        id
    }

    /// Record an attribute value. The mapping opens and closes within the
    /// returned marker attributes, which the caller places on the element
    /// that carries the value.
    #[track_caller]
    pub fn attribute_mark(
        &mut self,
        name: &str,
        explicit: Option<&[Frame]>,
        parts: &[&str],
    ) -> AttributeMark {
        let call_site = Location::caller();
        let value = parts.join(" ");
        let stack = self.resolve_stack(explicit, call_site);
        let prefix = self.config.prefix.clone();

        let mut attributes = Vec::new();
        let mut call_stack = Vec::with_capacity(stack.len());
        for frame in stack {
            let interned = self.registry.intern(frame);
            if let Interned::New(id) = interned {
                attributes.push((frame_attribute_name(&prefix, id), self.frame_record(id)));
            }
            call_stack.push(interned.id());
        }

        let id = self.push_mapping(call_stack, value.len());
        self.closed[id] = true;
        self.events.push(NestEvent::Leaf(id));
        attributes.push((
            start_attribute_name(&prefix, name),
            mapping_payload(&prefix, id, &self.mappings[id]),
        ));
        attributes.push((end_attribute_name(&prefix, name), mapping_end_payload(&prefix, id)));
        self.output.push_str(&value);

        AttributeMark {
            id,
            value,
            attributes,
        }
    }

    pub fn push_frame(&mut self, frame: Frame) {
        self.frame_stack.push(frame);
    }

    /// Pop the most recent manual frame. An unpaired push is not detected; it
    /// simply stays on every later mapping.
    pub fn pop_frame(&mut self) -> Option<Frame> {
        self.frame_stack.pop()
    }

    /// Push `frame` for the lifetime of the returned guard.
    pub fn enter(&mut self, frame: Frame) -> FrameScope<'_> {
        self.push_frame(frame);
        FrameScope { recorder: self }
    }

    pub fn frame_stack(&self) -> &[Frame] {
        &self.frame_stack
    }

    pub fn frames(&self) -> &[Frame] {
        self.registry.frames()
    }

    pub fn frame(&self, id: FrameId) -> Option<&Frame> {
        self.registry.get(id)
    }

    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    pub fn mapping(&self, id: MappingId) -> Option<&Mapping> {
        self.mappings.get(id)
    }

    /// Ids of mappings begun but not yet closed, outermost first.
    pub fn open_marks(&self) -> &[MappingId] {
        &self.open
    }

    /// Nesting of every mapping recorded so far.
    pub fn forest(&self) -> Vec<MappingTree> {
        build_forest(self.events.iter().copied())
    }

    /// Text of every mark concatenated, without markers.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// The marked-up document produced so far.
    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn data(&self) -> RecorderData {
        RecorderData {
            frames: self.registry.frames().to_vec(),
            mappings: self.mappings.clone(),
            output: self.output.clone(),
        }
    }

    /// The document as-is, open marks included.
    pub fn into_document(self) -> String {
        self.document
    }

    /// Close anything still open, innermost first, and hand back the document.
    pub fn finish(mut self) -> String {
        while let Some(&id) = self.open.last() {
            log::warn!(target: "hsm.recorder", "mapping {id} left open; closing at end of render");
            self.close_own(id);
        }
        self.document
    }

    fn resolve_stack(
        &self,
        explicit: Option<&[Frame]>,
        call_site: &'static Location<'static>,
    ) -> Vec<Frame> {
        if let Some(frames) = explicit {
            return frames.to_vec();
        }
        let mut stack = self.source.capture(call_site);
        stack.extend(self.frame_stack.iter().cloned());
        stack
    }

    fn push_mapping(&mut self, call_stack: Vec<FrameId>, len: usize) -> MappingId {
        let id = self.mappings.len();
        let mut mapping = Mapping::new(self.config.source.as_str(), call_stack);
        mapping.len = Some(len);
        self.mappings.push(mapping);
        self.closed.push(false);
        id
    }

    fn frame_record(&self, id: FrameId) -> String {
        match self.registry.get(id) {
            Some(frame) => frame_payload(&self.config.prefix, id, frame),
            None => String::new(),
        }
    }

    // `id` was opened by this recorder and is innermost, so closing cannot fail.
    fn close_own(&mut self, id: MappingId) {
        if let Err(err) = self.end_mark(id) {
            log::warn!(target: "hsm.recorder", "{err}");
        }
    }
}

/// Guard returned by [`Recorder::enter`]; pops its frame on drop.
pub struct FrameScope<'a> {
    recorder: &'a mut Recorder,
}

impl Deref for FrameScope<'_> {
    type Target = Recorder;

    fn deref(&self) -> &Recorder {
        self.recorder
    }
}

impl DerefMut for FrameScope<'_> {
    fn deref_mut(&mut self) -> &mut Recorder {
        self.recorder
    }
}

impl Drop for FrameScope<'_> {
    fn drop(&mut self) {
        self.recorder.pop_frame();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FixedStack;

    fn site(line: u32) -> Frame {
        Frame::new("page.rs", line)
    }

    #[test]
    fn parts_are_joined_with_single_spaces() {
        let mut rec = Recorder::new();
        let mark = rec.begin_mark(Some(&[site(1)]), &["<h1>", "Title", "</h1>"]);
        assert_eq!(mark.text, "<h1> Title </h1>");
        assert_eq!(rec.mapping(mark.id).unwrap().len, Some(16));
        rec.end_mark(mark.id).unwrap();
        assert_eq!(rec.output(), "<h1> Title </h1>");
    }

    #[test]
    fn frame_records_precede_the_first_mapping_that_uses_them() {
        let mut rec = Recorder::new();
        rec.mark_chunk(&[site(1)], "a");
        rec.mark_chunk(&[site(1)], "b");
        let doc = rec.document();
        assert_eq!(doc.matches("hm frame:").count(), 1, "doc: {doc}");
        assert!(doc.starts_with(r#"<!-- hm frame: 0 {"file":"page.rs","line":1}-->"#));
        assert!(doc.contains(concat!(
            r#"<!-- hm mapping: 1 {"source":"rust","callStack":[0],"len":1}-->"#,
            "b<!-- hm mapping end: 1-->",
        )));
    }

    #[test]
    fn print_attributes_to_the_calling_line() {
        let mut rec = Recorder::new();
        let line = line!() + 1;
        let id = rec.print(&["hello"]);
        let frame = &rec.frames()[rec.mapping(id).unwrap().call_stack[0]];
        assert_eq!(frame, &Frame::new(file!(), line));
    }

    #[test]
    fn manual_frames_are_appended_after_the_captured_stack() {
        let mut rec = Recorder::new().with_source(FixedStack(vec![site(10)]));
        rec.push_frame(site(100));
        let a = rec.print(&["a"]);
        let b = rec.print(&["b"]);
        rec.pop_frame();
        let c = rec.print(&["c"]);

        let template = rec.frames().iter().position(|f| f.line == 100).unwrap();
        for id in [a, b] {
            assert_eq!(rec.mapping(id).unwrap().call_stack.last(), Some(&template));
        }
        assert!(!rec.mapping(c).unwrap().call_stack.contains(&template));
    }

    #[test]
    fn explicit_frames_replace_capture_and_manual_stack() {
        let mut rec = Recorder::new().with_source(FixedStack(vec![site(10)]));
        rec.push_frame(site(100));
        let mark = rec.begin_mark(Some(&[site(7)]), &["x"]);
        assert_eq!(rec.mapping(mark.id).unwrap().call_stack, vec![0]);
        assert_eq!(rec.frames(), &[site(7)]);
    }

    #[test]
    fn empty_capture_degrades_to_no_frames() {
        let mut rec = Recorder::new().with_source(FixedStack(Vec::new()));
        let id = rec.print(&["plain"]);
        assert!(rec.mapping(id).unwrap().call_stack.is_empty());
        assert_eq!(
            rec.document(),
            concat!(
                r#"<!-- hm mapping: 0 {"source":"rust","callStack":[],"len":5}-->"#,
                "plain<!-- hm mapping end: 0-->",
            )
        );
    }

    #[test]
    fn scope_guard_pops_on_drop() {
        let mut rec = Recorder::new().with_source(FixedStack(Vec::new()));
        {
            let mut scope = rec.enter(site(50));
            scope.print(&["inside"]);
            assert_eq!(scope.frame_stack().len(), 1);
        }
        assert!(rec.frame_stack().is_empty());
        let outside = rec.print(&["outside"]);
        assert!(rec.mapping(outside).unwrap().call_stack.is_empty());
    }

    #[test]
    fn overlapping_ends_are_rejected() {
        let mut rec = Recorder::new();
        let outer = rec.begin_mark(Some(&[site(1)]), &["outer"]);
        let inner = rec.begin_mark(Some(&[site(2)]), &["inner"]);
        let before = rec.document().len();

        assert_eq!(
            rec.end_mark(outer.id),
            Err(MarkError::NotInnermost {
                expected: inner.id,
                got: outer.id
            })
        );
        assert_eq!(rec.document().len(), before);

        rec.end_mark(inner.id).unwrap();
        rec.end_mark(outer.id).unwrap();
        assert_eq!(rec.end_mark(outer.id), Err(MarkError::NotOpen(outer.id)));
        assert_eq!(rec.end_mark(42), Err(MarkError::NotOpen(42)));
    }

    #[test]
    fn forest_tracks_nesting() {
        let mut rec = Recorder::new();
        let outer = rec.begin_mark(Some(&[site(1)]), &["outer"]);
        let inner = rec.begin_mark(Some(&[site(2)]), &["inner"]);
        rec.end_mark(inner.id).unwrap();
        rec.end_mark(outer.id).unwrap();
        rec.mark_chunk(&[site(3)], "after");

        let forest = rec.forest();
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].id, outer.id);
        assert_eq!(forest[0].children, vec![MappingTree::leaf(inner.id)]);
    }

    #[test]
    fn attribute_marks_carry_frames_and_both_boundaries() {
        let mut rec = Recorder::new();
        let mark = rec.attribute_mark("href", Some(&[site(3)]), &["/about"]);
        assert_eq!(mark.value, "/about");
        let names: Vec<&str> = mark.attributes.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["data-hm-frame-0", "data-hm-href", "data-hm-end-href"]);
        assert_eq!(mark.attributes[2].1, "hm mapping end: 0");
        assert!(mark.markup().contains("&quot;callStack&quot;:[0]"));
        assert!(rec.open_marks().is_empty());
        assert_eq!(rec.end_mark(mark.id), Err(MarkError::NotOpen(mark.id)));
    }

    #[test]
    fn finish_closes_dangling_marks() {
        let mut rec = Recorder::new();
        rec.begin_mark(Some(&[site(1)]), &["a"]);
        rec.begin_mark(Some(&[site(2)]), &["b"]);
        let doc = rec.finish();
        assert!(doc.ends_with("<!-- hm mapping end: 1--><!-- hm mapping end: 0-->"), "doc: {doc}");
    }

    #[test]
    fn data_snapshot_serializes() {
        let mut rec = Recorder::new();
        rec.mark_chunk(&[site(1).with_function("main")], "x");
        let json = serde_json::to_value(rec.data()).unwrap();
        assert_eq!(json["frames"][0]["function"], "main");
        assert_eq!(json["mappings"][0]["callStack"][0], 0);
        assert_eq!(json["output"], "x");
    }
}
