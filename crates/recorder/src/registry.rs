use core_types::{Frame, FrameId, FrameKey};
use std::collections::HashMap;

/// Result of interning a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interned {
    /// First sighting; the caller owes the document a frame record.
    New(FrameId),
    Existing(FrameId),
}

impl Interned {
    pub fn id(self) -> FrameId {
        match self {
            Interned::New(id) | Interned::Existing(id) => id,
        }
    }
}

/// Deduplicating frame table.
///
/// Ids are dense and handed out in first-seen order. The first frame seen for
/// a `(file, line)` keeps its function/class text; later ones are discarded.
#[derive(Debug, Default)]
pub struct FrameRegistry {
    frames: Vec<Frame>,
    index: HashMap<FrameKey, FrameId>,
}

impl FrameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, frame: Frame) -> Interned {
        let key = frame.key();
        if let Some(&id) = self.index.get(&key) {
            return Interned::Existing(id);
        }
        let id = self.frames.len();
        self.frames.push(frame);
        self.index.insert(key, id);
        Interned::New(id)
    }

    pub fn get(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(id)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
