//! Stack of nested output scopes.
//!
//! The bottom frame is the root command's output map. Pushing under a key
//! makes the map stored at that key in the current frame the new write
//! target; popping writes it back. A map already present at the key is
//! reused, which is how repeated child invocations accumulate under the same
//! parent slot.

use serde_json::{Map, Value};

pub type Frame = Map<String, Value>;

#[derive(Debug, Clone, Default)]
pub struct ScopeStack {
    root: Frame,
    /// Frames detached from their parent while they are being written, with
    /// the key they go back under.
    nested: Vec<(String, Frame)>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames above the root.
    pub fn depth(&self) -> usize {
        self.nested.len()
    }

    pub fn current(&self) -> &Frame {
        self.nested.last().map(|(_, f)| f).unwrap_or(&self.root)
    }

    pub fn current_mut(&mut self) -> &mut Frame {
        match self.nested.last_mut() {
            Some((_, f)) => f,
            None => &mut self.root,
        }
    }

    pub fn push(&mut self, key: String) {
        let parent = self.current_mut();
        let frame = match parent.get_mut(&key) {
            // Leave an empty placeholder so the slot keeps its position.
            Some(Value::Object(existing)) => std::mem::take(existing),
            _ => {
                parent.insert(key.clone(), Value::Object(Frame::new()));
                Frame::new()
            }
        };
        self.nested.push((key, frame));
    }

    pub fn pop(&mut self, key: &str) {
        let Some((pushed, frame)) = self.nested.pop() else {
            return;
        };
        debug_assert_eq!(pushed, key, "scope pop does not match the last push");
        self.current_mut().insert(pushed, Value::Object(frame));
    }

    /// Root frame; only complete once every pushed scope has been popped.
    pub fn root(&self) -> &Frame {
        &self.root
    }

    pub fn into_root(self) -> Frame {
        self.root
    }
}
