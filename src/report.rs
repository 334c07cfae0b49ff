//! The dual-emission report sink: a human-readable text stream and a
//! hierarchical JSON tree, kept in lockstep.
//!
//! The decoder writes both forms as it goes, so everything emitted before a
//! failure is retained. The sink is a capability passed through the call
//! graph rather than process-global state.

use serde_json::{Map, Value};

/// Where the decoder sends its output.
pub trait ReportSink {
    /// Append a fragment to the text stream. Newlines are explicit.
    fn text(&mut self, fragment: &str);

    /// Attach a finished node under `key` at the root of the tree.
    fn attach(&mut self, key: &str, node: Value);
}

/// The provided sink: buffers the text stream and builds a JSON object.
#[derive(Debug, Default)]
pub struct TextJsonReport {
    text: String,
    tree: Map<String, Value>,
}

impl TextJsonReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// The text stream accumulated so far.
    pub fn text_output(&self) -> &str {
        &self.text
    }

    /// Consume the report, yielding the text stream and the JSON tree.
    pub fn into_parts(self) -> (String, Value) {
        (self.text, Value::Object(self.tree))
    }
}

impl ReportSink for TextJsonReport {
    fn text(&mut self, fragment: &str) {
        self.text.push_str(fragment);
    }

    fn attach(&mut self, key: &str, node: Value) {
        self.tree.insert(key.to_string(), node);
    }
}
