use std::sync::Mutex;

use blendcore::TraceSink;

/// Collects diagnostic lines so tests can assert on what the engine said.
#[derive(Default)]
pub struct CollectSink {
    lines: Mutex<Vec<String>>,
}

impl CollectSink {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl TraceSink for CollectSink {
    fn line(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}
