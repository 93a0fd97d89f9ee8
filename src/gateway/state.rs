use crate::memory::MemoryStore;
use crate::pipeline::Analyzer;

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Analyzer,
}

impl AppState {
    pub fn new(analyzer: Analyzer) -> Self {
        Self { analyzer }
    }

    pub fn memory(&self) -> &MemoryStore {
        self.analyzer.memory()
    }
}
