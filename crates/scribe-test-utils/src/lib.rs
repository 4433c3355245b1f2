//! Testing utilities for Scribe workspace
//!
//! Scripted collaborators and Python fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use scribe_core::{
    CompletionRequest, FileReport, FileRegenerator, ModelError, ModelService, ScribeConfig,
    ScribeResult,
};
use scribe_vcs::{VcsError, VersionControl};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Wrap code in a ```` ```python ```` fence the way a model reply would
pub fn fenced(code: &str) -> String {
    format!("Here is the code:\n```python\n{code}\n```\nLet me know if you need more.")
}

#[derive(Debug, Default)]
struct ScriptState {
    replies: VecDeque<String>,
    fallback: Option<String>,
    requests: Vec<CompletionRequest>,
}

/// Model stub replaying queued replies and recording every request
///
/// Clones share state, so a clone can be handed to the pipeline while the
/// test keeps one for inspection.
#[derive(Debug, Clone, Default)]
pub struct ScriptedModel {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stub answering every request with `reply` once the queue is empty
    pub fn always(reply: impl Into<String>) -> Self {
        let model = Self::new();
        model.state.lock().fallback = Some(reply.into());
        model
    }

    /// Queue a reply
    pub fn push_reply(&self, reply: impl Into<String>) -> &Self {
        self.state.lock().replies.push_back(reply.into());
        self
    }

    /// Number of requests served
    pub fn call_count(&self) -> usize {
        self.state.lock().requests.len()
    }

    /// All recorded requests
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.state.lock().requests.clone()
    }
}

#[async_trait]
impl ModelService for ScriptedModel {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError> {
        let mut state = self.state.lock();
        state.requests.push(request.clone());
        state
            .replies
            .pop_front()
            .or_else(|| state.fallback.clone())
            .ok_or(ModelError::EmptyResponse)
    }
}

/// Version-control stub with fixed output
#[derive(Debug, Clone, Default)]
pub struct StubVcs {
    pub name_status: String,
    pub diffs: HashMap<PathBuf, String>,
}

impl StubVcs {
    pub fn new(name_status: impl Into<String>) -> Self {
        Self {
            name_status: name_status.into(),
            diffs: HashMap::new(),
        }
    }

    pub fn with_diff(mut self, path: impl Into<PathBuf>, diff: impl Into<String>) -> Self {
        self.diffs.insert(path.into(), diff.into());
        self
    }
}

#[async_trait]
impl VersionControl for StubVcs {
    async fn name_status(&self) -> Result<String, VcsError> {
        Ok(self.name_status.clone())
    }

    async fn file_diff(&self, path: &Path) -> Result<String, VcsError> {
        Ok(self.diffs.get(path).cloned().unwrap_or_default())
    }
}

/// Regenerator that only records which files it was asked for
#[derive(Debug, Clone, Default)]
pub struct RecordingRegenerator {
    pub calls: Vec<PathBuf>,
}

#[async_trait]
impl FileRegenerator for RecordingRegenerator {
    async fn regenerate_file(&mut self, path: &Path) -> ScribeResult<FileReport> {
        self.calls.push(path.to_path_buf());
        Ok(FileReport::new(path))
    }
}

/// Config writing per-object tests below `test_root`, with `retry_budget`
pub fn test_config(test_root: &Path, retry_budget: u32) -> ScribeConfig {
    ScribeConfig::new()
        .with_test_root(test_root)
        .with_retry_budget(retry_budget)
        .with_repo_explanation("A small inventory package.")
}

/// Module with one class (two methods) and one top-level function
pub const INVENTORY_MODULE: &str = "\
class Inventory:
    def __init__(self):
        self.items = {}

    def add(self, name, count):
        self.items[name] = self.items.get(name, 0) + count


def total(inventory):
    return sum(inventory.items.values())
";

/// Documented replacement for `Inventory.add`
pub const INVENTORY_ADD_DOCUMENTED: &str = "\
def add(self, name: str, count: int) -> None:
    \"\"\"Add ``count`` units of ``name``.\"\"\"
    self.items[name] = self.items.get(name, 0) + count";

/// A small valid pytest module
pub const SAMPLE_TEST: &str = "\
def test_total_of_empty_inventory():
    assert True";
