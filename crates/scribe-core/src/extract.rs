//! Code extraction from model replies

use regex::Regex;
use std::sync::LazyLock;

static FENCED_PYTHON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```python(.*?)```").expect("fence pattern compiles"));

/// Extract fenced Python code from a reply
///
/// Every ```` ```python ```` … ```` ``` ```` block is trimmed and the blocks
/// are concatenated in order with no separator. Returns `None` when there is
/// no block at all; never `Some("")` for a reply without fences.
#[must_use]
pub fn extract_code(reply: &str) -> Option<String> {
    let mut found = false;
    let mut code = String::new();

    for captures in FENCED_PYTHON.captures_iter(reply) {
        found = true;
        if let Some(body) = captures.get(1) {
            code.push_str(body.as_str().trim());
        }
    }

    found.then_some(code)
}
