//! Prompt text for both generation threads

use scribe_artifact::{CodeObject, DirectorySummary, SyntaxError};

use crate::config::GenerationConfig;

/// System prompt of the documentation thread
#[must_use]
pub fn doc_system_prompt(doc_package: &str) -> String {
    format!(
        r#"You add documentation and type hints to Python code for use with {doc_package}.
Reply with the complete documented definition in a single ```python fenced block.
Keep the body unchanged.

For example, given:
```python
def load_rates(self, path):
    with open(path) as handle:
        return {{row[0]: float(row[1]) for row in csv.reader(handle)}}
```
a proper reply is:
```python
def load_rates(self, path: str) -> dict[str, float]:
    """
    Load currency exchange rates from a CSV file.

    :param path: Path of a CSV file with ``currency,rate`` rows.
    :type path: str
    :return: Mapping of currency code to rate.
    :rtype: dict[str, float]
    :raises FileNotFoundError: If ``path`` does not exist.
    """
    with open(path) as handle:
        return {{row[0]: float(row[1]) for row in csv.reader(handle)}}
```"#
    )
}

/// System prompt of the test thread
///
/// Embeds the directory summary so generated tests import from the right
/// modules.
#[must_use]
pub fn test_system_prompt(config: &GenerationConfig, summary: &DirectorySummary) -> String {
    let mut prompt = format!(
        "You write unit tests using {} for {}.",
        config.unit_test_package, config.platform
    );
    if !config.repo_explanation.trim().is_empty() {
        prompt.push(' ');
        prompt.push_str(config.repo_explanation.trim());
    }
    prompt.push_str(
        "\nReply with the tests in a single ```python fenced block.\n\
         The repository is described below: every file, and for Python files \
         their functions and classes, for JSON files their first- and \
         second-level keys, for CSV files their column names.\n",
    );
    prompt.push_str(&summary.to_json());
    prompt
}

/// Documentation request for one object
#[must_use]
pub fn doc_request(object: &CodeObject, doc_package: &str) -> String {
    let owner = object
        .class_name
        .as_deref()
        .map(|class| format!(" in class {class}"))
        .unwrap_or_default();
    format!(
        "provide documentation for\n```python\n{}\n```\n{owner} that can be used in {doc_package}",
        object.source_text
    )
}

/// Test request for one object
#[must_use]
pub fn test_request(object: &CodeObject) -> String {
    let name = match &object.class_name {
        Some(class) => format!("{} in {class}", object.function_name),
        None => object.function_name.clone(),
    };
    format!(
        "provide unit test for the function `{name}`.\n```python\n{}\n```\nand the path of the function is {}",
        object.source_text,
        object.file_path.display()
    )
}

/// Corrective message after a reply whose code does not parse
#[must_use]
pub fn syntax_feedback(error: &SyntaxError) -> String {
    format!(
        "The code in your last reply is not valid Python ({error}). \
         Reply again with the corrected code in a single ```python fenced block."
    )
}

/// Corrective message after a reply without a fenced block
#[must_use]
pub fn missing_code_feedback() -> String {
    "Your last reply did not contain a ```python fenced block. \
     Reply again with the code in a single ```python fenced block."
        .to_string()
}
