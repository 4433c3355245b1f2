//! Documentation splicing
//!
//! Replaces one definition in a Python module with its generated, documented
//! counterpart. The target is located in the parsed tree by symbol, then its
//! live text is compared with the text captured when the module was
//! cataloged (the same optimistic check a structural delta does against its
//! base). Any mismatch is an error and the file is left as it was.

use crate::error::SpliceError;
use crate::path::SymbolPath;
use crate::syntax::{check_python, parse_python, python_definitions};
use std::path::Path;

/// Shape generated text so it can stand in for the original definition
///
/// A reply that starts with a class definition is flattened: the class header
/// line is dropped and the (already indented) body is used as is. Anything
/// else is re-indented by `indent` so it nests where the original did.
/// Empty lines are left empty.
#[must_use]
pub fn prepare_replacement(generated: &str, indent: &str) -> String {
    if is_class_header(generated) {
        return generated
            .split_once('\n')
            .map(|(_, body)| body.to_string())
            .unwrap_or_default();
    }

    if indent.is_empty() {
        return generated.to_string();
    }

    generated
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{indent}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_class_header(text: &str) -> bool {
    text.strip_prefix("class")
        .is_some_and(|rest| rest.starts_with([' ', '\t']))
}

/// Replace the definition `target` in `file_text` with `generated`
///
/// `original` is the verbatim text captured for the definition, starting at
/// the beginning of its first line.
///
/// # Errors
/// - [`SpliceError::TargetNotFound`] if no definition has this symbol
/// - [`SpliceError::SourceDrift`] if none of them matches `original` verbatim
/// - [`SpliceError::InvalidResult`] if the spliced module does not parse
pub fn splice_documentation(
    file_text: &str,
    target: &SymbolPath,
    original: &str,
    generated: &str,
) -> Result<String, SpliceError> {
    let tree = parse_python(file_text)?;
    let candidates: Vec<_> = python_definitions(&tree, file_text)
        .into_iter()
        .filter(|def| def.symbol == *target)
        .collect();

    if candidates.is_empty() {
        return Err(SpliceError::TargetNotFound(target.clone()));
    }

    let span = candidates
        .iter()
        .find(|def| def.text(file_text) == original)
        .map(|def| def.span.clone())
        .ok_or_else(|| SpliceError::SourceDrift(target.clone()))?;

    let replacement = prepare_replacement(generated, leading_indent(original));

    let mut spliced = String::with_capacity(file_text.len() + replacement.len());
    spliced.push_str(&file_text[..span.start]);
    spliced.push_str(&replacement);
    spliced.push_str(&file_text[span.end..]);

    check_python(&spliced).map_err(|error| SpliceError::InvalidResult {
        target: target.clone(),
        error,
    })?;

    Ok(spliced)
}

/// Read `path`, splice, and write the result back
///
/// Nothing is written unless the splice succeeds.
///
/// # Errors
/// Same as [`splice_documentation`], plus IO errors
pub async fn splice_file(
    path: &Path,
    target: &SymbolPath,
    original: &str,
    generated: &str,
) -> Result<(), SpliceError> {
    let file_text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SpliceError::io_error(path, e))?;

    let spliced = splice_documentation(&file_text, target, original, generated)?;

    tokio::fs::write(path, spliced)
        .await
        .map_err(|e| SpliceError::io_error(path, e))?;

    tracing::debug!(path = %path.display(), %target, "documentation spliced");
    Ok(())
}

fn leading_indent(text: &str) -> &str {
    let end = text
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(text.len());
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MODULE: &str = "\
class Cart:
    def total(self, prices):
        return sum(prices)

    def count(self, prices):
        return len(prices)


def tax(amount):
    return amount * 0.2
";

    const TOTAL: &str = "    def total(self, prices):\n        return sum(prices)";

    #[test]
    fn method_is_replaced_and_reindented() {
        let generated = "def total(self, prices: list) -> float:\n    \"\"\"Sum prices.\"\"\"\n    return sum(prices)";
        let updated =
            splice_documentation(MODULE, &SymbolPath::for_object(Some("Cart"), "total"), TOTAL, generated)
                .unwrap();

        assert_eq!(
            updated,
            "\
class Cart:
    def total(self, prices: list) -> float:
        \"\"\"Sum prices.\"\"\"
        return sum(prices)

    def count(self, prices):
        return len(prices)


def tax(amount):
    return amount * 0.2
"
        );
    }

    #[test]
    fn class_reply_is_flattened() {
        let generated = "class Cart:\n    def total(self, prices):\n        \"\"\"Sum prices.\"\"\"\n        return sum(prices)";
        let updated =
            splice_documentation(MODULE, &SymbolPath::for_object(Some("Cart"), "total"), TOTAL, generated)
                .unwrap();

        assert!(updated.starts_with(
            "class Cart:\n    def total(self, prices):\n        \"\"\"Sum prices.\"\"\"\n"
        ));
        assert!(check_python(&updated).is_ok());
    }

    #[test]
    fn top_level_function_keeps_column_zero() {
        let original = "def tax(amount):\n    return amount * 0.2";
        let generated = "def tax(amount: float) -> float:\n    \"\"\"Tax due.\"\"\"\n    return amount * 0.2";
        let updated =
            splice_documentation(MODULE, &SymbolPath::single("tax"), original, generated).unwrap();

        assert!(updated.contains("\ndef tax(amount: float) -> float:\n    \"\"\"Tax due.\"\"\"\n"));
    }

    #[test]
    fn drifted_original_is_an_error() {
        let drifted = "    def total(self, prices):\n      return sum(prices)";
        let err = splice_documentation(
            MODULE,
            &SymbolPath::for_object(Some("Cart"), "total"),
            drifted,
            "def total(self, prices):\n    return 0",
        )
        .unwrap_err();

        assert!(matches!(err, SpliceError::SourceDrift(_)));
    }

    #[test]
    fn missing_target_is_an_error() {
        let err = splice_documentation(
            MODULE,
            &SymbolPath::for_object(Some("Cart"), "missing"),
            TOTAL,
            "def missing(self):\n    pass",
        )
        .unwrap_err();

        assert!(matches!(err, SpliceError::TargetNotFound(_)));
    }

    #[test]
    fn unparsable_result_is_rejected() {
        let err = splice_documentation(
            MODULE,
            &SymbolPath::for_object(Some("Cart"), "total"),
            TOTAL,
            "def total(self, prices:\n    return",
        )
        .unwrap_err();

        assert!(matches!(err, SpliceError::InvalidResult { .. }));
    }

    #[test]
    fn unindented_body_is_rejected() {
        let err = splice_documentation(
            MODULE,
            &SymbolPath::for_object(Some("Cart"), "total"),
            TOTAL,
            "def total(self, prices):\n\"\"\"Sum prices.\"\"\"\nreturn sum(prices)",
        )
        .unwrap_err();

        assert!(matches!(err, SpliceError::InvalidResult { .. }));
    }

    #[test]
    fn identifier_starting_with_class_is_not_flattened() {
        assert_eq!(
            prepare_replacement("classify = 1\ndef f():\n    pass", "    "),
            "    classify = 1\n    def f():\n        pass"
        );
        assert_eq!(
            prepare_replacement("class Cart:\n    def f(self):\n        pass", "    "),
            "    def f(self):\n        pass"
        );
    }

    #[test]
    fn prepare_replacement_skips_blank_lines() {
        assert_eq!(
            prepare_replacement("def f():\n\n    pass", "    "),
            "    def f():\n\n        pass"
        );
        assert_eq!(prepare_replacement("def f():\n    pass", ""), "def f():\n    pass");
    }

    #[tokio::test]
    async fn splice_file_leaves_file_untouched_on_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.py");
        tokio::fs::write(&path, MODULE).await.unwrap();
        let before = tokio::fs::read(&path).await.unwrap();

        let result = splice_file(
            &path,
            &SymbolPath::for_object(Some("Cart"), "total"),
            "def total(self, prices): return sum(prices)",
            "def total(self, prices):\n    return 1",
        )
        .await;

        assert!(result.is_err());
        assert_eq!(tokio::fs::read(&path).await.unwrap(), before);
    }

    #[tokio::test]
    async fn splice_file_writes_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.py");
        tokio::fs::write(&path, MODULE).await.unwrap();

        splice_file(
            &path,
            &SymbolPath::for_object(Some("Cart"), "count"),
            "    def count(self, prices):\n        return len(prices)",
            "def count(self, prices):\n    \"\"\"Number of prices.\"\"\"\n    return len(prices)",
        )
        .await
        .unwrap();

        let updated = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(updated.contains("        \"\"\"Number of prices.\"\"\""));
    }
}
