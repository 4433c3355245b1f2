//! Code object catalog
//!
//! Walks a source directory and collects:
//! - every top-level function and class method of each `.py` file, with the
//!   verbatim source text the splice engine later matches against
//! - a [`DirectorySummary`] describing the tree, used as prompt context

use crate::error::CatalogError;
use crate::path::{SymbolPath, TEST_PREFIX};
use crate::syntax::{check_python, parse_python, python_definitions};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Tree};
use walkdir::{DirEntry, WalkDir};

/// One function or method with its captured source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeObject {
    pub file_path: PathBuf,
    pub class_name: Option<String>,
    pub function_name: String,
    /// Verbatim text from the start of the definition's first line
    pub source_text: String,
}

impl CodeObject {
    /// Symbol of this object within its module
    #[inline]
    #[must_use]
    pub fn symbol(&self) -> SymbolPath {
        SymbolPath::for_object(self.class_name.as_deref(), &self.function_name)
    }

    /// `Class.method` or `function`
    #[must_use]
    pub fn qualified_name(&self) -> String {
        self.symbol().to_string()
    }

    /// Check if this object is a class method
    #[inline]
    #[must_use]
    pub fn is_method(&self) -> bool {
        self.class_name.is_some()
    }
}

/// Code objects of one source file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileCatalog {
    pub path: PathBuf,
    pub objects: Vec<CodeObject>,
}

/// Result of cataloging a directory
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub files: Vec<FileCatalog>,
    pub summary: DirectorySummary,
}

impl Catalog {
    /// Total number of code objects
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.files.iter().map(|f| f.objects.len()).sum()
    }
}

/// Per-file summary of a directory, keyed by `/`-separated relative path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectorySummary(IndexMap<String, FileSummary>);

impl DirectorySummary {
    /// Get summary of one file
    #[inline]
    #[must_use]
    pub fn get(&self, relative_path: &str) -> Option<&FileSummary> {
        self.0.get(relative_path)
    }

    /// Number of summarized files
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if summary is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(relative path, summary)`
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FileSummary)> {
        self.0.iter()
    }

    /// Render as pretty JSON for prompts
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    fn insert(&mut self, relative_path: String, summary: FileSummary) {
        self.0.insert(relative_path, summary);
    }
}

/// What the summary records about a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileSummary {
    /// Top-level function names and class → method names
    Python {
        functions: Vec<String>,
        classes: IndexMap<String, Vec<String>>,
    },
    /// First-level keys → second-level keys
    Json { keys: IndexMap<String, Vec<String>> },
    /// Header columns
    Csv { columns: Vec<String> },
}

/// Source of code objects for the pipeline
pub trait CodeCatalog: Send + Sync {
    /// Catalog every source file below `root`
    ///
    /// # Errors
    /// Returns error if the walk or a file read fails
    fn catalog_directory(&self, root: &Path) -> Result<Catalog, CatalogError>;

    /// Catalog a single file (scoped re-catalog)
    ///
    /// Non-Python files and generated `test_*` modules yield no objects.
    ///
    /// # Errors
    /// Returns error if the file cannot be read
    fn catalog_file(&self, path: &Path) -> Result<FileCatalog, CatalogError>;
}

/// Default catalog for Python source trees
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonCatalog;

impl PythonCatalog {
    /// Create new catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CodeCatalog for PythonCatalog {
    fn catalog_directory(&self, root: &Path) -> Result<Catalog, CatalogError> {
        let mut catalog = Catalog::default();

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_skipped(entry));

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = relative_key(root, path);

            match extension(path) {
                Some("py") => {
                    let source = read_source(path)?;
                    let tree = parse_python(&source)?;
                    catalog
                        .summary
                        .insert(relative, python_summary(&tree, &source));
                    catalog.files.push(FileCatalog {
                        path: path.to_path_buf(),
                        objects: code_objects(path, &tree, &source),
                    });
                }
                Some("json") => {
                    if let Some(summary) = json_summary(path, &read_source(path)?) {
                        catalog.summary.insert(relative, summary);
                    }
                }
                Some("csv") => {
                    let source = read_source(path)?;
                    catalog.summary.insert(relative, csv_summary(&source));
                }
                _ => {}
            }
        }

        tracing::info!(
            root = %root.display(),
            files = catalog.files.len(),
            objects = catalog.object_count(),
            "directory cataloged"
        );
        Ok(catalog)
    }

    fn catalog_file(&self, path: &Path) -> Result<FileCatalog, CatalogError> {
        if extension(path) != Some("py") || is_generated_test(path) {
            return Ok(FileCatalog {
                path: path.to_path_buf(),
                objects: Vec::new(),
            });
        }

        let source = read_source(path)?;
        Ok(FileCatalog {
            path: path.to_path_buf(),
            objects: extract_code_objects(path, &source)?,
        })
    }
}

/// Code objects of one Python module, in source order
///
/// # Errors
/// Returns error if the parser cannot be initialized
pub(crate) fn extract_code_objects(
    path: &Path,
    source: &str,
) -> Result<Vec<CodeObject>, CatalogError> {
    let tree = parse_python(source)?;
    Ok(code_objects(path, &tree, source))
}

fn code_objects(path: &Path, tree: &Tree, source: &str) -> Vec<CodeObject> {
    if let Err(error) = check_python(source) {
        tracing::warn!(path = %path.display(), %error, "cataloging module with syntax errors");
    }

    python_definitions(tree, source)
        .into_iter()
        .filter_map(|def| {
            let function_name = def.symbol.last()?.to_string();
            Some(CodeObject {
                file_path: path.to_path_buf(),
                class_name: def.symbol.owner().map(str::to_string),
                function_name,
                source_text: def.text(source).to_string(),
            })
        })
        .collect()
}

fn python_summary(tree: &Tree, source: &str) -> FileSummary {
    let mut functions = Vec::new();
    let mut classes: IndexMap<String, Vec<String>> = IndexMap::new();

    let root = tree.root_node();
    let mut cursor = root.walk();
    for node in root.children(&mut cursor) {
        let node = definition_of(node);
        if node.kind() != "class_definition" {
            continue;
        }
        if let Some(name) = name_of(node, source) {
            classes.entry(name).or_default();
        }
    }

    for def in python_definitions(tree, source) {
        let Some(name) = def.symbol.last().map(str::to_string) else {
            continue;
        };
        match def.symbol.owner() {
            Some(class) => classes.entry(class.to_string()).or_default().push(name),
            None => functions.push(name),
        }
    }

    FileSummary::Python { functions, classes }
}

fn definition_of(node: Node<'_>) -> Node<'_> {
    if node.kind() == "decorated_definition" {
        node.child_by_field_name("definition").unwrap_or(node)
    } else {
        node
    }
}

fn name_of(node: Node<'_>, source: &str) -> Option<String> {
    node.child_by_field_name("name")?
        .utf8_text(source.as_bytes())
        .ok()
        .map(str::to_string)
}

fn json_summary(path: &Path, source: &str) -> Option<FileSummary> {
    let value: serde_json::Value = match serde_json::from_str(source) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "skipping unparsable json");
            return None;
        }
    };

    let mut keys = IndexMap::new();
    if let serde_json::Value::Object(map) = value {
        for (key, nested) in map {
            let second = match nested {
                serde_json::Value::Object(inner) => inner.keys().cloned().collect(),
                _ => Vec::new(),
            };
            keys.insert(key, second);
        }
    }
    Some(FileSummary::Json { keys })
}

fn csv_summary(source: &str) -> FileSummary {
    let columns = source
        .lines()
        .next()
        .map(|header| {
            header
                .split(',')
                .map(|col| col.trim().trim_matches('"').to_string())
                .filter(|col| !col.is_empty())
                .collect()
        })
        .unwrap_or_default();
    FileSummary::Csv { columns }
}

fn is_skipped(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    if entry.file_type().is_dir() {
        name.starts_with('.') || name == "__pycache__"
    } else {
        name.starts_with(TEST_PREFIX)
    }
}

fn is_generated_test(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with(TEST_PREFIX))
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

fn relative_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_source(path: &Path) -> Result<String, CatalogError> {
    std::fs::read_to_string(path).map_err(|e| CatalogError::io_error(path, e))
}
