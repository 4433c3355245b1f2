//! Generation pipeline
//!
//! For every code object of a cataloged file:
//! 1. documentation thread: generate documented source, splice it in place
//! 2. test thread: generate tests, write the per-object test file
//!
//! then write the aggregate test file at the mapped path. Both threads keep
//! their [`ConversationSession`] across objects and files for the lifetime
//! of the pipeline.

use crate::config::{GenerationConfig, ModelParams, ScribeConfig};
use crate::conversation::{ConversationSession, Message};
use crate::error::ScribeResult;
use crate::generation::{generate_validated, Generation, GenerationOutcome, RetryBudget};
use crate::model::ModelService;
use crate::prompts;
use scribe_artifact::{
    artifact_path_buf, splice_file, unit_test_file, write_artifact, ArtifactStatus, Catalog,
    CodeCatalog, CodeObject, DirectorySummary, FileCatalog, GeneratedArtifact, PythonCatalog,
    TestSuite,
};
use std::fmt;
use std::path::{Path, PathBuf};

/// Drives both generation threads over cataloged files
pub struct GenerationPipeline<M, C = PythonCatalog> {
    model: M,
    catalog: C,
    config: GenerationConfig,
    doc_params: ModelParams,
    test_params: ModelParams,
    doc_session: ConversationSession,
    test_session: ConversationSession,
}

impl<M, C> GenerationPipeline<M, C>
where
    M: ModelService,
    C: CodeCatalog,
{
    /// Create pipeline; `summary` becomes part of the test thread's system prompt
    #[must_use]
    pub fn new(model: M, catalog: C, config: &ScribeConfig, summary: &DirectorySummary) -> Self {
        let generation = config.generation.clone();
        Self {
            doc_session: ConversationSession::new(prompts::doc_system_prompt(
                &generation.doc_package,
            )),
            test_session: ConversationSession::new(prompts::test_system_prompt(
                &generation,
                summary,
            )),
            doc_params: config.doc_params(),
            test_params: config.test_params(),
            config: generation,
            model,
            catalog,
        }
    }

    /// Documentation thread
    #[inline]
    #[must_use]
    pub fn doc_session(&self) -> &ConversationSession {
        &self.doc_session
    }

    /// Test thread
    #[inline]
    #[must_use]
    pub fn test_session(&self) -> &ConversationSession {
        &self.test_session
    }

    /// Process every file of a catalog, in order
    ///
    /// # Errors
    /// Returns the first fatal error; files processed before it stay written
    pub async fn run(&mut self, catalog: &Catalog) -> ScribeResult<RunReport> {
        let mut report = RunReport::default();
        for file in &catalog.files {
            report.files.push(self.process_file(file).await?);
        }
        tracing::info!(
            files = report.files.len(),
            written = report.written(),
            degraded = report.degraded(),
            "run complete"
        );
        Ok(report)
    }

    /// Re-catalog one file and process it
    ///
    /// # Errors
    /// Returns error if the file cannot be cataloged or a fatal error occurs
    pub async fn regenerate(&mut self, path: &Path) -> ScribeResult<FileReport> {
        let file = self.catalog.catalog_file(path)?;
        self.process_file(&file).await
    }

    /// Process all objects of one file and write its aggregate test file
    ///
    /// # Errors
    /// Returns error on model, IO or non-recoverable splice failure
    pub async fn process_file(&mut self, file: &FileCatalog) -> ScribeResult<FileReport> {
        tracing::info!(
            path = %file.path.display(),
            objects = file.objects.len(),
            "processing file"
        );

        let mut report = FileReport::new(&file.path);
        let mut suite = TestSuite::new(&file.path);

        for object in &file.objects {
            report.splices.push(self.document_object(object).await?);
            let artifact = self.test_object(object).await?;
            suite.push(object, &artifact.content);
            report.artifacts.push(artifact);
        }

        if !suite.is_empty() {
            let suite_path = artifact_path_buf(&file.path);
            write_artifact(&suite_path, &suite.render()).await?;
            report.suite_path = Some(suite_path);
        }

        Ok(report)
    }

    async fn document_object(&mut self, object: &CodeObject) -> ScribeResult<SpliceRecord> {
        let symbol = object.symbol();
        self.doc_session.push(Message::user(prompts::doc_request(
            object,
            &self.config.doc_package,
        )));

        let outcome = generate_validated(
            &self.model,
            &mut self.doc_session,
            self.doc_params,
            RetryBudget::new(self.config.retry_budget),
        )
        .await?;
        self.doc_session.trim_window();

        let result = match outcome.generation {
            Generation::Valid(code) => {
                match splice_file(&object.file_path, &symbol, &object.source_text, &code).await {
                    Ok(()) => SpliceResult::Applied,
                    Err(err) if err.is_recoverable() => {
                        tracing::warn!(
                            path = %object.file_path.display(),
                            %symbol,
                            error = %err,
                            "documentation not spliced"
                        );
                        SpliceResult::Failed(err.to_string())
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            Generation::Invalid { error, .. } => {
                tracing::warn!(%symbol, %error, "documentation still invalid, not spliced");
                SpliceResult::NotGenerated(ArtifactStatus::SyntaxInvalid)
            }
            Generation::Missing => {
                tracing::warn!(%symbol, "no documentation code returned");
                SpliceResult::NotGenerated(ArtifactStatus::ExtractionFailed)
            }
        };

        Ok(SpliceRecord {
            symbol: symbol.to_string(),
            result,
        })
    }

    async fn test_object(&mut self, object: &CodeObject) -> ScribeResult<ArtifactRecord> {
        self.test_session
            .push(Message::user(prompts::test_request(object)));

        let GenerationOutcome {
            generation,
            attempts,
        } = generate_validated(
            &self.model,
            &mut self.test_session,
            self.test_params,
            RetryBudget::new(self.config.retry_budget),
        )
        .await?;
        self.test_session.trim_window();

        let target = unit_test_file(&self.config.test_root, &object.symbol());
        let artifact = match generation {
            Generation::Valid(code) => GeneratedArtifact::written(object, target, code),
            Generation::Invalid { code, error } => {
                tracing::warn!(
                    symbol = %object.qualified_name(),
                    %error,
                    attempts,
                    "writing tests that do not parse"
                );
                GeneratedArtifact::syntax_invalid(object, target, code)
            }
            Generation::Missing => {
                tracing::warn!(
                    symbol = %object.qualified_name(),
                    attempts,
                    "no test code returned, writing placeholder"
                );
                GeneratedArtifact::extraction_failed(object, target)
            }
        };

        write_artifact(&artifact.target_path, &artifact.content).await?;
        Ok(ArtifactRecord {
            symbol: artifact.symbol,
            target_path: artifact.target_path,
            status: artifact.status,
            attempts,
            content: artifact.content,
        })
    }
}

/// One per-object test file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRecord {
    pub symbol: String,
    pub target_path: PathBuf,
    pub status: ArtifactStatus,
    /// Model calls spent
    pub attempts: u32,
    pub content: String,
}

/// What happened to one documentation splice
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpliceResult {
    Applied,
    /// No valid documentation to splice
    NotGenerated(ArtifactStatus),
    /// Splice rejected; file unchanged
    Failed(String),
}

/// Splice outcome for one object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpliceRecord {
    pub symbol: String,
    pub result: SpliceResult,
}

/// Outcome of processing one source file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub artifacts: Vec<ArtifactRecord>,
    pub splices: Vec<SpliceRecord>,
    /// Aggregate test file, if any object was processed
    pub suite_path: Option<PathBuf>,
}

impl FileReport {
    /// Create empty report for a file
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Number of per-object artifacts with the given status
    #[must_use]
    pub fn count(&self, status: ArtifactStatus) -> usize {
        self.artifacts.iter().filter(|a| a.status == status).count()
    }

    /// Number of splices that were applied
    #[must_use]
    pub fn splices_applied(&self) -> usize {
        self.splices
            .iter()
            .filter(|s| s.result == SpliceResult::Applied)
            .count()
    }
}

/// Outcome of a full run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub files: Vec<FileReport>,
}

impl RunReport {
    /// Artifacts whose code parsed
    #[must_use]
    pub fn written(&self) -> usize {
        self.files
            .iter()
            .map(|f| f.count(ArtifactStatus::Written))
            .sum()
    }

    /// Artifacts written in a degraded state
    #[must_use]
    pub fn degraded(&self) -> usize {
        self.files
            .iter()
            .flat_map(|f| &f.artifacts)
            .filter(|a| a.status.is_degraded())
            .count()
    }

    /// Splices that were rejected
    #[must_use]
    pub fn splice_failures(&self) -> usize {
        self.files
            .iter()
            .flat_map(|f| &f.splices)
            .filter(|s| matches!(s.result, SpliceResult::Failed(_)))
            .count()
    }
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.path.display())?;
        for artifact in &self.artifacts {
            writeln!(
                f,
                "  {} -> {} [{}]",
                artifact.symbol,
                artifact.target_path.display(),
                artifact.status
            )?;
        }
        for splice in &self.splices {
            match &splice.result {
                SpliceResult::Applied => writeln!(f, "  docs {}: spliced", splice.symbol)?,
                SpliceResult::NotGenerated(status) => {
                    writeln!(f, "  docs {}: not spliced ({status})", splice.symbol)?;
                }
                SpliceResult::Failed(reason) => {
                    writeln!(f, "  docs {}: failed ({reason})", splice.symbol)?;
                }
            }
        }
        if let Some(suite) = &self.suite_path {
            writeln!(f, "  suite -> {}", suite.display())?;
        }
        Ok(())
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.files {
            write!(f, "{file}")?;
        }
        write!(
            f,
            "{} files, {} artifacts written, {} degraded, {} splices failed",
            self.files.len(),
            self.written(),
            self.degraded(),
            self.splice_failures()
        )
    }
}
