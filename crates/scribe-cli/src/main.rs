use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use scribe_artifact::{CodeCatalog, PythonCatalog};
use scribe_core::{ChangeDispatcher, ChatCompletionsClient, GenerationPipeline, ScribeConfig};
use scribe_vcs::GitCli;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("scribe")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generate unit tests and documentation for Python code with a language model")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("retry-budget")
                .long("retry-budget")
                .global(true)
                .value_parser(value_parser!(u32))
                .help("Retries per generation when the reply does not parse"),
        )
        .arg(
            Arg::new("test-root")
                .long("test-root")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Directory for per-object test files"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("generate")
                .about("Generate tests and documentation for every Python file in a directory")
                .arg(
                    Arg::new("dir")
                        .long("dir")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Source directory"),
                )
                .arg(
                    Arg::new("explanation")
                        .long("explanation")
                        .conflicts_with("explanation-file")
                        .help("Short description of the repository for the test prompt"),
                )
                .arg(
                    Arg::new("explanation-file")
                        .long("explanation-file")
                        .value_parser(value_parser!(PathBuf))
                        .help("File holding the repository description"),
                ),
        )
        .subcommand(
            Command::new("sync")
                .about("Regenerate outputs for files changed since the upstream branch")
                .arg(
                    Arg::new("repo")
                        .long("repo")
                        .default_value(".")
                        .value_parser(value_parser!(PathBuf))
                        .help("Repository root"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// File config (or defaults) with command-line overrides applied
fn load_config(matches: &ArgMatches) -> Result<ScribeConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => ScribeConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ScribeConfig::new(),
    };

    if let Some(budget) = matches.get_one::<u32>("retry-budget") {
        config = config.with_retry_budget(*budget);
    }
    if let Some(root) = matches.get_one::<PathBuf>("test-root") {
        config = config.with_test_root(root);
    }
    Ok(config)
}

fn explanation(args: &ArgMatches) -> Result<Option<String>> {
    if let Some(text) = args.get_one::<String>("explanation") {
        return Ok(Some(text.clone()));
    }
    match args.get_one::<PathBuf>("explanation-file") {
        Some(path) => std::fs::read_to_string(path)
            .map(Some)
            .with_context(|| format!("reading explanation from {}", path.display())),
        None => Ok(None),
    }
}

async fn generate(mut config: ScribeConfig, args: &ArgMatches) -> Result<()> {
    let Some(dir) = args.get_one::<PathBuf>("dir") else {
        bail!("--dir is required");
    };
    if let Some(text) = explanation(args)? {
        config = config.with_repo_explanation(text);
    }

    let catalog = PythonCatalog::new()
        .catalog_directory(dir)
        .with_context(|| format!("cataloging {}", dir.display()))?;
    let model = ChatCompletionsClient::from_config(config.model.clone())?;
    tracing::info!(
        dir = %dir.display(),
        files = catalog.files.len(),
        objects = catalog.object_count(),
        "generating"
    );

    let mut pipeline = GenerationPipeline::new(model, PythonCatalog::new(), &config, &catalog.summary);
    let report = pipeline.run(&catalog).await?;

    tracing::info!(
        written = report.written(),
        degraded = report.degraded(),
        splice_failures = report.splice_failures(),
        "generation finished"
    );
    println!("{report}");
    Ok(())
}

async fn sync(config: ScribeConfig, repo: &Path) -> Result<()> {
    let summary = PythonCatalog::new()
        .catalog_directory(repo)
        .with_context(|| format!("cataloging {}", repo.display()))?
        .summary;
    let model = ChatCompletionsClient::from_config(config.model.clone())?;
    let mut pipeline = GenerationPipeline::new(model, PythonCatalog::new(), &config, &summary);

    tracing::info!(repo = %repo.display(), "syncing changed files");
    let dispatcher = ChangeDispatcher::new(GitCli::new(repo), repo);
    let report = dispatcher.dispatch(&mut pipeline).await?;

    println!("{report}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));
    dotenv::dotenv().ok();

    let config = load_config(&matches)?;

    let result = match matches.subcommand() {
        Some(("generate", args)) => generate(config, args).await,
        Some(("sync", args)) => {
            let repo = args
                .get_one::<PathBuf>("repo")
                .cloned()
                .unwrap_or_else(|| PathBuf::from("."));
            sync(config, &repo).await
        }
        Some((other, _)) => Err(anyhow::anyhow!("unknown command: {other}")),
        None => Err(anyhow::anyhow!("no command given")),
    };

    if let Err(error) = &result {
        tracing::error!(error = %format!("{error:#}"), "run failed");
    }
    result
}
