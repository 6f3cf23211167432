//! CLI entry point for the FMEA knowledge lookup engine.
//!
//! Every query command builds the engine from the active settings, runs one
//! retrieval and exits with a code scripts can branch on (3 = not enough data).

use anyhow::Context as _;
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use fmea_rag::io::{ExitCode, JsonResponse, OutputFormat, ResponseMeta};
use fmea_rag::{
    GenerationInput, KnowledgeEngine, NOT_ENOUGH_DATA, RetrievalError, RetrievalResult, Settings,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// FMEA knowledge lookup
#[derive(Parser)]
#[command(
    name = "fmea-rag",
    version = env!("CARGO_PKG_VERSION"),
    about = "Retrieve relevant FMEA records for a component",
    long_about = "Look up prior failure-analysis records relevant to a component and assemble them into a context for generation.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Knowledge CSV, overrides [knowledge].path
    #[arg(long, global = true)]
    knowledge: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "debug")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    #[command(about = "Set up .fmea directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    #[command(about = "Display active settings")]
    Config,

    #[command(about = "Build the index and show knowledge base statistics")]
    Stats {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    #[command(
        about = "Rank knowledge chunks by relevance to a component",
        after_help = "Examples:\n  fmea-rag retrieve Gantry Motor\n  fmea-rag retrieve \"X-ray tube\" -k 5 --threshold 0.3 --json"
    )]
    Retrieve {
        #[command(flatten)]
        query: QueryArgs,
    },

    #[command(
        about = "Assemble the generation context for a component",
        after_help = "Prints NOT ENOUGH DATA when no chunk clears the threshold."
    )]
    Context {
        #[command(flatten)]
        query: QueryArgs,
    },
}

#[derive(clap::Args)]
struct QueryArgs {
    /// Component name or description
    #[arg(required = true, num_args = 1..)]
    query: Vec<String>,

    /// Number of chunks to retrieve
    #[arg(short, long)]
    k: Option<usize>,

    /// Minimum relevance, 1 / (1 + distance)
    #[arg(short, long)]
    threshold: Option<f32>,

    /// Output in JSON format
    #[arg(long)]
    json: bool,
}

impl QueryArgs {
    fn text(&self) -> String {
        self.query.join(" ")
    }
}

#[derive(Serialize)]
struct RetrieveOutput<'a> {
    query: &'a str,
    k: usize,
    threshold: f32,
    result: &'a RetrievalResult,
}

fn main() {
    let cli = Cli::parse();

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::GeneralError
        }
    };

    std::process::exit(code.into());
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let loaded = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let mut settings = match loaded {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return Ok(ExitCode::ConfigError);
        }
    };

    if let Some(path) = &cli.knowledge {
        settings.knowledge.path = path.clone();
    }
    settings.debug |= cli.debug;
    init_logging(settings.debug, cli.quiet);

    match &cli.command {
        Commands::Init { force } => {
            let path = Settings::init_config_file(*force)
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            println!("Created configuration file at: {}", path.display());
            println!("Edit this file to customize your settings.");
            Ok(ExitCode::Success)
        }

        Commands::Config => {
            let toml_str = toml::to_string_pretty(&settings)
                .context("Error displaying config")?;
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            println!("{toml_str}");
            Ok(ExitCode::Success)
        }

        Commands::Stats { json } => {
            let format = OutputFormat::from_json_flag(*json);
            Ok(with_engine(&settings, format, |engine, start| {
                let stats = engine.stats();
                if format.is_json() {
                    let meta = ResponseMeta::new(start.elapsed());
                    print_json(&JsonResponse::success(&stats).with_meta(meta))?;
                } else {
                    println!("Records:         {}", stats.records);
                    println!("Chunks:          {}", stats.chunks);
                    println!("Dimension:       {}", stats.dimension);
                    println!("Index:           {}", stats.index_kind);
                    println!("Embedding model: {}", stats.embedding_model);
                }
                Ok(ExitCode::Success)
            }))
        }

        Commands::Retrieve { query } => {
            let format = OutputFormat::from_json_flag(query.json);
            let text = query.text();
            let k = query.k.unwrap_or(settings.retrieval.k);
            let threshold = query.threshold.unwrap_or(settings.retrieval.threshold);

            Ok(with_engine(&settings, format, |engine, start| {
                let result = engine.retrieve_with(&text, k, threshold)?;
                let code = ExitCode::from_retrieval(&result);

                if format.is_json() {
                    let output = RetrieveOutput {
                        query: &text,
                        k,
                        threshold,
                        result: &result,
                    };
                    let response = if result.is_not_enough_data() {
                        JsonResponse::not_enough_data(output)
                    } else {
                        JsonResponse::success(output)
                    };
                    print_json(&response.with_meta(ResponseMeta::new(start.elapsed())))?;
                } else {
                    print_retrieval(&result);
                }
                Ok(code)
            }))
        }

        Commands::Context { query } => {
            let format = OutputFormat::from_json_flag(query.json);
            let text = query.text();
            let k = query.k.unwrap_or(settings.retrieval.k);
            let threshold = query.threshold.unwrap_or(settings.retrieval.threshold);
            let separator = settings.retrieval.separator.clone();

            Ok(with_engine(&settings, format, |engine, start| {
                let result = engine.retrieve_with(&text, k, threshold)?;
                let input = GenerationInput::new(text.as_str(), &result, &separator);
                let code = ExitCode::from_retrieval(&result);

                if format.is_json() {
                    let response = if input.has_evidence() {
                        JsonResponse::success(&input)
                    } else {
                        JsonResponse::not_enough_data(&input)
                    };
                    print_json(&response.with_meta(ResponseMeta::new(start.elapsed())))?;
                } else {
                    println!("{}", input.context);
                }
                Ok(code)
            }))
        }
    }
}

/// Builds the engine, runs `command` and maps any engine error to an exit code.
fn with_engine<F>(settings: &Settings, format: OutputFormat, command: F) -> ExitCode
where
    F: FnOnce(&KnowledgeEngine, Instant) -> Result<ExitCode, CommandError>,
{
    let start = Instant::now();
    let outcome = KnowledgeEngine::initialize(settings)
        .map_err(CommandError::Retrieval)
        .and_then(|engine| command(&engine, start));

    match outcome {
        Ok(code) => code,
        Err(CommandError::Retrieval(error)) => report_error(&error, format),
        Err(CommandError::Output(error)) => {
            eprintln!("Error writing output: {error}");
            ExitCode::GeneralError
        }
    }
}

enum CommandError {
    Retrieval(RetrievalError),
    Output(serde_json::Error),
}

impl From<RetrievalError> for CommandError {
    fn from(error: RetrievalError) -> Self {
        Self::Retrieval(error)
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(error: serde_json::Error) -> Self {
        Self::Output(error)
    }
}

fn report_error(error: &RetrievalError, format: OutputFormat) -> ExitCode {
    let code = ExitCode::from_error(error);
    if format.is_json() {
        match serde_json::to_string_pretty(&JsonResponse::from_error(error)) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error: {error} (JSON output failed: {e})"),
        }
    } else {
        eprintln!("Error: {error}");
        for suggestion in error.recovery_suggestions() {
            eprintln!("  - {suggestion}");
        }
        eprintln!("Exit code {}: {}", code as u8, code.description());
    }
    code
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_retrieval(result: &RetrievalResult) {
    match result {
        RetrievalResult::NotEnoughData => println!("{NOT_ENOUGH_DATA}"),
        RetrievalResult::Evidence(chunks) => {
            for (rank, chunk) in chunks.iter().enumerate() {
                println!(
                    "{}. relevance {:.3} (record {}, chunk {})",
                    rank + 1,
                    chunk.relevance.get(),
                    chunk.document,
                    chunk.chunk
                );
                println!("   {}", chunk.text);
            }
        }
    }
}

fn init_logging(debug: bool, quiet: bool) {
    let level = if debug {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
