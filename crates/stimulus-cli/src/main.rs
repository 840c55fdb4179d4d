//! Stimulus CLI
//!
//! Inspect prompts, repair captured completions offline, or run a live
//! synthesis against a configured provider.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error};

use stimulus_core::{
    normalize, parse_traced, prompts, ProgramType, RequestFields, SynthesisRequest,
};
use stimulus_runtime::{ClientRegistry, EngineConfig, SynthesisError, SynthesisOrchestrator};

#[derive(Parser)]
#[command(name = "stimulus")]
#[command(author, version, about = "Generate and repair teaching stimuli", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the system and user prompts for a request
    Prompt {
        #[command(flatten)]
        request: RequestArgs,

        /// Labels to exclude, comma separated
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,
    },

    /// Parse and normalize a captured completion
    Normalize {
        #[command(flatten)]
        request: RequestArgs,

        /// Completion text file (reads stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Run a live synthesis and print the stimulus set as JSON
    Synthesize {
        #[command(flatten)]
        request: RequestArgs,

        /// Engine config (YAML)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Generate plain-text teaching instructions
    Instructions {
        #[command(flatten)]
        request: RequestArgs,

        /// Engine config (YAML)
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Args)]
struct RequestArgs {
    /// Program type (tacting, intraverbal, listener-responding, vpmts, seriation, sorting)
    #[arg(short, long)]
    program: ProgramType,

    /// JSON file with request fields (title, numTrials, matchingType, ...)
    #[arg(short, long)]
    fields: Option<PathBuf>,
}

impl RequestArgs {
    fn load_fields(&self) -> Result<RequestFields> {
        match &self.fields {
            Some(path) => read_fields(path),
            None => Ok(RequestFields::new()),
        }
    }
}

fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(synthesis) = e.downcast_ref::<SynthesisError>() {
                error!(configuration = synthesis.is_configuration_problem(), "{synthesis}");
                eprintln!("{}", synthesis.user_message());
            } else {
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Prompt { request, exclude } => {
            let fields = request.load_fields()?;
            let mut exclusions = fields.excluded_labels();
            exclusions.extend(
                exclude
                    .into_iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty()),
            );

            let prompt = prompts::build(request.program, &fields, &exclusions);
            println!(
                "=== system ===\n{}\n=== user ===\n{}",
                prompt.system.trim(),
                prompt.user.trim()
            );
            Ok(())
        }
        Commands::Normalize { request, input } => {
            let fields = request.load_fields()?;
            let raw = read_input(input.as_deref())?;

            let (parsed, strategy) = parse_traced(&raw);
            debug!(strategy = strategy.name(), "Parsed completion");
            let set = normalize(request.program, &parsed, &fields, &raw);
            println!("{}", serde_json::to_string_pretty(&set)?);
            Ok(())
        }
        Commands::Synthesize { request, config } => {
            let fields = request.load_fields()?;
            let orchestrator = build_orchestrator(&config)?;
            let runtime = tokio_runtime()?;

            let req = SynthesisRequest::new(request.program, fields);
            let set = runtime.block_on(orchestrator.synthesize(&req))?;
            println!("{}", serde_json::to_string_pretty(&set)?);
            Ok(())
        }
        Commands::Instructions { request, config } => {
            let fields = request.load_fields()?;
            let orchestrator = build_orchestrator(&config)?;
            let runtime = tokio_runtime()?;

            let text = runtime.block_on(
                orchestrator.build_teaching_instructions(request.program, &fields),
            )?;
            println!("{text}");
            Ok(())
        }
    }
}

fn build_orchestrator(path: &Path) -> Result<SynthesisOrchestrator> {
    let config = EngineConfig::from_yaml_file(path)
        .with_context(|| format!("Failed to load config: {}", path.display()))?;
    let orchestrator = SynthesisOrchestrator::from_config(&config, &ClientRegistry::with_defaults())?;
    Ok(orchestrator)
}

fn tokio_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

fn read_fields(path: &Path) -> Result<RequestFields> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read fields: {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&contents)
        .with_context(|| format!("Fields file is not valid JSON: {}", path.display()))?;
    anyhow::ensure!(value.is_object(), "Fields file must contain a JSON object");
    Ok(RequestFields::from_json(value))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read input: {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            Ok(buffer)
        }
    }
}
