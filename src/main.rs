//! Kennel CLI entrypoint.
//!
//! This is the main entrypoint for the kennel command-line tool.

use std::process::ExitCode;

use kennel::api::DatadogClient;
use kennel::cli::{Cli, Commands, OutputFormatter};
use kennel::config::{ConfigParser, DefinitionLoader, Definitions, ProjectFilter, Settings};
use kennel::error::Result;
use kennel::generator::SnapshotGenerator;
use kennel::planner::{AutoApprove, Confirmation, PromptConfirmation};
use kennel::reconciler::{SyncOutcome, Syncer};

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Calls are sequential, one thread is enough
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system on stderr; `RUST_LOG` takes precedence.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);
    let parser = ConfigParser::new(&cli.root);
    parser.load_dotenv()?;
    let settings = parser.load_settings()?;
    let filter = ProjectFilter::parse(cli.project.as_deref());
    if filter.is_filtered() {
        info!("Restricting run to projects: {}", cli.project.as_deref().unwrap_or_default());
    }

    let definitions = DefinitionLoader::new(&settings).load(&filter)?;

    match cli.command {
        Commands::Generate => cmd_generate(&settings, &definitions, &filter, &formatter),
        Commands::Plan => cmd_plan(&settings, &definitions, &filter, &formatter).await,
        Commands::Update { yes } => {
            cmd_update(&settings, &definitions, &filter, yes, &formatter).await
        }
    }
}

/// Write snapshots only.
fn cmd_generate(
    settings: &Settings,
    definitions: &Definitions,
    filter: &ProjectFilter,
    formatter: &OutputFormatter,
) -> Result<()> {
    let generator = SnapshotGenerator::new(&settings.generated_dir);
    let result = generator.generate(&definitions.records, filter)?;
    print!("{}", formatter.format_generate(&result));
    Ok(())
}

/// Show the plan.
async fn cmd_plan(
    settings: &Settings,
    definitions: &Definitions,
    filter: &ProjectFilter,
    formatter: &OutputFormatter,
) -> Result<()> {
    let client = create_client(settings)?;
    let syncer = Syncer::new(
        &client,
        SnapshotGenerator::new(&settings.generated_dir),
        filter,
        &settings.app_url,
    );

    let plan = syncer.plan(&definitions.records).await?;
    println!("{}", formatter.format_plan(&plan));
    Ok(())
}

/// Show the plan, confirm and apply it.
async fn cmd_update(
    settings: &Settings,
    definitions: &Definitions,
    filter: &ProjectFilter,
    yes: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let client = create_client(settings)?;
    let syncer = Syncer::new(
        &client,
        SnapshotGenerator::new(&settings.generated_dir),
        filter,
        &settings.app_url,
    );

    let plan = syncer.plan(&definitions.records).await?;
    println!("{}", formatter.format_plan(&plan));

    let mut confirmation: Box<dyn Confirmation> = if yes {
        Box::new(AutoApprove)
    } else {
        Box::new(PromptConfirmation::stdio())
    };

    match syncer.apply(&plan, confirmation.as_mut()).await? {
        SyncOutcome::NoChanges => debug!("Nothing to apply"),
        SyncOutcome::Declined => {
            eprintln!("Update cancelled.");
        }
        SyncOutcome::Applied(result) => {
            println!("{}", formatter.format_execution(&result));
        }
    }
    Ok(())
}

/// Creates a monitoring API client from settings and environment.
fn create_client(settings: &Settings) -> Result<DatadogClient> {
    let (api_key, app_key) = ConfigParser::credentials()?;
    DatadogClient::new(&settings.api_url, &api_key, &app_key)
}
