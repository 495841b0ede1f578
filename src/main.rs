use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use repomirror::directory::connect;
use repomirror::report::StdoutReporter;
use repomirror::workspace::RandomRunId;
use repomirror::{run_mirror, Collaborators, Config, GitCli, HealthCheck, RunSettings, RunSummary};

#[derive(Parser)]
#[command(name = "repomirror")]
#[command(about = "Mirror every repository of a project into another project")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create missing repositories and push every branch (default)
    Sync {
        /// Report what would happen without changing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// System health check and diagnostics
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration, then let the environment override it
    let mut config = load_config(cli.config)?;
    config.apply_process_env();

    init_logging(cli.verbose, &config.logging.level)?;
    info!("Starting repomirror v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        None => cmd_sync(false, &config).await,
        Some(Commands::Sync { dry_run }) => cmd_sync(dry_run, &config).await,
        Some(Commands::Doctor) => cmd_doctor(&config).await,
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool, level: &str) -> Result<()> {
    let default_level = if verbose { "debug" } else { level };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

/// Load configuration from specified path or default location
fn load_config(config_path: Option<std::path::PathBuf>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(&path),
        None => Config::load_or_default(),
    }
}

/// Mirror the source project into the destination project
async fn cmd_sync(dry_run_flag: bool, config: &Config) -> Result<()> {
    let source = config.source.resolve("source")?;
    let destination = config.destination.resolve("destination")?;
    let dry_run = dry_run_flag || config.dry_run;

    let source_service = connect(&source.endpoint).context("Failed to create source client")?;
    let destination_service =
        connect(&destination.endpoint).context("Failed to create destination client")?;
    let git = GitCli::new();

    let settings = RunSettings {
        source_project: source.project,
        destination_project: destination.project,
        source_credential: source.endpoint.credential,
        destination_credential: destination.endpoint.credential,
        workspace_root: config.workspace_root(),
        cleanup: config.workspace.cleanup,
        dry_run,
    };

    let services = Collaborators {
        source: source_service.as_ref(),
        destination: destination_service.as_ref(),
        vcs: &git,
    };

    let summary = run_mirror(
        &settings,
        services,
        &mut RandomRunId::default(),
        &mut StdoutReporter,
    )
    .await
    .context("Mirror run failed")?;

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    if summary.dry_run {
        println!("Dry run complete");
        println!("   Repositories to create: {}", summary.missing.len());
        println!("   Repositories to sync: {}", summary.sync.total_repositories);
        return;
    }

    println!("Mirror complete");
    println!("   Repositories created: {}", summary.created.len());
    println!("   Repositories synced: {}", summary.sync.total_repositories);
    println!("   Branches pushed: {}", summary.sync.branches_pushed);
    println!("   Duration: {:.2}s", summary.sync.duration.as_secs_f64());
    if let Some(workspace) = &summary.workspace {
        println!("   Workspace: {}", workspace.display());
    }
}

/// System health check and diagnostics
async fn cmd_doctor(config: &Config) -> Result<()> {
    let health = HealthCheck::run(config).await;
    print_health_report(&health);

    if !health.all_passed() {
        anyhow::bail!("Some checks failed");
    }
    Ok(())
}

/// Print health check report to stdout
fn print_health_report(health: &HealthCheck) {
    use repomirror::health::CheckResult;

    fn print_check(name: &str, result: &CheckResult) {
        println!("{}:", name);
        let icon = match (result.passed, result.is_warning) {
            (true, false) => "✅",
            (true, true) => "⚠️ ",
            (false, _) => "❌",
        };
        println!("  {} {}", icon, result.message);
        if let Some(details) = &result.details {
            for line in details.lines() {
                println!("     {}", line);
            }
        }
    }

    println!("🔍 repomirror System Diagnostics");
    println!();

    for (name, result) in health.all_checks() {
        print_check(name, result);
        println!();
    }

    let warnings = health.warnings();
    if health.all_passed() && warnings.is_empty() {
        println!("✅ All checks passed");
    } else if health.all_passed() {
        println!("✅ All checks passed with {} warning(s)", warnings.len());
    } else {
        println!("❌ Some checks failed");
    }
}
