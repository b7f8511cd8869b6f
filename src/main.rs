use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

mod cli;

use cli::Cli;
use cli::commands::Commands;
use modsched::config::Config;
use modsched::diagnostics::Diagnostic;
use modsched::domain::Placement;
use modsched::graph::EdgeFilter;
use modsched::manifest::Manifest;
use modsched::render::{OutputFormat, render};
use modsched::SchedulerState;

fn setup_logging(config: &Config) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("modsched")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("modsched.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let default_level = config.log_level.as_deref().unwrap_or("info");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application with manifest: {}", cli.command.manifest().display());

    if cli.is_verbose() {
        eprintln!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Plan { manifest, format } => handle_plan_command(manifest, format.as_deref(), config),
        Commands::Check { manifest } => handle_check_command(manifest, config),
        Commands::Queue { manifest } => handle_queue_command(manifest, config),
        Commands::Inspect { manifest, id } => handle_inspect_command(manifest, id, config),
    }
}

fn load_state(manifest_path: &Path, config: &Config) -> Result<SchedulerState> {
    let manifest = Manifest::load(manifest_path)
        .with_context(|| format!("Failed to load manifest from {}", manifest_path.display()))?;
    let mut state = SchedulerState::with_composer(config.composer());
    manifest.apply(&mut state);
    Ok(state)
}

fn print_diagnostic(diagnostic: &Diagnostic) {
    let label = match diagnostic {
        Diagnostic::MissingDependencies { .. } | Diagnostic::Cycle { .. } => "warning:".yellow(),
        Diagnostic::InvalidAttribute { .. } | Diagnostic::UnregisteredEnqueue { .. } => "notice:".cyan(),
    };
    eprintln!("{} {}", label, diagnostic);
}

fn handle_plan_command(manifest: &Path, format: Option<&str>, config: &Config) -> Result<()> {
    info!("Planning manifest: {}", manifest.display());
    let state = load_state(manifest, config)?;

    let format = match format {
        Some(f) => f.parse::<OutputFormat>()?,
        None => config.output_format()?,
    };

    let plan = state.plan();
    for diagnostic in state.registration_diagnostics().iter().chain(&plan.diagnostics) {
        print_diagnostic(diagnostic);
    }
    if plan.is_empty() {
        eprintln!("{}", "Nothing to emit".yellow());
    }

    let output = render(&plan, format, &config.html_writer()).context("Failed to render plan")?;
    print!("{}", output);
    Ok(())
}

fn handle_check_command(manifest: &Path, config: &Config) -> Result<()> {
    info!("Checking manifest: {}", manifest.display());
    let state = load_state(manifest, config)?;
    let plan = state.plan();

    let diagnostics: Vec<&Diagnostic> = state
        .registration_diagnostics()
        .iter()
        .chain(&plan.diagnostics)
        .collect();

    if diagnostics.is_empty() {
        println!(
            "{} {} load tags, {} preloads, {} table entries",
            "OK:".green(),
            plan.load_tags.len(),
            plan.preloads.len(),
            plan.resolution_table.len()
        );
        return Ok(());
    }

    for diagnostic in &diagnostics {
        print_diagnostic(diagnostic);
    }
    let affected: BTreeSet<&str> = diagnostics.iter().map(|d| d.id()).collect();
    eyre::bail!(
        "{} diagnostic(s) affecting {} module(s) in {}",
        diagnostics.len(),
        affected.len(),
        manifest.display()
    )
}

fn handle_queue_command(manifest: &Path, config: &Config) -> Result<()> {
    info!("Listing queue for manifest: {}", manifest.display());
    let state = load_state(manifest, config)?;
    let plan = state.plan();

    let queue = state.get_queue();
    if queue.is_empty() {
        println!("{}", "Queue is empty".yellow());
        return Ok(());
    }

    for id in &queue {
        if !state.registry().contains(id) {
            println!("{:<30} {}", id, "unregistered".dimmed());
        } else if plan.excluded.contains(id) {
            println!("{:<30} {}", id, "excluded".red());
        } else {
            let placement = state.effective_placement(id);
            let placement = match placement {
                Placement::Early => placement.to_string().normal(),
                Placement::Late => placement.to_string().blue(),
            };
            println!("{:<30} {:<6} {}", id, state.effective_priority(id), placement);
        }
    }
    Ok(())
}

fn handle_inspect_command(manifest: &Path, id: &str, config: &Config) -> Result<()> {
    info!("Inspecting module '{}' in {}", id, manifest.display());
    let state = load_state(manifest, config)?;
    let registry = state.registry();

    let Some(module) = registry.get(id) else {
        eyre::bail!("Module '{}' is not registered in {}", id, manifest.display());
    };

    println!("{} {}", "Module:".green(), module.id);
    println!("  address:   {}", module.address.as_deref().unwrap_or("-"));
    println!("  priority:  {} (effective {})", module.priority, state.effective_priority(id));
    println!("  placement: {} (effective {})", module.placement, state.effective_placement(id));

    println!("{}", "Dependencies:".green());
    for dep in state.get_dependencies(id) {
        println!("  {} ({})", dep.target_id, dep.import_kind.as_str());
    }

    let missing = state.check_dependencies(id);
    if !missing.is_empty() {
        println!("{} {}", "Missing:".red(), missing.join(", "));
    }

    let direct = registry.get_dependents(id, EdgeFilter::Any);
    let recursive = registry.get_recursive_dependents(id, EdgeFilter::Any);
    println!("{}", "Dependents:".green());
    for dependent in &recursive {
        let marker = if direct.contains(dependent) { "direct" } else { "indirect" };
        println!("  {} ({})", dependent, marker);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(&config).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
