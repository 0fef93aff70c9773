//! Regmux - package registry switcher
//!
//! Usage:
//!   regmux ls            # List registries
//!   regmux use [name]    # Switch registry (fastest when no name is given)
//!   regmux test          # Measure registry latency
//!   regmux config init   # Create the config file

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use dialoguer::{Confirm, theme::ColorfulTheme};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use regmux_core::config::{ConfigError, CustomRegistry};
use regmux_core::context::AppContext;
use regmux_core::latency::LatencyResult;
use regmux_core::manager::{
    PackageManagerAdapter, PackageManagerInfo, PackageManagerKind, restore_defaults,
};
use regmux_core::registry::{RegistryError, RegistryResolver, rank_results};
use regmux_core::types::RegistryEntry;

#[derive(Parser)]
#[command(name = "regmux")]
#[command(about = "Switch and benchmark npm, yarn, pnpm and bun registries", long_about = None)]
#[command(version)]
struct Cli {
    /// Use this config file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all registries
    Ls {
        /// Show home page and description
        #[arg(short = 'v', long)]
        verbose: bool,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show the registry npm is using
    Current {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Switch every installed package manager to a registry
    ///
    /// Without a name, all registries are tested and the fastest is used.
    Use {
        /// Registry name
        name: Option<String>,
    },

    /// Measure latency of registries
    Test {
        /// Registry names (default: all)
        names: Vec<String>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Add a custom registry
    Add {
        /// Registry name (letters, digits and underscores)
        name: String,
        /// Registry URL
        url: String,
        /// Home page
        home: Option<String>,
        /// Description
        description: Option<String>,
    },

    /// Remove custom registries
    Rm {
        /// Registry name
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        name: Option<String>,

        /// Remove every custom registry
        #[arg(long)]
        all: bool,

        /// Skip confirmation prompts
        #[arg(short, long)]
        force: bool,
    },

    /// Rename a custom registry
    Rename {
        old: String,
        new: String,

        /// Skip confirmation prompts
        #[arg(short, long)]
        force: bool,
    },

    /// Restore package managers to their default registries
    Unuse(UnuseArgs),

    /// Show installed package managers and their registries
    Info {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Manage the config file
    Config(ConfigArgs),
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

#[derive(Args)]
struct UnuseArgs {
    #[arg(long)]
    npm: bool,
    #[arg(long)]
    yarn: bool,
    #[arg(long)]
    pnpm: bool,
    #[arg(long)]
    bun: bool,
    /// Every package manager (default when none is selected)
    #[arg(long)]
    all: bool,
}

impl UnuseArgs {
    fn kinds(&self) -> Vec<PackageManagerKind> {
        let selected: Vec<PackageManagerKind> = [
            (self.npm, PackageManagerKind::Npm),
            (self.yarn, PackageManagerKind::Yarn),
            (self.pnpm, PackageManagerKind::Pnpm),
            (self.bun, PackageManagerKind::Bun),
        ]
        .into_iter()
        .filter_map(|(on, kind)| on.then_some(kind))
        .collect();

        if self.all || selected.is_empty() {
            PackageManagerKind::ALL.to_vec()
        } else {
            selected
        }
    }
}

#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Print the config file
    Show,
    /// Print the config file location
    Path,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "regmux=warn,regmux_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let ctx = AppContext::with_defaults(cli.config)?;

    run_cli(&ctx, cli.command)
}

fn run_cli(ctx: &AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::Ls { verbose, format } => run_ls(ctx, verbose, format),
        Commands::Current { format } => run_current(ctx, format),
        Commands::Use { name } => run_use(ctx, name),
        Commands::Test { names, format } => run_test(ctx, names, format),
        Commands::Add {
            name,
            url,
            home,
            description,
        } => run_add(ctx, name, url, home, description),
        Commands::Rm { name, all, force } => run_rm(ctx, name, all, force),
        Commands::Rename { old, new, force } => run_rename(ctx, old, new, force),
        Commands::Unuse(args) => run_unuse(ctx, &args),
        Commands::Info { format } => run_info(ctx, format),
        Commands::Config(args) => run_config(ctx, args),
    }
}

/// Open the resolver, turning a missing config file into a hint.
fn open_resolver(ctx: &AppContext) -> Result<RegistryResolver> {
    match ctx.resolver() {
        Ok(resolver) => Ok(resolver),
        Err(e) if e.is_config_missing() => anyhow::bail!(
            "Config file not found at {}\nRun `regmux config init` to create one",
            ctx.config_path().display()
        ),
        Err(e) => Err(e.into()),
    }
}

fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    Ok(runtime.block_on(future))
}

fn confirm(prompt: String) -> Result<bool> {
    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()?;
    Ok(confirmed)
}

/// Name of the active registry, when it is a known one.
fn active_name(resolver: &RegistryResolver) -> Option<String> {
    resolver
        .current()
        .ok()
        .filter(|entry| !entry.is_unknown())
        .map(|entry| entry.name)
}

// ============================================================================
// Registry commands
// ============================================================================

fn run_ls(ctx: &AppContext, verbose: bool, format: OutputFormat) -> Result<()> {
    let resolver = open_resolver(ctx)?;
    let entries = resolver.list();
    let active = active_name(&resolver);

    match format {
        OutputFormat::Table => print_registry_table(&entries, active.as_deref(), verbose),
        OutputFormat::Json => {
            let output: Vec<_> = entries
                .iter()
                .map(|entry| {
                    serde_json::json!({
                        "name": entry.name,
                        "url": entry.url,
                        "home": entry.home,
                        "description": entry.description,
                        "origin": entry.origin,
                        "active": active.as_deref() == Some(entry.name.as_str()),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn print_registry_table(entries: &[RegistryEntry], active: Option<&str>, verbose: bool) {
    for entry in entries {
        let is_active = active == Some(entry.name.as_str());
        let marker = if is_active { "*" } else { " " };
        let name = format!("{:<12}", entry.name);
        let name = if is_active {
            style(name).green().bold()
        } else if entry.is_builtin() {
            style(name)
        } else {
            style(name).cyan()
        };

        println!("{} {} {}", marker, name, entry.url);
        if verbose {
            if let Some(home) = &entry.home {
                println!("  {:<12} home: {}", "", style(home).dim());
            }
            if let Some(description) = &entry.description {
                println!("  {:<12} {}", "", style(description).dim());
            }
        }
    }
}

fn run_current(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let resolver = open_resolver(ctx)?;
    let entry = resolver.current()?;

    match format {
        OutputFormat::Table => {
            if entry.is_unknown() {
                println!(
                    "Using an unlisted registry: {}",
                    style(&entry.url).yellow()
                );
            } else {
                println!(
                    "Using {} ({})",
                    style(&entry.name).green().bold(),
                    entry.url
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entry)?),
    }

    Ok(())
}

fn run_use(ctx: &AppContext, name: Option<String>) -> Result<()> {
    let resolver = open_resolver(ctx)?;

    let (registry, applied) = match name {
        Some(name) => {
            let report = resolver.use_registry(&name)?;
            (report.registry, report.applied)
        }
        None => {
            println!("Testing {} registries...", resolver.list().len());
            let report = match block_on(resolver.use_fastest())? {
                Ok(report) => report,
                Err(e @ RegistryError::NoReachableRegistry { .. }) => {
                    anyhow::bail!("{}. Check your network connection", e)
                }
                Err(e) => return Err(e.into()),
            };
            if let Some(fastest) = report.ranked.first() {
                println!(
                    "Fastest: {} ({}ms)",
                    style(&fastest.name).green(),
                    fastest.latency_ms()
                );
            }
            (report.winner, report.applied)
        }
    };

    if applied.is_empty() {
        anyhow::bail!("No package manager installed");
    }

    println!(
        "{} Registry set to {} ({})",
        style("✓").green(),
        style(&registry.name).green().bold(),
        registry.url
    );
    let managers: Vec<&str> = applied.iter().map(|kind| kind.id()).collect();
    println!("  Applied to: {}", managers.join(", "));

    Ok(())
}

fn run_test(ctx: &AppContext, names: Vec<String>, format: OutputFormat) -> Result<()> {
    let resolver = open_resolver(ctx)?;
    let results = block_on(resolver.test(&names))?;
    let ranked = rank_results(results);
    let active = active_name(&resolver);

    match format {
        OutputFormat::Table => print_latency_table(&ranked, active.as_deref()),
        OutputFormat::Json => {
            let output: Vec<_> = ranked
                .iter()
                .map(|result| {
                    serde_json::json!({
                        "name": result.name,
                        "url": result.url,
                        "online": result.is_online,
                        "latency_ms": result.latency_ms() as u64,
                        "error": result.error,
                        "tested_at": result.tested_at.to_rfc3339(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn print_latency_table(results: &[LatencyResult], active: Option<&str>) {
    for result in results {
        let marker = if active == Some(result.name.as_str()) {
            "*"
        } else {
            " "
        };
        let status = match &result.error {
            None => style(format!("{:>6}ms", result.latency_ms())).green(),
            Some(_) => style(format!("{:>8}", "offline")).red(),
        };
        print!("{} {:<12} {}", marker, result.name, status);
        match &result.error {
            Some(error) => println!("  {}", style(error).dim()),
            None => println!(),
        }
    }
}

fn run_add(
    ctx: &AppContext,
    name: String,
    url: String,
    home: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let resolver = open_resolver(ctx)?;
    let registry = CustomRegistry {
        url,
        home,
        description,
    };
    let entry = resolver.add(&name, registry)?;

    println!(
        "{} Added registry '{}' ({})",
        style("✓").green(),
        entry.name,
        entry.url
    );
    println!("  Switch to it with: regmux use {}", entry.name);
    Ok(())
}

fn run_rm(ctx: &AppContext, name: Option<String>, all: bool, force: bool) -> Result<()> {
    let resolver = open_resolver(ctx)?;

    if all {
        let count = resolver.document().custom_registries.len();
        if count == 0 {
            println!("No custom registries to remove");
            return Ok(());
        }
        if !force && !confirm(format!("Remove all {} custom registries?", count))? {
            println!("Cancelled.");
            return Ok(());
        }

        let report = resolver.remove_all();
        println!(
            "{} Removed {} custom registries",
            style("✓").green(),
            report.removed.len()
        );
        for (name, error) in &report.failed {
            println!("  {} {}: {}", style("✗").red(), name, error);
        }
        if !report.failed.is_empty() {
            anyhow::bail!("{} registries could not be removed", report.failed.len());
        }
        return Ok(());
    }

    let name = name.ok_or_else(|| anyhow::anyhow!("Missing required argument: name"))?;
    if !force
        && active_name(&resolver).as_deref() == Some(name.as_str())
        && !confirm(format!("'{}' is the active registry. Remove it anyway?", name))?
    {
        println!("Cancelled.");
        return Ok(());
    }

    let entry = resolver.remove(&name)?;
    println!("{} Removed registry '{}'", style("✓").green(), entry.name);
    Ok(())
}

fn run_rename(ctx: &AppContext, old: String, new: String, force: bool) -> Result<()> {
    let resolver = open_resolver(ctx)?;

    if !force
        && active_name(&resolver).as_deref() == Some(old.as_str())
        && !confirm(format!(
            "'{}' is the active registry. Rename it and re-apply as '{}'?",
            old, new
        ))?
    {
        println!("Cancelled.");
        return Ok(());
    }

    let report = resolver.rename(&old, &new)?;
    println!(
        "{} Renamed registry '{}' to '{}'",
        style("✓").green(),
        report.old,
        report.new.name
    );

    match report.reapplied {
        None => {}
        Some(Ok(usage)) => {
            let managers: Vec<&str> = usage.applied.iter().map(|kind| kind.id()).collect();
            println!("  Re-applied to: {}", managers.join(", "));
        }
        Some(Err(e)) => {
            println!("  {} Failed to re-apply: {:#}", style("⚠").yellow(), e);
            println!("  Run `regmux use {}` to retry", report.new.name);
        }
    }

    Ok(())
}

// ============================================================================
// Package manager commands
// ============================================================================

fn run_unuse(ctx: &AppContext, args: &UnuseArgs) -> Result<()> {
    let adapter = ctx.adapter();
    let report = restore_defaults(&adapter, &args.kinds());

    for kind in &report.restored {
        println!(
            "{} {} restored to {}",
            style("✓").green(),
            kind,
            kind.default_registry()
        );
    }
    for kind in &report.not_installed {
        println!("  {} {} not installed, skipped", style("•").dim(), kind);
    }
    for (kind, error) in &report.failed {
        println!("{} {}: {:#}", style("✗").red(), kind, error);
    }

    if !report.failed.is_empty() {
        anyhow::bail!("{} package managers could not be restored", report.failed.len());
    }
    Ok(())
}

fn run_info(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let managers = ctx.adapter().detect();

    match format {
        OutputFormat::Table => print_manager_table(&managers),
        OutputFormat::Json => {
            let output: Vec<_> = managers
                .iter()
                .map(|info| {
                    serde_json::json!({
                        "name": info.kind,
                        "installed": info.installed,
                        "version": info.version,
                        "registry": info.registry_url,
                        "config_path": info.config_path.as_ref().map(|p| p.display().to_string()),
                        "config_exists": info.config_exists,
                        "error": info.error,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn print_manager_table(managers: &[PackageManagerInfo]) {
    println!("{:<8} {:<12} {:<45} Config", "Manager", "Version", "Registry");
    println!("{}", "-".repeat(90));

    for info in managers {
        if !info.installed {
            println!(
                "{:<8} {}",
                info.kind.id(),
                style("not installed").dim()
            );
            continue;
        }

        let config = match &info.config_path {
            Some(path) if info.config_exists => path.display().to_string(),
            Some(path) => format!("{} (missing)", path.display()),
            None => "-".to_string(),
        };
        println!(
            "{:<8} {:<12} {:<45} {}",
            info.kind.id(),
            info.version.as_deref().unwrap_or("-"),
            info.registry_url.as_deref().unwrap_or("-"),
            config
        );
    }
}

// ============================================================================
// Config commands
// ============================================================================

fn run_config(ctx: &AppContext, args: ConfigArgs) -> Result<()> {
    let store = ctx.config_store();

    match args.command {
        ConfigSubcommand::Init { force } => {
            store.init(force).map_err(|e| match e {
                ConfigError::AlreadyExists { path } => anyhow::anyhow!(
                    "Config file already exists at {}\nUse --force to overwrite it",
                    path.display()
                ),
                other => other.into(),
            })?;
            println!(
                "{} Created config file at {}",
                style("✓").green(),
                store.config_path().display()
            );
        }
        ConfigSubcommand::Show => {
            let content = store.read_raw().map_err(|e| {
                if e.is_not_found() {
                    anyhow::anyhow!(
                        "Config file not found at {}\nRun `regmux config init` to create one",
                        store.config_path().display()
                    )
                } else {
                    e.into()
                }
            })?;
            print!("{}", content);
        }
        ConfigSubcommand::Path => println!("{}", store.config_path().display()),
    }

    Ok(())
}
