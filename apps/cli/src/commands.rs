//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use cabundler_bundle::{BuildConfig, BuildResult, ProgressReporter, build_bundles};
use cabundler_fetcher::Fetcher;
use cabundler_shared::{AppConfig, Strength, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// cabundler — build trusted-certificate bundles from CCADB reports.
#[derive(Parser)]
#[command(
    name = "cabundler",
    version,
    about = "Build intermediate/root certificate bundles from the CCADB reports.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Download both certificate reports and write the six bundle files.
    Build {
        /// Output directory for the bundle files.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Also write one .pem file per certificate.
        #[arg(long)]
        individual_files: bool,

        /// Override the intermediate-certificates report URL.
        #[arg(long)]
        intermediate_url: Option<String>,

        /// Override the root-certificates report URL.
        #[arg(long)]
        root_url: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "cabundler=info",
        1 => "cabundler=debug",
        _ => "cabundler=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Build {
            out,
            individual_files,
            intermediate_url,
            root_url,
        } => cmd_build(out, individual_files, intermediate_url, root_url).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// build
// ---------------------------------------------------------------------------

async fn cmd_build(
    out: Option<PathBuf>,
    individual_files: bool,
    intermediate_url: Option<String>,
    root_url: Option<String>,
) -> Result<()> {
    let config = load_config()?;

    // CLI flags override config file values.
    let mut build_config = BuildConfig::from(&config);
    if let Some(dir) = out {
        build_config.output_dir = dir;
    }
    if individual_files {
        build_config.individual_files = true;
    }
    if let Some(url) = intermediate_url {
        build_config.intermediate_url = url;
    }
    if let Some(url) = root_url {
        build_config.root_url = url;
    }

    info!(
        output_dir = %build_config.output_dir.display(),
        individual_files = build_config.individual_files,
        "building certificate bundles"
    );

    let fetcher = Fetcher::new()?;
    let reporter = CliProgress::new();

    let result = build_bundles(&build_config, &fetcher, &reporter).await?;

    print_summary(&result);
    Ok(())
}

/// Post-build summary in the style of the report endpoints' grouping.
fn print_summary(result: &BuildResult) {
    println!();
    println!("  Intermediate and root certificate bundles generated");
    println!("  ---------------------------------------------------");
    println!("  All certificates:");
    for bundle in result
        .bundles
        .iter()
        .filter(|b| b.strength == Strength::All)
    {
        println!("    {} ({} certificates)", bundle.path.display(), bundle.records);
    }
    println!();
    println!("  Excluding weak signature digest algorithms:");
    for bundle in result
        .bundles
        .iter()
        .filter(|b| b.strength == Strength::StrongOnly)
    {
        println!("    {} ({} certificates)", bundle.path.display(), bundle.records);
    }
    println!();
    println!("  Time: {:.1}s", result.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn record_processed(&self, common_name: &str, current: usize) {
        self.spinner
            .set_message(format!("Processing [{current}] {common_name}"));
    }

    fn done(&self, _result: &BuildResult) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
