use anyhow::{Context, Result};
use chainjacking::{
    checker::GithubAccountChecker,
    config::Config,
    input::InputSources,
    output::{format_result_to_string, print_result, OutputFormat},
    scanner::{ChainScanner, ScanOptions},
    toolchain::GoToolchain,
    ScanResult,
};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const VULNERABLE: u8 = 1;
    pub const ERROR: u8 = 2;
}

#[derive(Parser)]
#[command(name = "chainjacking")]
#[command(
    author,
    version,
    about = "Find Go dependencies that can be taken over through deleted GitHub accounts"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan Go modules for dependencies owned by deleted GitHub accounts
    Scan {
        /// GitHub token used for account lookups
        #[arg(short = 't', long, env = "GITHUB_TOKEN", hide_env_values = true)]
        github_token: String,

        /// Path to scan (default: current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Module to scan, e.g. github.com/owner/repo[@version] (repeatable)
        #[arg(long = "url", num_args = 1..)]
        urls: Vec<String>,

        /// File with one module per line
        #[arg(short = 'f', long = "file")]
        urls_file: Option<PathBuf>,

        /// Output format (table, json, sarif)
        #[arg(long)]
        format: Option<String>,

        /// Write output to file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Modules to scan at the same time
        #[arg(long)]
        concurrency: Option<usize>,

        /// Verbose output mode
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

struct ScanArgs {
    github_token: String,
    sources: InputSources,
    format: String,
    output: Option<PathBuf>,
    concurrency: usize,
    interactive: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Scan { verbose: true, .. });
    init_tracing(verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(false)
        .without_time()
        .init();
}

async fn run(cli: Cli) -> Result<u8> {
    match cli.command {
        Commands::Scan {
            github_token,
            path,
            urls,
            urls_file,
            format,
            output,
            concurrency,
            verbose,
        } => {
            let config = Config::load()?;
            let args = ScanArgs {
                github_token,
                sources: InputSources {
                    urls,
                    urls_file,
                    path,
                },
                format: format.unwrap_or_else(|| config.default_format.clone()),
                output,
                concurrency: concurrency.unwrap_or(config.concurrency),
                interactive: !verbose,
            };
            run_scan(args, &config).await
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

async fn run_scan(args: ScanArgs, config: &Config) -> Result<u8> {
    let format = OutputFormat::from_str(&args.format).map_err(|e| anyhow::anyhow!(e))?;

    let toolchain = GoToolchain::with_binary(&config.go_binary);
    toolchain.version().await.with_context(|| {
        format!(
            "Go binaries are not installed (tried \"{}\"). Visit https://golang.org/doc/install",
            toolchain.binary()
        )
    })?;

    let cwd = std::env::current_dir()?;
    let references = args.sources.collect(&cwd)?;

    let checker =
        GithubAccountChecker::with_api_url(&config.api_url, args.github_token, config.retry_policy())?;
    let scanner = ChainScanner::new(toolchain, checker).with_options(ScanOptions {
        concurrency: args.concurrency,
        ignore: config.ignore.clone(),
    });

    let progress = if args.interactive && format == OutputFormat::Table {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Scanning {} modules...", references.len()));
        Some(pb)
    } else {
        None
    };

    let scan = scanner.scan(&references).await;
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    let result = scan?;

    report_findings(&result);

    if let Some(path) = args.output {
        let rendered = format_result_to_string(&result, format)?;
        std::fs::write(&path, rendered)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Results written to: {}", path.display());
    } else {
        print_result(&result, format)?;
    }

    Ok(if !result.is_clean() {
        exit_codes::VULNERABLE
    } else if !result.is_conclusive() {
        exit_codes::ERROR
    } else {
        exit_codes::SUCCESS
    })
}

fn report_findings(result: &ScanResult) {
    for module in result.failed() {
        info!("⚠ Could not scan \"{}\"; rerun with -v for details", module.reference);
    }

    let vulnerable = result.vulnerable_packages();
    for package in &vulnerable {
        error!("⚠ Go package \"{}\" is vulnerable to ChainJacking attack", package);
    }

    if !result.is_conclusive() {
        warn!("⚠ No module could be analyzed; nothing was checked for ChainJacking exposure");
    } else if vulnerable.is_empty() {
        info!("✅ Dependencies analyzed and found to be safe from ChainJacking attacks");
    }
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        Config::default().save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'chainjacking config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
