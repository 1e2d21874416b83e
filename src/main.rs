use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use known_canonical::{Config, run};
use tracing_subscriber::EnvFilter;

/// Build a canonical-transcript coordinate table from UCSC knownGene/knownCanonical.
#[derive(Parser, Debug)]
#[command(name = "known-canonical")]
#[command(author, version, about)]
struct Cli {
    /// Genome assembly identifier (e.g. hg19, hg38)
    #[arg(long, short)]
    assembly: Option<String>,

    /// Output file (default: knownGeneCanonical.txt.<assembly>)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Download host prefix
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Parent directory for the per-run working directory
    #[arg(long, value_name = "DIR")]
    temp_dir: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Number of output lines echoed on success
    #[arg(long, value_name = "N")]
    preview: Option<usize>,

    /// TOML config file; flags override its values
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn into_config(self) -> known_canonical::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(assembly) = self.assembly {
            config.assembly = assembly;
        }
        if let Some(output) = self.output {
            config.output = Some(output);
        }
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(temp_dir) = self.temp_dir {
            config.temp_dir = Some(temp_dir);
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = Some(timeout);
        }
        if let Some(preview) = self.preview {
            config.preview_lines = preview;
        }
        Ok(config)
    }
}

/// Default filter level for a `-v` count
fn verbosity_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Filter directive to log with; a non-empty `RUST_LOG` wins over `-v`
fn log_directive(verbose: u8, rust_log: Option<&str>) -> String {
    match rust_log.map(str::trim) {
        Some(directive) if !directive.is_empty() => directive.to_string(),
        _ => verbosity_level(verbose).to_string(),
    }
}

fn init_logging(verbose: u8) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = log_directive(verbose, rust_log.as_deref());
    let filter = EnvFilter::try_new(&directive)
        .unwrap_or_else(|_| EnvFilter::new(verbosity_level(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.into_config() {
        Ok(config) => run(&config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(summary) => {
            print!("{summary}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::debug!(code = e.error_code(), "run failed");
            eprintln!("error: {} stage failed: {}", e.stage(), e);
            ExitCode::FAILURE
        }
    }
}
