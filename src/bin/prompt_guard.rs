//! Prompt Guard CLI binary.
//!
//! Heuristic prompt-injection risk scanner.
//!
//! # Commands
//!
//! - `scan` - Scan text (plus optional external fragments) for injection risk
//! - `patterns` - List the preset detector patterns
//! - `config` - Print the effective configuration as TOML

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use prompt_guard::{
    patterns::{PatternKind, KEYWORD_LITERALS, KEYWORD_REGEXES},
    Config, RiskLevel, ScanContext, ScanOptions, ScanResult, VERSION,
};

#[derive(Parser)]
#[command(name = "prompt-guard")]
#[command(version = VERSION)]
#[command(about = "Prompt Guard - heuristic prompt-injection risk scanner", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: <config dir>/prompt-guard/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan text for prompt-injection risk
    Scan {
        /// Text to scan (or - for stdin)
        input: Option<String>,

        /// Input file path
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// External fragment as SOURCE=PATH (repeatable)
        #[arg(short, long = "external", value_name = "SOURCE=PATH")]
        external: Vec<String>,

        /// Channel trust level (e.g. "high")
        #[arg(long)]
        trust_level: Option<String>,

        /// Extra context entry as KEY=VALUE (repeatable)
        #[arg(long = "context", value_name = "KEY=VALUE")]
        context: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Exit with status 1 when the level reaches this value
        #[arg(long, value_name = "LEVEL")]
        fail_on: Option<RiskLevel>,
    },

    /// List preset detector patterns
    Patterns {
        /// Only this table (injection, context_shift, tool)
        #[arg(short, long)]
        kind: Option<PatternKind>,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Scan {
            input,
            file,
            external,
            trust_level,
            context,
            json,
            fail_on,
        } => {
            let config = load_config(cli.config)?;
            cmd_scan(
                &config,
                input,
                file,
                &external,
                trust_level,
                &context,
                json,
                fail_on,
            )
        },

        Commands::Patterns { kind } => {
            cmd_patterns(kind);
            Ok(())
        },

        Commands::Config => {
            let config = load_config(cli.config)?;
            print!("{}", config.to_toml()?);
            Ok(())
        },
    }
}

fn init_tracing(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(&path)
            .with_context(|| format!("loading {}", path.display()))?
            .with_env_overrides(),
        None => Config::load()?,
    };
    config.validate()?;
    Ok(config)
}

#[allow(clippy::too_many_arguments)]
fn cmd_scan(
    config: &Config,
    input: Option<String>,
    file: Option<PathBuf>,
    external: &[String],
    trust_level: Option<String>,
    context: &[String],
    json_output: bool,
    fail_on: Option<RiskLevel>,
) -> anyhow::Result<()> {
    let content = read_input(input, file)?;
    let scanner = config.build_scanner()?;

    let mut ctx = ScanContext::new();
    if let Some(level) = trust_level {
        ctx = ctx.with_trust_level(level);
    }
    for entry in context {
        let (key, value) = split_pair(entry, "--context")?;
        ctx = ctx.with(key, value);
    }

    let mut options = ScanOptions::new().with_context(ctx);
    for entry in external {
        let (source, path) = split_pair(entry, "--external")?;
        let body = std::fs::read_to_string(path)
            .with_context(|| format!("reading external fragment {path}"))?;
        options = options.with_external(source, body);
    }

    let result = scanner.scan(&content, &options);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&result);
    }

    if fail_on.is_some_and(|threshold| result.level >= threshold) {
        std::process::exit(1);
    }

    Ok(())
}

fn print_report(result: &ScanResult) {
    let label = match result.level {
        RiskLevel::Low => "LOW",
        RiskLevel::Medium => "MEDIUM",
        RiskLevel::High => "HIGH",
    };
    println!("RISK {label} (score: {})", result.score);

    if result.is_clean() {
        return;
    }

    println!();
    println!("Detections:");
    for finding in &result.detections {
        let origin = match &finding.source {
            Some(source) => format!("external:{source}"),
            None => finding.origin.to_string(),
        };
        println!(
            "  - [{}] {} ({origin}) score: {}",
            finding.severity, finding.detector, finding.score
        );
        println!("    {}", finding.message);
    }
}

fn cmd_patterns(kind: Option<PatternKind>) {
    let kinds: Vec<PatternKind> = match kind {
        Some(k) => vec![k],
        None => PatternKind::ALL.to_vec(),
    };

    for kind in kinds {
        println!("[{kind}]");
        for pattern in kind.table() {
            println!("  {:<24} {}", pattern.name, pattern.description);
            println!("  {:<24} {}", "", pattern.pattern);
        }
        println!();
    }

    if kind.is_none() {
        println!("[keyword]");
        for literal in KEYWORD_LITERALS {
            println!("  \"{literal}\"");
        }
        for regex in KEYWORD_REGEXES {
            println!("  /{regex}/");
        }
    }
}

fn split_pair<'a>(entry: &'a str, flag: &str) -> anyhow::Result<(&'a str, &'a str)> {
    entry
        .split_once('=')
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| anyhow::anyhow!("{flag} expects KEY=VALUE, got `{entry}`"))
}

fn read_input(input: Option<String>, file: Option<PathBuf>) -> anyhow::Result<String> {
    if let Some(path) = file {
        Ok(std::fs::read_to_string(path)?)
    } else if let Some(s) = input {
        if s == "-" {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        } else {
            Ok(s)
        }
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    }
}
