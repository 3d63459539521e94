//! triviaeval CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "triviaeval",
    version,
    about = "Trivia dataset collector and local LLM evaluator"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the trivia API and append questions to the dataset
    Collect {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Dataset CSV to append to
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Delay between fetches in milliseconds
        #[arg(long)]
        poll_delay_ms: Option<u64>,

        /// Questions requested per fetch
        #[arg(long)]
        amount: Option<u32>,

        /// Stop after this many fetches
        #[arg(long)]
        max_cycles: Option<u32>,

        /// Session token (overrides config)
        #[arg(long)]
        token: Option<String>,
    },

    /// Ask the local model every dataset question and score the answers
    Evaluate {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Dataset CSV to read
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Model name
        #[arg(long)]
        model: Option<String>,

        /// Preset: default, reference, full-file
        #[arg(long)]
        profile: Option<String>,

        /// Stop after this many scored rows
        #[arg(long, conflicts_with = "no_cap")]
        row_cap: Option<usize>,

        /// Process the whole file even if the profile sets a cap
        #[arg(long)]
        no_cap: bool,

        /// Answer comparison: exact, case-insensitive
        #[arg(long)]
        match_mode: Option<String>,

        /// Unparseable replies: empty, lowercased-raw
        #[arg(long)]
        parse_fallback: Option<String>,

        /// Invalid answers: await, discard
        #[arg(long)]
        retry_policy: Option<String>,

        /// Model requests per question, first attempt included
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Delay between model requests in milliseconds
        #[arg(long)]
        request_delay_ms: Option<u64>,

        /// Write the JSON report to this path
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Check a dataset file for malformed or inconsistent rows
    Validate {
        /// Dataset CSV to check
        #[arg(long)]
        dataset: PathBuf,
    },

    /// Request a new trivia API session token
    Token {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config file
    Init,
}

const DEFAULT_LOG_FILTER: &str = "triviaeval=info,triviaeval_core=info,triviaeval_providers=info";

/// `RUST_LOG` directives when set and valid, otherwise info for our crates.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Collect {
            config,
            dataset,
            poll_delay_ms,
            amount,
            max_cycles,
            token,
        } => {
            commands::collect::execute(commands::collect::CollectArgs {
                config,
                dataset,
                poll_delay_ms,
                amount,
                max_cycles,
                token,
            })
            .await
        }
        Commands::Evaluate {
            config,
            dataset,
            model,
            profile,
            row_cap,
            no_cap,
            match_mode,
            parse_fallback,
            retry_policy,
            max_attempts,
            request_delay_ms,
            output,
        } => {
            commands::evaluate::execute(commands::evaluate::EvaluateArgs {
                config,
                dataset,
                model,
                profile,
                row_cap,
                no_cap,
                match_mode,
                parse_fallback,
                retry_policy,
                max_attempts,
                request_delay_ms,
                output,
            })
            .await
        }
        Commands::Validate { dataset } => commands::validate::execute(dataset),
        Commands::Token { config } => commands::token::execute(config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
