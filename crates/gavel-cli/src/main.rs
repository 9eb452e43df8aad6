//! Gavel CLI
//!
//! A command-line tool for judging a source file against a problem's test cases.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gavel::{
    Config, EXAMPLE_CONFIG, JudgeRequest, JudgeSession, MemoryStore, Problem, Submission,
};
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gavel")]
#[command(about = "A judge engine for programming problems")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new configuration file
    Init {
        /// Output path (default: gavel.toml)
        #[arg(short, long, default_value = "gavel.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Judge a source file against a problem
    Judge {
        /// Source file to judge
        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        /// Problem file (TOML or JSON) with limits and test cases
        #[arg(short, long, value_name = "FILE")]
        problem: PathBuf,

        /// Language ID (default: configured default_language)
        #[arg(short, long)]
        language: Option<String>,

        /// User ID recorded on the submission
        #[arg(short, long, default_value = "cli")]
        user: String,

        /// Print the submission as JSON
        #[arg(long)]
        json: bool,
    },

    /// List available languages
    Languages,

    /// Show effective configuration
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = if let Some(ref path) = cli.config {
        info!(?path, "loading configuration");
        Config::from_file(path).context("failed to load configuration")?
    } else {
        debug!("using default configuration");
        Config::default()
    };

    match cli.command {
        Commands::Init { output, force } => init_config(&output, force).await,
        Commands::Judge {
            source,
            problem,
            language,
            user,
            json,
        } => run_judge(config, &source, &problem, language.as_deref(), &user, json).await,
        Commands::Languages => {
            list_languages(&config);
            Ok(())
        }
        Commands::ShowConfig => {
            show_config(&config);
            Ok(())
        }
    }
}

async fn run_judge(
    config: Config,
    source: &Path,
    problem_path: &Path,
    language: Option<&str>,
    user: &str,
    json: bool,
) -> Result<()> {
    let source_content = tokio::fs::read(source)
        .await
        .context("failed to read source file")?;

    let problem = Problem::from_file(problem_path).context("failed to load problem")?;
    let problem_id = problem.id.clone();
    info!(
        problem = %problem_id,
        tests = problem.test_cases.len(),
        "judging submission"
    );

    let store = MemoryStore::new();
    store
        .insert_problem(problem)
        .context("failed to register problem")?;
    store
        .insert_user(user)
        .context("failed to register user")?;

    let session = JudgeSession::new(config, store);
    let submission = session
        .judge_request(JudgeRequest {
            problem_id: &problem_id,
            user_id: user,
            source: &source_content,
            language,
        })
        .await
        .context("judging failed")?;

    if json {
        let out = serde_json::to_string_pretty(&submission)
            .context("failed to serialize submission")?;
        println!("{out}");
    } else {
        print_submission(&submission);
    }

    if submission.status.is_accepted() {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

fn print_submission(submission: &Submission) {
    println!("Submission: {}", submission.id);
    println!("Status: {} ({})", submission.status, submission.status.code());
    if !submission.message.is_empty() {
        println!("\n{}", submission.message.trim_end());
    }
}

fn list_languages(config: &Config) {
    println!("Available languages:\n");

    let mut languages: Vec<_> = config.languages.iter().collect();
    languages.sort_by_key(|(id, _)| *id);

    for (id, lang) in languages {
        let default = if config.default_language.as_deref() == Some(id.as_str()) {
            " [default]"
        } else {
            ""
        };
        println!("  {:<15} {} (.{}){}", id, lang.name, lang.extension, default);
    }
}

fn show_config(config: &Config) {
    println!("Source directory: {}", config.source_dir.display());
    println!(
        "Default language: {}",
        config.default_language.as_deref().unwrap_or("(none)")
    );
    println!(
        "Max concurrent judges: {}",
        limit_display(config.max_concurrent_judges)
    );
    println!(
        "Max parallel tests: {}",
        limit_display(config.max_parallel_tests)
    );
    println!(
        "Memory sample interval: {} ms",
        config.memory_sample_interval_ms
    );
    println!();
    println!("Languages configured: {}", config.languages.len());
}

fn limit_display(limit: Option<usize>) -> String {
    limit.map_or_else(|| "unbounded".to_owned(), |n| n.to_string())
}

async fn init_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists at '{}'. Use --force to overwrite.",
            output.display()
        );
    }

    tokio::fs::write(output, EXAMPLE_CONFIG)
        .await
        .context("failed to write configuration file")?;

    println!("Created configuration file at '{}'", output.display());
    Ok(())
}
