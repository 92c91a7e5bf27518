// ABOUTME: Daybook CLI entry point for dated markdown ledgers
// ABOUTME: Provides subcommands: standup, changelog, ingest, lint

mod commands;

use clap::{Parser, Subcommand};
use daybook_lib::Config;
use std::path::PathBuf;

/// Daybook CLI - Standups and changelogs from dated markdown ledgers
#[derive(Parser)]
#[command(name = "daybook")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Vault root (defaults to $OBSIDIAN_VAULT_PATH or the platform default)
    #[arg(long, global = true)]
    vault: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate completed work, next steps and blockers across projects
    Standup {
        /// Time range for completed items, e.g. "3 days"
        #[arg(long, default_value = "1 day")]
        since: String,
        /// Weekly summary (last 7 days)
        #[arg(long)]
        week: bool,
        /// Copy the report to the clipboard
        #[arg(short, long)]
        copy: bool,
        /// Single project only
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Add merged pull requests to the project and vault changelogs
    Changelog {
        /// Time range passed to git, e.g. "3 days ago"
        #[arg(long, default_value = "1 day ago")]
        since: String,
        /// Specific PR number to add
        #[arg(long)]
        pr: Option<u64>,
        /// Preview entries without writing files
        #[arg(short = 'n', long)]
        dry_run: bool,
        /// Repository directory (defaults to the current directory)
        #[arg(short, long)]
        project: Option<PathBuf>,
    },
    /// Merge a session extract (oracle JSON output) into a project's ledgers
    Ingest {
        /// Project name inside the vault
        #[arg(short, long)]
        project: String,
        /// Read the extract from this file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Date section to write, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<String>,
        /// Preview entries without writing files
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
    /// Report records that appear before the first date header
    Lint {
        /// Ledger files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact();

    let _ = subscriber.try_init();
}

fn resolve_config(vault: Option<PathBuf>) -> daybook_lib::Result<Config> {
    match vault {
        Some(path) => Ok(Config::with_vault(path)),
        None => Config::from_env(),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = resolve_config(cli.vault).and_then(|config| match cli.command {
        Commands::Standup {
            since,
            week,
            copy,
            project,
        } => commands::standup::run(
            &config,
            &commands::standup::StandupConfig {
                since,
                week,
                copy,
                project,
                verbose: cli.verbose,
            },
        ),
        Commands::Changelog {
            since,
            pr,
            dry_run,
            project,
        } => commands::changelog::run(
            &config,
            &commands::changelog::ChangelogConfig {
                since,
                pr,
                dry_run,
                project,
                verbose: cli.verbose,
            },
        ),
        Commands::Ingest {
            project,
            file,
            date,
            dry_run,
        } => commands::ingest::run(
            &config,
            &commands::ingest::IngestConfig {
                project,
                file,
                date,
                dry_run,
                verbose: cli.verbose,
            },
        ),
        Commands::Lint { files } => commands::lint::run(&commands::lint::LintConfig {
            files,
            verbose: cli.verbose,
        }),
    });

    if let Err(e) = result {
        eprintln!("❌ Error: {e}");
        std::process::exit(1);
    }
}
