use anyhow::{bail, Context, Result};
use background_service::{AnalysisLauncher, Summary};
use boardwatch_core::{
    AnalysisConfig, BotConfig, CheckpointError, ConfigError, CoreError, ErrorExt,
};
use clap::{Parser, Subcommand};
use feed_client::{notifier_from_config, LogNotifier, Notifier};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "boardwatch",
    version,
    about = "Comment board monitor: checkpoint and configuration tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a checkpoint, validate it and print its totals
    Inspect { file: PathBuf },

    /// Run the analysis program on a checkpoint and wait for it
    Analyse {
        file: PathBuf,

        /// Ask the analysis program to publish its result
        #[arg(long)]
        publish: bool,

        /// Take the analysis program and webhook from this config
        #[arg(long, short)]
        config: Option<PathBuf>,
    },

    /// Parse and validate a bot configuration file
    CheckConfig { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("boardwatch=info,background_service=info")),
        )
        .init();

    let cli = Cli::parse();
    tracing::debug!(command = ?cli.command, "Starting boardwatch");
    let result = match cli.command {
        Command::Inspect { file } => inspect(&file).await,
        Command::Analyse {
            file,
            publish,
            config,
        } => analyse(&file, publish, config.as_deref()).await,
        Command::CheckConfig { file } => check_config(&file),
    };

    if let Err(e) = &result {
        if let Some(hint) = operator_hint(e) {
            eprintln!("{}", hint);
        }
    }
    result
}

/// Plain-language advice for the first boardwatch error in the chain.
fn operator_hint(err: &anyhow::Error) -> Option<String> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<CoreError>() {
            Some(e.user_friendly_message())
        } else if let Some(e) = cause.downcast_ref::<ConfigError>() {
            Some(e.user_friendly_message())
        } else {
            cause
                .downcast_ref::<CheckpointError>()
                .map(|e| e.user_friendly_message())
        }
    })
}

async fn inspect(file: &Path) -> Result<()> {
    let summary = Summary::load(file)
        .await
        .with_context(|| format!("cannot use checkpoint {}", file.display()))?;
    let board = &summary.board;
    let account = &summary.account;

    let peak = board
        .hot
        .iter()
        .enumerate()
        .max_by_key(|(_, count)| **count)
        .filter(|(_, count)| **count > 0);
    let worst = board.awl.iter().copied().max().unwrap_or(0);

    println!("checkpoint  {} (version {})", file.display(), summary.version);
    println!("window      {} .. {}", summary.start, summary.end);
    println!("board       {} (oid {})", board.name, board.oid);
    println!(
        "comments    {} from {} people, totals {} -> {}",
        board.count,
        board.people.len(),
        board.start_all_count,
        board.end_all_count
    );
    match peak {
        Some((minute, count)) => println!("peak        minute {} with {} comments", minute, count),
        None => println!("peak        none"),
    }
    println!("worst delay {}", background_service::format_delay(worst));
    println!(
        "followers   {} ({}) {} -> {}, {} samples",
        account.name,
        account.alias,
        account.start_followers,
        account.end_followers,
        account.fans_count.len()
    );
    Ok(())
}

async fn analyse(file: &Path, publish: bool, config: Option<&Path>) -> Result<()> {
    let (analysis, notifier): (AnalysisConfig, Arc<dyn Notifier>) = match config {
        Some(path) => {
            let config = BotConfig::load(path)?;
            let notifier = notifier_from_config(&config)?;
            (config.analysis, notifier)
        }
        None => (
            AnalysisConfig::default(),
            Arc::new(LogNotifier) as Arc<dyn Notifier>,
        ),
    };

    let launcher = AnalysisLauncher::new(&analysis, notifier);
    let outcome = launcher
        .launch(file, publish)
        .await
        .context("analysis task ended without reporting")?;

    if let Err(e) = outcome {
        bail!("analysis of {} failed: {}", file.display(), e);
    }
    println!("analysis of {} finished", file.display());
    Ok(())
}

fn check_config(file: &Path) -> Result<()> {
    let config = BotConfig::load(file)?;
    println!(
        "ok: board {} (oid {}, type {}), account {} ({})",
        config.board.name,
        config.board.oid,
        config.board.kind.code(),
        config.account.uid,
        config.account.alias
    );
    println!(
        "poll every {}s, like {} (cooldown {}s), trigger {:?}, checkpoints in {}",
        config.fresh_cd,
        config.like,
        config.like_cd,
        config.trigger,
        config.report_dir.display()
    );
    Ok(())
}
