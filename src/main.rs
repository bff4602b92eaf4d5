use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use fishbatch::{AnalyzerConfig, RunOutcome, Runner};

/// Analyze a batch of chess positions in parallel with a UCI engine.
#[derive(Parser, Debug)]
#[command(name = "fishbatch", version, about)]
struct Cli {
    /// Path to the UCI engine executable
    #[arg(long, default_value = "stockfish")]
    engine: PathBuf,

    /// Input JSON file with the position list
    #[arg(long, default_value = "chess960.json")]
    positions: PathBuf,

    /// Output JSON file for persisted results
    #[arg(long, default_value = "chess960_evals.json")]
    output: PathBuf,

    /// Search time per position in milliseconds
    #[arg(long, default_value_t = 20_000)]
    movetime_ms: u64,

    /// Number of parallel engine workers
    #[arg(long, default_value_t = 2)]
    workers: u32,

    /// Threads per engine instance
    #[arg(long, default_value_t = 4)]
    threads: u32,

    /// Number of ranked lines to retain per position
    #[arg(long, default_value_t = 3)]
    multipv: u32,

    /// Checkpoint after this many completed positions
    #[arg(long, default_value_t = 10)]
    checkpoint_interval: usize,

    /// Disable Chess960 castling rules
    #[arg(long)]
    no_chess960: bool,

    /// Suppress the progress line
    #[arg(long, short)]
    quiet: bool,
}

impl Cli {
    fn into_config(self) -> AnalyzerConfig {
        let mut config = AnalyzerConfig::new()
            .with_engine_path(self.engine)
            .with_movetime(Duration::from_millis(self.movetime_ms))
            .with_workers(self.workers)
            .with_multipv(self.multipv)
            .with_checkpoint_interval(self.checkpoint_interval)
            .with_paths(self.positions, self.output);
        config.engine_threads = self.threads;
        config.chess960 = !self.no_chess960;
        config.quiet = self.quiet;
        config
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = cli.into_config();

    println!(
        "fishbatch | {:.0}s/pos | {} workers x {} threads | MultiPV {}",
        config.movetime.as_secs_f64(),
        config.workers,
        config.engine_threads,
        config.multipv
    );

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupt received, finishing in-flight positions...");
            let _ = cancel_tx.send(true);
        }
        // Keep the sender alive so the cancel channel stays open.
        std::future::pending::<()>().await;
    });

    let runner = Runner::new(config);
    match runner.run(cancel_rx).await {
        Ok(summary) => {
            let status = match summary.outcome {
                RunOutcome::Completed => "done",
                RunOutcome::Interrupted => "interrupted",
            };
            println!(
                "{status}: {} analyzed, {} already persisted, {} total",
                summary.analyzed, summary.skipped, summary.total
            );
            if summary.outcome == RunOutcome::Interrupted {
                std::process::exit(130);
            }
        }
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}
