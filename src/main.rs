use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use port_scan_rs::{scanner, PortResult, ScanConfig, ScanUpdate};

/// port-scan-rs — Fast async TCP connect port scanner with live progress reporting.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "port-scan-rs",
    version,
    about = "Fast async TCP connect port scanner with live progress reporting.",
    long_about = None
)]
struct Cli {
    /// Target host to scan (hostname or IP address).
    target: String,

    /// First port of the inclusive range.
    #[arg(long = "start-port", default_value_t = 1)]
    start_port: u16,

    /// Last port of the inclusive range.
    #[arg(long = "end-port", default_value_t = 1024)]
    end_port: u16,

    /// Socket connect timeout in milliseconds.
    #[arg(long = "timeout-ms", default_value_t = 2000)]
    timeout_ms: u64,

    /// Max concurrent TCP connect attempts.
    #[arg(long, default_value_t = 100)]
    concurrency: usize,

    /// Write results as pretty JSON to this path (optional).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Suppress the live progress line.
    #[arg(long, short, default_value_t = false)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = ScanConfig::new(cli.target.clone(), cli.start_port, cli.end_port)?
        .with_timeout(Duration::from_millis(cli.timeout_ms))?
        .with_concurrency(cli.concurrency)?;

    println!(
        "Scanning {} ports {}-{} (concurrency {}, timeout {}ms)",
        config.target, config.start_port, config.end_port, config.concurrency, cli.timeout_ms
    );

    // Ctrl-C cancels the scan; in-flight probes finish within the timeout.
    let cancel = CancellationToken::new();
    let cancel_ctrlc = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        eprintln!("\ninterrupted, winding down...");
        cancel_ctrlc.cancel();
    });

    let progress = if cli.quiet {
        None
    } else {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(render_progress(rx));
        Some(tx)
    };

    let mut results = scanner::run_with_cancel(&config, progress, cancel).await?;

    // Workers race, so completion order is arbitrary; sort for display.
    results.sort_unstable_by_key(|r| r.port);
    print_results_table(&results, config.port_count());

    if let Some(path) = cli.output.as_deref() {
        write_results_json(path, &results)?;
        println!("Wrote JSON results to {}", path.display());
    }

    Ok(())
}

/// Render `InProgress` updates as a single rewritten progress line.
async fn render_progress(mut rx: mpsc::UnboundedReceiver<ScanUpdate>) {
    while let Some(update) = rx.recv().await {
        match update {
            ScanUpdate::InProgress { fraction } => {
                eprint!("\rprogress: {fraction:6.2}%");
            }
            ScanUpdate::Completed { .. } | ScanUpdate::Failed { .. } => {
                eprintln!();
                break;
            }
        }
    }
}

fn print_results_table(results: &[PortResult], scanned: usize) {
    println!("\nOpen ports: {} (scanned: {})", results.len(), scanned);
    if results.is_empty() {
        return;
    }
    println!("{:>9}  {:<6}  {}", "PORT", "STATE", "SERVICE");
    for r in results {
        println!("{:>5}/tcp  {:<6}  {}", r.port, r.state, r.service);
    }
}

fn write_results_json(path: &std::path::Path, results: &[PortResult]) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, results)?;
    Ok(())
}
