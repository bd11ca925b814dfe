use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use brokerprobe::{
    read_snapshot, BrokerSnapshot, DataSource, DiagnosticReport, FileSource, KnowledgeBase,
    ProbeConfig, ScanControl, Scanner,
};

#[derive(Parser, Debug)]
#[command(name = "brokerprobe")]
#[command(about = "Run diagnostic probes over a message broker snapshot")]
struct Args {
    /// Path to a broker snapshot JSON file
    #[arg(short, long, default_value = "snapshot.json")]
    file: PathBuf,

    /// Probe threshold configuration file (TOML, JSON or YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start from the recommended thresholds instead of none
    #[arg(long)]
    recommended: bool,

    /// Consumer utilization threshold (0.0 to 1.0)
    #[arg(long)]
    consumer_utilization: Option<f64>,

    /// Connections created per second that count as high churn
    #[arg(long)]
    connection_creation_rate: Option<f64>,

    /// Connections closed per second that count as high churn
    #[arg(long)]
    connection_closure_rate: Option<f64>,

    /// File descriptor usage coefficient (0.0 to 1.0)
    #[arg(long)]
    fd_coefficient: Option<f64>,

    /// Socket descriptor usage coefficient (0.0 to 1.0)
    #[arg(long)]
    socket_coefficient: Option<f64>,

    /// Runtime process usage coefficient (0.0 to 1.0)
    #[arg(long)]
    runtime_coefficient: Option<f64>,

    /// Incoming message total at which a queue is flooded
    #[arg(long)]
    high_flow: Option<u64>,

    /// Incoming message total at which a queue is starved
    #[arg(long)]
    low_flow: Option<u64>,

    /// Redelivered message coefficient (0.0 to 1.0)
    #[arg(long)]
    redelivery_coefficient: Option<f64>,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Evaluate entities in parallel
    #[arg(long)]
    parallel: bool,

    /// Abort a scan that runs longer than this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Keep running and rescan whenever the snapshot file changes
    #[arg(short, long)]
    watch: bool,

    /// Poll interval in seconds (only used with --watch)
    #[arg(short, long, default_value = "1", requires = "watch")]
    refresh: u64,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> ProbeConfig {
        ProbeConfig {
            consumer_utilization_threshold: self.consumer_utilization,
            high_connection_creation_rate_threshold: self.connection_creation_rate,
            high_connection_closure_rate_threshold: self.connection_closure_rate,
            file_descriptor_usage_threshold_coefficient: self.fd_coefficient,
            socket_usage_threshold_coefficient: self.socket_coefficient,
            runtime_process_usage_threshold_coefficient: self.runtime_coefficient,
            queue_high_flow_threshold: self.high_flow,
            queue_low_flow_threshold: self.low_flow,
            message_redelivery_threshold_coefficient: self.redelivery_coefficient,
        }
    }

    /// Recommended or empty base, then file and environment, then flags.
    fn probe_config(&self) -> Result<ProbeConfig> {
        let base = if self.recommended {
            ProbeConfig::recommended()
        } else {
            ProbeConfig::default()
        };
        let loaded = ProbeConfig::load(self.config.as_deref())
            .context("Failed to load probe configuration")?;

        let config = base.overlay(&loaded).overlay(&self.overrides());
        config.validate().context("Invalid probe threshold")?;
        Ok(config)
    }

    fn scan_control(&self) -> ScanControl {
        match self.timeout_ms {
            Some(ms) => ScanControl::new().with_timeout(Duration::from_millis(ms)),
            None => ScanControl::new(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = args.probe_config()?;
    let kb = KnowledgeBase::builtin();
    let scanner = Scanner::from_config(&config, &kb);
    info!(probes = scanner.registry().len(), "probe registry ready");

    if args.watch {
        return run_watch(&args, &scanner);
    }

    let snapshot = read_snapshot(&args.file)
        .with_context(|| format!("Failed to load snapshot from {}", args.file.display()))?;
    let report = scan(&args, &scanner, &snapshot)?;
    emit(&report, args.output.as_deref())
}

/// Logs go to stderr so the report on stdout stays machine-readable.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn scan(args: &Args, scanner: &Scanner, snapshot: &BrokerSnapshot) -> Result<DiagnosticReport> {
    let control = args.scan_control();
    let report = if args.parallel {
        scanner.scan_parallel(snapshot, &control)
    } else {
        scanner.scan_with(snapshot, &control)
    }
    .context("Scan failed")?;

    info!(
        cluster = %report.cluster,
        overall = %report.overall_status(),
        "{}",
        report.summary()
    );
    Ok(report)
}

/// Write the report as pretty JSON to `output`, or print it.
fn emit(report: &DiagnosticReport, output: Option<&Path>) -> Result<()> {
    let json = report.to_json_pretty().context("Failed to serialize report")?;
    match output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Rescan whenever the snapshot file changes, until Ctrl-C.
fn run_watch(args: &Args, scanner: &Scanner) -> Result<()> {
    let rt = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;

    rt.block_on(async {
        let mut source = FileSource::new(&args.file);
        let mut ticker = tokio::time::interval(Duration::from_secs(args.refresh.max(1)));
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        info!(source = source.description(), "watching for snapshots");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some(snapshot) = source.poll() else {
                        continue;
                    };
                    match scan(args, scanner, &snapshot) {
                        Ok(report) => emit(&report, args.output.as_deref())?,
                        Err(err) => warn!("scan skipped: {err:#}"),
                    }
                }
                _ = &mut shutdown => {
                    info!("interrupted, stopping");
                    break;
                }
            }
        }
        Ok::<(), anyhow::Error>(())
    })
}
