//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config::EngineConfig;
use crate::domain::config_validation::validate_engine_config;
use crate::domain::error::VoltrendError;
use crate::domain::metrics::{MetricsReport, regimes};
use crate::domain::session::{CycleStatus, TrendSession};
use crate::domain::window::WindowRange;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "voltrend",
    about = "Volatility-targeted trend signal over a streaming price series"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a price file through the update cycle and report a window
    Run {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        data: PathBuf,
        /// 1D, 1W, 1M, 1Y, ALL or <n><m|h|d|w>
        #[arg(short, long, default_value = "ALL")]
        window: String,
        /// Bars per update cycle; the whole file in one cycle when absent
        #[arg(long)]
        batch_size: Option<usize>,
        /// Write processed rows as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write the window summary as CSV
        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// Validate an engine configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the time range of a price file
    Info {
        #[arg(short, long)]
        data: PathBuf,
    },
}

/// Counters from replaying a feed through a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub cycles: usize,
    pub warming_up_cycles: usize,
    pub recomputed_rows: usize,
    pub rejected: usize,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            data,
            window,
            batch_size,
            output,
            summary,
        } => run_replay(
            config.as_deref(),
            &data,
            &window,
            batch_size,
            output.as_deref(),
            summary.as_deref(),
        ),
        Command::Validate { config } => run_validate(&config),
        Command::Info { data } => run_info(&data),
    }
}

pub fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig, VoltrendError> {
    match path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            let adapter = FileConfigAdapter::from_file(path)?;
            validate_engine_config(&adapter)
        }
        None => Ok(EngineConfig::default()),
    }
}

fn fail(err: VoltrendError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

fn run_replay(
    config_path: Option<&Path>,
    data_path: &Path,
    window: &str,
    batch_size: Option<usize>,
    output_path: Option<&Path>,
    summary_path: Option<&Path>,
) -> ExitCode {
    // Stage 1: config and window
    let config = match load_engine_config(config_path) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let range: WindowRange = match window.parse() {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    // Stage 2: replay the feed
    let data_port = CsvAdapter::new(data_path.to_path_buf());
    let mut session = TrendSession::new(config);
    let stats = match replay(&data_port, &mut session, batch_size) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    eprintln!(
        "Replayed {} cycles ({} warming up), {} rows recomputed, {} observations rejected",
        stats.cycles, stats.warming_up_cycles, stats.recomputed_rows, stats.rejected
    );

    // Stage 3: summarize
    let report = match session.summarize(range) {
        Ok(r) => r,
        Err(VoltrendError::EmptyWindow) => {
            let required = session.config().warmup_len();
            eprintln!(
                "Not enough data: {} observations retained, {} required",
                session.series().len(),
                required
            );
            return (&VoltrendError::EmptyWindow).into();
        }
        Err(e) => return fail(e),
    };
    println!("{}", format_report(&report, &range));

    let spans = regimes(session.select_window(range));
    println!("Regimes:           {}", spans.len());
    if let Some(current) = spans.last() {
        println!(
            "Current regime:    {} for {} bars since {}",
            if current.signal == 1 { "long" } else { "flat" },
            current.length,
            current.start
        );
    }

    // Stage 4: optional outputs
    let reporter = CsvReportAdapter;
    if let Some(path) = output_path {
        if let Err(e) = reporter.write_rows(session.rows(), path) {
            return fail(e);
        }
        eprintln!("Rows written to {}", path.display());
    }
    if let Some(path) = summary_path {
        if let Err(e) = reporter.write_summary(&report, &range.to_string(), path) {
            return fail(e);
        }
        eprintln!("Summary written to {}", path.display());
    }

    ExitCode::SUCCESS
}

/// Feed every observation of `data_port` through `session`, `batch_size`
/// bars per cycle.
pub fn replay(
    data_port: &dyn DataPort,
    session: &mut TrendSession,
    batch_size: Option<usize>,
) -> Result<ReplayStats, VoltrendError> {
    let observations = data_port.fetch_prices(session.series().latest_timestamp())?;
    let chunk = batch_size.unwrap_or(observations.len()).max(1);
    let mut stats = ReplayStats::default();

    for batch in observations.chunks(chunk) {
        let outcome = session.ingest(batch);
        stats.rejected += outcome.rejected.len();

        let report = session.run_cycle()?;
        stats.cycles += 1;
        if matches!(report.status, CycleStatus::WarmingUp { .. }) {
            stats.warming_up_cycles += 1;
        }
        if let Some(scope) = report.recomputed {
            stats.recomputed_rows += scope.rows;
        }
    }

    Ok(stats)
}

fn fmt_opt(value: Option<f64>, pct: bool) -> String {
    match value {
        Some(v) if pct => format!("{:.2}%", v * 100.0),
        Some(v) => format!("{:.2}", v),
        None => "n/a".to_string(),
    }
}

pub fn format_report(report: &MetricsReport, range: &WindowRange) -> String {
    [
        format!(
            "Window:            {} ({} rows, {} to {})",
            range, report.rows, report.start, report.end
        ),
        format!("Mean PnL:          {:.6}", report.mean_pnl),
        format!(
            "PnL volatility:    {}",
            report
                .pnl_volatility
                .map_or_else(|| "n/a".to_string(), |v| format!("{:.6}", v))
        ),
        format!("Sharpe (per bar):  {}", fmt_opt(report.sharpe_like, false)),
        format!("Annual return:     {:.2}%", report.annualized_return * 100.0),
        format!("Annual volatility: {}", fmt_opt(report.annualized_volatility, true)),
        format!("Sharpe ratio:      {}", fmt_opt(report.annualized_sharpe, false)),
        format!("Max drawdown:      {:.2}%", report.max_drawdown * 100.0),
        format!("Time in market:    {:.1}%", report.time_in_market * 100.0),
        format!("Window PnL:        {:.2}%", report.total_pnl * 100.0),
        format!("Cumulative PnL:    {:.2}%", report.final_cumulative_pnl * 100.0),
    ]
    .join("\n")
}

fn run_validate(config_path: &Path) -> ExitCode {
    let config = match load_engine_config(Some(config_path)) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    eprintln!("\nEngine parameters:");
    eprintln!("  capacity:             {}", config.capacity);
    eprintln!("  vol_window:           {}", config.vol_window);
    eprintln!("  ma_window:            {}", config.ma_window);
    eprintln!("  annualization_factor: {}", config.annualization_factor);
    eprintln!("  target_vol:           {}", config.target_vol);
    eprintln!("  max_leverage:         {}", config.max_leverage);
    eprintln!("  warm-up length:       {}", config.warmup_len());

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_info(data_path: &Path) -> ExitCode {
    let adapter = CsvAdapter::new(data_path.to_path_buf());
    match adapter.get_data_range() {
        Ok(Some((first, last, count))) => {
            println!(
                "{}: {} observations, {} to {}",
                data_path.display(),
                count,
                first,
                last
            );
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("{}: no data found", data_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}
