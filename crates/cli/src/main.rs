// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `warden`: argument parsing, process wiring, and the top-level run loop.
//! Everything below this file is a library; this is the one place that
//! talks to stdout, the filesystem lock, and the process exit code.

mod color;
mod exit_error;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fs2::FileExt;
use warden_adapters::{
    CliReviewerTool, CommandWorkerProcess, GitVcsFacade, HttpUsageEndpoint, ReviewerRun, ReviewerTool, UsageEndpoint,
    UsageReport, UsageWindow,
};
use warden_core::{Clock, RunState, RunStatus, SystemClock};
use warden_orchestrator::{
    BudgetMonitor, BudgetThresholds, CheckpointDecision, CoordinationListener, CycleEngine, PartialWardenConfig,
    TokioSleeper, WardenConfig, WorkerSupervisor, ESCALATION_EXIT_CODE,
};
use warden_store::ProjectPaths;

use exit_error::ExitError;

#[derive(Parser)]
#[command(
    name = "warden",
    long_version = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH")),
    about = "Hierarchical agent cycle engine",
    styles = color::styles()
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start a new cycle-engine run for a feature
    Start(RunArgs),
    /// Resume a paused or interrupted run
    Resume(RunArgs),
    /// Print the current run's status
    Status {
        #[arg(long)]
        project: PathBuf,
        /// Emit machine-readable JSON instead of a text summary
        #[arg(long)]
        json: bool,
    },
    /// Request a pause at the next checkpoint
    Pause {
        #[arg(long)]
        project: PathBuf,
    },
    /// Show the run's recent log output
    Log {
        #[arg(long)]
        project: PathBuf,
        /// Number of trailing lines to show
        #[arg(short = 'n', long, default_value_t = 50)]
        lines: usize,
        /// Keep printing new lines as they're written
        #[arg(long)]
        follow: bool,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// The feature to build (ignored by `resume`, which re-reads the
    /// original run's feature from state)
    feature: Option<String>,
    #[arg(long)]
    project: PathBuf,
    #[arg(long)]
    concurrency: Option<u32>,
    #[arg(long)]
    max_cycles: Option<u32>,
    /// Overrides the budget monitor's critical-utilization threshold
    #[arg(long)]
    usage_threshold: Option<f64>,
    /// Skip the reviewer/planner LLM entirely; every review auto-approves
    #[arg(long)]
    skip_codex: bool,
    /// Skip flow-derivation and flow-tracing for this run
    #[arg(long)]
    skip_flow_review: bool,
    /// Plan the first cycle and print it without executing anything
    #[arg(long)]
    dry_run: bool,
    /// Extra context appended to the planning prompt
    #[arg(long)]
    context_file: Option<PathBuf>,
    /// Work on the currently checked-out branch instead of creating one
    #[arg(long)]
    current_branch: bool,
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            if let Some(exit_err) = err.downcast_ref::<ExitError>() {
                eprintln!("{exit_err}");
                exit_err.code
            } else {
                eprintln!("error: {err:#}");
                1
            }
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Start(args) => run_cycle_loop(args, true).await,
        Command::Resume(args) => run_cycle_loop(args, false).await,
        Command::Status { project, json } => status(&project, json).map(|()| 0),
        Command::Pause { project } => pause(&project).map(|()| 0),
        Command::Log { project, lines, follow } => log(&project, lines, follow).await.map(|()| 0),
    }
}

fn init_logging(paths: &ProjectPaths, verbose: bool) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_appender = tracing_appender::rolling::never(paths.logs_dir(), "warden.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    // Leaked deliberately: the writer must outlive every subsequent log call
    // for the remainder of the process.
    Box::leak(Box::new(guard));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .try_init()
        .context("installing tracing subscriber")?;
    Ok(())
}

/// Holds the project's startup lock for the lifetime of the process. Per
/// SPEC_FULL §10.7: at most one engine process runs against a project at a
/// time; a second `start`/`resume` fails fast rather than racing writers.
struct StartupLock {
    _file: std::fs::File,
}

fn acquire_startup_lock(paths: &ProjectPaths) -> Result<StartupLock> {
    use std::io::Write;

    let file = std::fs::OpenOptions::new().write(true).create(true).truncate(false).open(paths.lock_file())?;
    file.try_lock_exclusive().map_err(|_| {
        ExitError::new(1, format!("warden is already running against {} (lock held)", paths.root().display()))
    })?;
    let mut file = file;
    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;
    Ok(StartupLock { _file: file })
}

/// Auto-approving reviewer used when `--skip-codex` is passed. Per the
/// "external tool not installed: downgrade" policy (§7), skipping the
/// reviewer is a deliberate degrade, never a fatal error.
struct NullReviewerTool;

#[async_trait::async_trait]
impl ReviewerTool for NullReviewerTool {
    async fn run(&self, _project_dir: &std::path::Path, _prompt: &str, _timeout: std::time::Duration) -> Result<ReviewerRun, warden_adapters::AdapterError> {
        Ok(ReviewerRun {
            stdout: "```json\n{\"review_performed\":true,\"verdict\":\"APPROVE\",\"issues\":[],\"summary\":\"codex skipped\"}\n```".to_string(),
            stderr: String::new(),
            exit_code: Some(0),
            timed_out: false,
        })
    }
}

/// Usage endpoint used when no endpoint is configured via environment. Always
/// reports zero utilization so the budget monitor never winds a run down
/// when the operator hasn't wired a real usage backend.
struct NullUsageEndpoint;

#[async_trait::async_trait]
impl UsageEndpoint for NullUsageEndpoint {
    async fn fetch(&self) -> Result<UsageReport, warden_adapters::AdapterError> {
        let zero = UsageWindow { utilization: 0.0, resets_at_ms: 0 };
        Ok(UsageReport { five_hour: zero, seven_day: zero })
    }
}

fn build_reviewer(skip_codex: bool) -> Arc<dyn ReviewerTool> {
    if skip_codex {
        Arc::new(NullReviewerTool)
    } else {
        let tool_path = std::env::var("WARDEN_REVIEWER_TOOL").unwrap_or_else(|_| "codex".to_string());
        Arc::new(CliReviewerTool::new(tool_path))
    }
}

fn build_usage_endpoint() -> Arc<dyn UsageEndpoint> {
    match (std::env::var("WARDEN_USAGE_ENDPOINT_URL"), std::env::var("WARDEN_USAGE_ENDPOINT_TOKEN")) {
        (Ok(url), Ok(token)) => Arc::new(HttpUsageEndpoint::new(url, token)),
        _ => {
            tracing::warn!("WARDEN_USAGE_ENDPOINT_URL/TOKEN not set; budget monitoring disabled");
            Arc::new(NullUsageEndpoint)
        }
    }
}

fn apply_overrides(mut config: WardenConfig, args: &RunArgs) -> WardenConfig {
    let overrides = PartialWardenConfig {
        concurrency: args.concurrency,
        cycle_cap: args.max_cycles,
        critical_threshold: args.usage_threshold,
        ..Default::default()
    };
    config = config.merge_file(overrides);
    config
}

async fn run_cycle_loop(args: RunArgs, is_start: bool) -> Result<i32> {
    if is_start && args.feature.is_none() {
        bail!(ExitError::new(1, "start requires a feature description"));
    }
    let project_dir = args.project.clone();
    let paths = ProjectPaths::new(&project_dir);
    for dir in paths.all_dirs() {
        std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    init_logging(&paths, args.verbose)?;
    let _lock = acquire_startup_lock(&paths)?;

    let config = apply_overrides(WardenConfig::load(&project_dir)?, &args);
    let clock = SystemClock;

    let vcs = Arc::new(GitVcsFacade::new(&project_dir));
    let reviewer = build_reviewer(args.skip_codex);
    let usage = build_usage_endpoint();
    let thresholds =
        BudgetThresholds { wind_down: config.wind_down_threshold, critical: config.critical_threshold, resume: config.resume_threshold };
    let budget = BudgetMonitor::new(usage, clock.clone(), Arc::new(TokioSleeper), thresholds);

    let worker_binary = std::env::var("WARDEN_WORKER_BINARY").unwrap_or_else(|_| "warden-worker".to_string());
    let worker_process = Arc::new(CommandWorkerProcess::new(worker_binary));

    let (bound, coordination_addr) =
        CoordinationListener::new(paths.clone(), clock.clone(), config.test_command.clone()).bind("127.0.0.1:0").await?;
    tokio::spawn(async move {
        if let Err(err) = bound.run().await {
            tracing::error!(error = %err, "coordination service stopped");
        }
    });

    let supervisor = WorkerSupervisor::new(worker_process, &project_dir, coordination_addr.to_string());
    let engine = CycleEngine::new(paths.clone(), &project_dir, config, clock.clone(), reviewer, vcs.clone(), budget, supervisor, Arc::new(TokioSleeper));

    let mut run = load_or_create_run(&paths, &vcs, &clock, &args, is_start).await?;

    let feature = match (&args.feature, is_start) {
        (Some(f), _) => context_prompt(f, args.context_file.as_deref())?,
        (None, false) => run.feature.clone(),
        (None, true) => bail!(ExitError::new(1, "start requires a feature description")),
    };

    if args.dry_run {
        let plan_prompt = format!("Plan the feature \"{feature}\" for cycle {}.", run.current_cycle + 1);
        let next_id = engine.plan(&mut run, &plan_prompt).await?;
        println!("Planned {} task(s); see {}", next_id.saturating_sub(1), paths.plan_file(1).display());
        return Ok(0);
    }

    install_signal_handler(paths.clone());

    loop {
        let outcome = engine.run_cycle(&mut run, &feature, args.skip_flow_review).await?;
        tracing::info!(decision = ?outcome.decision, "cycle finished");
        match outcome.decision {
            CheckpointDecision::Complete => {
                println!("Run completed.");
                return Ok(0);
            }
            CheckpointDecision::Pause => {
                println!("Run paused.");
                return Ok(0);
            }
            CheckpointDecision::Escalate => {
                println!("Run escalated: {}", outcome.escalation.map(|e| e.reason).unwrap_or_default());
                return Ok(ESCALATION_EXIT_CODE);
            }
            CheckpointDecision::Continue => continue,
        }
    }
}

fn context_prompt(feature: &str, context_file: Option<&std::path::Path>) -> Result<String> {
    match context_file {
        None => Ok(feature.to_string()),
        Some(path) => {
            let context = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            Ok(format!("{feature}\n\nAdditional context:\n{context}"))
        }
    }
}

async fn load_or_create_run<C: Clock>(
    paths: &ProjectPaths,
    vcs: &Arc<dyn warden_adapters::VcsFacade>,
    clock: &C,
    args: &RunArgs,
    is_start: bool,
) -> Result<RunState> {
    let existing = warden_store::run_state::load_run_state(paths)?;
    if is_start {
        if let Some(run) = &existing {
            if !matches!(run.status, RunStatus::Completed | RunStatus::Escalated) {
                bail!(ExitError::new(1, "a run is already in progress for this project; use `warden resume`"));
            }
        }
        let feature = args.feature.as_deref().context("start requires a feature description")?;
        if !args.current_branch {
            let branch = format!("warden/{}", slugify(feature));
            vcs.create_branch(&branch).await.context("creating working branch")?;
        }
        let base_commit = vcs.head_sha().await.context("reading base commit")?;
        let branch_name = if args.current_branch { "HEAD".to_string() } else { format!("warden/{}", slugify(feature)) };
        let cycle_cap = args.max_cycles.unwrap_or(20);
        let run = RunState::new(feature, branch_name, base_commit, cycle_cap, args.concurrency.unwrap_or(4), clock.epoch_ms());
        warden_store::run_state::save_run_state(paths, &run)?;
        Ok(run)
    } else {
        let mut run = existing.ok_or_else(|| ExitError::new(1, "no run found to resume; use `warden start`"))?;
        if run.status == RunStatus::Paused {
            run.resume(clock.epoch_ms());
        }
        Ok(run)
    }
}

fn slugify(feature: &str) -> String {
    feature
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .take(6)
        .collect::<Vec<_>>()
        .join("-")
}

fn install_signal_handler(paths: ProjectPaths) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut term) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {}
                        _ = term.recv() => {}
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to install SIGTERM handler; watching SIGINT only");
                    let _ = tokio::signal::ctrl_c().await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }
        tracing::info!("shutdown requested, pausing at next checkpoint");
        let _ = std::fs::write(paths.pause_signal_file(), "");
    });
}

fn status(project: &std::path::Path, json: bool) -> Result<()> {
    let paths = ProjectPaths::new(project);
    let run = warden_store::run_state::load_run_state(&paths)?;
    let Some(run) = run else {
        if json {
            println!("{}", serde_json::json!({"status": "no_run"}));
        } else {
            println!("No run found for {}", project.display());
        }
        return Ok(());
    };

    let tasks = warden_store::tasks::list_tasks(&paths)?;
    let pending = tasks.iter().filter(|t| t.status == warden_core::TaskStatus::Pending).count();
    let in_progress = tasks.iter().filter(|t| t.status == warden_core::TaskStatus::InProgress).count();
    let completed = tasks.iter().filter(|t| t.status == warden_core::TaskStatus::Completed).count();
    let failed = tasks.iter().filter(|t| t.status == warden_core::TaskStatus::Failed).count();

    if json {
        println!(
            "{}",
            serde_json::json!({
                "feature": run.feature,
                "status": run.status,
                "current_cycle": run.current_cycle,
                "cycle_cap": run.cycle_cap,
                "tasks": {"pending": pending, "in_progress": in_progress, "completed": completed, "failed": failed},
            })
        );
    } else {
        println!("feature: {}", run.feature);
        println!("status: {:?}", run.status);
        println!("cycle: {}/{}", run.current_cycle, run.cycle_cap);
        println!("tasks: pending={pending} in_progress={in_progress} completed={completed} failed={failed}");
    }
    Ok(())
}

fn pause(project: &std::path::Path) -> Result<()> {
    let paths = ProjectPaths::new(project);
    std::fs::create_dir_all(paths.root())?;
    std::fs::write(paths.pause_signal_file(), "")?;
    println!("Pause requested; the run will stop at the next checkpoint.");
    Ok(())
}

async fn log(project: &std::path::Path, lines: usize, follow: bool) -> Result<()> {
    let paths = ProjectPaths::new(project);
    let log_path = paths.log_file("warden");
    if !log_path.exists() {
        bail!(ExitError::new(1, format!("no log file at {}", log_path.display())));
    }

    print_tail(&log_path, lines)?;
    if !follow {
        return Ok(());
    }

    use tokio::io::AsyncReadExt;
    let mut file = tokio::fs::File::open(&log_path).await?;
    let mut pos = file.metadata().await?.len();
    loop {
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        let len = file.metadata().await?.len();
        if len < pos {
            pos = 0; // log was rotated/truncated
        }
        if len > pos {
            use tokio::io::AsyncSeekExt;
            file.seek(std::io::SeekFrom::Start(pos)).await?;
            let mut buf = String::new();
            file.read_to_string(&mut buf).await?;
            print!("{buf}");
            pos = len;
        }
    }
}

fn print_tail(path: &std::path::Path, lines: usize) -> Result<()> {
    let content = std::fs::read_to_string(path)?;
    let all_lines: Vec<&str> = content.lines().collect();
    let start = all_lines.len().saturating_sub(lines);
    for line in &all_lines[start..] {
        println!("{line}");
    }
    Ok(())
}
