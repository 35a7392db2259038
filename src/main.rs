//! # yyflow: workflow controller console
//!
//! Drives the controller with simulated device conditions.
//!
//! Usage:
//!   yyflow check --battery 0.05                # Would a workflow be admitted?
//!   yyflow run --steps 5 --fail-at 3           # Demo run that fails at step 3
//!   yyflow run --network offline --offline     # Force-run while offline
//!   yyflow run --queue 3 --network offline     # Refused, but queued ops drain on reconnect
//!   yyflow config --write                      # Write ~/.yyflow/config.toml

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use yyflow_core::traits::{HapticSink, OfflineOperation, StepOutcome};
use yyflow_core::types::{DeviceStatus, DeviceStatusUpdate, NetworkQuality};
use yyflow_core::{YyFlowConfig, YyFlowError};
use yyflow_scheduler::{
    ExecutionOptions, QueueStats, WorkflowController, WorkflowDefinition, WorkflowInstance, WorkflowStep,
    spawn_connectivity_watcher, step_fn,
};

#[derive(Parser)]
#[command(
    name = "yyflow",
    version,
    about = "📱 YYFlow: admission-controlled workflow runner"
)]
struct Cli {
    /// Config file (default: ~/.yyflow/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Simulated device conditions.
#[derive(clap::Args, Debug, Clone)]
struct DeviceArgs {
    /// Battery level, 0.0–1.0
    #[arg(long, default_value = "1.0")]
    battery: f64,

    /// excellent | good | poor | offline
    #[arg(long, default_value = "good")]
    network: NetworkQuality,

    /// Memory usage, 0.0–1.0
    #[arg(long, default_value = "0.3")]
    memory: f64,

    /// CPU usage, 0.0–1.0
    #[arg(long, default_value = "0.2")]
    cpu: f64,
}

impl DeviceArgs {
    fn status(&self) -> DeviceStatus {
        DeviceStatus::new(self.battery, self.network, self.memory, self.cpu)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print the admission decision for the given device conditions
    Check {
        #[command(flatten)]
        device: DeviceArgs,
    },
    /// Run a demo workflow of sleep steps
    Run {
        #[command(flatten)]
        device: DeviceArgs,

        /// Number of steps
        #[arg(long, default_value = "4")]
        steps: usize,

        /// Milliseconds each step sleeps
        #[arg(long, default_value = "200")]
        step_ms: u64,

        /// 1-based step that fails
        #[arg(long)]
        fail_at: Option<usize>,

        /// Bypass device checks
        #[arg(long)]
        offline: bool,

        /// Queue this many operations, then reconnect and drain
        #[arg(long, default_value = "0")]
        queue: usize,
    },
    /// Print the effective config, or write defaults to disk
    Config {
        /// Write the default config to the config path
        #[arg(long)]
        write: bool,
    },
}

/// Haptics rendered as log lines.
struct ConsoleHaptics;

impl HapticSink for ConsoleHaptics {
    fn vibrate(&self, pattern: &[u64]) -> std::result::Result<(), String> {
        tracing::info!("📳 bzz {:?}", pattern);
        Ok(())
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<YyFlowConfig> {
    let config = match path {
        Some(p) => YyFlowConfig::load_from(p).with_context(|| format!("loading {}", p.display()))?,
        None => YyFlowConfig::load()?,
    };
    Ok(config)
}

fn demo_workflow(steps: usize, step_ms: u64, fail_at: Option<usize>) -> WorkflowDefinition {
    let mut def = WorkflowDefinition::new("demo", "Demo workflow");
    for n in 1..=steps {
        let fails = fail_at == Some(n);
        def = def.step(
            WorkflowStep::new(
                format!("step-{n}"),
                step_fn(move |ctx| async move {
                    tokio::time::sleep(Duration::from_millis(step_ms)).await;
                    if fails {
                        return Err(YyFlowError::step(ctx.step_id, "simulated failure"));
                    }
                    Ok(StepOutcome::new(serde_json::json!({ "step": n, "mode": ctx.performance_mode }))
                        .with_network_calls(1))
                }),
            )
            .named(format!("Step {n}")),
        );
    }
    def
}

/// What a demo run did.
struct DemoReport {
    /// `None` when admission refused the workflow.
    instance: Option<WorkflowInstance>,
    refused: Option<YyFlowError>,
    queue: QueueStats,
}

async fn run_demo(
    config: YyFlowConfig,
    device: DeviceArgs,
    steps: usize,
    step_ms: u64,
    fail_at: Option<usize>,
    offline: bool,
    queue: usize,
) -> Result<DemoReport> {
    let processor = |op: OfflineOperation| async move {
        tracing::info!("📤 Applied {} {}", op.kind, op.payload);
        Ok::<(), YyFlowError>(())
    };
    let controller = WorkflowController::builder(config.clone())
        .device_status(device.status())
        .haptics(Arc::new(ConsoleHaptics))
        .processor(Arc::new(processor))
        .build();
    let watcher = tokio::spawn(spawn_connectivity_watcher(
        controller.clone(),
        config.queue.drain_interval_secs,
    ));
    // Let the watcher take its first device sample before anything changes.
    tokio::task::yield_now().await;

    let report = demo_session(&controller, steps, step_ms, fail_at, offline, queue).await;
    watcher.abort();
    report
}

async fn demo_session(
    controller: &WorkflowController,
    steps: usize,
    step_ms: u64,
    fail_at: Option<usize>,
    offline: bool,
    queue: usize,
) -> Result<DemoReport> {
    for i in 0..queue {
        let op = OfflineOperation::new("demo.sync", serde_json::json!({ "seq": i }));
        let outcome = controller.submit_operation(op).await;
        tracing::debug!("submit #{i}: {:?}", outcome);
    }

    let options = ExecutionOptions {
        enable_offline_mode: offline,
        ..Default::default()
    };
    let (instance, refused) = match controller.execute_workflow(demo_workflow(steps, step_ms, fail_at), options) {
        Ok(started) => {
            println!(
                "🚀 {} started ({} steps, {} mode)",
                started.workflow_name, started.total_steps, started.performance_mode
            );
            let mut status = controller.subscribe_status().context("instance vanished")?;
            loop {
                let current = *status.borrow_and_update();
                if current.is_terminal() {
                    break;
                }
                if status.changed().await.is_err() {
                    break;
                }
            }
            let done = controller.instance().context("instance vanished")?;
            println!("{}", serde_json::to_string_pretty(&done)?);
            (Some(done), None)
        }
        Err(e @ YyFlowError::AdmissionDenied { .. }) => {
            println!("⛔ {e} (pass --offline to run anyway)");
            (None, Some(e))
        }
        Err(e) => return Err(e.into()),
    };

    if queue > 0 && controller.offline_queue_len() > 0 {
        println!("📶 Reconnecting with {} queued operation(s)…", controller.offline_queue_len());
        controller.update_device_status(DeviceStatusUpdate::network(NetworkQuality::Good));
        tokio::time::timeout(Duration::from_secs(5), async {
            while controller.offline_queue_len() > 0 {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .context("offline queue did not drain")?;
        println!("{}", serde_json::to_string_pretty(&controller.queue_stats())?);
    }

    Ok(DemoReport {
        instance,
        refused,
        queue: controller.queue_stats(),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "yyflow=debug,yyflow_scheduler=debug,yyflow_core=debug"
    } else {
        "yyflow=info,yyflow_scheduler=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    match cli.command {
        Command::Check { device } => {
            let controller = WorkflowController::builder(load_config(cli.config.as_ref())?)
                .device_status(device.status())
                .build();
            let decision = controller.admission();
            println!("{}", serde_json::to_string_pretty(&decision)?);
            if !decision.can_execute_workflow {
                println!("⛔ {}", YyFlowError::AdmissionDenied { factors: decision.blocking });
            }
        }
        Command::Run {
            device,
            steps,
            step_ms,
            fail_at,
            offline,
            queue,
        } => {
            let config = load_config(cli.config.as_ref())?;
            let report = run_demo(config, device, steps, step_ms, fail_at, offline, queue).await?;
            tracing::debug!("📊 Replayed {} queued operation(s)", report.queue.total_replayed);
            if let Some(reason) = &report.refused {
                tracing::debug!("⛔ Run refused: {reason}");
            }
            if let Some(err) = report.instance.and_then(|i| i.error) {
                anyhow::bail!("workflow failed: {err}");
            }
        }
        Command::Config { write } => {
            if write {
                let path = match &cli.config {
                    Some(path) => {
                        YyFlowConfig::default().save_to(path)?;
                        path.clone()
                    }
                    None => {
                        YyFlowConfig::default().save()?;
                        YyFlowConfig::default_path()
                    }
                };
                println!("✅ Wrote default config to {}", path.display());
            } else {
                print!("{}", load_config(cli.config.as_ref())?.to_toml()?);
            }
        }
    }
    Ok(())
}
