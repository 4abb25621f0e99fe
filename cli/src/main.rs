// cli/src/main.rs

use std::collections::HashMap;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use leadloop_core::data_models::control_plane::{Directive, DirectiveStatus, OperatorOverride, OverrideKind};
use leadloop_core::data_models::optimization::Priority;
use leadloop_core::external::message_sender::SmtpMessageSender;
use leadloop_core::external::routing_agent::RoutingAgent;
use leadloop_core::store::memory_store::InMemoryStore;
use leadloop_core::store::Store;
use leadloop_core::subsystems::control_plane::directives::DirectiveRegistry;
use leadloop_core::subsystems::control_plane::overrides::OverrideRegistry;
use leadloop_core::subsystems::error_monitor::alerts::{AlertChannel, AlertFanout, LogAlertChannel};
use leadloop_core::subsystems::error_monitor::monitor::{ErrorMonitor, ErrorMonitorConfig};
use leadloop_core::subsystems::optimization_loop::controller::{OptimizationLoop, OptimizationLoopConfig};
use leadloop_core::subsystems::scheduler::dispatcher::TickDispatcher;
use leadloop_core::subsystems::scheduler::sequence::SequenceTicker;
use leadloop_core::utils::clock::{Clock, SystemClock};
use leadloop_core::utils::config::Config;
use leadloop_core::utils::logger::init_logger;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[clap(name = "leadloopd", author, version, about = "Continuous optimization loop and control plane daemon", long_about = None)]
struct Cli {
    /// Path to an optional TOML config file; `LEADLOOP_*` env vars always apply on top.
    #[clap(short, long)]
    config: Option<String>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs the daemon: optimization cycle driver, sequence tick dispatcher, error monitor.
    Serve {
        /// Agent ids to optimize; repeat the flag for multiple agents.
        #[clap(long = "agent")]
        agents: Vec<String>,
    },
    /// Prints an empty dashboard snapshot (diagnostic use only).
    Dashboard,
    /// Creates a strategic directive and prints its id.
    DirectiveCreate {
        #[clap(long)]
        title: String,
        #[clap(long = "target")]
        target_agent_ids: Vec<String>,
    },
    /// Issues an operator override suspending the optimization loop.
    OverrideSuspend {
        /// Agent id to target; omit to suspend globally.
        #[clap(long)]
        agent: Option<String>,
        #[clap(long)]
        issued_by: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logger() {
        eprintln!("fatal: failed to initialize logger: {e}");
        return ExitCode::from(1);
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            log::error!(target: "leadloopd", error = e.message.as_str(); "fatal init failure: invalid configuration");
            return ExitCode::from(1);
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = InMemoryStore::with_clock(clock.clone());

    if let Err(e) = check_store_integrity(&store).await {
        log::error!(target: "leadloopd", error = e.message.as_str(); "unrecoverable state corruption detected at load");
        return ExitCode::from(2);
    }

    match cli.command {
        Commands::Serve { agents } => run_serve(store, config, clock, agents).await,
        Commands::Dashboard => run_dashboard(clock.as_ref()),
        Commands::DirectiveCreate { title, target_agent_ids } => {
            run_directive_create(title, target_agent_ids, clock.as_ref()).await
        }
        Commands::OverrideSuspend { agent, issued_by } => run_override_suspend(agent, issued_by, clock.as_ref()).await,
    }
}

/// A database-backed `Store` runs its own consistency check against
/// on-disk structures here; the in-memory store is always empty at process
/// start, so this is a pass-through, kept so the exit-code contract (`2`
/// on corruption) is wired the same way a durable implementation wires it.
async fn check_store_integrity(store: &InMemoryStore) -> Result<(), leadloop_core::contracts::CoreError> {
    store
        .query_leads(leadloop_core::store::LeadFilter::default())
        .await
        .map(|_| ())
}

async fn run_serve(store: InMemoryStore, config: Config, clock: Arc<dyn Clock>, agent_ids: Vec<String>) -> ExitCode {
    log::info!(target: "leadloopd", agent_count = agent_ids.len(); "starting leadloopd");

    let channels: Vec<Box<dyn AlertChannel>> = vec![Box::new(LogAlertChannel)];
    let fanout = AlertFanout::new(channels, chrono::Duration::minutes(config.alerts.cooldown_minutes as i64));
    let error_monitor_config = ErrorMonitorConfig {
        error_rate_threshold_per_min: config.alerts.error_rate_threshold,
        critical_per_hour_threshold: config.alerts.critical_per_hour,
        cb_trips_per_hour_threshold: config.alerts.cb_trips_per_hour,
        cooldown: chrono::Duration::minutes(config.alerts.cooldown_minutes as i64),
        ..ErrorMonitorConfig::default()
    };
    let error_monitor = ErrorMonitor::new(error_monitor_config, fanout, clock.clone());

    let sender = SmtpMessageSender::new(
        std::env::var("LEADLOOP_SMTP_HOST").ok(),
        std::env::var("LEADLOOP_SMTP_USER").ok(),
        std::env::var("LEADLOOP_SMTP_PASSWORD").ok(),
        std::env::var("LEADLOOP_SMTP_FROM").unwrap_or_else(|_| "noreply@leadloop.local".to_string()),
    );

    // Operators register each worker agent's concrete `RoutingAgent` adapter
    // here; none are wired for the reference binary since adapter
    // implementations live outside this crate's scope (§6).
    let routing_agents: HashMap<String, Arc<dyn RoutingAgent>> = HashMap::new();
    let overrides = OverrideRegistry::new();

    let optimization_config = OptimizationLoopConfig {
        cycle_interval: chrono::Duration::hours(config.optimization.cycle_hours as i64),
        ..OptimizationLoopConfig::default()
    };
    let optimization_loop =
        OptimizationLoop::new(&store, &routing_agents, &error_monitor, optimization_config, clock.clone())
            .with_overrides(&overrides);
    optimization_loop.rehydrate().await;

    let ticker = SequenceTicker::new(&sender);
    let dispatcher = TickDispatcher::new(&store, ticker, &error_monitor);

    let mut tick_interval = tokio::time::interval(std::time::Duration::from_secs(config.polling.interval_minutes * 60));
    let mut cycle_interval = tokio::time::interval(
        chrono::Duration::hours(config.optimization.cycle_hours as i64)
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(6 * 3600)),
    );

    log::info!(target: "leadloopd", "leadloopd is running; press ctrl-c to stop");

    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                if config.polling.enabled {
                    let now = clock.now();
                    let fired = dispatcher.run_tick(now).await;
                    if fired > 0 {
                        log::info!(target: "scheduler", fired = fired; "sequence tick dispatched");
                    }
                }
            }
            _ = cycle_interval.tick() => {
                optimization_loop.run_cycle(&agent_ids, Vec::new(), Vec::new()).await;
                log::info!(
                    target: "optimization_loop",
                    active = optimization_loop.active_count().await;
                    "optimization cycle completed"
                );
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    log::error!(target: "leadloopd", error = e.to_string().as_str(); "failed to listen for shutdown signal");
                    return ExitCode::from(1);
                }
                log::info!(target: "leadloopd", "shutdown signal received, stopping cleanly");
                return ExitCode::from(0);
            }
        }
    }
}

fn run_dashboard(clock: &dyn Clock) -> ExitCode {
    let now = clock.now();
    let snapshot = leadloop_core::subsystems::control_plane::dashboard::compose(vec![], vec![], vec![], now, now);
    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => {
            println!("{json}");
            ExitCode::from(0)
        }
        Err(e) => {
            eprintln!("fatal: failed to render dashboard: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run_directive_create(title: String, target_agent_ids: Vec<String>, clock: &dyn Clock) -> ExitCode {
    let registry = DirectiveRegistry::new();
    let directive = Directive {
        id: Uuid::new_v4(),
        title,
        target_agent_ids,
        priority: Priority::Medium,
        status: DirectiveStatus::Draft,
        created_at: clock.now(),
    };
    let id = directive.id;
    registry.create(directive).await;
    println!("created directive {id}");
    ExitCode::from(0)
}

async fn run_override_suspend(agent: Option<String>, issued_by: String, clock: &dyn Clock) -> ExitCode {
    let registry = OverrideRegistry::new();
    let override_ = OperatorOverride {
        id: Uuid::new_v4(),
        kind: OverrideKind::SuspendOptimization,
        target_agent_id: agent,
        issued_by,
        issued_at: clock.now(),
        expires_at: None,
        reversed_at: None,
    };
    let id = override_.id;
    registry.issue(override_).await;
    println!("issued override {id}");
    ExitCode::from(0)
}
