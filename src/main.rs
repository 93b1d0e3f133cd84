use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use attendance_engine::api::{AppState, create_router};
use attendance_engine::clock::SystemClock;
use attendance_engine::config::ConfigLoader;
use attendance_engine::engine::{AttendanceService, Collaborators};
use attendance_engine::events::BroadcastEventSink;
use attendance_engine::sources::{InMemoryLeave, InMemoryProgress, InMemoryRoster};
use attendance_engine::store::InMemoryStore;
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Attendance reconciliation and payroll server.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Directory containing engine.yaml, worksites.yaml and devices.yaml.
    #[arg(long, default_value = "./config/default")]
    config_dir: PathBuf,

    /// Roster file used to seed the in-memory roster.
    #[arg(long, default_value = "./config/default/roster.yaml")]
    roster: PathBuf,

    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:3000")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    if let Err(err) = run(args).await {
        error!(error = %err, "Server exited with error");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigLoader::load(&args.config_dir)?;
    let roster = InMemoryRoster::load(&args.roster)?;
    info!(
        config_dir = %args.config_dir.display(),
        worksites = config.config().worksites().len(),
        devices = config.config().devices().len(),
        "Configuration loaded"
    );

    let events = Arc::new(BroadcastEventSink::default());
    let mut receiver = events.subscribe();
    let service = AttendanceService::new(
        config.config().clone(),
        Collaborators {
            store: Arc::new(InMemoryStore::new()),
            roster: Arc::new(roster),
            leave: Arc::new(InMemoryLeave::default()),
            progress: Arc::new(InMemoryProgress::new()),
            events,
            clock: Arc::new(SystemClock),
        },
    );

    let shutdown = CancellationToken::new();

    let auto_close = tokio::spawn(service.auto_closer().run(shutdown.child_token()));

    let event_log_cancel = shutdown.child_token();
    let event_log = tokio::spawn(async move {
        loop {
            tokio::select! {
                received = receiver.recv() => match received {
                    Ok(event) => debug!(
                        event_type = ?event.event_type,
                        employee_id = %event.employee_id,
                        date = %event.date,
                        new_status = %event.new_status,
                        "State change"
                    ),
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event log lagged"),
                    Err(RecvError::Closed) => break,
                },
                _ = event_log_cancel.cancelled() => break,
            }
        }
    });

    let router = create_router(AppState::new(service, shutdown.clone()));
    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    info!(address = %args.bind, "Listening");

    let signal = shutdown.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = %err, "Failed to listen for ctrl-c");
            }
            info!("Shutdown requested");
            signal.cancel();
        })
        .await?;

    shutdown.cancel();
    let _ = auto_close.await;
    let _ = event_log.await;
    info!("Server stopped");
    Ok(())
}
