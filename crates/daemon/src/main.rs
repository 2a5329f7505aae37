// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live-Widget Master Daemon (lwmd)
//!
//! Background process that supervises live-widget worker processes: it owns
//! the slave registry, sweeps lifecycle timers, and attributes faults when
//! workers die. Inbound events arrive on a unix control socket.

use lwm_adapters::{LogNotify, MemoryPackageStore, NoopActivity, NoopLink, ServiceLauncher};
use lwm_core::SystemClock;
use lwm_daemon::{env::DaemonConfig, listener, protocol::MasterEvent, run};
use lwm_master::{Master, MasterDeps};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("lwmd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("lwmd {}", env!("CARGO_PKG_VERSION"));
                println!("Live-Widget Master Daemon - supervises live-widget worker processes");
                println!();
                println!("USAGE:");
                println!("    lwmd");
                println!();
                println!("Configuration comes from LWM_* environment variables; see the");
                println!("project documentation for the full list.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: lwmd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = DaemonConfig::load();
    std::fs::create_dir_all(&config.log_dir)?;
    std::fs::create_dir_all(&config.master.slave_log_path)?;

    let _log_guard = setup_logging(&config)?;
    info!(socket = %config.socket_path.display(), "starting the live-widget master");

    let mut master = Master::new(
        config.master.clone(),
        MasterDeps {
            launcher: ServiceLauncher::new(),
            link: NoopLink,
            notify: LogNotify,
            packages: MemoryPackageStore::new(),
            activity: NoopActivity,
        },
        SystemClock,
    );

    let (events_tx, mut events_rx) = mpsc::channel::<MasterEvent>(256);

    let unix_listener = match listener::bind(&config.socket_path) {
        Ok(l) => l,
        Err(e) => {
            error!(socket = %config.socket_path.display(), error = %e, "failed to bind the control socket");
            return Err(e.into());
        }
    };
    tokio::spawn(listener::run(unix_listener, events_tx.clone()));

    // Signals translate into an ordinary shutdown event so the loop drains
    // whatever is already queued first.
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let signal_tx = events_tx.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("SIGTERM received"),
            _ = sigint.recv() => info!("SIGINT received"),
        }
        let _ = signal_tx.send(MasterEvent::Shutdown).await;
    });

    run::run(&mut master, &mut events_rx).await;

    info!("live-widget master stopped");
    let _ = std::fs::remove_file(&config.socket_path);
    Ok(())
}

fn setup_logging(
    config: &DaemonConfig,
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    let file_appender = tracing_appender::rolling::never(&config.log_dir, "lwmd.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}
