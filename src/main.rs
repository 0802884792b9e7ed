//! Raycast vehicle demo server.
//!
//! Runs a rapier world with one raycast car per connected WebSocket client
//! and broadcasts a snapshot of every car each tick.

mod net;
mod physics;
mod state;
mod steering;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, ensure};
use clap::Parser;
use raycast_vehicle::VehicleConfig;
use tokio::sync::Mutex;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::net::start_websocket_server;
use crate::physics::PhysicsWorld;
use crate::state::SharedGameState;

/// Raycast vehicle demo server
#[derive(Parser)]
#[command(name = "vehicle-server")]
#[command(version)]
struct Cli {
    /// Address the WebSocket server listens on
    #[arg(short, long, default_value = "0.0.0.0:9001")]
    bind: SocketAddr,

    /// JSON vehicle description (defaults to the built-in sedan)
    #[arg(long)]
    vehicle_config: Option<PathBuf>,

    /// Simulation rate
    #[arg(long, default_value = "60")]
    tick_hz: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the flag
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    ensure!(cli.tick_hz > 0, "--tick-hz must be positive");

    let vehicle_config = match &cli.vehicle_config {
        Some(path) => VehicleConfig::load(path)
            .with_context(|| format!("loading vehicle config {}", path.display()))?,
        None => VehicleConfig::sedan(),
    };

    info!(bind = %cli.bind, tick_hz = cli.tick_hz, "starting vehicle server");

    let state = Arc::new(Mutex::new(SharedGameState::new()));
    let physics = Arc::new(Mutex::new(PhysicsWorld::new(vehicle_config)));

    let mut server = tokio::spawn(start_websocket_server(
        cli.bind,
        Arc::clone(&state),
        Arc::clone(&physics),
    ));

    let dt = 1.0 / cli.tick_hz as f32;
    let mut ticker = interval(Duration::from_secs_f32(dt));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            res = &mut server => {
                // The listener only returns on error.
                return res.context("WebSocket task panicked")?;
            }
        }

        let mut phys = physics.lock().await;
        let mut game = state.lock().await;

        phys.step(dt);

        game.tick += 1;
        game.broadcast_snapshot(&phys);
    }
}
