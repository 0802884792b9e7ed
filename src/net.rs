use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::accept_async;
use tungstenite::Message;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::physics::PhysicsWorld;
use crate::state::SharedGameState;
use crate::steering::DriverInput;

/// Half-width of the square spawn area around the origin (m).
const SPAWN_SPREAD: f32 = 20.0;

#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ClientMessage {
    Input(DriverInput),
    Ping,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ServerMessage<'a> {
    Welcome { player_id: &'a str },
    Pong,
}

impl ServerMessage<'_> {
    fn to_json(&self) -> String {
        // Plain structs of strings; encoding cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

pub async fn start_websocket_server(
    bind: SocketAddr,
    state: Arc<Mutex<SharedGameState>>,
    physics: Arc<Mutex<PhysicsWorld>>,
) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind WebSocket port {bind}"))?;

    info!("WebSocket listening on ws://{bind}");

    loop {
        let (raw, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(err) => {
                warn!(%err, "accept failed");
                continue;
            }
        };

        let state = Arc::clone(&state);
        let physics = Arc::clone(&physics);

        tokio::spawn(async move {
            if let Err(err) = handle_client(raw, state, physics).await {
                warn!(%peer, "client error: {err:#}");
            }
        });
    }
}

async fn handle_client(
    raw: TcpStream,
    state: Arc<Mutex<SharedGameState>>,
    physics: Arc<Mutex<PhysicsWorld>>,
) -> Result<()> {
    let ws = accept_async(raw).await.context("WebSocket handshake failed")?;
    let (mut write, mut read) = ws.split();

    // -------------------------------
    // 1) Outgoing message channel + send loop
    // -------------------------------
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if write.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    // -------------------------------
    // 2) Player id + car
    // -------------------------------
    let player_id = Uuid::new_v4().to_string();
    {
        let (x, z) = {
            let mut rng = rand::thread_rng();
            (
                rng.gen_range(-SPAWN_SPREAD..SPAWN_SPREAD),
                rng.gen_range(-SPAWN_SPREAD..SPAWN_SPREAD),
            )
        };
        let mut phys = physics.lock().await;
        phys.spawn_car(&player_id, x, z)
            .context("failed to build vehicle")?;
    }
    state.lock().await.register_client(&player_id, tx.clone());

    info!(player = %player_id, "player connected");
    let _ = tx.send(ServerMessage::Welcome { player_id: &player_id }.to_json());

    // -------------------------------
    // 3) Main receive loop
    // -------------------------------
    while let Some(msg) = read.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(err) => {
                debug!(player = %player_id, %err, "read failed");
                break;
            }
        };

        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        match serde_json::from_str::<ClientMessage>(&text) {
            Ok(ClientMessage::Ping) => {
                let _ = tx.send(ServerMessage::Pong.to_json());
            }
            Ok(ClientMessage::Input(input)) => {
                physics.lock().await.set_input(&player_id, input);
            }
            Err(err) => {
                debug!(player = %player_id, %err, "ignored client message");
            }
        }
    }

    info!(player = %player_id, "player disconnected");
    state.lock().await.remove_client(&player_id);
    physics.lock().await.remove_car(&player_id);
    Ok(())
}
