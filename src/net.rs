use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::accept_async;
use tungstenite::Message;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::autopilot::Command;
use crate::error::SimError;
use crate::physics::PhysicsWorld;
use crate::state::SharedSimState;
use crate::vehicle::HumanInput;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Ping,
    Input {
        #[serde(default)]
        vertical: f32,
        #[serde(default)]
        horizontal: f32,
        #[serde(default)]
        handbrake: bool,
    },
}

impl ClientMessage {
    pub fn from_json(txt: &str) -> Option<Self> {
        serde_json::from_str(txt).ok()
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Welcome {
        client_id: String,
        vehicle: Option<String>, // the car this client's input drives
    },
    Pong,
}

impl ServerMessage {
    fn to_json(&self) -> Option<String> {
        serde_json::to_string(self).ok()
    }
}

pub async fn start_websocket_server(
    bind: String,
    state: Arc<Mutex<SharedSimState>>,
    physics: Arc<Mutex<PhysicsWorld>>,
) -> Result<(), SimError> {
    let listener = TcpListener::bind(&bind).await?;
    info!("WebSocket listening on ws://{bind}");

    loop {
        let (raw, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("accept failed: {e}");
                continue;
            }
        };
        let state_clone = Arc::clone(&state);
        let physics_clone = Arc::clone(&physics);

        tokio::spawn(async move {
            handle_client(raw, peer.to_string(), state_clone, physics_clone).await;
        });
    }
}

async fn handle_client(
    raw: TcpStream,
    peer: String,
    state: Arc<Mutex<SharedSimState>>,
    physics: Arc<Mutex<PhysicsWorld>>,
) {
    let ws = match accept_async(raw).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer, "websocket handshake failed: {e}");
            return;
        }
    };
    let (mut write, mut read) = ws.split();

    // -------------------------------
    // 1) outgoing message channel
    // -------------------------------
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let human_id = {
        let mut sim = state.lock().await;
        sim.register_client(tx.clone());
        sim.human_id.clone()
    };

    // -------------------------------
    // 2) send-loop task
    // -------------------------------
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if write.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    let client_id = Uuid::new_v4().to_string();
    info!(%peer, %client_id, "client connected");

    let welcome = ServerMessage::Welcome { client_id: client_id.clone(), vehicle: human_id.clone() };
    if let Some(json) = welcome.to_json() {
        let _ = tx.send(json);
    }

    // -------------------------------
    // 3) receive loop
    // -------------------------------
    while let Some(msg) = read.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(_) => break,
        };
        let Ok(text) = msg.to_text() else {
            continue;
        };

        match ClientMessage::from_json(text) {
            Some(ClientMessage::Ping) => {
                if let Some(json) = ServerMessage::Pong.to_json() {
                    let _ = tx.send(json);
                }
            }
            Some(ClientMessage::Input { vertical, horizontal, handbrake }) => {
                let Some(id) = human_id.as_deref() else {
                    debug!(%client_id, "input ignored: no human vehicle configured");
                    continue;
                };
                let input = HumanInput { command: Command::new(vertical, horizontal), handbrake };
                physics.lock().await.apply_player_input(id, input);
            }
            None => debug!(%client_id, "unrecognised message"),
        }
    }

    info!(%client_id, "client disconnected");

    // release the controls so the car does not run away
    if let Some(id) = human_id.as_deref() {
        physics.lock().await.apply_player_input(id, HumanInput::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_input_with_defaults() {
        let msg = ClientMessage::from_json(r#"{"type":"input","vertical":0.5}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Input { vertical: 0.5, horizontal: 0.0, handbrake: false }
        );

        let msg = ClientMessage::from_json(
            r#"{"type":"input","vertical":-1,"horizontal":0.25,"handbrake":true}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::Input { vertical: -1.0, horizontal: 0.25, handbrake: true }
        );
    }

    #[test]
    fn parses_ping_and_rejects_unknown() {
        assert_eq!(ClientMessage::from_json(r#"{"type":"ping"}"#), Some(ClientMessage::Ping));
        assert_eq!(ClientMessage::from_json(r#"{"type":"teleport"}"#), None);
        assert_eq!(ClientMessage::from_json("not json"), None);
    }

    #[test]
    fn welcome_and_pong_shapes() {
        let welcome = ServerMessage::Welcome { client_id: "abc".into(), vehicle: Some("player".into()) };
        assert_eq!(
            welcome.to_json().unwrap(),
            r#"{"type":"welcome","client_id":"abc","vehicle":"player"}"#
        );
        assert_eq!(ServerMessage::Pong.to_json().unwrap(), r#"{"type":"pong"}"#);
    }
}
