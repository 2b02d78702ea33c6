/**
 * CANAL WEBSOCKET - Sessions temps réel du dashboard
 *
 * RÔLE : Upgrade sur /ws, push initial de l'état complet vers le nouveau
 * client, puis boucle de connexion : relaie les broadcasts du scheduler et
 * répond aux keep-alive.
 *
 * FONCTIONNEMENT : une tâche par client, deux points de suspension (prochain
 * message sortant, prochaine frame entrante). La tâche se désinscrit du
 * registre avant de sortir : aucun broadcast futur ne vise un client mort.
 */
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, warn};

use crate::messages::{now_rfc3339, WsMessage};
use crate::state::AppState;

/// GET /ws — canal duplex du dashboard.
pub async fn ws_endpoint(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_client(socket, app))
}

async fn handle_client(socket: WebSocket, app: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    let client_id = app.registry.register(tx);

    // push initial adressé à ce seul client, jamais rejoué dans le broadcast
    let initial = build_initial_message(&app).await;
    match serde_json::to_string(&initial) {
        Ok(payload) => {
            let _ = app.registry.send(client_id, payload);
        }
        Err(e) => warn!("failed to serialize initial data: {e}"),
    }

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                // None : retiré du registre (envoi en échec côté broadcast)
                let Some(payload) = outbound else { break };
                if sink.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        // keep-alive applicatif du dashboard
                        if text.as_str().trim() == "ping" {
                            let _ = app.registry.send(client_id, "pong".to_owned());
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!("client {client_id} read error: {e}");
                        break;
                    }
                    Some(Ok(_)) => {} // Ping/Pong/Binary protocolaires : tolérés
                }
            }
        }
    }

    app.registry.unregister(client_id);
}

/// Compose l'état complet au moment de la connexion : queue du log brut,
/// analyse, lignes en erreur, résumé et alertes actives.
pub async fn build_initial_message(app: &AppState) -> WsMessage {
    let tail_lines = app.cfg.lock().log_tail_lines;
    let lines = match app.reader.read_lines().await {
        Ok(lines) => lines,
        Err(e) => {
            warn!("initial data unavailable: {e}");
            return WsMessage::Error {
                message: format!("Log file not found: {}", app.reader.path().display()),
                timestamp: now_rfc3339(),
            };
        }
    };

    let analysis = app.analyzer.analyze(&lines);
    let summary = app.analyzer.summarize(&analysis);
    let error_logs: Vec<String> = lines
        .iter()
        .filter(|line| app.reader.is_error_line(line))
        .cloned()
        .collect();
    let start = lines.len().saturating_sub(tail_lines);
    let logs = lines[start..].join("\n");
    let alerts = app.alerts.lock().active_alerts();

    WsMessage::InitialData {
        logs,
        analysis,
        error_logs,
        summary,
        alerts,
        timestamp: now_rfc3339(),
    }
}
