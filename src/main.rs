/**
 * AUTOSRE BACKEND - Point d'entrée du serveur de monitoring
 *
 * RÔLE : Bootstrap du service : environnement, logging, configuration,
 * tâches de fond (scheduler de cycle, watcher de config) puis serveur
 * HTTP + WebSocket Axum.
 */

use std::net::SocketAddr;

use autosre_backend::config::{load_config, spawn_config_watcher};
use autosre_backend::http;
use autosre_backend::scheduler::spawn_update_scheduler;
use autosre_backend::state::AppState;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().init();

    let cfg_loaded = load_config().await;
    let bind_port = cfg_loaded.bind_port;
    info!("watching access log at {}", cfg_loaded.log_file);

    let app_state = AppState::new(cfg_loaded);

    // rechargement à chaud des seuils d'alerte
    spawn_config_watcher(app_state.cfg.clone());

    // cycle périodique analyse → alertes → broadcast
    spawn_update_scheduler(app_state.clone());

    // HTTP + WebSocket
    let app = http::build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], bind_port));
    info!("listening on http://{addr}");
    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
