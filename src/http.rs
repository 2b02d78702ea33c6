/**
 * API REST AUTOSRE - Surface HTTP du backend
 *
 * RÔLE :
 * Expose l'état du monitoring aux clients qui ne tiennent pas de WebSocket :
 * santé du service, métriques système fraîches, dernier cycle, et lectures
 * directes du access log.
 *
 * FONCTIONNEMENT :
 * - Routes organisées : /health, /system, /status, /logs, /ws
 * - Sérialisation JSON automatique des réponses
 * - CORS ouvert aux origines du frontend (configurable)
 * - Log indisponible sur les routes /logs : 404, pas d'erreur interne
 */
use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::alerts::Alert;
use crate::analysis::Analysis;
use crate::health::ServiceHealth;
use crate::metrics::{SystemMetrics, SystemSnapshot};
use crate::state::AppState;

pub fn build_router(app_state: AppState) -> Router {
    let cors = build_cors(&app_state.cfg.lock().cors_origins);
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/system/health", get(get_system_health))
        .route("/system/metrics", get(get_system_metrics))
        .route("/status", get(get_status))
        .route("/logs", get(get_logs))
        .route("/logs/errors", get(get_error_logs))
        .route("/logs/analysis", get(get_log_analysis))
        .route("/logs/summary", get(get_log_summary))
        .route("/ws", get(crate::ws::ws_endpoint))
        .with_state(app_state)
        .layer(cors)
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

#[derive(Serialize)]
struct LogsView {
    logs: String,
}

#[derive(Serialize)]
struct ErrorLogsView {
    error_logs: Vec<String>,
}

#[derive(Serialize)]
struct SummaryView {
    summary: String,
}

#[derive(Serialize)]
struct StatusView {
    analysis: Option<Analysis>,
    summary: Option<String>,
    system: Option<SystemSnapshot>,
    alerts: Vec<Alert>,
    updated_at: Option<String>,
}

// GET /system/health (état du service)
async fn get_system_health(State(app): State<AppState>) -> Json<ServiceHealth> {
    Json(app.health.get_health(&app.registry))
}

// GET /system/metrics (échantillon frais, indépendant du cycle)
async fn get_system_metrics(State(app): State<AppState>) -> Json<SystemMetrics> {
    Json(app.sampler.sample(app.registry.client_count()))
}

// GET /status (dernier cycle + alertes actives, pour clients non-streaming)
async fn get_status(State(app): State<AppState>) -> Json<StatusView> {
    let latest = app.latest.lock().clone();
    Json(StatusView {
        analysis: latest.analysis,
        summary: latest.summary,
        system: latest.system,
        alerts: app.alerts.lock().active_alerts(),
        updated_at: latest.updated_at,
    })
}

// GET /logs (queue du fichier brut)
async fn get_logs(State(app): State<AppState>) -> Result<Json<LogsView>, StatusCode> {
    let lines = app
        .reader
        .read_lines()
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;
    let start = lines.len().saturating_sub(app.cfg.lock().log_tail_lines);
    Ok(Json(LogsView {
        logs: lines[start..].join("\n"),
    }))
}

// GET /logs/errors (5xx uniquement)
async fn get_error_logs(State(app): State<AppState>) -> Result<Json<ErrorLogsView>, StatusCode> {
    let error_logs = app
        .reader
        .read_error_lines()
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;
    Ok(Json(ErrorLogsView { error_logs }))
}

// GET /logs/analysis (statistiques recalculées sur le contenu courant)
async fn get_log_analysis(State(app): State<AppState>) -> Result<Json<Analysis>, StatusCode> {
    let lines = app
        .reader
        .read_lines()
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;
    Ok(Json(app.analyzer.analyze(&lines)))
}

// GET /logs/summary (rendu texte de l'analyse)
async fn get_log_summary(State(app): State<AppState>) -> Result<Json<SummaryView>, StatusCode> {
    let lines = app
        .reader
        .read_lines()
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;
    let analysis = app.analyzer.analyze(&lines);
    Ok(Json(SummaryView {
        summary: app.analyzer.summarize(&analysis),
    }))
}
