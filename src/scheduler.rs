/**
 * UPDATE SCHEDULER - Cycle périodique d'analyse et de diffusion
 *
 * RÔLE : Toutes les N secondes (5 par défaut), relit le log, recalcule les
 * statistiques, échantillonne le système, évalue les alertes puis broadcast
 * un message `update` à tous les clients inscrits.
 *
 * FONCTIONNEMENT : deux états, idle ↔ cycle en cours, jusqu'à l'arrêt du
 * processus. Un cycle en échec est loggé et sauté, le tick suivant repart :
 * l'absence transitoire du fichier de log ne tue jamais le service.
 */
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::MonitorError;
use crate::messages::{now_rfc3339, WsMessage};
use crate::state::AppState;

pub fn spawn_update_scheduler(app: AppState) -> JoinHandle<()> {
    let period = app.cfg.lock().update_interval_secs.max(1);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(period));
        interval.tick().await; // le premier tick est immédiat
        loop {
            interval.tick().await;
            match run_cycle(&app).await {
                Ok(delivered) => debug!("cycle broadcast to {delivered} client(s)"),
                Err(e) => warn!("cycle skipped: {e}"),
            }
        }
    })
}

/// Un cycle complet : lecture → analyse → métriques → alertes → broadcast.
///
/// Tous les champs du message sortant proviennent des données de ce cycle,
/// jamais d'un mélange avec le cycle précédent.
pub async fn run_cycle(app: &AppState) -> Result<usize, MonitorError> {
    // log absent = collaborateur pas encore démarré, on analyse zéro ligne
    let lines = match app.reader.read_lines().await {
        Ok(lines) => lines,
        Err(e) => {
            warn!("{e}");
            Vec::new()
        }
    };

    let analysis = app.analyzer.analyze(&lines);
    let summary = app.analyzer.summarize(&analysis);
    let metrics = app.sampler.sample(app.registry.client_count());
    let system = metrics.snapshot();
    let thresholds = app.cfg.lock().thresholds;
    let deltas = app.alerts.lock().evaluate(&analysis, &system, &thresholds);

    {
        let mut latest = app.latest.lock();
        latest.analysis = Some(analysis.clone());
        latest.summary = Some(summary.clone());
        latest.system = Some(system);
        latest.updated_at = Some(now_rfc3339());
    }
    app.health.mark_cycle();

    let message = WsMessage::Update {
        analysis,
        summary,
        system,
        alerts_raised: deltas.raised,
        alerts_cleared: deltas.cleared,
        timestamp: now_rfc3339(),
    };
    let payload = serde_json::to_string(&message)?;
    Ok(app.registry.broadcast(&payload))
}
