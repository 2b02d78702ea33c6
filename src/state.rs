use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::alerts::AlertManager;
use crate::analysis::{Analysis, LogAnalyzer};
use crate::config::DashboardConfig;
use crate::connections::ConnectionRegistry;
use crate::health::HealthTracker;
use crate::logs::LogReader;
use crate::metrics::{MetricsSampler, SystemSnapshot};

/// État partagé entre tâches (mutex non-async, sections critiques courtes).
pub type Shared<T> = Arc<Mutex<T>>;

pub fn new_state<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

/// Résultat du dernier cycle complet du scheduler, interrogeable via /status
/// par les clients qui ne tiennent pas de WebSocket ouverte.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LatestCycle {
    pub analysis: Option<Analysis>,
    pub summary: Option<String>,
    pub system: Option<SystemSnapshot>,
    pub updated_at: Option<String>,
}

/// État unique du service, construit au démarrage et cloné dans les handlers
/// Axum et les tâches de fond. Pas de singleton process-wide.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Shared<DashboardConfig>,
    pub reader: Arc<LogReader>,
    pub analyzer: Arc<LogAnalyzer>,
    pub sampler: Arc<MetricsSampler>,
    pub alerts: Shared<AlertManager>,
    pub registry: Arc<ConnectionRegistry>,
    pub latest: Shared<LatestCycle>,
    pub health: HealthTracker,
}

impl AppState {
    pub fn new(cfg: DashboardConfig) -> Self {
        let reader = Arc::new(LogReader::new(&cfg.log_file));
        Self {
            reader,
            analyzer: Arc::new(LogAnalyzer::new()),
            sampler: Arc::new(MetricsSampler::new()),
            alerts: new_state(AlertManager::new()),
            registry: Arc::new(ConnectionRegistry::new()),
            latest: new_state(LatestCycle::default()),
            health: HealthTracker::new(),
            cfg: new_state(cfg),
        }
    }
}
