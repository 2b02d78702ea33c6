use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

use crate::state::Shared;

const DEFAULT_CPU_THRESHOLD: f64 = 80.0;
const DEFAULT_MEMORY_THRESHOLD: f64 = 85.0;
const DEFAULT_DISK_THRESHOLD: f64 = 90.0;
const DEFAULT_ERROR_RATE_THRESHOLD: f64 = 10.0;

/// Seuils d'alerte (en pourcentage), chacun réglable indépendamment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    #[serde(default = "default_cpu_threshold")]
    pub cpu_usage: f64,
    #[serde(default = "default_memory_threshold")]
    pub memory_usage: f64,
    #[serde(default = "default_disk_threshold")]
    pub disk_usage: f64,
    #[serde(default = "default_error_rate_threshold")]
    pub error_rate: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            cpu_usage: DEFAULT_CPU_THRESHOLD,
            memory_usage: DEFAULT_MEMORY_THRESHOLD,
            disk_usage: DEFAULT_DISK_THRESHOLD,
            error_rate: DEFAULT_ERROR_RATE_THRESHOLD,
        }
    }
}

fn default_cpu_threshold() -> f64 {
    DEFAULT_CPU_THRESHOLD
}
fn default_memory_threshold() -> f64 {
    DEFAULT_MEMORY_THRESHOLD
}
fn default_disk_threshold() -> f64 {
    DEFAULT_DISK_THRESHOLD
}
fn default_error_rate_threshold() -> f64 {
    DEFAULT_ERROR_RATE_THRESHOLD
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Access log nginx suivi par le service.
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,
    /// Période du cycle d'analyse/broadcast, en secondes.
    #[serde(default = "default_update_interval")]
    pub update_interval_secs: u64,
    /// Nombre de lignes brutes envoyées dans initial_data et /logs.
    #[serde(default = "default_tail_lines")]
    pub log_tail_lines: usize,
    #[serde(default)]
    pub thresholds: AlertThresholds,
    /// Origines autorisées pour le frontend (CORS).
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            bind_port: default_bind_port(),
            update_interval_secs: default_update_interval(),
            log_tail_lines: default_tail_lines(),
            thresholds: AlertThresholds::default(),
            cors_origins: default_cors_origins(),
        }
    }
}

fn default_log_file() -> String {
    "./nginx-logs/logs/access.log".to_string()
}

fn default_bind_port() -> u16 {
    8000
}

fn default_update_interval() -> u64 {
    5
}

fn default_tail_lines() -> usize {
    500
}

fn default_cors_origins() -> Vec<String> {
    [
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:3001",
        "http://127.0.0.1:3001",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect()
}

pub async fn load_config() -> DashboardConfig {
    let path = std::env::var("AUTOSRE_CONFIG").unwrap_or_else(|_| "dashboard.yaml".into());
    if Path::new(&path).exists() {
        let txt = fs::read_to_string(&path).await.unwrap_or_default();
        if txt.trim().is_empty() {
            return DashboardConfig::default();
        }
        serde_yaml::from_str(&txt).unwrap_or_else(|e| {
            warn!("config invalide ({path}): {e}");
            DashboardConfig::default()
        })
    } else {
        warn!("pas de {path}, usage config par défaut");
        DashboardConfig::default()
    }
}

/// Relit périodiquement le fichier de config et applique les seuils à chaud.
/// Le port et la période de cycle ne sont pris en compte qu'au démarrage.
pub fn spawn_config_watcher(cfg: Shared<DashboardConfig>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(30));
        interval.tick().await; // le premier tick est immédiat
        loop {
            interval.tick().await;
            let fresh = load_config().await;
            let mut current = cfg.lock();
            if fresh.thresholds != current.thresholds {
                info!("seuils d'alerte rechargés: {:?}", fresh.thresholds);
                current.thresholds = fresh.thresholds;
            }
        }
    });
}
