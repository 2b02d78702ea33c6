/**
 * ALERT MANAGER - Alertes à seuils avec hystérésis
 *
 * RÔLE : Compare à chaque cycle les métriques système et le taux d'erreur
 * du log aux seuils configurés, et maintient l'ensemble des alertes actives.
 *
 * CONTRAT : edge-triggered. Une alerte naît au franchissement du seuil,
 * reste silencieuse tant que la condition dure (pas de spam, raised_at
 * conservé), et se clôt au premier cycle repassé sous le seuil. L'ensemble
 * actif est la seule source de vérité, aucun historique n'est gardé.
 */
use std::collections::HashMap;

use serde::Serialize;

use crate::analysis::Analysis;
use crate::config::AlertThresholds;
use crate::messages::now_rfc3339;
use crate::metrics::SystemSnapshot;

/// Ordre d'évaluation fixe, pour des cycles reproductibles.
pub const ALERT_KINDS: [AlertKind; 4] = [
    AlertKind::Cpu,
    AlertKind::Memory,
    AlertKind::Disk,
    AlertKind::ErrorRate,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Cpu,
    Memory,
    Disk,
    ErrorRate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub id: String,
    pub kind: AlertKind,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub raised_at: String,
}

impl AlertKind {
    fn alert_id(self) -> &'static str {
        match self {
            AlertKind::Cpu => "high_cpu",
            AlertKind::Memory => "high_memory",
            AlertKind::Disk => "high_disk",
            AlertKind::ErrorRate => "high_error_rate",
        }
    }

    fn title(self) -> &'static str {
        match self {
            AlertKind::Cpu => "High CPU Usage",
            AlertKind::Memory => "High Memory Usage",
            AlertKind::Disk => "High Disk Usage",
            AlertKind::ErrorRate => "High Error Rate",
        }
    }

    fn severity(self) -> Severity {
        match self {
            AlertKind::ErrorRate => Severity::Critical,
            _ => Severity::Warning,
        }
    }

    fn describe(self, value: f64) -> String {
        match self {
            AlertKind::Cpu => format!("CPU usage is {value:.1}%"),
            AlertKind::Memory => format!("Memory usage is {value:.1}%"),
            AlertKind::Disk => format!("Disk usage is {value:.1}%"),
            AlertKind::ErrorRate => format!("Error rate is {value:.1}%"),
        }
    }

    fn threshold(self, thresholds: &AlertThresholds) -> f64 {
        match self {
            AlertKind::Cpu => thresholds.cpu_usage,
            AlertKind::Memory => thresholds.memory_usage,
            AlertKind::Disk => thresholds.disk_usage,
            AlertKind::ErrorRate => thresholds.error_rate,
        }
    }

    /// Valeur courante de la métrique, None si elle est illisible ce cycle.
    fn current_value(self, analysis: &Analysis, snapshot: &SystemSnapshot) -> Option<f64> {
        match self {
            AlertKind::Cpu => snapshot.cpu_percent.map(f64::from),
            AlertKind::Memory => snapshot.memory_percent.map(f64::from),
            AlertKind::Disk => snapshot.disk_percent.map(f64::from),
            AlertKind::ErrorRate => {
                // log vide : taux d'erreur défini à 0, pas d'alerte
                if analysis.total_requests == 0 {
                    Some(0.0)
                } else {
                    Some(analysis.error_count as f64 / analysis.total_requests as f64 * 100.0)
                }
            }
        }
    }
}

/// Deltas d'un cycle d'évaluation : alertes levées et types clos.
#[derive(Debug, Default)]
pub struct AlertDeltas {
    pub raised: Vec<Alert>,
    pub cleared: Vec<AlertKind>,
}

/// Détenteur exclusif de l'état des alertes actives. Construit au démarrage
/// du service, consulté par le scheduler et les endpoints de requête.
pub struct AlertManager {
    active: HashMap<AlertKind, Alert>,
}

impl AlertManager {
    pub fn new() -> Self {
        Self {
            active: HashMap::new(),
        }
    }

    /// Évalue tous les types d'alerte contre le cycle courant.
    ///
    /// Une métrique illisible (valeur None) laisse l'état du type inchangé,
    /// ni levée ni clôture sur une lecture en panne.
    pub fn evaluate(
        &mut self,
        analysis: &Analysis,
        snapshot: &SystemSnapshot,
        thresholds: &AlertThresholds,
    ) -> AlertDeltas {
        let mut deltas = AlertDeltas::default();

        for kind in ALERT_KINDS {
            let Some(value) = kind.current_value(analysis, snapshot) else {
                continue;
            };
            let threshold = kind.threshold(thresholds);
            let already_active = self.active.contains_key(&kind);

            if value >= threshold && !already_active {
                let alert = Alert {
                    id: kind.alert_id().to_owned(),
                    kind,
                    severity: kind.severity(),
                    title: kind.title().to_owned(),
                    message: kind.describe(value),
                    raised_at: now_rfc3339(),
                };
                self.active.insert(kind, alert.clone());
                deltas.raised.push(alert);
            } else if value < threshold && already_active {
                self.active.remove(&kind);
                deltas.cleared.push(kind);
            }
            // condition toujours vraie sur un type déjà actif : silence
        }

        deltas
    }

    /// Alertes actives, dans l'ordre d'évaluation.
    pub fn active_alerts(&self) -> Vec<Alert> {
        ALERT_KINDS
            .iter()
            .filter_map(|kind| self.active.get(kind).cloned())
            .collect()
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new()
    }
}
