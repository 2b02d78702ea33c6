use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::alerts::{Alert, AlertKind};
use crate::analysis::Analysis;
use crate::metrics::SystemSnapshot;

/// Horodatage RFC3339 pour les données sortantes.
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}

/// Enveloppe des messages poussés sur le canal WebSocket.
///
/// `initial_data` part une seule fois, vers le client qui vient de se
/// connecter ; `update` est le delta broadcast à chaque tick du scheduler.
/// Tous les champs d'un même message proviennent du même cycle.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    InitialData {
        logs: String,
        analysis: Analysis,
        error_logs: Vec<String>,
        summary: String,
        alerts: Vec<Alert>,
        timestamp: String,
    },
    Update {
        analysis: Analysis,
        summary: String,
        system: SystemSnapshot,
        alerts_raised: Vec<Alert>,
        alerts_cleared: Vec<AlertKind>,
        timestamp: String,
    },
    Error {
        message: String,
        timestamp: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_carries_the_type_tag() {
        let msg = WsMessage::Error {
            message: "Log file not found".into(),
            timestamp: now_rfc3339(),
        };
        let json: serde_json::Value = serde_json::from_str(&serde_json::to_string(&msg).unwrap()).unwrap();
        assert_eq!(json["type"], "error");
        assert!(json["timestamp"].is_string());
    }
}
