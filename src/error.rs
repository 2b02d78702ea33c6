use thiserror::Error;
use uuid::Uuid;

/// Erreurs récupérables du moteur de monitoring. Aucune n'est fatale au
/// processus : le scheduler et les tâches de connexion les absorbent.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Fichier de log absent ou illisible. Traité comme "pas de données"
    /// par les appelants, le collaborateur nginx peut ne pas avoir démarré.
    #[error("log source unavailable: {0}")]
    IoUnavailable(#[source] std::io::Error),

    /// Un envoi vers un client a échoué, la connexion est retirée du registre.
    #[error("send to client {0} failed")]
    SendFailure(Uuid),

    /// Une métrique système est illisible sur cette plateforme.
    #[error("metric `{0}` unavailable")]
    SampleFailure(&'static str),

    #[error("failed to serialize outbound message: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Ligne ne respectant pas la grammaire du access log. La ligne brute est
/// conservée pour l'affichage mais exclue de tous les agrégats.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line does not match the access log grammar")]
pub struct ParseFailure {
    pub raw: String,
}
