/**
 * CONNECTION REGISTRY - Registre des clients WebSocket connectés
 *
 * RÔLE : Détenteur exclusif des canaux d'envoi vers les dashboards. Le
 * scheduler broadcast à travers lui, chaque tâche de connexion s'y inscrit
 * à l'upgrade et s'en retire à la fermeture.
 *
 * CONTRAT : le broadcast opère sur un instantané de la composition pris
 * sous verrou ; un client ajouté ou retiré pendant l'itération ne reçoit
 * ni doublon ni message partiel. Un envoi en échec retire le client sans
 * toucher aux autres destinataires.
 */
use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::MonitorError;

pub type ClientId = Uuid;
pub type ClientSender = UnboundedSender<String>;

pub struct ConnectionRegistry {
    clients: Mutex<HashMap<ClientId, ClientSender>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn register(&self, tx: ClientSender) -> ClientId {
        let id = Uuid::new_v4();
        let total = {
            let mut clients = self.clients.lock();
            clients.insert(id, tx);
            clients.len()
        };
        info!("client {id} connected (total: {total})");
        id
    }

    pub fn unregister(&self, id: ClientId) {
        let removed_total = {
            let mut clients = self.clients.lock();
            clients.remove(&id).map(|_| clients.len())
        };
        if let Some(total) = removed_total {
            info!("client {id} disconnected (total: {total})");
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    /// Envoi adressé à un seul client (push initial, réponse au ping).
    /// Un échec retire la connexion du registre.
    pub fn send(&self, id: ClientId, payload: String) -> Result<(), MonitorError> {
        let tx = self.clients.lock().get(&id).cloned();
        match tx {
            Some(tx) if tx.send(payload).is_ok() => Ok(()),
            Some(_) => {
                self.unregister(id);
                Err(MonitorError::SendFailure(id))
            }
            None => Err(MonitorError::SendFailure(id)),
        }
    }

    /// Diffuse le même payload à tous les clients inscrits à cet instant.
    /// Les destinataires morts sont retirés, les autres livrés quand même.
    /// Ne lève jamais : rend le nombre de livraisons réussies.
    pub fn broadcast(&self, payload: &str) -> usize {
        let targets: Vec<(ClientId, ClientSender)> = self
            .clients
            .lock()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let mut delivered = 0;
        for (id, tx) in targets {
            if tx.send(payload.to_owned()).is_ok() {
                delivered += 1;
            } else {
                debug!("dropping dead client {id}");
                self.unregister(id);
            }
        }
        delivered
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn broadcast_reaches_every_live_client() {
        let registry = ConnectionRegistry::new();
        let (tx1, mut rx1) = unbounded_channel();
        let (tx2, mut rx2) = unbounded_channel();
        registry.register(tx1);
        registry.register(tx2);

        assert_eq!(registry.broadcast("tick"), 2);
        assert_eq!(rx1.try_recv().unwrap(), "tick");
        assert_eq!(rx2.try_recv().unwrap(), "tick");
    }

    #[test]
    fn broadcast_isolates_a_dead_client() {
        let registry = ConnectionRegistry::new();
        let (tx1, mut rx1) = unbounded_channel();
        let (tx2, rx2) = unbounded_channel();
        let (tx3, mut rx3) = unbounded_channel();
        registry.register(tx1);
        let dead = registry.register(tx2);
        registry.register(tx3);
        drop(rx2); // le client est parti sans se désinscrire

        let delivered = registry.broadcast("tick");
        assert_eq!(delivered, 2);
        assert_eq!(registry.client_count(), 2);
        assert_eq!(rx1.try_recv().unwrap(), "tick");
        assert_eq!(rx3.try_recv().unwrap(), "tick");

        // le mort est bien désinscrit
        assert!(registry.send(dead, "again".into()).is_err());
    }

    #[test]
    fn send_targets_one_client_only() {
        let registry = ConnectionRegistry::new();
        let (tx1, mut rx1) = unbounded_channel();
        let (tx2, mut rx2) = unbounded_channel();
        let id1 = registry.register(tx1);
        registry.register(tx2);

        registry.send(id1, "hello".into()).unwrap();
        assert_eq!(rx1.try_recv().unwrap(), "hello");
        assert!(rx2.try_recv().is_err());
    }

    #[test]
    fn failed_send_unregisters_the_client() {
        let registry = ConnectionRegistry::new();
        let (tx, rx) = unbounded_channel();
        let id = registry.register(tx);
        drop(rx);

        let err = registry.send(id, "hello".into()).unwrap_err();
        assert!(matches!(err, MonitorError::SendFailure(failed) if failed == id));
        assert_eq!(registry.client_count(), 0);
    }
}
