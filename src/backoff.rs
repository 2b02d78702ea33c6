//! Politique de reconnexion pour les clients du canal temps réel.
//!
//! Miroir générique de la logique du dashboard navigateur : tentatives
//! bornées, délai croissant plafonné, compteur remis à zéro après une
//! connexion réussie, et aucune reconnexion après une fermeture volontaire.

use std::time::Duration;

/// Nature de la déconnexion observée par le client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disconnect {
    /// Fermeture propre demandée par une des deux parties.
    Clean,
    /// Connexion perdue (réseau coupé, serveur tombé).
    Dropped,
}

#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Compteur de tentatives attaché à une connexion cliente.
#[derive(Debug, Clone)]
pub struct ReconnectState {
    policy: ReconnectPolicy,
    attempts: u32,
}

impl ReconnectState {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self { policy, attempts: 0 }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Délai avant la prochaine tentative : min(base × tentative, plafond).
    /// `None` quand il ne faut pas (ou plus) retenter.
    pub fn reconnect_after(&mut self, cause: Disconnect) -> Option<Duration> {
        if cause == Disconnect::Clean {
            return None;
        }
        if self.attempts >= self.policy.max_attempts {
            return None;
        }
        self.attempts += 1;
        Some(
            self.policy
                .base_delay
                .saturating_mul(self.attempts)
                .min(self.policy.max_delay),
        )
    }

    /// À appeler après une connexion rétablie.
    pub fn record_success(&mut self) {
        self.attempts = 0;
    }
}

impl Default for ReconnectState {
    fn default() -> Self {
        Self::new(ReconnectPolicy::default())
    }
}
