/**
 * AUTOSRE BACKEND - Moteur de monitoring temps réel du dashboard
 *
 * RÔLE : Analyse du access.log nginx, métriques système, alertes à seuils
 * et diffusion incrémentale vers les clients WebSocket connectés.
 *
 * ARCHITECTURE : Un scheduler périodique pilote le cycle lecture → analyse →
 * alertes → broadcast ; chaque client WebSocket est servi par sa propre tâche.
 * Tout l'état vit en mémoire, un seul processus, best-effort.
 */

pub mod alerts;
pub mod analysis;
pub mod backoff;
pub mod config;
pub mod connections;
pub mod error;
pub mod health;
pub mod http;
pub mod logs;
pub mod messages;
pub mod metrics;
pub mod scheduler;
pub mod state;
pub mod ws;
