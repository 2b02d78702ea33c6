/**
 * LOG ANALYZER - Statistiques agrégées du access log nginx
 *
 * RÔLE : Parse chaque ligne selon la grammaire du format combiné, puis
 * recalcule intégralement les statistiques (compteurs, distribution des
 * statuts, taux de succès) sur le snapshot courant du fichier.
 *
 * Les lignes hors grammaire sont rendues telles quelles à l'appelant pour
 * affichage mais n'entrent dans aucun agrégat. Recalcul complet à chaque
 * cycle : une Analysis est toujours cohérente avec un seul snapshot.
 */
use std::collections::HashMap;

use regex::Regex;
use serde::Serialize;

use crate::error::ParseFailure;
use crate::messages::now_rfc3339;

/// Une requête extraite d'une ligne du access log. Immuable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestRecord {
    pub client_ip: String,
    pub timestamp: String,
    pub method: String,
    pub path: String,
    pub status_code: u16,
    pub byte_count: u64,
    pub user_agent: String,
}

/// Statistiques d'un snapshot du log.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub total_requests: u64,
    pub status_code_distribution: HashMap<String, u64>,
    /// Nombre de réponses 5xx.
    pub error_count: u64,
    /// 100 × (réponses 2xx-3xx) / total, 100.0 quand le log est vide.
    pub success_rate: f64,
    pub generated_at: String,
}

/// Analyseur du format combiné :
/// `IP - - [TS] "METHOD PATH PROTO" STATUS BYTES "REFERRER" "USER_AGENT"`
pub struct LogAnalyzer {
    line_re: Regex,
}

impl LogAnalyzer {
    pub fn new() -> Self {
        let line_re = Regex::new(
            r#"^(\S+) - - \[([^\]]+)\] "(\S+) (\S+) \S+" (\d{3}) (\d+|-) "[^"]*" "([^"]*)"$"#,
        )
        .expect("access log grammar");
        Self { line_re }
    }

    /// Extrait un `RequestRecord`, ou rend la ligne brute si elle ne colle
    /// pas à la grammaire. Un byte count `-` (réponse sans corps) vaut 0.
    pub fn parse(&self, line: &str) -> Result<RequestRecord, ParseFailure> {
        let caps = self
            .line_re
            .captures(line)
            .ok_or_else(|| ParseFailure { raw: line.to_owned() })?;
        let status_code = caps[5]
            .parse()
            .map_err(|_| ParseFailure { raw: line.to_owned() })?;
        let byte_count = match &caps[6] {
            "-" => 0,
            bytes => bytes
                .parse()
                .map_err(|_| ParseFailure { raw: line.to_owned() })?,
        };
        Ok(RequestRecord {
            client_ip: caps[1].to_owned(),
            timestamp: caps[2].to_owned(),
            method: caps[3].to_owned(),
            path: caps[4].to_owned(),
            status_code,
            byte_count,
            user_agent: caps[7].to_owned(),
        })
    }

    /// Statistiques du snapshot courant. Fonction pure des lignes reçues.
    pub fn analyze(&self, lines: &[String]) -> Analysis {
        let mut status_counts: HashMap<String, u64> = HashMap::new();
        let mut total = 0u64;
        let mut errors = 0u64;
        let mut successes = 0u64;

        for line in lines {
            // lignes illisibles : ni requête, ni erreur
            let Ok(record) = self.parse(line) else { continue };
            total += 1;
            *status_counts
                .entry(record.status_code.to_string())
                .or_insert(0) += 1;
            if (500..=599).contains(&record.status_code) {
                errors += 1;
            }
            if (200..=399).contains(&record.status_code) {
                successes += 1;
            }
        }

        let success_rate = if total == 0 {
            100.0
        } else {
            successes as f64 / total as f64 * 100.0
        };

        Analysis {
            total_requests: total,
            status_code_distribution: status_counts,
            error_count: errors,
            success_rate,
            generated_at: now_rfc3339(),
        }
    }

    /// Rendu texte déterministe de l'analyse, sans état caché.
    pub fn summarize(&self, analysis: &Analysis) -> String {
        let mut summary = String::from("Log Analysis Summary:\n");
        summary.push_str(&format!("- Total requests: {}\n", analysis.total_requests));
        summary.push_str(&format!("- Error requests: {}\n", analysis.error_count));
        summary.push_str(&format!("- Success rate: {:.1}%\n", analysis.success_rate));

        let mut codes: Vec<(&String, &u64)> = analysis.status_code_distribution.iter().collect();
        // tri par volume décroissant puis par code, pour un rendu stable
        codes.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        if !codes.is_empty() {
            let top: Vec<&str> = codes.iter().take(3).map(|(code, _)| code.as_str()).collect();
            summary.push_str(&format!("- Top status codes: {}\n", top.join(", ")));
        }
        summary
    }
}

impl Default for LogAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(status: u16) -> String {
        format!(
            "192.168.1.10 - - [06/Aug/2026:10:00:00 +0000] \"GET /index.html HTTP/1.1\" {status} 1024 \"-\" \"Mozilla/5.0\""
        )
    }

    #[test]
    fn parse_extracts_every_field() {
        let analyzer = LogAnalyzer::new();
        let record = analyzer
            .parse("10.1.2.3 - - [06/Aug/2026:09:30:12 +0000] \"POST /login HTTP/1.1\" 201 98 \"http://example.com\" \"Mozilla/5.0 (X11; Linux)\"")
            .unwrap();
        assert_eq!(record.client_ip, "10.1.2.3");
        assert_eq!(record.timestamp, "06/Aug/2026:09:30:12 +0000");
        assert_eq!(record.method, "POST");
        assert_eq!(record.path, "/login");
        assert_eq!(record.status_code, 201);
        assert_eq!(record.byte_count, 98);
        assert_eq!(record.user_agent, "Mozilla/5.0 (X11; Linux)");
    }

    #[test]
    fn parse_accepts_dash_byte_count() {
        let analyzer = LogAnalyzer::new();
        let record = analyzer
            .parse("10.0.0.1 - - [06/Aug/2026:10:00:00 +0000] \"HEAD / HTTP/1.1\" 304 - \"-\" \"curl/8.0\"")
            .unwrap();
        assert_eq!(record.byte_count, 0);
    }

    #[test]
    fn parse_rejects_lines_off_grammar() {
        let analyzer = LogAnalyzer::new();
        for raw in ["", "not a log line", "2026-08-06 ERROR something broke"] {
            let failure = analyzer.parse(raw).unwrap_err();
            assert_eq!(failure.raw, raw);
        }
    }

    #[test]
    fn analyze_counts_statuses_errors_and_success_rate() {
        // un 200, un 201, un 404, un 500
        let analyzer = LogAnalyzer::new();
        let lines = vec![line(200), line(201), line(404), line(500)];
        let analysis = analyzer.analyze(&lines);

        assert_eq!(analysis.total_requests, 4);
        assert_eq!(analysis.error_count, 1);
        assert_eq!(analysis.success_rate, 50.0);
        assert_eq!(analysis.status_code_distribution["200"], 1);
        assert_eq!(analysis.status_code_distribution["201"], 1);
        assert_eq!(analysis.status_code_distribution["404"], 1);
        assert_eq!(analysis.status_code_distribution["500"], 1);
    }

    #[test]
    fn analyze_excludes_unparsable_lines_from_aggregates() {
        let analyzer = LogAnalyzer::new();
        let lines = vec![
            line(200),
            "garbage".to_string(),
            line(503),
            "another bad line".to_string(),
        ];
        let analysis = analyzer.analyze(&lines);
        assert_eq!(analysis.total_requests, 2);
        assert_eq!(
            analysis.total_requests,
            analysis.status_code_distribution.values().sum::<u64>()
        );
    }

    #[test]
    fn analyze_empty_log_yields_defined_success_rate() {
        let analyzer = LogAnalyzer::new();
        let analysis = analyzer.analyze(&[]);
        assert_eq!(analysis.total_requests, 0);
        assert_eq!(analysis.success_rate, 100.0);
        assert!(analysis.status_code_distribution.is_empty());
    }

    #[test]
    fn analyze_is_idempotent_on_a_frozen_snapshot() {
        let analyzer = LogAnalyzer::new();
        let lines = vec![line(200), line(500), line(302)];
        let first = analyzer.analyze(&lines);
        let second = analyzer.analyze(&lines);
        assert_eq!(first.total_requests, second.total_requests);
        assert_eq!(first.error_count, second.error_count);
        assert_eq!(first.success_rate, second.success_rate);
        assert_eq!(first.status_code_distribution, second.status_code_distribution);
    }

    #[test]
    fn success_rate_stays_in_bounds() {
        let analyzer = LogAnalyzer::new();
        for lines in [
            vec![line(500), line(500)],
            vec![line(200); 10],
            vec![line(404)],
        ] {
            let analysis = analyzer.analyze(&lines);
            assert!((0.0..=100.0).contains(&analysis.success_rate));
        }
    }

    #[test]
    fn summary_is_deterministic() {
        let analyzer = LogAnalyzer::new();
        let lines = vec![line(200), line(200), line(404), line(500)];
        let analysis = analyzer.analyze(&lines);
        let rendered = analyzer.summarize(&analysis);
        assert_eq!(rendered, analyzer.summarize(&analysis));
        assert!(rendered.contains("- Total requests: 4"));
        assert!(rendered.contains("- Error requests: 1"));
        assert!(rendered.contains("- Success rate: 50.0%"));
        assert!(rendered.contains("- Top status codes: 200, 404, 500"));
    }
}
