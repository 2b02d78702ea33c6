use std::path::{Path, PathBuf};

use regex::Regex;
use tokio::fs;

use crate::error::MonitorError;

/// Lecteur du access log nginx.
///
/// Relit le fichier en entier à chaque appel : pas de suivi de position,
/// donc pas de bug de rotation. Les logs sont bornés et tournés par le
/// collaborateur nginx, le coût O(taille du fichier) par cycle est assumé.
pub struct LogReader {
    path: PathBuf,
    error_re: Regex,
}

impl LogReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            // statut 5xx entouré d'espaces dans la ligne combinée
            error_re: Regex::new(r"\s5\d{2}\s").expect("5xx pattern"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Contenu courant du log, ligne par ligne. `IoUnavailable` si le fichier
    /// n'existe pas encore : les appelants traitent ça comme "zéro ligne".
    pub async fn read_lines(&self) -> Result<Vec<String>, MonitorError> {
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(MonitorError::IoUnavailable)?;
        Ok(content.lines().map(str::to_owned).collect())
    }

    /// Lignes en erreur serveur (5xx) uniquement.
    pub async fn read_error_lines(&self) -> Result<Vec<String>, MonitorError> {
        let lines = self.read_lines().await?;
        Ok(lines.into_iter().filter(|l| self.is_error_line(l)).collect())
    }

    pub fn is_error_line(&self, line: &str) -> bool {
        self.error_re.is_match(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ACCESS_LOG: &str = "\
10.0.0.1 - - [06/Aug/2026:10:00:00 +0000] \"GET / HTTP/1.1\" 200 512 \"-\" \"curl/8.0\"
10.0.0.2 - - [06/Aug/2026:10:00:01 +0000] \"GET /api HTTP/1.1\" 502 77 \"-\" \"curl/8.0\"
10.0.0.3 - - [06/Aug/2026:10:00:02 +0000] \"GET /missing HTTP/1.1\" 404 13 \"-\" \"curl/8.0\"
";

    fn temp_log(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn reads_all_lines() {
        let file = temp_log(ACCESS_LOG);
        let reader = LogReader::new(file.path());
        let lines = reader.read_lines().await.unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("10.0.0.1"));
    }

    #[tokio::test]
    async fn missing_file_is_io_unavailable() {
        let reader = LogReader::new("/nonexistent/access.log");
        let err = reader.read_lines().await.unwrap_err();
        assert!(matches!(err, MonitorError::IoUnavailable(_)));
    }

    #[tokio::test]
    async fn error_lines_are_5xx_only() {
        let file = temp_log(ACCESS_LOG);
        let reader = LogReader::new(file.path());
        let errors = reader.read_error_lines().await.unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains(" 502 "));
    }
}
