//! Writes the final recommendation to disk

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::finder::Recommendation;

/// Writes recommendations to a single report file
#[derive(Debug, Clone)]
pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the report with the recommendation text, exactly as given.
    pub async fn write(&self, recommendation: &Recommendation) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, recommendation.text.as_bytes()).await?;
        tracing::info!(path = %self.path.display(), bytes = recommendation.text.len(), "report written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::ExecutionTrace;

    fn recommendation(output: &str) -> Recommendation {
        Recommendation::new(output, ExecutionTrace::new("test"))
    }

    #[tokio::test]
    async fn test_writes_text_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path().join("nested/report.txt"));

        writer.write(&recommendation("Line one\nLine two")).await.unwrap();

        let content = std::fs::read_to_string(writer.path()).unwrap();
        assert_eq!(
            content,
            "Recommendation based on analysis: Line one\nLine two"
        );
    }

    #[tokio::test]
    async fn test_overwrites_previous_report() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path().join("report.txt"));

        writer
            .write(&recommendation("a much longer first recommendation"))
            .await
            .unwrap();
        writer.write(&recommendation("short")).await.unwrap();

        let content = std::fs::read_to_string(writer.path()).unwrap();
        assert_eq!(content, "Recommendation based on analysis: short");
    }
}
