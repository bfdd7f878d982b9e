use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;

use crate::models::{JournalEntry, MealAnalysis};

/// Durable store for finalized nutrition records. The analysis pipeline only
/// ever appends; reads and deletes belong to the journal commands.
#[async_trait::async_trait]
pub trait MealJournal: Send + Sync {
    async fn append(&self, analysis: &MealAnalysis) -> Result<JournalEntry>;
    async fn entries(&self) -> Result<Vec<JournalEntry>>;
    /// Returns false if no entry had that id.
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// JSON-lines file journal, one entry per line, chronological order.
pub struct FileJournal {
    path: PathBuf,
}

impl FileJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_all(&self) -> Result<Vec<JournalEntry>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            entries.push(serde_json::from_str(line)?);
        }
        Ok(entries)
    }

    async fn write_all(&self, entries: &[JournalEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let mut contents = String::new();
        for entry in entries {
            contents.push_str(&serde_json::to_string(entry)?);
            contents.push('\n');
        }

        // write to a sibling temp file and rename, so a crash mid-write
        // cannot truncate the journal
        let tmp = self.path.with_extension("jsonl.tmp");
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl MealJournal for FileJournal {
    async fn append(&self, analysis: &MealAnalysis) -> Result<JournalEntry> {
        let mut entries = self.read_all().await?;
        let next_id = entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;

        let entry = JournalEntry {
            id: next_id,
            analysis: analysis.clone(),
            logged_at: Utc::now(),
        };
        entries.push(entry.clone());
        self.write_all(&entries).await?;

        log::info!("💾 Saved meal #{} to {}", entry.id, self.path.display());
        Ok(entry)
    }

    async fn entries(&self) -> Result<Vec<JournalEntry>> {
        self.read_all().await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut entries = self.read_all().await?;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        self.write_all(&entries).await?;
        log::info!("🗑️ Deleted meal #{}", id);
        Ok(true)
    }
}
