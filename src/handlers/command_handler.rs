use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::models::{JournalEntry, MealAnalysis};
use crate::services::{GeminiService, ImageNormalizer, MealJournal};

pub struct CommandHandler {
    gemini: Arc<GeminiService>,
    journal: Arc<dyn MealJournal>,
}

impl CommandHandler {
    pub fn new(gemini: Arc<GeminiService>, journal: Arc<dyn MealJournal>) -> Self {
        Self { gemini, journal }
    }

    /// Run the full pipeline on one photo: normalize, analyze, print the
    /// record, and append it to the journal unless --no-save was given.
    pub async fn handle_analyze(&self, image_path: &Path, no_save: bool) -> Result<()> {
        log::info!("📸 Analyzing {}", image_path.display());

        let raw = std::fs::read(image_path)
            .with_context(|| format!("could not read {}", image_path.display()))?;

        let encoded = ImageNormalizer::normalize(&raw)?;
        let analysis = self.gemini.analyze_meal(&encoded).await?;

        println!("{}", format_analysis(&analysis));

        if no_save {
            log::info!("📝 --no-save given, not journaling this meal");
            return Ok(());
        }

        let entry = self.journal.append(&analysis).await?;
        println!("Saved as meal #{}.", entry.id);
        Ok(())
    }

    /// Print the journal grouped by calendar day, newest day first.
    pub async fn handle_log(&self) -> Result<()> {
        let entries = self.journal.entries().await?;
        if entries.is_empty() {
            println!("Journal is empty. Analyze a meal photo to get started.");
            return Ok(());
        }
        println!("{}", format_journal(&entries));
        Ok(())
    }

    pub async fn handle_delete(&self, id: i64) -> Result<()> {
        if self.journal.delete(id).await? {
            println!("Deleted meal #{}.", id);
        } else {
            println!("No meal #{} in the journal.", id);
        }
        Ok(())
    }
}

fn format_analysis(meal: &MealAnalysis) -> String {
    let mut out = format!(
        "🍽️ {}\n\
         🔥 Calories: {} kcal\n\
         🥩 Protein: {} g | 🍞 Carbs: {} g | 🧈 Fat: {} g\n\
         🩺 Cholesterol: {}",
        meal.name, meal.calories, meal.protein, meal.carbs, meal.fat, meal.cholesterol
    );
    if meal.is_alcoholic {
        out.push_str("\n🍺 Contains alcohol");
    }
    for warning in meal.warning_list() {
        out.push_str(&format!("\n⚠️ {}", warning));
    }
    out
}

fn format_journal(entries: &[JournalEntry]) -> String {
    // BTreeMap keeps days sorted; render newest day first
    let mut by_day: BTreeMap<NaiveDate, Vec<&JournalEntry>> = BTreeMap::new();
    for entry in entries {
        by_day
            .entry(entry.logged_at.date_naive())
            .or_default()
            .push(entry);
    }

    let mut out = String::new();
    for (day, day_entries) in by_day.iter().rev() {
        let total: u64 = day_entries.iter().map(|e| e.analysis.calories as u64).sum();
        out.push_str(&format!(
            "📅 {}: {} kcal total\n",
            day.format("%Y-%m-%d"),
            total
        ));
        for entry in day_entries {
            out.push_str(&format!(
                "  #{} {}: {} kcal ({})\n",
                entry.id,
                entry.analysis.name,
                entry.analysis.calories,
                entry.logged_at.format("%H:%M")
            ));
        }
    }
    out.trim_end().to_string()
}
