use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Nutrition record produced by the analysis pipeline.
///
/// This is exactly the JSON schema the model is instructed to emit. Decoding
/// is all-or-nothing: a response that does not match (non-integer macros,
/// negative values, cholesterol outside the closed set) never becomes a
/// `MealAnalysis`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealAnalysis {
    pub name: String,
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fat: u32,
    pub cholesterol: CholesterolLevel,
    #[serde(rename = "isAlcoholic")]
    pub is_alcoholic: bool,
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
}

impl MealAnalysis {
    /// Warnings as a slice, treating absent and empty the same.
    pub fn warning_list(&self) -> &[String] {
        self.warnings.as_deref().unwrap_or(&[])
    }
}

/// Closed enumeration; the match against the provider's text is
/// case-sensitive ("Low"/"Medium"/"High" exactly).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CholesterolLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for CholesterolLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CholesterolLevel::Low => "Low",
            CholesterolLevel::Medium => "Medium",
            CholesterolLevel::High => "High",
        };
        write!(f, "{}", s)
    }
}

/// One saved meal in the journal file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: i64,
    #[serde(flatten)]
    pub analysis: MealAnalysis,
    pub logged_at: DateTime<Utc>,
}
