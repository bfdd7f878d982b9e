mod handlers;
mod models;
mod services;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::env;

use handlers::CommandHandler;
use services::gemini::PLACEHOLDER_API_KEY;
use services::{FileJournal, GeminiService, MealJournal};

#[derive(Parser)]
#[command(name = "mealsnap", about = "Photograph a meal, journal its nutrition")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a meal photo and save it to the journal
    Analyze {
        /// Path to the photo (jpeg or png)
        image: PathBuf,
        /// Print the analysis without saving it
        #[arg(long)]
        no_save: bool,
    },
    /// Show the journal grouped by day
    Log,
    /// Remove one entry from the journal
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    dotenv().ok();

    let cli = Cli::parse();

    // An absent key is surfaced as MissingCredential when a request is made,
    // so log/delete keep working without one.
    let api_key = env::var("GEMINI_API_KEY").unwrap_or_else(|_| PLACEHOLDER_API_KEY.to_string());
    let model = env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string());
    let journal_path = env::var("MEALSNAP_JOURNAL").unwrap_or_else(|_| "meals.jsonl".to_string());

    let gemini = Arc::new(GeminiService::new(api_key, model));
    let journal: Arc<dyn MealJournal> = Arc::new(FileJournal::new(journal_path));
    let handler = CommandHandler::new(gemini, journal);

    match cli.command {
        Command::Analyze { image, no_save } => handler.handle_analyze(&image, no_save).await?,
        Command::Log => handler.handle_log().await?,
        Command::Delete { id } => handler.handle_delete(id).await?,
    }

    Ok(())
}
