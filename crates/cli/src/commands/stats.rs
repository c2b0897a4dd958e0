//! Stats command handler.

use super::{open_store, print_json};
use clap::Args;
use ragline_core::{config::AppConfig, AppResult};

/// Show knowledge base statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let store = open_store(config).await?;
        let stats = store.stats().await;

        if self.json {
            return print_json(&stats);
        }

        println!("Knowledge base: {:?}", store.index_dir());
        println!("State:          {:?}", store.lifecycle().await);
        println!("Entries:        {}", stats.total_documents);
        match stats.dimension {
            Some(d) => println!("Dimension:      {}", d),
            None => println!("Dimension:      -"),
        }

        Ok(())
    }
}
