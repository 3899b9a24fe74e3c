//! Seed command - insert the demo account

use anyhow::{Context, Result};
use colored::Colorize;

use bankstore_core::services::SeedService;

use super::Session;
use crate::output;

pub async fn run(session: &Session, json: bool) -> Result<()> {
    let store = session.open()?;
    let service = SeedService::new(store);

    if !json {
        println!("{}", "Seeding demo accounts".bold());
    }

    let seeded = service
        .seed_demo_accounts(&session.op_context())
        .await
        .context("Failed to seed demo accounts")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&seeded)?);
        return Ok(());
    }

    for account in &seeded {
        output::success(&format!(
            "✓ {} created with number {}",
            account.full_name(),
            account.number
        ));
    }

    Ok(())
}
