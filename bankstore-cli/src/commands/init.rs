//! Init command - create the database and schema

use anyhow::Result;

use super::Session;
use crate::output;

pub fn run(session: &Session) -> Result<()> {
    let store = session.open()?;

    match &store.config().path {
        Some(path) => output::success(&format!("Account store ready at {}", path.display())),
        None => output::warning("Account store initialized in memory; nothing was persisted"),
    }

    Ok(())
}
