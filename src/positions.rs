// Positions file loader

use anyhow::{anyhow, Context, Result};
use std::path::Path;
use tracing::info;

use crate::models::PositionRecord;

/// Read the JSON array of positions at `path`
pub fn load_positions<P: AsRef<Path>>(path: P) -> Result<Vec<PositionRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(anyhow!("Positions file not found: {}", path.display()));
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read positions file {}", path.display()))?;
    let positions = parse_positions(&content)
        .with_context(|| format!("Failed to load positions from {}", path.display()))?;

    info!("Loaded {} positions from {}", positions.len(), path.display());
    Ok(positions)
}

pub fn parse_positions(content: &str) -> Result<Vec<PositionRecord>> {
    let positions: Vec<PositionRecord> =
        serde_json::from_str(content).context("Invalid positions JSON")?;
    Ok(positions)
}
