use comfy_table::{presets::UTF8_FULL, Table};
use rpsls_core::{GameError, Result, SandboxBook};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Furthest the sandbox clock may run ahead: a century.
pub const MAX_CLOCK_OFFSET_SECS: i64 = 100 * 365 * 24 * 60 * 60;

/// Sandbox chain as kept between invocations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SandboxState {
    pub book: SandboxBook,
    /// Seconds the sandbox clock runs ahead of the system clock.
    pub clock_offset: i64,
}

impl SandboxState {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| GameError::internal(format!("Failed to read sandbox: {}", e)))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| GameError::internal(format!("Failed to create directory: {}", e)))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .map_err(|e| GameError::internal(format!("Failed to write sandbox: {}", e)))?;
        Ok(())
    }
}

pub fn show_payouts(state: &SandboxState) -> Result<()> {
    let payouts = state.book.payouts();
    if payouts.is_empty() {
        println!("No payouts yet.");
        return Ok(());
    }

    let mut rows: Vec<_> = payouts.iter().collect();
    rows.sort_by_key(|(account, _)| **account);

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Account", "Received"]);
    for (account, amount) in rows {
        table.add_row(vec![account.to_string(), amount.to_string()]);
    }

    println!("Sandbox Payouts:");
    println!("{}", table);
    Ok(())
}

pub fn advance_clock(state: &mut SandboxState, seconds: i64) -> Result<()> {
    if seconds <= 0 {
        return Err(GameError::config("Can only advance the clock forward"));
    }

    let offset = state
        .clock_offset
        .checked_add(seconds)
        .filter(|offset| *offset <= MAX_CLOCK_OFFSET_SECS)
        .ok_or_else(|| {
            GameError::config(format!(
                "Clock offset is capped at {}s; currently {}s",
                MAX_CLOCK_OFFSET_SECS, state.clock_offset
            ))
        })?;
    state.clock_offset = offset;
    tracing::info!("Sandbox clock now {}s ahead", state.clock_offset);
    println!(
        "Sandbox clock advanced by {}s (total offset {}s)",
        seconds, state.clock_offset
    );
    Ok(())
}
