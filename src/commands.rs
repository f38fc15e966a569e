use anyhow::{Context, Result};
use std::io::{self, Write};

use crate::config::WidgetConfig;
use crate::events::{ConversationHistory, EntryRole};
use crate::storage::HistoryStore;

/// Print the stored conversation without starting the widget
pub fn show_history(config: &WidgetConfig) -> Result<()> {
    let store = config.history_store();
    let history = store.load();
    let stdout = io::stdout();
    write_history(&mut stdout.lock(), &history)
}

/// Persist `config` to the file `WidgetConfig::load` reads
pub fn init_config(config: &WidgetConfig) -> Result<()> {
    let path = config.save()?;
    println!("✅ Saved settings to {}", path.display());
    println!("   organization: {}", config.organization_id);
    println!("   position:     {}", config.position);
    println!("   backend:      {}", config.base_url);
    Ok(())
}

pub fn write_history(out: &mut impl Write, history: &ConversationHistory) -> Result<()> {
    if history.is_empty() {
        writeln!(out, "📭 No conversation yet. Run 'chat-widget' to start one!")
            .context("Failed to write history")?;
        return Ok(());
    }

    writeln!(out, "💬 Conversation ({} messages):", history.len())
        .context("Failed to write history")?;
    writeln!(out, "{}", "=".repeat(50)).context("Failed to write history")?;

    for entry in history.iter() {
        let icon = match entry.role() {
            EntryRole::User => "👤",
            EntryRole::System => "🤖",
        };
        writeln!(out, "{} [{}] {}", icon, entry.role(), entry.text())
            .context("Failed to write history")?;
    }

    Ok(())
}
