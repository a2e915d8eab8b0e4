//! The `restate init` command.

use anyhow::Result;

use restate_providers::config::starter_config;

pub fn execute() -> Result<()> {
    if std::path::Path::new("restate.toml").exists() {
        println!("restate.toml already exists, skipping.");
    } else {
        std::fs::write("restate.toml", starter_config())?;
        println!("Created restate.toml");
    }

    println!("\nNext steps:");
    println!("  1. Pick a scorer in restate.toml (overlap works offline)");
    println!("  2. Run: restate submit --owner 1 --original \"...\" --user \"...\"");
    println!("  3. Run: restate latest");

    Ok(())
}
