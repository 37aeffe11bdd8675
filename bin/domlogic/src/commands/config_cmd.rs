use domlogic_core::{Config, Paths};

/// Show the effective configuration as pretty-printed JSON.
pub fn show() -> anyhow::Result<()> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;

    println!();
    println!("📋 Current Configuration");
    if paths.config_file().exists() {
        println!("  File: {}", paths.config_file().display());
    } else {
        println!("  File: {} (not created, showing defaults)", paths.config_file().display());
    }
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Write the default configuration to `~/.domlogic/config.json`.
pub fn init(force: bool) -> anyhow::Result<()> {
    let paths = Paths::new();
    let config_path = paths.config_file();

    if config_path.exists() && !force {
        println!("Config already exists at {}", config_path.display());
        println!("Use --force to overwrite.");
        return Ok(());
    }

    Config::default().save(&config_path)?;
    std::fs::create_dir_all(paths.sessions_dir())?;

    println!("✅ Wrote {}", config_path.display());
    println!();
    println!("Edit `scope.root` / `scope.child` to change the default selectors,");
    println!("or set `browser.wsEndpoint` to attach to a running browser.");
    Ok(())
}
