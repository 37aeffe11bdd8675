use domlogic_browser::session::list_available_browsers;
use domlogic_browser::BrowserEngine;
use domlogic_core::{Config, Paths};

/// Check configuration and browser availability.
pub fn run() -> anyhow::Result<()> {
    let paths = Paths::new();

    println!();
    println!("🩺 domlogic doctor");
    println!("==================");
    println!();

    let mut ok_count = 0u32;
    let mut warn_count = 0u32;
    let mut err_count = 0u32;

    println!("📋 Configuration");
    if paths.config_file().exists() {
        print_ok("Config file exists", &paths.config_file().display().to_string());
        ok_count += 1;
    } else {
        print_warn("Config file not found", "Defaults apply; run `domlogic config init` to create one");
        warn_count += 1;
    }

    let config = match Config::load_or_default(&paths) {
        Ok(config) => {
            print_ok("Config is valid", "");
            ok_count += 1;
            config
        }
        Err(e) => {
            print_err("Config is invalid", &e.to_string());
            err_count += 1;
            Config::default()
        }
    };
    println!("  Root scope:  {}", config.scope.root);
    println!("  Child scope: {}", config.scope.child);
    println!();

    println!("🌐 Browsers");
    let available = list_available_browsers();
    if available.is_empty() {
        print_err("No supported browser found", "Install Chrome, Edge or Firefox");
        err_count += 1;
    }
    for (engine, path) in &available {
        print_ok(engine.name(), path);
        ok_count += 1;
    }

    let wanted = BrowserEngine::parse(&config.browser.engine);
    if let Some(ws) = &config.browser.ws_endpoint {
        print_ok("Attaching to configured endpoint", ws);
        ok_count += 1;
    } else if !available.iter().any(|(engine, _)| *engine == wanted) {
        print_warn(
            &format!("Configured engine '{}' not found", wanted.name()),
            "Set browser.engine to one of the browsers above",
        );
        warn_count += 1;
    }
    println!();

    println!(
        "Summary: {} ok, {} warnings, {} errors",
        ok_count, warn_count, err_count
    );
    Ok(())
}

fn print_ok(label: &str, detail: &str) {
    if detail.is_empty() {
        println!("  ✅ {}", label);
    } else {
        println!("  ✅ {} ({})", label, detail);
    }
}

fn print_warn(label: &str, hint: &str) {
    println!("  ⚠️  {} ({})", label, hint);
}

fn print_err(label: &str, hint: &str) {
    println!("  ❌ {} ({})", label, hint);
}
