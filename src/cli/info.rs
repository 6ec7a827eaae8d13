use anyhow::Result;

use super::runtime::{load_profile, LoadedConfig};

pub async fn cmd_info(loaded: &LoadedConfig) -> Result<()> {
    let config = &loaded.config;

    println!("EasyApply System Information");
    println!("============================");
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!("Build Date: {}", env!("BUILD_DATE"));
    println!("Git Commit: {} ({})", env!("GIT_HASH"), env!("GIT_BRANCH"));
    println!();

    println!("Configuration:");
    println!(
        "- Config File: {}{}",
        loaded.path.display(),
        if loaded.found { "" } else { " (not found, defaults)" }
    );
    match config.oracle.resolve() {
        Some(oracle) => {
            println!("- Oracle Provider: {:?}", oracle.provider);
            println!("- Oracle Model: {}", oracle.model);
            println!("- Oracle Endpoint: {}", oracle.completions_url());
            println!("- API Keys: {}", oracle.api_keys.len());
        }
        None => println!("- Oracle: unconfigured (fallback answers only)"),
    }
    println!(
        "- Browser: {} (profile dir {})",
        if config.browser.headless {
            "headless"
        } else {
            "headed"
        },
        config.browser.user_data_dir.display()
    );
    if let Some(url) = &config.browser.connect_url {
        println!("- Connect URL: {}", url);
    }
    let flow = &config.flow;
    println!(
        "- Flow: repair attempts={} step limit={} settle={}ms post-click={}ms",
        flow.repair_attempts, flow.step_limit, flow.settle_delay_ms, flow.post_click_delay_ms
    );
    println!("- Batch Jitter: {}ms", config.batch.jitter_ms);
    println!();

    println!("Profile:");
    match &config.profile_path {
        Some(path) => println!("- Path: {}", path.display()),
        None => println!("- Path: (none)"),
    }
    let profile = load_profile(config).await?;
    if profile.is_empty() {
        println!("- Summary: (empty)");
    } else {
        println!("- Summary: {}", profile.summary());
    }

    Ok(())
}
