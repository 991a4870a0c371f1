//! Config command handler: show effective configuration.

use std::path::Path;

use anyhow::Result;

use mediarip_core::Settings;
use mediarip_core::config::resolve_default_config_path;

pub fn run_config_show_command(settings: &Settings, loaded_from: Option<&Path>) -> Result<()> {
    let resolved_path = loaded_from
        .map(Path::to_path_buf)
        .or_else(resolve_default_config_path)
        .map_or_else(|| "<unresolved>".to_string(), |path| path.display().to_string());

    println!("# config_path = {resolved_path}");
    println!(
        "# config_file = {}",
        if loaded_from.is_some() {
            "loaded"
        } else {
            "not found (using defaults)"
        }
    );
    print!("{}", settings.to_toml()?);
    Ok(())
}
