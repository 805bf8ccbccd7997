use crate::output::print_json;
use anyhow::Context;
use ramplo_core::config::Config;
use ramplo_core::paths;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config_path = paths::config_path(root);
    let default = serde_yaml::to_string(&Config::default())?;
    let wrote_config = ramplo_core::io::write_if_missing(&config_path, default.as_bytes())
        .context("failed to write config")?;

    let config = super::load_config(root)?;
    super::open_store(root, &config)?;
    let database = config.database_path(root);

    if json {
        print_json(&serde_json::json!({
            "root": root,
            "config": config_path,
            "configCreated": wrote_config,
            "database": database,
        }))?;
    } else {
        if wrote_config {
            println!("Wrote {}", config_path.display());
        } else {
            println!("Kept existing {}", config_path.display());
        }
        println!("Database ready at {}", database.display());
    }
    Ok(())
}
