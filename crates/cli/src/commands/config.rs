use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use fieldscope_core::config::AnalyzerConfig;

/// Write a default configuration file.
pub fn init_config_command(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists; pass --force to overwrite", path.display());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let mut config = AnalyzerConfig::default();
    config.class_dirs = vec!["build/classes/java/main".into()];
    let yaml = config.to_yaml()?;
    fs::write(path, yaml).with_context(|| format!("Failed to write config: {}", path.display()))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
