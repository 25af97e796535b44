//! Init command - write a default config file

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use circuit_score::config::{CONFIG_FILE_NAME, DEFAULT_CONFIG_TEMPLATE};

/// Run the init command
pub fn run(path: &Path, force: bool) -> Result<()> {
    let dir = path
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", path.display()))?;

    if !dir.is_dir() {
        anyhow::bail!("Path is not a directory: {}", dir.display());
    }

    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() && !force {
        println!(
            "Config already exists at {} (use --force to overwrite)",
            config_path.display()
        );
        return Ok(());
    }

    std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    info!("Wrote default config to {}", config_path.display());
    println!("Created {}", config_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_template() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), false).unwrap();

        let written = std::fs::read_to_string(dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(written, DEFAULT_CONFIG_TEMPLATE);
    }

    #[test]
    fn test_init_keeps_existing_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, "[scoring]\nmax_iterations = 7\n").unwrap();

        run(dir.path(), false).unwrap();
        assert!(std::fs::read_to_string(&config_path).unwrap().contains("= 7"));

        run(dir.path(), true).unwrap();
        assert_eq!(
            std::fs::read_to_string(&config_path).unwrap(),
            DEFAULT_CONFIG_TEMPLATE
        );
    }

    #[test]
    fn test_init_missing_dir_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(&dir.path().join("nope"), false).is_err());
    }
}
