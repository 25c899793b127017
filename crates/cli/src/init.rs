//! Init command

use std::fs;
use std::path::Path;

use color_eyre::eyre::{eyre, Result};
use tracing::{debug, info};

use canopy_config::Config;

/// Write the default configuration to `config_file`, unless it already exists.
pub fn run(config_file: &Path) -> Result<()> {
    if config_file.exists() {
        info!("Configuration already exists at {}", config_file.display());
        return Ok(());
    }

    debug!("Saving configuration to {:?}.", config_file);
    save_config(config_file, &Config::default())?;
    info!("Configuration written to {}", config_file.display());

    Ok(())
}

pub fn save_config(config_file: &Path, config: &Config) -> Result<()> {
    save(config_file, &toml::to_string_pretty(config)?)
}

fn save(path: &Path, data: &str) -> Result<()> {
    if let Some(parent_dir) = path.parent() {
        fs::create_dir_all(parent_dir).map_err(|e| {
            eyre!(
                "Failed to create parent directory {}: {e:?}",
                parent_dir.display()
            )
        })?;
    }

    fs::write(path, data)
        .map_err(|e| eyre!("Failed to write configuration to {}: {e:?}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use canopy_config::load_config;

    use super::*;

    #[test]
    fn written_config_loads_back() {
        let home = tempfile::tempdir().unwrap();
        let path = home.path().join("config").join("config.toml");

        run(&path).unwrap();

        let config = load_config(&path, Some("CANOPY_TEST_INIT")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn existing_config_is_kept() {
        let home = tempfile::tempdir().unwrap();
        let path = home.path().join("config.toml");
        fs::write(&path, "[aggregator]\nquorum = 5\n").unwrap();

        run(&path).unwrap();

        let config = load_config(&path, Some("CANOPY_TEST_INIT_KEEP")).unwrap();
        assert_eq!(config.aggregator.quorum, 5);
    }
}
