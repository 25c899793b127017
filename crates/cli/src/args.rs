//! Command-line interface
//!
//! The service reads its configuration from `<home>/config/config.toml`, or from
//! the file given with `--config`. Every setting can be overridden with a
//! `CANOPY__<SECTION>__<KEY>` environment variable.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result, WrapErr};
use directories::BaseDirs;

use canopy_config::{load_config, Config};

const APP_FOLDER: &str = ".canopy";
const CONFIG_FILE: &str = "config.toml";

#[derive(Parser, Clone, Debug, Default)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Home directory, holding the configuration and the database
    #[arg(long, value_name = "DIR", env = "CANOPY_HOME")]
    pub home: Option<PathBuf>,

    /// Config file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug, Default, PartialEq, Eq)]
pub enum Commands {
    /// Write the default configuration
    Init,

    /// Start accepting tree submissions
    #[default]
    Start,
}

impl Args {
    pub fn new() -> Args {
        Args::parse()
    }

    /// The application home folder.
    /// Typically `$HOME/.canopy`, dependent on the operating system.
    pub fn get_home_dir(&self) -> Result<PathBuf> {
        if let Some(home) = &self.home {
            return Ok(home.clone());
        }

        Ok(BaseDirs::new()
            .ok_or_else(|| eyre!("could not determine home directory path"))?
            .home_dir()
            .join(APP_FOLDER))
    }

    pub fn get_config_dir(&self) -> Result<PathBuf> {
        Ok(self.get_home_dir()?.join("config"))
    }

    pub fn get_config_file_path(&self) -> Result<PathBuf> {
        Ok(match &self.config {
            Some(path) => path.clone(),
            None => self.get_config_dir()?.join(CONFIG_FILE),
        })
    }

    /// Load the configuration file, applying environment overrides.
    pub fn load_config(&self) -> Result<Config> {
        let path = self.get_config_file_path()?;

        load_config(&path, None).wrap_err_with(|| {
            format!(
                "failed to load configuration from {}, run `canopy init` first",
                path.display()
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_struct() {
        let args = Args::parse_from(["canopy", "init"]);
        assert_eq!(args.command, Commands::Init);
        assert_eq!(args.config, None);

        let args = Args::parse_from([
            "canopy",
            "--home",
            "/tmp/canopy",
            "--config",
            "myconfig.toml",
            "start",
        ]);
        assert_eq!(args.command, Commands::Start);
        assert_eq!(args.home, Some(PathBuf::from("/tmp/canopy")));
        assert_eq!(
            args.get_config_file_path().unwrap(),
            PathBuf::from("myconfig.toml")
        );
    }

    #[test]
    fn config_lives_under_the_home_dir() {
        let args = Args::parse_from(["canopy", "--home", "/srv/canopy", "start"]);

        assert_eq!(
            args.get_config_file_path().unwrap(),
            PathBuf::from("/srv/canopy/config/config.toml")
        );
    }

    #[test]
    fn missing_config_file_is_reported() {
        let home = tempfile::tempdir().unwrap();
        let args = Args {
            home: Some(home.path().to_path_buf()),
            ..Args::default()
        };

        let err = args.load_config().unwrap_err();
        assert!(format!("{err}").contains("canopy init"), "{err}");
    }
}
