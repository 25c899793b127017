use color_eyre::eyre::Result;
use tracing::debug;

use args::{Args, Commands};

mod args;
mod init;
mod logging;
mod start;

#[tokio::main]
pub async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::new();

    match &args.command {
        Commands::Init => {
            logging::init(Default::default(), Default::default())?;
            debug!("Command-line parameters: {:?}", args);

            init::run(&args.get_config_file_path()?)
        }
        Commands::Start => {
            let config = args.load_config()?;

            logging::init(config.logging.log_level, config.logging.log_format)?;
            debug!("Command-line parameters: {:?}", args);

            start::run(&args.get_home_dir()?, config).await
        }
    }
}
