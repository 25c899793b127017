use std::io::IsTerminal;

use color_eyre::eyre::{Result, WrapErr};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use canopy_config::{LogFormat, LogLevel};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a global
/// subscriber is already installed.
pub fn init(log_level: LogLevel, log_format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::builder().parse(directives(log_level)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = FmtSubscriber::builder()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_thread_ids(false);

    let installed = match log_format {
        LogFormat::Plaintext => builder
            .with_ansi(std::io::stdout().is_terminal())
            .finish()
            .try_init(),
        LogFormat::Json => builder.json().finish().try_init(),
    };

    installed.wrap_err("failed to install the log subscriber")
}

fn directives(log_level: LogLevel) -> String {
    // hyper is capped at warn whatever the configured level
    format!("{log_level},hyper=warn")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_reported() {
        // Either this test or another one installed the subscriber first
        let _ = init(LogLevel::Debug, LogFormat::Plaintext);

        let err = init(LogLevel::Info, LogFormat::Json).unwrap_err();
        assert!(format!("{err}").contains("log subscriber"), "{err}");
    }

    #[test]
    fn directives_parse() {
        for level in [LogLevel::Trace, LogLevel::Info, LogLevel::Error] {
            assert!(EnvFilter::builder().parse(directives(level)).is_ok());
        }
    }
}
