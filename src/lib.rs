mod collaborators;
mod message_log;
mod pipeline;

use anyhow::{Context, Result};
use clap::Parser;
use gbf_data::Settings;
use std::path::PathBuf;

pub use pipeline::{run_session, Pipeline};

#[derive(Parser, Debug)]
#[command(version, about = "Farms items in Granblue Fantasy on an Android device", long_about = None)]
struct Cli {
    /// Settings file to run with
    #[arg(default_value = "settings.json")]
    settings: PathBuf,

    /// Save extra diagnostics while running
    #[arg(long)]
    debug: bool,
}

pub fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "gbf_autopilot_lib=debug,gbf_nav=debug,gbf_vision=info,gbf_input=info,gbf_capture=info".into()
            }),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::load(&cli.settings)?;
    settings.debug_mode |= cli.debug;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start the async runtime")?;
    let total = runtime.block_on(run_session(settings))?;
    tracing::info!("Done, {} farmed", total);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["gbf-autopilot"]);
        assert_eq!(cli.settings, PathBuf::from("settings.json"));
        assert!(!cli.debug);

        let cli = Cli::parse_from(["gbf-autopilot", "raid.json", "--debug"]);
        assert_eq!(cli.settings, PathBuf::from("raid.json"));
        assert!(cli.debug);
    }
}
