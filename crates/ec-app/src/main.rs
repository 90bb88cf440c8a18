use anyhow::Result;
use clap::Parser;
use ec_core::AnalysisConfig;

pub mod batch;
pub mod cli;
pub mod io;

use cli::Command;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Charger la config
    let config = resolve_config(&cli)?;

    // 4. Lancer l'étape demandée
    run_stage(cli.command, &config, cli.stop_after)
}

fn run_stage(stage: Command, config: &AnalysisConfig, stop_after: Option<usize>) -> Result<()> {
    let report = match stage {
        Command::Decode => batch::run_decode(config, stop_after)?,
        Command::Eda => batch::run_eda(config, stop_after)?,
        Command::Emg => batch::run_emg(config, stop_after)?,
        Command::Collect => return batch::run_collect(config),
        Command::All => {
            for stage in [Command::Decode, Command::Eda, Command::Emg, Command::Collect] {
                run_stage(stage, config, stop_after)?;
            }
            return Ok(());
        }
    };
    log::info!(
        "{stage:?} : {} sujets traités, {} en échec",
        report.processed,
        report.failed
    );
    Ok(())
}

/// Missing config file: warn and fall back to the defaults.
fn resolve_config(cli: &cli::Cli) -> Result<AnalysisConfig> {
    if cli.config.exists() {
        ec_core::config::load_config(&cli.config)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(AnalysisConfig::default())
    }
}
