use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// emocon : scoring EDA / EMG du conditionnement de peur.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Étape à exécuter.
    #[command(subcommand)]
    pub command: Command,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,

    /// Ne traiter que les N premiers sujets.
    #[arg(long, global = true)]
    pub stop_after: Option<usize>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Décoder les lignes numériques en fichiers d'événements.
    Decode,
    /// Scorer la conductance cutanée de chaque sujet.
    Eda,
    /// Scorer les sursauts EMG de chaque sujet.
    Emg,
    /// Assembler les tables de cohorte (exclusion + normalisation).
    Collect,
    /// Toutes les étapes, dans l'ordre.
    All,
}
