/// Shared types, configuration, and event handling for emocon.
///
/// This crate contains the event stream, the score types exchanged between
/// the scoring and cohort stages, the decomposition boundary, and the
/// configuration loaded from TOML.

pub mod config;
pub mod decomposition;
pub mod error;
pub mod events;
pub mod score;
pub mod stats;

pub use config::AnalysisConfig;
pub use decomposition::{Decomposer, Decomposition};
pub use error::CoreError;
pub use events::{Event, EventStream};
pub use score::{Amplitude, Modality, Score, ScoreRecord};
