// Trial extraction and response scoring for emocon.

pub mod eda;
pub mod emg;
pub mod error;
pub mod extractor;
pub mod phase;
pub mod scl;
pub mod scorer;
pub mod trial;

pub use error::ScoreError;
pub use extractor::TrialExtractor;
pub use phase::{Phase, extract_phase};
pub use scorer::{FastResponse, PeakToPeak, ResponseScorer, SlowResponse, SmnaSum};
pub use trial::Trial;
