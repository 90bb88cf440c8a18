/// Cohort stage of emocon: exclusion, normalization, label correction and
/// score tables on disk.

pub mod aggregate;
pub mod exclusion;
pub mod normalize;
pub mod relabel;
pub mod summary;
pub mod table;

pub use aggregate::{CohortAggregator, CohortTable};
pub use exclusion::{Verdict, verdict};
pub use normalize::normalize;
pub use relabel::swap_direct_labels;
