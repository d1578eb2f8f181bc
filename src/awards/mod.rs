//! Award evaluation and manual grants

mod engine;
mod manual;

pub use engine::{candidate_tier, AwardEngine, AwardOutcome, TierChange};
pub use manual::ManualAwards;
