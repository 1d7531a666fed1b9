//! Common helpers for formatter implementations.

use crate::aggregate::Tier;

pub mod color;

pub const NO_TESTS: &str = "No tests were run";

/// Class name a tier is styled with.
pub fn tier_class(tier: Tier) -> &'static str {
    match tier {
        Tier::AllPass => "ok",
        Tier::AllFail => "fail",
        Tier::Mixed => "mid",
    }
}
