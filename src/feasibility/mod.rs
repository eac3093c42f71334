//! What-if scheduling for quotes.
//!
//! Both entry points schedule the existing job set exactly as a real run
//! would, then place one synthetic job after it. Nothing is written back;
//! every call builds and drops its own ledger.

mod analyzer;
mod quote;

pub use analyzer::{
    AsIsTier, Bottleneck, FeasibilityAnalyzer, FeasibilityResult, MovesTier, OvertimeCell,
    OvertimeTierResult, QuoteEstimate, Recommendation,
};
pub use quote::{BigItem, DueMode, QuoteInput, QUOTE_JOB_ID};

use chrono::NaiveDate;

use crate::config::ShopConfig;
use crate::error::ConfigResult;
use crate::models::Job;

/// Points, urgency and per-department timeline of a hypothetical job.
///
/// # Errors
/// Returns the configuration defect, if any.
pub fn simulate_quote_schedule(
    input: &QuoteInput,
    existing: &[Job],
    as_of: NaiveDate,
    config: &ShopConfig,
) -> ConfigResult<QuoteEstimate> {
    config.validate()?;
    Ok(FeasibilityAnalyzer::new(config, as_of).estimate(input, existing))
}

/// Three-tier feasibility of a hypothetical job.
///
/// "No solution" is a `Reject` recommendation, never an error.
///
/// # Errors
/// Returns the configuration defect, if any.
pub fn check_advanced_feasibility(
    input: &QuoteInput,
    existing: &[Job],
    as_of: NaiveDate,
    config: &ShopConfig,
) -> ConfigResult<FeasibilityResult> {
    config.validate()?;
    Ok(FeasibilityAnalyzer::new(config, as_of).analyze(input, existing))
}
