//! Bulk pre-fetch of rate tables over a date range
//!
//! Calls [`RateSource::get_rates`] once per calendar day, sleeping between
//! calls so the external API tier is not hammered. With a tiered source this
//! fills the persistent cache as a side effect.

use super::base::{parse_date, RateSource, DEFAULT_BASE_CURRENCY};
use crate::currency::Currency;
use crate::error::{MoneyError, Result};
use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Pause between two consecutive days
pub const DEFAULT_PREFETCH_DELAY: Duration = Duration::from_millis(500);

/// What to do when one day cannot be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop and return the error for that day
    #[default]
    Abort,
    /// Record the failure in the report and move on
    Continue,
}

#[derive(Debug, Clone)]
pub struct PrefetchOptions {
    pub delay: Duration,
    pub policy: FailurePolicy,
    /// Currencies requested each day; the tiers fetch and cache whole
    /// tables regardless
    pub currencies: Vec<Currency>,
}

impl Default for PrefetchOptions {
    fn default() -> Self {
        Self {
            delay: DEFAULT_PREFETCH_DELAY,
            policy: FailurePolicy::Abort,
            currencies: vec![DEFAULT_BASE_CURRENCY],
        }
    }
}

/// Outcome of a pre-fetch run
#[derive(Debug, Default)]
pub struct PrefetchReport {
    pub fetched: Vec<NaiveDate>,
    pub failed: Vec<(NaiveDate, MoneyError)>,
    pub cancelled: bool,
}

impl PrefetchReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && !self.cancelled
    }
}

/// Number of days in the inclusive range
pub fn day_count(from: NaiveDate, to: NaiveDate) -> usize {
    if from > to {
        0
    } else {
        (to - from).num_days() as usize + 1
    }
}

/// Fetch every day from `from` to `to` inclusive.
///
/// `cancel` is checked before each day; once set, the run stops and the
/// report is marked cancelled. `on_day` is called after each day with the
/// error for that day, if any.
pub fn prefetch_range<F>(
    source: &dyn RateSource,
    from: NaiveDate,
    to: NaiveDate,
    options: &PrefetchOptions,
    cancel: Option<&AtomicBool>,
    mut on_day: F,
) -> Result<PrefetchReport>
where
    F: FnMut(NaiveDate, Option<&MoneyError>),
{
    if from > to {
        return Err(MoneyError::ParseError(format!(
            "Empty date range: {} is after {}",
            from, to
        )));
    }

    log::info!(
        "Pre-fetching rates for {} days ({} to {})",
        day_count(from, to),
        from,
        to
    );

    // One cache connection for the whole run
    let _hold = source.hold()?;
    let mut report = PrefetchReport::default();
    let mut first = true;
    for date in from.iter_days().take_while(|d| *d <= to) {
        if cancel.map_or(false, |c| c.load(Ordering::SeqCst)) {
            log::info!("Pre-fetch cancelled before {}", date);
            report.cancelled = true;
            break;
        }
        if !first && !options.delay.is_zero() {
            thread::sleep(options.delay);
        }
        first = false;

        match source.get_rates(date, &options.currencies) {
            Ok(_) => {
                on_day(date, None);
                report.fetched.push(date);
            }
            Err(e) => {
                on_day(date, Some(&e));
                match options.policy {
                    FailurePolicy::Abort => return Err(e),
                    FailurePolicy::Continue => {
                        log::warn!("Failed to fetch rates for {}: {}", date, e);
                        report.failed.push((date, e));
                    }
                }
            }
        }
    }

    log::info!(
        "Pre-fetch finished: {} fetched, {} failed",
        report.fetched.len(),
        report.failed.len()
    );
    Ok(report)
}

/// Parse `FROM:TO` (both `YYYY-MM-DD`, inclusive)
pub fn parse_range(text: &str) -> Result<(NaiveDate, NaiveDate)> {
    let (from, to) = text.split_once(':').ok_or_else(|| {
        MoneyError::ParseError(format!("Expected FROM:TO date range, got '{}'", text))
    })?;
    Ok((parse_date(from)?, parse_date(to)?))
}
