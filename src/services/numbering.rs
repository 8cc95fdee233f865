//! Estimate numbering
//!
//! Generates period-scoped, human-readable numbers of the form
//! `EST-YYYYMM-NNNN`. The sequence increments within a year-month and
//! resets to 1 when the period rolls over.
//!
//! Computing the next number from the last one is a pure function; making
//! it stick is not. Reservation goes through the store's unique-number
//! guarantee and retries on conflict, so two concurrent creators can
//! never both keep the same number.

use std::time::Duration;

use backoff::ExponentialBackoff;
use chrono::{DateTime, Datelike, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::store::EstimateStore;

pub const ESTIMATE_NUMBER_PREFIX: &str = "EST";

/// Format a number as `EST-YYYYMM-NNNN`.
pub fn format_estimate_number(year: i32, month: u32, sequence: u32) -> String {
    format!("{ESTIMATE_NUMBER_PREFIX}-{year:04}{month:02}-{sequence:04}")
}

/// Parse `EST-YYYYMM-NNNN` into (year, month, sequence).
pub fn parse_estimate_number(number: &str) -> Option<(i32, u32, u32)> {
    let rest = number.strip_prefix("EST-")?;
    let (period, sequence) = rest.split_once('-')?;
    if period.len() != 6 || sequence.len() != 4 {
        return None;
    }
    if !period.bytes().all(|b| b.is_ascii_digit())
        || !sequence.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let year = period[..4].parse().ok()?;
    let month = period[4..].parse().ok()?;
    let sequence = sequence.parse().ok()?;
    Some((year, month, sequence))
}

/// Next number after `last` for the period containing `now`.
///
/// A last number from the same year-month continues its sequence; any
/// other period, or a malformed number, starts a fresh sequence at 1.
pub fn next_number(last: Option<&str>, now: DateTime<Utc>) -> String {
    let year = now.year();
    let month = now.month();

    let mut sequence = 1;
    if let Some((last_year, last_month, last_seq)) = last.and_then(parse_estimate_number) {
        if last_year == year && last_month == month {
            sequence = last_seq + 1;
        }
    }

    format_estimate_number(year, month, sequence)
}

/// Reserve the next estimate number for an organization.
///
/// Read-compute-reserve loop: a `Conflict` from the store means another
/// caller took the number first, so the last number is re-read and the
/// reservation retried under exponential backoff.
pub async fn reserve_number<S: EstimateStore>(
    store: &S,
    organization_id: Uuid,
    now: DateTime<Utc>,
) -> CoreResult<String> {
    // Conflicts resolve as soon as the winning reservation lands, so the
    // loop starts tight and caps out quickly.
    let policy = ExponentialBackoff {
        initial_interval: Duration::from_millis(50),
        max_interval: Duration::from_secs(1),
        max_elapsed_time: Some(Duration::from_secs(5)),
        ..ExponentialBackoff::default()
    };

    backoff::future::retry(policy, || async {
        let last = store
            .last_estimate_number(organization_id)
            .await
            .map_err(backoff::Error::permanent)?;
        let number = next_number(last.as_deref(), now);

        match store.reserve_estimate_number(organization_id, &number).await {
            Ok(()) => Ok(number),
            Err(err @ CoreError::Conflict(_)) => {
                debug!(
                    organization_id = %organization_id,
                    number = %number,
                    "Estimate number already taken, retrying"
                );
                Err(backoff::Error::transient(err))
            }
            Err(err) => Err(backoff::Error::permanent(err)),
        }
    })
    .await
}
