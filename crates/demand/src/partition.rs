//! Date-axis train/test partitioning of the modelling table.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::error::{DemandError, Result};
use crate::zone_hour::ZoneHourRecord;

/// Disjoint historical and holdout sets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Partition {
    pub train: Vec<ZoneHourRecord>,
    pub test: Vec<ZoneHourRecord>,
    /// First holdout date. `None` only for empty input.
    pub cutoff: Option<NaiveDate>,
}

/// Split `records` so the last `test_days` distinct dates form the holdout.
///
/// With `test_days` or fewer distinct dates the split degrades to holding
/// out only the latest date, which never fails on small inputs. Relative
/// order within each side follows the input.
///
/// # Errors
///
/// `InvalidParameter` if `test_days < 1`.
pub fn split(records: &[ZoneHourRecord], test_days: usize) -> Result<Partition> {
    if test_days < 1 {
        return Err(DemandError::invalid_parameter("test_days must be >= 1"));
    }

    let dates: Vec<NaiveDate> = records
        .iter()
        .map(|r| r.date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let Some(&latest) = dates.last() else {
        return Ok(Partition::default());
    };
    let cutoff = if dates.len() <= test_days {
        tracing::warn!(
            "only {} distinct dates for test_days={}; holding out {} alone",
            dates.len(),
            test_days,
            latest
        );
        latest
    } else {
        dates[dates.len() - test_days]
    };
    let (test, train): (Vec<_>, Vec<_>) = records.iter().cloned().partition(|r| r.date >= cutoff);
    tracing::info!(
        "split at {}: {} train rows, {} test rows",
        cutoff,
        train.len(),
        test.len()
    );
    Ok(Partition {
        train,
        test,
        cutoff: Some(cutoff),
    })
}
