//! Zone-hour aggregation: the canonical modelling table.

mod aggregate;
mod fill;
mod types;

pub use aggregate::{aggregate, total_orders};
pub use fill::fill_missing_buckets;
pub use types::{BucketKey, ZoneHourRecord};
