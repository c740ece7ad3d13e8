//! Wire model for the simulation server.
//!
//! These types mirror the JSON the server produces for every tick. They are
//! decoded once, normalized, and then treated as immutable: nothing in the
//! core mutates a [`Snapshot`] after it has been received.
//!
//! Decoding is deliberately lenient about entity data. A train with a broken
//! route (missing or null coordinates, zero distances) still decodes so the
//! damage stays contained to that train instead of discarding the whole tick.

mod conflict;
mod route;
mod snapshot;
mod train;

pub use conflict::{Conflict, ConflictSource, Severity};
pub use route::RouteStop;
pub use snapshot::Snapshot;
pub use train::{Train, TrainStatus};

use serde::{Deserialize, Deserializer};

/// Deserialize an optional number, mapping `null` or absence to NaN.
///
/// NaN is how a malformed coordinate is carried into the motion tracker,
/// which then treats the affected segment as zero-duration.
pub(crate) fn f64_or_nan<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

pub(crate) fn nan() -> f64 {
    f64::NAN
}

/// Deserialize a quantity that must be finite and non-negative (speed, distance).
pub(crate) fn non_negative<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
    Ok(if value.is_finite() { value.max(0.0) } else { 0.0 })
}
