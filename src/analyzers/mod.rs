//! Per-timestamp concentration metrics.
//!
//! This module turns parsed [`TimeFrames`](crate::frames::TimeFrames) into
//! scalar series: the center-region average, the total domain mass, and the
//! mass held in each vertical layer. Every series keeps the parser's
//! first-seen timestamp order.

pub mod aggregate;
pub mod layers;
pub mod types;
pub mod utility;

/// Micrograms to kilograms.
pub const UG_TO_KG: f64 = 1e-9;
