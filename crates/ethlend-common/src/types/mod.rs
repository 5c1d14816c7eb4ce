//! Core data types for Ethlend

pub mod loan;
pub mod params;
pub mod units;
