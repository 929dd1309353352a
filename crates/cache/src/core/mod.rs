//! Cache handles
//!
//! A [`Cache`] is the caller-facing handle for one named cache. It resolves
//! call options against the options the handle was created with, delegates
//! to a [`crate::Backend`] primitive, records hits, misses and timings, and
//! falls back to a configured loader on a miss.

mod builder;
mod operations;
mod types;

pub use types::Cache;

#[cfg(test)]
mod tests;
