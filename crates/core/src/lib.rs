//! Core types for the cachet client
//!
//! - **`options`**: option categories, the option schema registry, and the
//!   type-indexed [`OptionSet`] with its three-tier precedence resolution.
//! - **`time`**: wall-clock helpers shared by stores and metrics.

pub mod options;
pub mod time;

pub use options::{
    resolve, AppliesTo, CacheScope, CallOption, Category, Expiry, Get, OptionSchema, OptionSet,
    OptionValue, Put, Remove, Replace, Return, SessionScope, TimeUnit,
};
