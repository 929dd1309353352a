//! Error handling for the cache client
//!
//! Backend failures are fatal and surface to the caller unchanged; a cache
//! miss is never an error.

mod conversions;
mod types;

pub use types::*;
