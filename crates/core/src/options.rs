//! Type-indexed configuration options
//!
//! Options are small configuration values (an expiry, a return-value flag, a
//! loader) grouped into categories describing which calls accept them. An
//! [`OptionSet`] holds at most one option per owning variant type and falls
//! back to defaults registered in an [`OptionSchema`].

mod builtin;
mod category;
mod schema;
mod set;

pub use builtin::{Expiry, Return, TimeUnit};
pub use category::{
    AppliesTo, CacheScope, CallOption, Category, Get, OptionValue, Put, Remove, Replace,
    SessionScope,
};
pub use schema::{
    DefaultSource, OptionSchema, OptionSchemaBuilder, TypeDecl, TypeDeclBuilder, TypeKind,
};
pub use set::{resolve, OptionSet};
