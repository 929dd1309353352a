//! Built-in options shared by every cache backend

use super::category::{CacheScope, Get, Put, Remove, Replace};
use super::schema::OptionSchemaBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Time unit accepted by [`Expiry::of`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Convert `amount` of this unit into milliseconds, saturating on overflow
    pub const fn to_millis(self, amount: i64) -> i64 {
        let factor = match self {
            Self::Milliseconds => 1,
            Self::Seconds => 1_000,
            Self::Minutes => 60_000,
            Self::Hours => 3_600_000,
            Self::Days => 86_400_000,
        };
        amount.saturating_mul(factor)
    }
}

/// Time-to-live for a written entry, in milliseconds
///
/// `0` means "use the cache's configured default" and `-1` means "never
/// expire"; any other value is the number of milliseconds the entry lives
/// after the write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Expiry {
    millis: i64,
}

impl Expiry {
    pub const DEFAULT_MILLIS: i64 = 0;
    pub const NEVER_MILLIS: i64 = -1;

    pub const fn of(amount: i64, unit: TimeUnit) -> Self {
        Self {
            millis: unit.to_millis(amount),
        }
    }

    pub fn from_duration(duration: Duration) -> Self {
        Self {
            millis: i64::try_from(duration.as_millis()).unwrap_or(i64::MAX),
        }
    }

    pub const fn from_millis(millis: i64) -> Self {
        Self { millis }
    }

    pub const fn never() -> Self {
        Self {
            millis: Self::NEVER_MILLIS,
        }
    }

    /// Defer to the cache's configured default
    pub const fn default_expiry() -> Self {
        Self {
            millis: Self::DEFAULT_MILLIS,
        }
    }

    pub const fn millis(&self) -> i64 {
        self.millis
    }

    pub const fn is_default(&self) -> bool {
        self.millis == Self::DEFAULT_MILLIS
    }

    pub const fn is_never(&self) -> bool {
        self.millis == Self::NEVER_MILLIS
    }
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.millis {
            Self::DEFAULT_MILLIS => write!(f, "Expiry{{default}}"),
            Self::NEVER_MILLIS => write!(f, "Expiry{{never}}"),
            millis => write!(f, "Expiry{{{millis}ms}}"),
        }
    }
}

/// Whether a mutating call hands back the value it displaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Return {
    Nothing,
    OldValue,
}

impl Return {
    pub const fn value(&self) -> bool {
        matches!(self, Self::OldValue)
    }
}

crate::applies_to!(Expiry => Get, Put, Replace, CacheScope);
crate::applies_to!(Return => Put, Replace, Remove);

pub(super) fn declare_standard(builder: OptionSchemaBuilder) -> OptionSchemaBuilder {
    builder
        .declare::<Expiry>(|d| {
            d.applies_to::<CacheScope>()
                .applies_to::<Put>()
                .applies_to::<Replace>()
                .applies_to::<Get>()
                .default_function(|| Some(Expiry::default_expiry()))
        })
        .declare::<Return>(|d| {
            d.applies_to::<Put>()
                .applies_to::<Replace>()
                .applies_to::<Remove>()
                .default_variant(Return::Nothing)
        })
}
