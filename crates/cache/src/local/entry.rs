//! Stored entries with absolute expiry

use cachet_core::Expiry;

/// A value plus the wall-clock millisecond at which it stops being visible
#[derive(Debug, Clone)]
pub(crate) struct StoredEntry<V> {
    pub value: V,
    /// `None` never expires
    pub expires_at: Option<i64>,
}

impl<V> StoredEntry<V> {
    /// Build an entry written at `now`
    ///
    /// `expiry` must already have the cache default substituted; a default
    /// expiry that reaches this point never expires.
    pub fn new(value: V, expiry: Expiry, now: i64) -> Self {
        let expires_at = if expiry.is_never() || expiry.is_default() {
            None
        } else {
            Some(now.saturating_add(expiry.millis()))
        };

        Self { value, expires_at }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        matches!(self.expires_at, Some(at) if at < now)
    }
}

/// Entries compare by payload only; expiry never takes part
impl<V: PartialEq> PartialEq for StoredEntry<V> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachet_core::TimeUnit;

    #[test]
    fn test_absolute_expiry() {
        let entry = StoredEntry::new("v", Expiry::of(100, TimeUnit::Milliseconds), 1_000);
        assert_eq!(entry.expires_at, Some(1_100));
        assert!(!entry.is_expired(1_100));
        assert!(entry.is_expired(1_101));
    }

    #[test]
    fn test_never_and_default_do_not_expire() {
        assert_eq!(StoredEntry::new(1, Expiry::never(), 5).expires_at, None);
        assert_eq!(StoredEntry::new(1, Expiry::default_expiry(), 5).expires_at, None);
        assert!(!StoredEntry::new(1, Expiry::never(), 5).is_expired(i64::MAX));
    }

    #[test]
    fn test_equality_ignores_expiry() {
        let a = StoredEntry::new("same", Expiry::never(), 0);
        let b = StoredEntry::new("same", Expiry::from_millis(5), 0);
        let c = StoredEntry::new("other", Expiry::never(), 0);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
