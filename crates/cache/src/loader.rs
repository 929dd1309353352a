//! Miss loaders

use crate::backend::CacheValue;
use cachet_core::CacheScope;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// Produces a value for a key that missed
///
/// Invoked synchronously on the calling thread. Concurrent misses on the
/// same key may invoke the loader more than once.
pub trait CacheLoader<V>: Send + Sync {
    fn load(&self, key: &str) -> Option<V>;
}

impl<V, F> CacheLoader<V> for F
where
    F: Fn(&str) -> Option<V> + Send + Sync,
{
    fn load(&self, key: &str) -> Option<V> {
        self(key)
    }
}

/// Cache-scoped option carrying a [`CacheLoader`]
///
/// The loader is stored type-erased so the option can live in an untyped
/// option set; [`LoaderOption::loader`] recovers it for a concrete value type.
#[derive(Clone)]
pub struct LoaderOption {
    loader: Arc<dyn Any + Send + Sync>,
    value_type: &'static str,
}

impl LoaderOption {
    pub fn new<V: CacheValue>(loader: impl CacheLoader<V> + 'static) -> Self {
        let loader: Arc<dyn CacheLoader<V>> = Arc::new(loader);
        Self {
            loader: Arc::new(loader),
            value_type: type_name::<V>(),
        }
    }

    pub fn from_fn<V, F>(loader: F) -> Self
    where
        V: CacheValue,
        F: Fn(&str) -> Option<V> + Send + Sync + 'static,
    {
        Self::new::<V>(loader)
    }

    /// The loader, if it produces values of type `V`
    pub fn loader<V: CacheValue>(&self) -> Option<Arc<dyn CacheLoader<V>>> {
        self.loader
            .downcast_ref::<Arc<dyn CacheLoader<V>>>()
            .cloned()
    }

    /// Name of the value type the loader produces
    pub fn value_type(&self) -> &'static str {
        self.value_type
    }
}

impl fmt::Debug for LoaderOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderOption")
            .field("value_type", &self.value_type)
            .finish()
    }
}

cachet_core::applies_to!(LoaderOption => CacheScope);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loader_round_trips_through_option() {
        let option = LoaderOption::from_fn(|key: &str| Some(format!("{key}-value")));
        let loader = option.loader::<String>().unwrap();
        assert_eq!(loader.load("k"), Some("k-value".to_string()));
        assert_eq!(option.value_type(), type_name::<String>());
    }

    #[test]
    fn test_loader_for_other_type_is_not_returned() {
        let option = LoaderOption::from_fn(|_: &str| Some(1u64));
        assert!(option.loader::<String>().is_none());
        assert!(option.loader::<u64>().is_some());
    }

    struct Fixed;

    impl CacheLoader<i32> for Fixed {
        fn load(&self, _key: &str) -> Option<i32> {
            Some(42)
        }
    }

    #[test]
    fn test_struct_loader() {
        let option = LoaderOption::new(Fixed);
        assert_eq!(option.loader::<i32>().unwrap().load("x"), Some(42));
    }
}
