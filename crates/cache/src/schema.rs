//! Option schema used by cache handles and sessions

use crate::loader::LoaderOption;
use crate::serialization::SerializerOption;
use cachet_core::{CacheScope, OptionSchema, SessionScope};
use once_cell::sync::Lazy;
use std::sync::Arc;

static CACHE_SCHEMA: Lazy<Arc<OptionSchema>> = Lazy::new(|| {
    Arc::new(
        OptionSchema::builder()
            .with_standard_options()
            .declare::<LoaderOption>(|d| d.applies_to::<CacheScope>())
            .declare::<SerializerOption>(|d| {
                d.applies_to::<SessionScope>()
                    .applies_to::<CacheScope>()
                    .default_function(|| Some(SerializerOption::json()))
            })
            .build(),
    )
});

/// The standard options plus the loader and serializer options
pub fn cache_schema() -> Arc<OptionSchema> {
    Arc::clone(&CACHE_SCHEMA)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachet_core::{CallOption, Expiry, OptionSet, Return};

    #[test]
    fn test_cache_schema_declares_everything() {
        let schema = cache_schema();
        assert!(schema.is_declared::<Expiry>());
        assert!(schema.is_declared::<Return>());
        assert!(schema.is_declared::<LoaderOption>());
        assert!(schema.is_declared::<SerializerOption>());
    }

    #[test]
    fn test_serializer_defaults_to_json() {
        let options: OptionSet<SessionScope> = OptionSet::empty(cache_schema());
        let serializer = options.get::<SerializerOption>().unwrap();
        assert_eq!(serializer.serializer().name(), "json");
    }

    #[test]
    fn test_loader_is_classified_into_cache_scope() {
        let loader: CallOption<CacheScope> =
            LoaderOption::from_fn(|_: &str| Some(1u8)).into();
        let options = OptionSet::from_options(cache_schema(), &[loader]);
        assert!(options.contains::<LoaderOption>());
        assert!(options.get::<LoaderOption>().is_some());
    }
}
