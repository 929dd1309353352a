//! Immutable, type-indexed option sets

use super::category::{CallOption, Category, OptionValue};
use super::schema::OptionSchema;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

type Entries = IndexMap<TypeId, Arc<dyn OptionValue>>;

static EMPTY_ENTRIES: Lazy<Arc<Entries>> = Lazy::new(|| Arc::new(IndexMap::new()));

/// An immutable bag of options for category `C`
///
/// Entries are keyed by their owning variant type as determined by the
/// schema; a later option with the same owning variant replaces an earlier
/// one. Lookups that miss fall back to the schema's default providers.
pub struct OptionSet<C: Category> {
    schema: Arc<OptionSchema>,
    entries: Arc<Entries>,
    _category: PhantomData<fn() -> C>,
}

impl<C: Category> OptionSet<C> {
    /// Build a set from call arguments using the standard schema
    pub fn new(options: &[CallOption<C>]) -> Self {
        Self::from_options(OptionSchema::standard(), options)
    }

    /// Build a set from call arguments, classifying each against `schema`
    ///
    /// Options that cannot be classified into `C` are dropped.
    pub fn from_options(schema: Arc<OptionSchema>, options: &[CallOption<C>]) -> Self {
        if options.is_empty() {
            return Self::empty(schema);
        }

        let category = TypeId::of::<C>();
        let mut entries = Entries::with_capacity(options.len());

        for option in options {
            match schema.classify(option.concrete_type(), category) {
                Some(variant) => {
                    entries.insert(variant, Arc::clone(option.value()));
                }
                None => {
                    tracing::warn!(
                        option = ?option,
                        category = C::NAME,
                        "ignoring option that cannot be classified into category"
                    );
                }
            }
        }

        Self {
            schema,
            entries: Arc::new(entries),
            _category: PhantomData,
        }
    }

    /// The shared empty set; it only ever answers with defaults
    pub fn empty(schema: Arc<OptionSchema>) -> Self {
        Self {
            schema,
            entries: Arc::clone(&EMPTY_ENTRIES),
            _category: PhantomData,
        }
    }

    pub fn schema(&self) -> &Arc<OptionSchema> {
        &self.schema
    }

    /// The explicit option of type `U`, or the schema default for `U`
    pub fn get<U: OptionValue + Clone>(&self) -> Option<U> {
        self.explicit::<U>().or_else(|| self.default_for::<U>())
    }

    /// The explicit option of type `U`, or `fallback`
    pub fn get_or<U: OptionValue + Clone>(&self, fallback: U) -> U {
        self.explicit::<U>().unwrap_or(fallback)
    }

    /// The option of type `U` supplied to this set, ignoring defaults
    pub fn explicit<U: OptionValue + Clone>(&self) -> Option<U> {
        self.entries
            .get(&TypeId::of::<U>())
            .and_then(|value| downcast::<U>(value))
    }

    /// The schema default for `U`
    pub fn default_for<U: OptionValue + Clone>(&self) -> Option<U> {
        self.schema
            .default_for(TypeId::of::<U>())
            .and_then(|value| downcast::<U>(&value))
    }

    /// Untyped lookup by owning variant, used when the variant is a marker
    /// rather than the concrete type of the stored option
    pub fn get_variant(&self, variant: TypeId) -> Option<Arc<dyn OptionValue>> {
        self.entries
            .get(&variant)
            .cloned()
            .or_else(|| self.schema.default_for(variant))
    }

    pub fn contains<U: OptionValue>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<U>())
    }

    /// Every stored option whose concrete type is `U`, in insertion order
    pub fn instances_of<U: OptionValue + Clone>(&self) -> Vec<U> {
        self.entries
            .values()
            .filter_map(|value| downcast::<U>(value))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn OptionValue> + '_ {
        self.entries.values().map(|value| &**value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether this set shares the process-wide empty storage
    pub fn is_shared_empty(&self) -> bool {
        Arc::ptr_eq(&self.entries, &EMPTY_ENTRIES)
    }
}

impl<C: Category> Clone for OptionSet<C> {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            entries: Arc::clone(&self.entries),
            _category: PhantomData,
        }
    }
}

impl<C: Category> Default for OptionSet<C> {
    fn default() -> Self {
        Self::empty(OptionSchema::standard())
    }
}

impl<C: Category> fmt::Display for OptionSet<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_shared_empty() {
            return f.write_str("EmptyOptions{}");
        }

        f.write_str("Options{")?;
        for (idx, value) in self.entries.values().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value:?}")?;
        }
        f.write_str("}")
    }
}

impl<C: Category> fmt::Debug for OptionSet<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionSet")
            .field("category", &C::NAME)
            .field(
                "entries",
                &self
                    .entries
                    .keys()
                    .map(|variant| self.schema.name_of(*variant))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Resolve option `U` with three-tier precedence
///
/// An explicit option in `call` wins over an explicit option in `scope`,
/// which wins over the schema default for `U` as seen by `call`.
pub fn resolve<U, A, B>(call: &OptionSet<A>, scope: &OptionSet<B>) -> Option<U>
where
    U: OptionValue + Clone,
    A: Category,
    B: Category,
{
    call.explicit::<U>()
        .or_else(|| scope.explicit::<U>())
        .or_else(|| call.default_for::<U>())
}

fn downcast<U: OptionValue + Clone>(value: &Arc<dyn OptionValue>) -> Option<U> {
    (**value).as_any().downcast_ref::<U>().cloned()
}
