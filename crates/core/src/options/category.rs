//! Option categories
//!
//! A category is a capability tag naming the kind of call an option may be
//! supplied to. Categories are zero-sized types so that call surfaces can be
//! checked at compile time through [`AppliesTo`], while the runtime registry
//! in [`super::OptionSchema`] records the same membership by `TypeId`.

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Capability tag identifying which call kinds an option may apply to
pub trait Category: Any + Send + Sync {
    /// Human readable category name used in logs and `Display` output
    const NAME: &'static str;

    fn id() -> TypeId
    where
        Self: Sized,
    {
        TypeId::of::<Self>()
    }
}

/// Options valid for `get` calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Get;

/// Options valid for `put` and `put_if_absent` calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Put;

/// Options valid for both `replace` variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replace;

/// Options valid for both `remove` variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remove;

/// Options supplied once when a cache handle is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheScope;

/// Options supplied once when a session is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionScope;

impl Category for Get {
    const NAME: &'static str = "get";
}

impl Category for Put {
    const NAME: &'static str = "put";
}

impl Category for Replace {
    const NAME: &'static str = "replace";
}

impl Category for Remove {
    const NAME: &'static str = "remove";
}

impl Category for CacheScope {
    const NAME: &'static str = "cache";
}

impl Category for SessionScope {
    const NAME: &'static str = "session";
}

/// Any value that can be stored in an option set
///
/// Blanket-implemented for every `Debug + Send + Sync + 'static` type;
/// whether a value is actually accepted by a set is decided by the schema.
pub trait OptionValue: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;

    fn type_name(&self) -> &'static str;
}

impl<T> OptionValue for T
where
    T: Any + Send + Sync + fmt::Debug,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Compile-time statement that an option type may be supplied to calls of
/// category `C`
pub trait AppliesTo<C: Category>: OptionValue {}

/// A single type-erased option destined for a call of category `C`
#[derive(Clone)]
pub struct CallOption<C: Category> {
    value: Arc<dyn OptionValue>,
    _category: PhantomData<fn() -> C>,
}

impl<C: Category> CallOption<C> {
    pub fn new<O: AppliesTo<C>>(option: O) -> Self {
        Self {
            value: Arc::new(option),
            _category: PhantomData,
        }
    }

    pub(crate) fn concrete_type(&self) -> TypeId {
        (*self.value).as_any().type_id()
    }

    pub(crate) fn value(&self) -> &Arc<dyn OptionValue> {
        &self.value
    }
}

impl<C: Category> fmt::Debug for CallOption<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.value, f)
    }
}

/// Declares the categories an option type applies to
///
/// Emits an [`AppliesTo`] impl and a `From` conversion into [`CallOption`]
/// for every listed category, so call sites can write `expiry.into()`.
#[macro_export]
macro_rules! applies_to {
    ($option:ty => $($category:ty),+ $(,)?) => {
        $(
            impl $crate::options::AppliesTo<$category> for $option {}

            impl ::std::convert::From<$option> for $crate::options::CallOption<$category> {
                fn from(option: $option) -> Self {
                    $crate::options::CallOption::new(option)
                }
            }
        )+
    };
}
