//! Option schema registry
//!
//! The schema is authored once, up front, and records for every option type:
//!
//! - what kind of type it is (concrete, abstract, or a capability marker),
//! - the parent it inherits category membership from,
//! - the categories and markers it directly advertises,
//! - an ordered table of default providers.
//!
//! Classification of an option into a category and default resolution are
//! then plain table lookups.

use super::category::{Category, OptionValue};
use once_cell::sync::Lazy;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// How a declared type takes part in classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// An instantiable option type
    Concrete,
    /// A shared base that is never instantiated itself
    Abstract,
    /// A capability marker that extends one or more categories
    Marker,
}

type DefaultFn = Arc<dyn Fn() -> Option<Arc<dyn OptionValue>> + Send + Sync>;
type ConstructorFn = Arc<dyn Fn() -> Arc<dyn OptionValue> + Send + Sync>;

/// A registered way of producing the default value for a variant
///
/// Sources are tried in the order listed here regardless of the order in
/// which they were registered.
#[derive(Clone)]
pub enum DefaultSource {
    /// Parameterless producer; may decline by returning `None`
    Function(DefaultFn),
    /// Shared constant instance
    Constant(Arc<dyn OptionValue>),
    /// Parameterless constructor
    Constructor(ConstructorFn),
    /// Designated enumerated constant
    EnumConstant(Arc<dyn OptionValue>),
}

impl DefaultSource {
    fn priority(&self) -> u8 {
        match self {
            Self::Function(_) => 0,
            Self::Constant(_) => 1,
            Self::Constructor(_) => 2,
            Self::EnumConstant(_) => 3,
        }
    }

    fn produce(&self) -> Option<Arc<dyn OptionValue>> {
        match self {
            Self::Function(f) => f(),
            Self::Constant(value) | Self::EnumConstant(value) => Some(Arc::clone(value)),
            Self::Constructor(f) => Some(f()),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Function(_) => "function",
            Self::Constant(_) => "constant",
            Self::Constructor(_) => "constructor",
            Self::EnumConstant(_) => "enum-constant",
        }
    }
}

impl fmt::Debug for DefaultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Registry entry for one option type
#[derive(Debug, Clone)]
pub struct TypeDecl {
    name: &'static str,
    kind: TypeKind,
    parent: Option<TypeId>,
    advertises: Vec<TypeId>,
    defaults: Vec<DefaultSource>,
}

impl TypeDecl {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn parent(&self) -> Option<TypeId> {
        self.parent
    }
}

/// Builder for a single [`TypeDecl`]
pub struct TypeDeclBuilder {
    decl: TypeDecl,
}

impl TypeDeclBuilder {
    fn new<T: 'static>() -> Self {
        Self {
            decl: TypeDecl {
                name: short_name(type_name::<T>()),
                kind: TypeKind::Concrete,
                parent: None,
                advertises: Vec::new(),
                defaults: Vec::new(),
            },
        }
    }

    /// Directly advertise membership of category `C`
    pub fn applies_to<C: Category>(mut self) -> Self {
        self.decl.advertises.push(TypeId::of::<C>());
        self
    }

    /// Directly advertise a capability marker (which may itself extend categories)
    pub fn implements<M: 'static>(mut self) -> Self {
        self.decl.advertises.push(TypeId::of::<M>());
        self
    }

    /// Inherit from a previously or subsequently declared type
    pub fn parent<P: 'static>(mut self) -> Self {
        self.decl.parent = Some(TypeId::of::<P>());
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.decl.kind = TypeKind::Abstract;
        self
    }

    pub fn marker(mut self) -> Self {
        self.decl.kind = TypeKind::Marker;
        self
    }

    pub fn default_function<D, F>(mut self, producer: F) -> Self
    where
        D: OptionValue,
        F: Fn() -> Option<D> + Send + Sync + 'static,
    {
        self.decl
            .defaults
            .push(DefaultSource::Function(Arc::new(move || {
                producer().map(|value| Arc::new(value) as Arc<dyn OptionValue>)
            })));
        self
    }

    pub fn default_constant<D: OptionValue>(mut self, value: D) -> Self {
        self.decl
            .defaults
            .push(DefaultSource::Constant(Arc::new(value)));
        self
    }

    pub fn default_constructor<D, F>(mut self, constructor: F) -> Self
    where
        D: OptionValue,
        F: Fn() -> D + Send + Sync + 'static,
    {
        self.decl
            .defaults
            .push(DefaultSource::Constructor(Arc::new(move || {
                Arc::new(constructor()) as Arc<dyn OptionValue>
            })));
        self
    }

    pub fn default_variant<D: OptionValue>(mut self, value: D) -> Self {
        self.decl
            .defaults
            .push(DefaultSource::EnumConstant(Arc::new(value)));
        self
    }

    fn build(mut self) -> TypeDecl {
        self.decl.defaults.sort_by_key(DefaultSource::priority);
        self.decl
    }
}

/// Explicit registry of option types, their categories and their defaults
#[derive(Debug, Default)]
pub struct OptionSchema {
    types: HashMap<TypeId, TypeDecl>,
}

static STANDARD: Lazy<Arc<OptionSchema>> =
    Lazy::new(|| Arc::new(OptionSchema::builder().with_standard_options().build()));

impl OptionSchema {
    pub fn builder() -> OptionSchemaBuilder {
        OptionSchemaBuilder::default()
    }

    /// The process-wide schema declaring the built-in options
    pub fn standard() -> Arc<OptionSchema> {
        Arc::clone(&STANDARD)
    }

    pub fn declaration(&self, type_id: TypeId) -> Option<&TypeDecl> {
        self.types.get(&type_id)
    }

    pub fn is_declared<T: 'static>(&self) -> bool {
        self.types.contains_key(&TypeId::of::<T>())
    }

    /// Name of a declared type, or `"<undeclared>"`
    pub fn name_of(&self, type_id: TypeId) -> &'static str {
        self.types
            .get(&type_id)
            .map(TypeDecl::name)
            .unwrap_or("<undeclared>")
    }

    /// Find the owning variant type of `concrete` within `category`
    ///
    /// Walks the declared parent chain from `concrete` upwards. At the first
    /// type advertising `category` directly, the nearest non-abstract type at
    /// or below it is the key. At the first type advertising a marker that
    /// extends `category`, the marker is the key, provided the chain holds a
    /// non-abstract type. Chains that are entirely abstract, and undeclared
    /// types, are unclassifiable.
    pub fn classify(&self, concrete: TypeId, category: TypeId) -> Option<TypeId> {
        if concrete == category {
            return Some(concrete);
        }

        let mut hierarchy: Vec<TypeId> = Vec::new();
        let mut current = Some(concrete);

        while let Some(type_id) = current {
            let decl = self.types.get(&type_id)?;
            hierarchy.push(type_id);

            for &tag in &decl.advertises {
                if tag == category {
                    return self.nearest_instantiable(&mut hierarchy);
                }

                if self.extends(tag, category) {
                    return self.nearest_instantiable(&mut hierarchy).map(|_| tag);
                }
            }

            current = decl.parent;
        }

        None
    }

    /// Produce the default for a variant type using its registered sources
    pub fn default_for(&self, variant: TypeId) -> Option<Arc<dyn OptionValue>> {
        let decl = self.types.get(&variant)?;

        decl.defaults.iter().find_map(|source| {
            let produced = source.produce();
            if produced.is_none() {
                tracing::trace!(
                    variant = decl.name,
                    source = source.label(),
                    "default source declined"
                );
            }
            produced
        })
    }

    /// Whether marker `tag` is, or transitively extends, `category`
    fn extends(&self, tag: TypeId, category: TypeId) -> bool {
        if tag == category {
            return true;
        }

        match self.types.get(&tag) {
            Some(decl) if decl.kind == TypeKind::Marker => decl
                .advertises
                .iter()
                .any(|&parent| self.extends(parent, category)),
            _ => false,
        }
    }

    fn nearest_instantiable(&self, hierarchy: &mut Vec<TypeId>) -> Option<TypeId> {
        while let Some(type_id) = hierarchy.pop() {
            let is_abstract = self
                .types
                .get(&type_id)
                .is_some_and(|decl| decl.kind == TypeKind::Abstract);

            if !is_abstract {
                return Some(type_id);
            }
        }

        None
    }
}

/// Builder for [`OptionSchema`]
#[derive(Default)]
pub struct OptionSchemaBuilder {
    types: HashMap<TypeId, TypeDecl>,
}

impl OptionSchemaBuilder {
    /// Declare type `T`; declaring the same type twice replaces the first declaration
    pub fn declare<T: 'static>(
        mut self,
        configure: impl FnOnce(TypeDeclBuilder) -> TypeDeclBuilder,
    ) -> Self {
        let decl = configure(TypeDeclBuilder::new::<T>()).build();
        self.types.insert(TypeId::of::<T>(), decl);
        self
    }

    /// Declare the options shipped with this crate
    pub fn with_standard_options(self) -> Self {
        super::builtin::declare_standard(self)
    }

    pub fn build(self) -> OptionSchema {
        OptionSchema { types: self.types }
    }
}

fn short_name(full: &'static str) -> &'static str {
    match full.find('<') {
        Some(generic_start) => {
            let head = &full[..generic_start];
            match head.rfind("::") {
                Some(idx) => &full[idx + 2..],
                None => full,
            }
        }
        None => full.rsplit("::").next().unwrap_or(full),
    }
}
