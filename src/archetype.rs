//! Archetypes — named sets of component type names.
//!
//! An archetype describes a reusable object "shape": the set of component
//! types an object carries, without any component data. Equality is set
//! equality; insertion order never matters. The backing set is ordered
//! (`BTreeSet`) so persisted archetype files are byte-stable across runs.

use std::collections::BTreeSet;

use crate::error::ReflectError;
use crate::host::ComponentHost;
use crate::registry::{RegistryBuilder, TypeDef};

/// A named, unordered set of component type names.
///
/// Built either by snapshotting a live object ([`Archetype::from_host`],
/// name left blank until the caller names it) or by explicit
/// [`with`](Archetype::with)/[`insert`](Archetype::insert) calls.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Archetype {
    name: String,
    components: BTreeSet<String>,
}

impl Archetype {
    /// An empty, unnamed archetype.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty archetype with a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: BTreeSet::new(),
        }
    }

    /// Snapshot a live object's current component-type set. The name is
    /// left blank; the caller (usually the manager) names it.
    pub fn from_host(host: &dyn ComponentHost) -> Self {
        Self {
            name: String::new(),
            components: host.component_type_names().into_iter().collect(),
        }
    }

    /// Builder method: add a component type name and return self.
    pub fn with(mut self, type_name: impl Into<String>) -> Self {
        self.components.insert(type_name.into());
        self
    }

    /// Add a component type name. Returns `true` if it was newly inserted.
    pub fn insert(&mut self, type_name: impl Into<String>) -> bool {
        self.components.insert(type_name.into())
    }

    /// Remove a component type name. Returns `true` if it was present.
    pub fn remove(&mut self, type_name: &str) -> bool {
        self.components.remove(type_name)
    }

    #[inline]
    pub fn contains(&self, type_name: &str) -> bool {
        self.components.contains(type_name)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Component type names in set (lexicographic) order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|s| s.as_str())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Set equality ignoring the names.
    pub fn same_components(&self, other: &Archetype) -> bool {
        self.components == other.components
    }

    /// Does the live object's component-type set equal this archetype's set?
    ///
    /// Implemented as cardinality equality plus a subset check, which
    /// together are set equality.
    pub fn matches(&self, host: &dyn ComponentHost) -> bool {
        let live = host.component_type_names();
        live.len() == self.components.len()
            && live.iter().all(|name| self.components.contains(name))
    }
}

impl FromIterator<String> for Archetype {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self {
            name: String::new(),
            components: iter.into_iter().collect(),
        }
    }
}

impl Extend<String> for Archetype {
    fn extend<T: IntoIterator<Item = String>>(&mut self, iter: T) {
        self.components.extend(iter);
    }
}

/// Declare the reflection types the archetype layer persists through:
/// `String`, the `StringSet` leaf, and `Archetype` itself. Idempotent.
pub fn register_types(builder: &mut RegistryBuilder) -> Result<(), ReflectError> {
    builder.declare(TypeDef::leaf::<String>("String"))?;
    builder.declare(TypeDef::leaf::<BTreeSet<String>>("StringSet"))?;
    builder.declare(
        TypeDef::new::<Archetype>("Archetype")
            .field("name", "String", |a: &Archetype| &a.name, |a: &mut Archetype| {
                &mut a.name
            })
            .field(
                "components",
                "StringSet",
                |a: &Archetype| &a.components,
                |a: &mut Archetype| &mut a.components,
            ),
    )?;
    Ok(())
}
