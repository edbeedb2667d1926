//! # Runtime Type Reflection & Document Serialization (type-reflect)
//!
//! A process-wide type registry that lets plain data structures be
//! introspected (field names, types, access levels) and converted to and
//! from a JSON-like tree document automatically — plus named **archetypes**
//! (persisted sets of component-type names) built on top of the reflection
//! data.
//!
//! ## Design
//!
//! Registration is two-phase so declaration order never matters:
//!
//! ```text
//! declare phase               build phase                  read-only phase
//! ┌─────────────────┐   ┌──────────────────────────┐   ┌─────────────────┐
//! │ TypeDef         │   │ resolve names → Arc links│   │ TypeRegistry    │
//! │  base: "Point"  │ → │ topo-sort base/field deps│ → │  lookup(name)   │
//! │  field: "x:i32" │   │ flatten inherited fields │   │  TypedRef walk  │
//! └─────────────────┘   └──────────────────────────┘   └─────────────────┘
//! ```
//!
//! Field access is a pair of registered accessor closures
//! ([`field::FieldAccessor`]) instead of raw offset arithmetic; inherited
//! fields compose the derived type's upcast projection with the base field's
//! accessor, so a `TypedRef` walk sees one flattened field list.
//!
//! Leaf types (integers, floats, strings) terminate the recursion through
//! serde-backed codec slots; everything else serializes by walking its field
//! list into an ordered object document.
//!
//! ## Quick tour
//!
//! ```
//! use type_reflect::prelude::*;
//!
//! #[derive(Default)]
//! struct Point { x: i32, y: i32 }
//!
//! let mut builder = RegistryBuilder::new();
//! register_primitives(&mut builder).unwrap();
//! builder.declare(
//!     TypeDef::new::<Point>("Point")
//!         .field("x", "i32", |p: &Point| &p.x, |p: &mut Point| &mut p.x)
//!         .field("y", "i32", |p: &Point| &p.y, |p: &mut Point| &mut p.y),
//! ).unwrap();
//! let registry = builder.build().unwrap();
//!
//! let desc = registry.lookup("Point").unwrap();
//! let point = Point { x: 1, y: 2 };
//! let doc = TypedRef::new(desc, &point).unwrap().serialize().unwrap();
//! assert_eq!(doc["x"], 1);
//!
//! let mut restored = Point::default();
//! TypedRefMut::new(desc, &mut restored).unwrap().deserialize(&doc).unwrap();
//! assert_eq!(restored.x, 1);
//! ```
//!
//! Entity/component storage and the filesystem are *collaborators*, consumed
//! through the [`host::ComponentHost`] and [`store::FileStore`] traits; the
//! crate never implements engine-side storage beyond test doubles.

pub mod archetype;
pub mod blueprint;
pub mod descriptor;
pub mod document;
pub mod error;
pub mod field;
pub mod hash;
pub mod host;
pub mod manager;
pub mod reference;
pub mod registry;
pub mod serializer;
pub mod store;

pub use archetype::Archetype;
pub use descriptor::{DeserializeFn, SerializeFn, TypeDescriptor};
pub use document::{Document, DocumentMap};
pub use error::{ArchetypeError, ReflectError, StoreError};
pub use field::{Access, FieldAccessor, FieldDef, FieldDescriptor};
pub use hash::type_hash;
pub use host::{ComponentHost, MemoryHost};
pub use manager::ArchetypeManager;
pub use reference::{TypedRef, TypedRefMut};
pub use registry::{RegistryBuilder, TypeDef, TypeRegistry, register_primitives};
pub use store::{DirStore, FileStore, MemStore};

/// Stable identity hash of a type name (see [`hash::type_hash`]).
pub type TypeHash = u64;

/// One-stop imports for registration and serialization.
pub mod prelude {
    pub use crate::archetype::Archetype;
    pub use crate::error::{ArchetypeError, ReflectError, StoreError};
    pub use crate::field::{Access, FieldDef};
    pub use crate::host::{ComponentHost, MemoryHost};
    pub use crate::manager::ArchetypeManager;
    pub use crate::reference::{TypedRef, TypedRefMut};
    pub use crate::registry::{RegistryBuilder, TypeDef, TypeRegistry, register_primitives};
    pub use crate::store::{DirStore, FileStore, MemStore};
}
